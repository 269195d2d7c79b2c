//! End-to-end dialogue tests over the in-memory store

use std::sync::Arc;

use hr_agent::{HrAgent, MemoryStore, RecordStore, Values};
use hr_nlu::{Lexicon, SchemaCatalog};
use hr_types::{
    Condition, ConditionOp, ConversationState, FieldValue, Intent, ResponseEnvelope, ResponseType,
};
use serde_json::json;

// ============================================================================
// Helpers
// ============================================================================

fn setup() -> (HrAgent, Arc<MemoryStore>) {
    let lexicon = Arc::new(Lexicon::builtin().clone());
    let store = Arc::new(MemoryStore::new(lexicon.schemas().iter().cloned()));
    let agent = HrAgent::new(lexicon, store.clone());
    (agent, store)
}

/// Run a sequence of utterances, carrying the state between them
async fn converse(agent: &HrAgent, turns: &[&str]) -> Vec<ResponseEnvelope> {
    let mut state = ConversationState::default();
    let mut replies = Vec::new();
    for text in turns {
        let reply = agent.process(text, state).await;
        state = reply.conversation_state.clone();
        replies.push(reply);
    }
    replies
}

async fn seed_employee(store: &MemoryStore, id: i64, first: &str, last: &str, salary: f64) {
    let values: Values = [
        ("employee_id", FieldValue::Int(id)),
        ("first_name", FieldValue::text(first)),
        ("last_name", FieldValue::text(last)),
        ("email", FieldValue::text(format!("{}@hr.com", first.to_lowercase()))),
        ("salary", FieldValue::Float(salary)),
        ("hire_date", FieldValue::text("2020-03-01")),
        ("job_id", FieldValue::text("IT_PROG")),
        ("department_id", FieldValue::Int(60)),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect();
    store.insert("employees", &values).await.unwrap();
}

// ============================================================================
// Slot filling
// ============================================================================

#[tokio::test]
async fn test_insert_without_data_asks_first_required_field() {
    let (agent, _) = setup();
    let cases = [
        ("insertar empleado", "employees"),
        ("insertar departamento", "departments"),
        ("insertar puesto", "jobs"),
        ("insertar region", "regions"),
        ("insertar pais", "countries"),
        ("insertar ubicacion", "locations"),
    ];

    for (text, table) in cases {
        let schema = Lexicon::builtin().schema_for(table).unwrap();
        let first = &schema.required[0];

        let reply = agent.process(text, ConversationState::default()).await;
        assert_eq!(reply.response_type, ResponseType::DialogNeeded, "{text}");
        assert!(reply.agent_text.contains(&format!("**{first}**")), "{}", reply.agent_text);

        let state = &reply.conversation_state;
        assert_eq!(state.intent, Intent::Insert);
        assert_eq!(state.table.as_deref(), Some(table));
        assert_eq!(state.last_asked_field.as_ref(), Some(first));
        assert_eq!(state.missing_fields, schema.required);
    }
}

#[tokio::test]
async fn test_slot_filling_runs_insert_on_fourth_turn() {
    let (agent, store) = setup();
    let replies = converse(&agent, &["insertar pais", "AR", "Argentina", "2"]).await;

    assert_eq!(
        replies[1].conversation_state.last_asked_field.as_deref(),
        Some("country_name")
    );
    assert_eq!(
        replies[2].conversation_state.missing_fields,
        vec!["region_id".to_string()]
    );
    assert!(replies[..3]
        .iter()
        .all(|r| r.response_type == ResponseType::DialogNeeded));

    let done = &replies[3];
    assert_eq!(done.response_type, ResponseType::QuerySuccess);
    assert!(done.conversation_state.is_empty());
    assert_eq!(
        done.sql_statement.as_deref(),
        Some("INSERT INTO countries (country_id, country_name, region_id) VALUES ('AR', 'Argentina', 2);")
    );

    let rows = store.find("countries", None, 10).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("region_id"), Some(&FieldValue::Int(2)));
}

#[tokio::test]
async fn test_generated_keys_start_at_floor_then_increment() {
    let (agent, _) = setup();
    let first = converse(&agent, &["insertar region", "Oceania"]).await;
    assert_eq!(
        first[1].sql_statement.as_deref(),
        Some("INSERT INTO regions (region_id, region_name) VALUES (1, 'Oceania');")
    );

    let second = converse(&agent, &["crear region", "Antartida"]).await;
    assert_eq!(
        second[1].sql_statement.as_deref(),
        Some("INSERT INTO regions (region_id, region_name) VALUES (2, 'Antartida');")
    );
}

#[tokio::test]
async fn test_labelled_values_fill_the_insert_in_one_turn() {
    let (agent, _) = setup();
    let reply = agent
        .process(
            "insertar departamento nombre: Ventas, localizacion: 1700",
            ConversationState::default(),
        )
        .await;

    assert_eq!(reply.response_type, ResponseType::QuerySuccess);
    assert_eq!(
        reply.sql_statement.as_deref(),
        Some("INSERT INTO departments (department_id, department_name, location_id) VALUES (100, 'Ventas', 1700);")
    );
}

#[tokio::test]
async fn test_invalid_slot_value_keeps_state() {
    let (agent, _) = setup();
    let replies = converse(&agent, &["insertar pais", "AR", "Argentina", "norte"]).await;

    let rejected = &replies[3];
    assert_eq!(rejected.response_type, ResponseType::DialogNeeded);
    assert!(rejected.agent_text.contains("norte"));
    assert_eq!(rejected.conversation_state, replies[2].conversation_state);

    let done = agent.process("2", rejected.conversation_state.clone()).await;
    assert_eq!(done.response_type, ResponseType::QuerySuccess);
}

#[tokio::test]
async fn test_empty_reply_reasks_pending_field() {
    let (agent, _) = setup();
    let replies = converse(&agent, &["insertar region", "   "]).await;

    assert_eq!(replies[1].response_type, ResponseType::DialogNeeded);
    assert_eq!(
        replies[1].conversation_state.last_asked_field.as_deref(),
        Some("region_name")
    );
}

#[tokio::test]
async fn test_date_field_prompt_names_format() {
    let (agent, _) = setup();
    let replies = converse(
        &agent,
        &["agregar empleado a Ana Ruiz", "ana.ruiz@hr.com", "3000"],
    )
    .await;

    let prompt = &replies[2];
    assert_eq!(prompt.conversation_state.last_asked_field.as_deref(), Some("hire_date"));
    assert!(prompt.agent_text.contains("fecha de contratación"));
    assert!(prompt.agent_text.contains("YYYY-MM-DD"));
}

#[tokio::test]
async fn test_inserted_employee_reads_back_with_composite_name() {
    let (agent, _) = setup();
    let replies = converse(
        &agent,
        &[
            "agregar empleado a Ana Ruiz",
            "ana.ruiz@hr.com",
            "3000",
            "2024-01-15",
            "IT_PROG",
            "60",
        ],
    )
    .await;
    let inserted = replies.last().unwrap();
    assert_eq!(inserted.response_type, ResponseType::QuerySuccess);

    let reply = agent.process("listar empleados", ConversationState::default()).await;
    assert_eq!(reply.response_type, ResponseType::QueryResult);
    let rows = reply.data.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["NOMBRE"], json!("Ana Ruiz"));
    assert_eq!(rows[0]["SALARY"], json!(3000.0));
    assert_eq!(rows[0]["EMPLOYEE_ID"], json!(300.0));
    assert!(!rows[0].contains_key("LAST_NAME"));
}

#[tokio::test]
async fn test_duplicate_key_is_terminal_error() {
    let (agent, _) = setup();
    let first = converse(&agent, &["insertar puesto", "IT_PROG", "Programador"]).await;
    assert_eq!(first[2].response_type, ResponseType::QuerySuccess);

    let second = converse(&agent, &["insertar puesto", "IT_PROG", "Programador"]).await;
    let failed = &second[2];
    assert_eq!(failed.response_type, ResponseType::Error);
    assert!(failed
        .agent_text
        .starts_with("Error al ejecutar la operación en la base de datos"));
    assert!(failed.conversation_state.is_empty());
}

#[tokio::test]
async fn test_out_of_range_key_seed_is_dropped() {
    let (agent, _) = setup();
    let reply = agent
        .process(
            "insertar region id: 9223372036854775807, nombre: Norte",
            ConversationState::default(),
        )
        .await;

    assert_eq!(reply.response_type, ResponseType::QuerySuccess);
    assert_eq!(
        reply.sql_statement.as_deref(),
        Some("INSERT INTO regions (region_id, region_name) VALUES (1, 'Norte');")
    );
}

#[tokio::test]
async fn test_out_of_range_slot_value_keeps_state() {
    let (agent, _) = setup();
    let replies = converse(
        &agent,
        &["insertar pais", "AR", "Argentina", "9223372036854775807"],
    )
    .await;

    let rejected = &replies[3];
    assert_eq!(rejected.response_type, ResponseType::DialogNeeded);
    assert_eq!(rejected.conversation_state, replies[2].conversation_state);
}

#[tokio::test]
async fn test_exhausted_key_space_is_error_not_panic() {
    let (agent, store) = setup();
    let values: Values = [
        ("region_id".to_string(), FieldValue::Int(i32::MAX as i64)),
        ("region_name".to_string(), FieldValue::text("Norte")),
    ]
    .into_iter()
    .collect();
    store.insert("regions", &values).await.unwrap();

    let reply = agent
        .process("insertar region nombre: Sur", ConversationState::default())
        .await;
    assert_eq!(reply.response_type, ResponseType::Error);
    assert!(reply.agent_text.contains("no key value left"));
    assert!(reply.conversation_state.is_empty());
    assert_eq!(store.find("regions", None, 10).await.unwrap().len(), 1);
}

// ============================================================================
// SELECT
// ============================================================================

#[tokio::test]
async fn test_select_scenario_sql() {
    let (agent, store) = setup();
    seed_employee(&store, 100, "Steven", "King", 24000.0).await;
    seed_employee(&store, 104, "Bruce", "Ernst", 2000.0).await;

    let reply = agent
        .process("listar empleados que ganan mas de 3000", ConversationState::default())
        .await;

    assert_eq!(reply.response_type, ResponseType::QueryResult);
    assert_eq!(
        reply.sql_statement.as_deref(),
        Some("SELECT * FROM employees WHERE salary > 3000.0 LIMIT 10;")
    );
    let rows = reply.data.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["NOMBRE"], json!("Steven King"));
    assert!(reply.conversation_state.is_empty());
}

#[tokio::test]
async fn test_select_caps_rows_at_limit() {
    let (agent, store) = setup();
    for id in 0..15 {
        seed_employee(&store, 200 + id, "Emp", "Loyee", 1000.0).await;
    }

    let reply = agent
        .process("mostrar empleados con salario mayor a 500", ConversationState::default())
        .await;
    assert_eq!(reply.data.unwrap().len(), 10);
    assert!(reply.agent_text.contains("Mostrando los primeros 10 registros"));
}

#[tokio::test]
async fn test_select_field_outside_table_is_schema_mismatch() {
    let (agent, _) = setup();
    let reply = agent
        .process("listar regiones con salario mayor a 5", ConversationState::default())
        .await;
    assert_eq!(reply.response_type, ResponseType::Error);
    assert!(reply.agent_text.contains("salary"));
}

// ============================================================================
// UPDATE
// ============================================================================

#[tokio::test]
async fn test_update_without_where_asks_again() {
    let (agent, _) = setup();
    let reply = agent
        .process("actualizar el salario del empleado a 5000", ConversationState::default())
        .await;
    assert_eq!(reply.response_type, ResponseType::DialogNeeded);
    assert!(reply.conversation_state.is_empty());
}

#[tokio::test]
async fn test_update_applies_set_and_where() {
    let (agent, store) = setup();
    seed_employee(&store, 101, "Neena", "Kochhar", 4000.0).await;

    let reply = agent
        .process(
            "actualizar el salario del empleado a 5000 donde id es 101",
            ConversationState::default(),
        )
        .await;

    assert_eq!(reply.response_type, ResponseType::QuerySuccess);
    assert_eq!(
        reply.sql_statement.as_deref(),
        Some("UPDATE employees SET salary = 5000.0 WHERE employee_id = 101;")
    );
    let filter = Condition::new("employee_id", ConditionOp::Eq, FieldValue::Int(101));
    let rows = store.find("employees", Some(&filter), 10).await.unwrap();
    assert_eq!(rows[0].get("salary"), Some(&FieldValue::Float(5000.0)));
}

#[tokio::test]
async fn test_update_matching_nothing_is_status() {
    let (agent, _) = setup();
    let reply = agent
        .process(
            "actualizar el salario del empleado a 5000 donde id es 999",
            ConversationState::default(),
        )
        .await;
    assert_eq!(reply.response_type, ResponseType::Status);
    assert!(reply.agent_text.contains("0 filas"));
}

#[tokio::test]
async fn test_update_connectorless_con_clause_never_rewrites_key() {
    let (agent, store) = setup();
    seed_employee(&store, 102, "Lex", "De Haan", 5000.0).await;

    let reply = agent
        .process(
            "actualizar el empleado con salario 5000 donde id es 300",
            ConversationState::default(),
        )
        .await;
    assert_ne!(reply.response_type, ResponseType::QuerySuccess);

    let ids: Vec<_> = store
        .find("employees", None, 10)
        .await
        .unwrap()
        .iter()
        .map(|r| r.get("employee_id").cloned())
        .collect();
    assert_eq!(ids, vec![Some(FieldValue::Int(102))]);
}

#[tokio::test]
async fn test_update_donde_clause_wins_over_con_set() {
    let (agent, store) = setup();
    seed_employee(&store, 102, "Lex", "De Haan", 5000.0).await;

    let reply = agent
        .process(
            "actualizar el empleado con salario a 7000 donde id es 102",
            ConversationState::default(),
        )
        .await;
    assert_eq!(reply.response_type, ResponseType::QuerySuccess);
    assert_eq!(
        reply.sql_statement.as_deref(),
        Some("UPDATE employees SET salary = 7000.0 WHERE employee_id = 102;")
    );
}

#[tokio::test]
async fn test_invalid_update_value_keeps_state_for_retry() {
    let (agent, store) = setup();
    seed_employee(&store, 101, "Neena", "Kochhar", 4000.0).await;

    let rejected = agent
        .process(
            "actualizar el salario del empleado a mucho donde id es 101",
            ConversationState::default(),
        )
        .await;
    assert_eq!(rejected.response_type, ResponseType::DialogNeeded);
    assert!(rejected.agent_text.contains("mucho"));
    let state = rejected.conversation_state.clone();
    assert_eq!(state.intent, Intent::Update);
    assert_eq!(state.table.as_deref(), Some("employees"));

    let retried = agent.process("salario a 4500 donde id es 101", state).await;
    assert_eq!(retried.response_type, ResponseType::QuerySuccess);
    assert!(retried.conversation_state.is_empty());
}

// ============================================================================
// DELETE
// ============================================================================

#[tokio::test]
async fn test_delete_removes_matching_rows() {
    let (agent, store) = setup();
    seed_employee(&store, 207, "Ana", "Ruiz", 3000.0).await;

    let reply = agent
        .process("eliminar empleado con id 207", ConversationState::default())
        .await;
    assert_eq!(reply.response_type, ResponseType::QuerySuccess);
    assert_eq!(
        reply.sql_statement.as_deref(),
        Some("DELETE FROM employees WHERE employee_id = 207;")
    );
    assert!(store.find("employees", None, 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_repeated_delete_is_status_both_times() {
    let (agent, _) = setup();
    for _ in 0..2 {
        let reply = agent
            .process("eliminar empleado con id 999", ConversationState::default())
            .await;
        assert_eq!(reply.response_type, ResponseType::Status);
        assert!(reply.agent_text.contains("0 filas"));
    }
}

#[tokio::test]
async fn test_delete_honors_filter_operator() {
    let (agent, store) = setup();
    seed_employee(&store, 100, "Steven", "King", 24000.0).await;
    seed_employee(&store, 104, "Bruce", "Ernst", 2000.0).await;

    let reply = agent
        .process("borrar empleados con salario menor a 3000", ConversationState::default())
        .await;
    assert_eq!(
        reply.sql_statement.as_deref(),
        Some("DELETE FROM employees WHERE salary < 3000.0;")
    );
    assert_eq!(store.find("employees", None, 10).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_delete_without_condition_asks_again() {
    let (agent, _) = setup();
    let reply = agent
        .process("eliminar todos los empleados", ConversationState::default())
        .await;
    assert_eq!(reply.response_type, ResponseType::DialogNeeded);
    assert!(reply.conversation_state.is_empty());
}

// ============================================================================
// Unrecognized input
// ============================================================================

#[tokio::test]
async fn test_unrecognized_request_is_error() {
    let (agent, _) = setup();
    for text in ["hola", "listar cosas", ""] {
        let reply = agent.process(text, ConversationState::default()).await;
        assert_eq!(reply.response_type, ResponseType::Error, "{text}");
        assert!(reply.conversation_state.is_empty());
    }
}
