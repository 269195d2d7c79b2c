//! Turn routing and INSERT slot filling

use std::collections::BTreeMap;

use hr_nlu::{classify_intent, coerce_to_kind, extract_seed_data, extract_table};
use hr_types::{ColumnKind, ConversationState, FieldValue, Intent, ResponseEnvelope, TableSchema};
use tracing::{debug, info};

use super::HrAgent;
use crate::error::AgentError;

impl HrAgent {
    /// FRESH: classify, pick the table, dispatch
    pub(super) async fn fresh_turn(&self, text: &str) -> Result<ResponseEnvelope, AgentError> {
        let intent = classify_intent(&self.lexicon, text);
        let table = extract_table(&self.lexicon, text);
        info!(%intent, table = table.unwrap_or("-"), "new request");

        let table = match (intent, table) {
            (Intent::Unknown, _) | (_, None) => {
                return Err(AgentError::UnrecognizedInput(unrecognized(text)))
            }
            (_, Some(table)) => table,
        };
        let schema = self.schema(table)?;

        match intent {
            Intent::Select => self.select(text, schema).await,
            Intent::Insert => {
                let mut state = ConversationState::new(Intent::Insert, Some(schema.name.clone()));
                state.data_collected = self.valid_seeds(text, schema);
                self.advance_insert(schema, state).await
            }
            Intent::Update => self.update(text, schema).await,
            Intent::Delete => self.delete(text, schema).await,
            Intent::Unknown => Err(AgentError::UnrecognizedInput(unrecognized(text))),
        }
    }

    /// COLLECTING: continue the operation held in `state`
    pub(super) async fn continue_turn(
        &self,
        text: &str,
        mut state: ConversationState,
    ) -> Result<ResponseEnvelope, AgentError> {
        let table = state.table.clone().unwrap_or_default();
        let schema = self.schema(&table)?;
        debug!(intent = %state.intent, table = %table, pending = ?state.last_asked_field, "continuing dialogue");

        match state.intent {
            Intent::Insert => {
                let Some(field) = state.last_asked_field.clone() else {
                    return self.advance_insert(schema, state).await;
                };
                if text.is_empty() {
                    return Ok(self.ask_for(schema, state, &field));
                }

                let kind = schema.kind_of(&field).ok_or_else(|| {
                    AgentError::SchemaMismatch(format!(
                        "Campo '{field}' no válido para la tabla '{table}'"
                    ))
                })?;
                match coerce_to_kind(&FieldValue::text(text), kind) {
                    Ok(value) => {
                        state.data_collected.insert(field.clone(), value);
                        state.missing_fields.retain(|f| f != &field);
                        self.advance_insert(schema, state).await
                    }
                    Err(e) => {
                        debug!(field = %field, error = %e, "slot value rejected");
                        let text = format!(
                            "El valor **{text}** no es válido para **{}** ({e}). {}",
                            self.display_name(&field),
                            self.prompt_for(schema, &field)
                        );
                        Ok(ResponseEnvelope::dialog(text, state))
                    }
                }
            }
            Intent::Update if text.is_empty() => Ok(ResponseEnvelope::dialog(
                format!(
                    "Sigo esperando la actualización de **{table}**. Indica el campo, el nuevo valor y la condición."
                ),
                state,
            )),
            Intent::Update => self.update(text, schema).await,
            _ => self.fresh_turn(text).await,
        }
    }

    /// Ask for the next missing required field, or run the INSERT when none is left
    pub(super) async fn advance_insert(
        &self,
        schema: &TableSchema,
        mut state: ConversationState,
    ) -> Result<ResponseEnvelope, AgentError> {
        state.missing_fields = schema.missing_required(&state.data_collected);

        match state.missing_fields.first().cloned() {
            Some(next) => {
                debug!(table = %schema.name, field = %next, remaining = state.missing_fields.len(), "slot needed");
                Ok(self.ask_for(schema, state, &next))
            }
            None => self.insert(schema, state.data_collected).await,
        }
    }

    fn ask_for(&self, schema: &TableSchema, mut state: ConversationState, field: &str) -> ResponseEnvelope {
        state.last_asked_field = Some(field.to_string());
        let text = format!(
            "Entendí la inserción en la tabla **{}**. {}",
            schema.name,
            self.prompt_for(schema, field)
        );
        ResponseEnvelope::dialog(text, state)
    }

    fn prompt_for(&self, schema: &TableSchema, field: &str) -> String {
        match schema.kind_of(field) {
            Some(ColumnKind::Date) => format!(
                "Por favor, dime la **{}** (formato YYYY-MM-DD).",
                self.display_name(field)
            ),
            _ => format!("Por favor, dime el valor para el campo: **{field}**."),
        }
    }

    /// Seed values from the opening utterance that already fit their column
    fn valid_seeds(&self, text: &str, schema: &TableSchema) -> BTreeMap<String, FieldValue> {
        extract_seed_data(&self.lexicon, text, schema)
            .into_iter()
            .filter_map(|(field, raw)| {
                let kind = schema.kind_of(&field)?;
                match coerce_to_kind(&raw, kind) {
                    Ok(value) => Some((field, value)),
                    Err(e) => {
                        debug!(field = %field, error = %e, "seed value dropped");
                        None
                    }
                }
            })
            .collect()
    }
}

fn unrecognized(text: &str) -> String {
    if text.is_empty() {
        return "Por favor, ingresa una consulta.".to_string();
    }
    format!(
        "No pude procesar la solicitud: **{text}**. Por favor, sé más específico sobre la tabla (ej. 'employees' o 'departments') y la acción."
    )
}
