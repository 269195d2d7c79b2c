//! SQL text shown to the user next to each answer.
//!
//! Rebuilt from the structured condition and values for transparency; this
//! text is never executed.

use hr_types::{format_float, Condition, FieldValue};

/// SQL literal for a value: numbers bare, text single-quoted
pub fn literal(value: &FieldValue) -> String {
    match value {
        FieldValue::Null => "NULL".to_string(),
        FieldValue::Int(i) => i.to_string(),
        FieldValue::Float(f) => format_float(*f),
        FieldValue::Text(s) => format!("'{}'", s.replace('\'', "''")),
    }
}

fn condition(c: &Condition) -> String {
    format!("{} {} {}", c.field, c.op.sql_symbol(), literal(&c.value))
}

pub fn select(table: &str, filter: Option<&Condition>, limit: usize) -> String {
    match filter {
        Some(filter) => format!(
            "SELECT * FROM {table} WHERE {} LIMIT {limit};",
            condition(filter)
        ),
        None => format!("SELECT * FROM {table} LIMIT {limit};"),
    }
}

pub fn insert<'a>(
    table: &str,
    values: impl IntoIterator<Item = (&'a str, &'a FieldValue)>,
) -> String {
    let (columns, literals): (Vec<&str>, Vec<String>) = values
        .into_iter()
        .map(|(column, value)| (column, literal(value)))
        .unzip();
    format!(
        "INSERT INTO {table} ({}) VALUES ({});",
        columns.join(", "),
        literals.join(", ")
    )
}

pub fn update(table: &str, set: &Condition, filter: &Condition) -> String {
    format!(
        "UPDATE {table} SET {} WHERE {};",
        condition(set),
        condition(filter)
    )
}

pub fn delete(table: &str, filter: &Condition) -> String {
    format!("DELETE FROM {table} WHERE {};", condition(filter))
}
