//! Record to display-row mapping for SELECT results.

use hr_types::{DisplayRow, FieldValue};
use serde_json::Value;

use crate::store::Record;

/// Composite display field built from the given and family names
pub const FULL_NAME: &str = "NOMBRE";

/// Flat display mapping of a record.
///
/// Internal attributes (leading `_`) are skipped, keys are upper-cased,
/// numbers become floats, everything else text, NULL stays null. When both
/// `FIRST_NAME` and `LAST_NAME` are present they are merged into
/// [`FULL_NAME`]; `LAST_NAME` never appears in the output.
pub fn map_record(record: &Record) -> DisplayRow {
    let mut row = DisplayRow::new();
    for (field, value) in record.fields() {
        if field.starts_with('_') {
            continue;
        }
        row.insert(field.to_uppercase(), display_value(value));
    }

    if row.contains_key("FIRST_NAME") && row.contains_key("LAST_NAME") {
        let parts: Vec<String> = ["FIRST_NAME", "LAST_NAME"]
            .iter()
            .filter_map(|key| row.remove(*key))
            .filter_map(|value| match value {
                Value::String(s) => Some(s),
                Value::Null => None,
                other => Some(other.to_string()),
            })
            .collect();
        let full_name = if parts.is_empty() {
            Value::Null
        } else {
            Value::String(parts.join(" "))
        };
        row.insert(FULL_NAME.to_string(), full_name);
    }
    row.remove("LAST_NAME");

    row
}

fn display_value(value: &FieldValue) -> Value {
    match value {
        FieldValue::Null => Value::Null,
        FieldValue::Int(i) => float(*i as f64),
        FieldValue::Float(f) => float(*f),
        FieldValue::Text(s) => Value::String(s.clone()),
    }
}

fn float(n: f64) -> Value {
    serde_json::Number::from_f64(n)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}
