//! Value coercion for extracted and collected values.

use chrono::NaiveDate;
use hr_types::{ColumnKind, FieldValue};

use crate::error::CoercionError;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Largest value an integer column holds (PostgreSQL `INTEGER`)
pub const MAX_INTEGER: i64 = i32::MAX as i64;

/// Remove currency and thousands decoration: `$`, `,` and a leading quetzal `q`.
pub fn strip_decorations(raw: &str) -> String {
    let trimmed = raw.trim();
    let without_marker = match trimmed.strip_prefix(['q', 'Q']) {
        Some(rest) if rest.trim_start().starts_with(|c: char| c.is_ascii_digit() || c == '$') => {
            rest
        }
        _ => trimmed,
    };
    without_marker
        .chars()
        .filter(|c| !matches!(c, '$' | ','))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Number if the undecorated text parses as one, otherwise the trimmed text
pub fn coerce_numeric(raw: &str) -> FieldValue {
    let cleaned = strip_decorations(raw);
    match cleaned.parse::<f64>() {
        Ok(n) if n.is_finite() => FieldValue::Float(n),
        _ => FieldValue::Text(raw.trim().to_string()),
    }
}

/// Key lookups prefer an integer; anything else is kept as it is (text stays text)
pub fn coerce_key(value: &FieldValue) -> FieldValue {
    match value {
        FieldValue::Float(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
            FieldValue::Int(*f as i64)
        }
        FieldValue::Text(s) => match strip_decorations(s).parse::<i64>() {
            Ok(i) => FieldValue::Int(i),
            Err(_) => FieldValue::Text(s.trim().to_string()),
        },
        other => other.clone(),
    }
}

/// Convert a value to the representation its column stores, or explain why it can't be
pub fn coerce_to_kind(value: &FieldValue, kind: ColumnKind) -> Result<FieldValue, CoercionError> {
    if value.is_null() {
        return Ok(FieldValue::Null);
    }
    if value.as_text().is_some_and(|s| s.trim().is_empty()) {
        return Err(CoercionError::Empty);
    }

    let invalid = || CoercionError::Invalid {
        value: value.to_string(),
        kind: kind.as_str(),
    };

    match kind {
        ColumnKind::Integer => match coerce_key(value) {
            FieldValue::Int(i) if (-MAX_INTEGER - 1..=MAX_INTEGER).contains(&i) => {
                Ok(FieldValue::Int(i))
            }
            FieldValue::Int(i) => Err(CoercionError::OutOfRange {
                value: i,
                max: MAX_INTEGER,
            }),
            _ => Err(invalid()),
        },
        ColumnKind::Numeric => match value {
            FieldValue::Int(i) => Ok(FieldValue::Float(*i as f64)),
            FieldValue::Float(f) => Ok(FieldValue::Float(*f)),
            FieldValue::Text(s) => match coerce_numeric(s) {
                FieldValue::Float(f) => Ok(FieldValue::Float(f)),
                _ => Err(invalid()),
            },
            FieldValue::Null => Ok(FieldValue::Null),
        },
        ColumnKind::Text => Ok(match value {
            FieldValue::Text(s) => FieldValue::Text(s.trim().to_string()),
            FieldValue::Int(i) => FieldValue::Text(i.to_string()),
            FieldValue::Float(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                FieldValue::Text((*f as i64).to_string())
            }
            FieldValue::Float(f) => FieldValue::Text(f.to_string()),
            FieldValue::Null => FieldValue::Null,
        }),
        ColumnKind::Date => {
            let text = value.as_text().ok_or_else(invalid)?;
            NaiveDate::parse_from_str(text.trim(), DATE_FORMAT)
                .map(|d| FieldValue::Text(d.format(DATE_FORMAT).to_string()))
                .map_err(|_| invalid())
        }
    }
}
