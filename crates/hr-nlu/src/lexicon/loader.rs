//! YAML shape of the vocabulary and its load-time validation.

use std::collections::{HashMap, HashSet};

use hr_types::{ConditionOp, Intent, TableSchema};
use serde::Deserialize;

use crate::error::LexiconError;

/// Root of `lexicon.yaml`
#[derive(Debug, Clone, Deserialize)]
pub struct LexiconConfig {
    pub intents: Vec<IntentKeywords>,
    pub tables: Vec<TableKeywords>,
    pub operators: Vec<OperatorPhrase>,
    pub fields: Vec<FieldPhrase>,
    #[serde(default)]
    pub translations: Vec<Translation>,
    pub schemas: Vec<TableSchema>,
}

/// Keywords that select one intent
#[derive(Debug, Clone, Deserialize)]
pub struct IntentKeywords {
    pub intent: Intent,
    pub keywords: Vec<String>,
}

/// Keywords that name one table
#[derive(Debug, Clone, Deserialize)]
pub struct TableKeywords {
    pub table: String,
    pub keywords: Vec<String>,
}

/// Comparison phrase such as `mayor a`
#[derive(Debug, Clone, Deserialize)]
pub struct OperatorPhrase {
    pub phrase: String,
    pub op: ConditionOp,
}

/// Localized field phrase and the column it names
#[derive(Debug, Clone, Deserialize)]
pub struct FieldPhrase {
    pub phrase: String,
    pub column: String,
    /// Per-table column overrides (`nombre` is `department_name` for departments)
    #[serde(default)]
    pub tables: HashMap<String, String>,
}

impl FieldPhrase {
    pub fn column_for(&self, table: Option<&str>) -> &str {
        table
            .and_then(|t| self.tables.get(t))
            .map(String::as_str)
            .unwrap_or(&self.column)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Translation {
    pub id: String,
    pub text: String,
}

impl LexiconConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, LexiconError> {
        let config: LexiconConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check schema invariants and cross references between sections
    pub fn validate(&self) -> Result<(), LexiconError> {
        if let Some(entry) = self.intents.iter().find(|e| e.intent.is_unknown()) {
            return Err(LexiconError::InvalidIntent(entry.intent.to_string()));
        }

        let mut seen = HashSet::new();
        for schema in &self.schemas {
            if !seen.insert(schema.name.as_str()) {
                return Err(LexiconError::DuplicateTable(schema.name.clone()));
            }
            validate_schema(schema)?;
        }

        for entry in &self.tables {
            if !seen.contains(entry.table.as_str()) {
                return Err(LexiconError::TableWithoutSchema(entry.table.clone()));
            }
        }

        let known_columns: HashSet<&str> = self.schemas.iter().flat_map(|s| s.fields()).collect();
        for field in &self.fields {
            let targets = std::iter::once(&field.column).chain(field.tables.values());
            for column in targets {
                if !known_columns.contains(column.as_str()) {
                    return Err(LexiconError::UnknownColumn {
                        phrase: field.phrase.clone(),
                        column: column.clone(),
                    });
                }
            }
        }

        Ok(())
    }
}

fn validate_schema(schema: &TableSchema) -> Result<(), LexiconError> {
    let invalid = |reason: String| LexiconError::InvalidSchema {
        table: schema.name.clone(),
        reason,
    };

    let mut columns = HashSet::new();
    for column in &schema.columns {
        if !columns.insert(column.name.as_str()) {
            return Err(invalid(format!("column '{}' declared twice", column.name)));
        }
    }

    if let Some(overlap) = schema.required.iter().find(|f| schema.optional.contains(f)) {
        return Err(invalid(format!(
            "'{}' is both required and optional",
            overlap
        )));
    }

    if let Some(stray) = schema
        .required
        .iter()
        .chain(&schema.optional)
        .find(|f| !columns.contains(f.as_str()))
    {
        return Err(invalid(format!("'{}' is not a column", stray)));
    }

    if let Some(key) = &schema.key {
        match schema.kind_of(&key.field) {
            Some(kind) if kind.is_numeric() => {}
            Some(kind) => {
                return Err(invalid(format!(
                    "generated key '{}' must be numeric, found {}",
                    key.field,
                    kind.as_str()
                )))
            }
            None => return Err(invalid(format!("key '{}' is not a column", key.field))),
        }
        if schema.required.contains(&key.field) {
            return Err(invalid(format!(
                "generated key '{}' cannot be required",
                key.field
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
intents:
  - intent: SELECT
    keywords: [listar]
tables:
  - table: regions
    keywords: [region]
operators:
  - { phrase: "es", op: "==" }
fields:
  - { phrase: "nombre", column: region_name }
schemas:
  - name: regions
    key: { field: region_id, start: 1 }
    required: [region_name]
    columns:
      - { name: region_id, kind: integer }
      - { name: region_name, kind: text }
"#;

    #[test]
    fn test_minimal_config_loads() {
        let config = LexiconConfig::from_yaml_str(MINIMAL).unwrap();
        assert_eq!(config.schemas[0].required, vec!["region_name"]);
        assert_eq!(config.operators[0].op, ConditionOp::Eq);
        assert!(config.translations.is_empty());
    }

    #[test]
    fn test_required_optional_overlap_rejected() {
        let yaml = MINIMAL.replace(
            "required: [region_name]",
            "required: [region_name]\n    optional: [region_name]",
        );
        let err = LexiconConfig::from_yaml_str(&yaml).unwrap_err();
        assert!(matches!(err, LexiconError::InvalidSchema { .. }));
    }

    #[test]
    fn test_field_to_unknown_column_rejected() {
        let yaml = MINIMAL.replace("column: region_name", "column: nickname");
        let err = LexiconConfig::from_yaml_str(&yaml).unwrap_err();
        assert!(matches!(err, LexiconError::UnknownColumn { .. }));
    }

    #[test]
    fn test_table_keywords_need_schema() {
        let yaml = MINIMAL.replace("- table: regions", "- table: planets");
        let err = LexiconConfig::from_yaml_str(&yaml).unwrap_err();
        assert!(matches!(err, LexiconError::TableWithoutSchema(t) if t == "planets"));
    }

    #[test]
    fn test_unknown_intent_rejected() {
        let yaml = MINIMAL.replace("intent: SELECT", "intent: UNKNOWN");
        assert!(matches!(
            LexiconConfig::from_yaml_str(&yaml),
            Err(LexiconError::InvalidIntent(_))
        ));
    }
}
