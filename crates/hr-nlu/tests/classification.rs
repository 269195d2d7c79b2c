//! Properties of classification and extraction over the built-in vocabulary,
//! plus loading a vocabulary from disk.

use std::io::Write;

use hr_nlu::{
    classify_intent, extract_condition, extract_table, extract_update_params, ExtractionMode,
    Lexicon, LexiconError,
};
use hr_types::Intent;
use proptest::prelude::*;

const INSERT_KEYWORDS: &[&str] = &["insertar", "agregar", "crear", "ingresar"];

const TABLE_KEYWORDS: &[(&str, &str)] = &[
    ("empleado", "employees"),
    ("departamento", "departments"),
    ("puesto", "jobs"),
    ("región", "regions"),
    ("país", "countries"),
    ("ubicación", "locations"),
];

fn mixed_case(text: &str, mask: u64) -> String {
    text.chars()
        .enumerate()
        .map(|(i, c)| {
            if mask & (1 << (i % 64)) != 0 {
                c.to_uppercase().collect::<String>()
            } else {
                c.to_string()
            }
        })
        .collect()
}

proptest! {
    /// INSERT keyword + table keyword classify as INSERT on that table, in any case
    #[test]
    fn insert_with_table_is_recognized(
        verb in prop::sample::select(INSERT_KEYWORDS),
        (keyword, table) in prop::sample::select(TABLE_KEYWORDS),
        mask in any::<u64>(),
    ) {
        let text = mixed_case(&format!("{verb} un {keyword}"), mask);
        let lexicon = Lexicon::builtin();
        prop_assert_eq!(classify_intent(lexicon, &text), Intent::Insert);
        prop_assert_eq!(extract_table(lexicon, &text), Some(table));
    }

    /// Classification is a pure function of the text
    #[test]
    fn classification_is_deterministic(text in ".{0,80}") {
        let lexicon = Lexicon::builtin();
        prop_assert_eq!(classify_intent(lexicon, &text), classify_intent(lexicon, &text));
        prop_assert_eq!(extract_table(lexicon, &text), extract_table(lexicon, &text));
    }

    /// Extraction never panics, whatever the input
    #[test]
    fn extraction_is_total(text in ".{0,120}") {
        let lexicon = Lexicon::builtin();
        for mode in [ExtractionMode::Filter, ExtractionMode::Assignment, ExtractionMode::Where] {
            let _ = extract_condition(lexicon, &text, Some("employees"), mode);
        }
        let _ = extract_update_params(lexicon, &text, Some("employees"));
    }
}

const CUSTOM_LEXICON: &str = r#"
intents:
  - intent: SELECT
    keywords: [consultar]
  - intent: DELETE
    keywords: [suprimir]
tables:
  - table: regions
    keywords: [zona]
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
fn test_lexicon_loads_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(CUSTOM_LEXICON.as_bytes()).unwrap();

    let lexicon = Lexicon::from_path(file.path()).unwrap();
    assert_eq!(classify_intent(&lexicon, "Consultar zonas"), Intent::Select);
    assert_eq!(classify_intent(&lexicon, "listar zonas"), Intent::Unknown);
    assert_eq!(extract_table(&lexicon, "suprimir la zona"), Some("regions"));
}

#[test]
fn test_missing_lexicon_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Lexicon::from_path(dir.path().join("absent.yaml")).unwrap_err();
    assert!(matches!(err, LexiconError::Io { .. }));
}

#[test]
fn test_invalid_lexicon_file_is_rejected() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"intents: [not, a, mapping").unwrap();
    let err = Lexicon::from_path(file.path()).unwrap_err();
    assert!(matches!(err, LexiconError::Yaml(_)));
}
