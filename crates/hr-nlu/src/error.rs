//! Error types for vocabulary loading and value coercion

use std::path::PathBuf;

use thiserror::Error;

/// Vocabulary could not be loaded or violates a schema invariant
#[derive(Error, Debug)]
pub enum LexiconError {
    #[error("failed to read lexicon file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid lexicon YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid schema for table '{table}': {reason}")]
    InvalidSchema { table: String, reason: String },

    #[error("table '{0}' is declared more than once")]
    DuplicateTable(String),

    #[error("keyword entry for table '{0}' has no schema")]
    TableWithoutSchema(String),

    #[error("field phrase '{phrase}' maps to unknown column '{column}'")]
    UnknownColumn { phrase: String, column: String },

    #[error("intent section may not declare {0}")]
    InvalidIntent(String),

    #[error("failed to compile extraction pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// A raw value does not fit the storage type of its column
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoercionError {
    #[error("empty value")]
    Empty,

    #[error("'{value}' is not a valid {kind}")]
    Invalid { value: String, kind: &'static str },

    #[error("{value} is outside the integer range (max {max})")]
    OutOfRange { value: i64, max: i64 },
}
