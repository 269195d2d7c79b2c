//! Error types for the agent and its record stores
//!
//! `AgentError` follows the taxonomy the response envelope exposes:
//! unrecognized input, schema mismatch, extraction failure and
//! persistence failure. A conditional UPDATE/DELETE that matches nothing is
//! not an error and never reaches this type.

use hr_nlu::CoercionError;
use hr_types::{ConversationState, ResponseEnvelope};
use thiserror::Error;

/// Failure raised by a record store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("unknown table '{0}'")]
    UnknownTable(String),

    #[error("column '{column}' does not exist in table '{table}'")]
    UnknownColumn { table: String, column: String },

    #[error("duplicate key value {value} violates primary key of '{table}' ({column})")]
    DuplicateKey {
        table: String,
        column: String,
        value: String,
    },

    #[error("no key value left for {table}.{column} after {last}")]
    KeyExhausted {
        table: String,
        column: String,
        last: i64,
    },

    #[error("null value in column '{column}' of table '{table}' violates not-null constraint")]
    NotNull { table: String, column: String },

    #[error("invalid value for {table}.{column}: {source}")]
    InvalidValue {
        table: String,
        column: String,
        #[source]
        source: CoercionError,
    },

    #[cfg(feature = "database")]
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Why a request could not be carried out
#[derive(Error, Debug)]
pub enum AgentError {
    /// Intent or table could not be determined
    #[error("{0}")]
    UnrecognizedInput(String),

    /// Table or field has no schema entry or column mapping
    #[error("{0}")]
    SchemaMismatch(String),

    /// Required clause shape not found in the text
    #[error("{0}")]
    ExtractionFailure(String),

    #[error("Error al ejecutar la operación en la base de datos: {0}")]
    Persistence(#[from] StoreError),
}

impl AgentError {
    /// Response for this failure. State is always reset.
    pub fn into_envelope(self) -> ResponseEnvelope {
        match self {
            AgentError::ExtractionFailure(message) => {
                ResponseEnvelope::dialog(message, ConversationState::default())
            }
            other => ResponseEnvelope::error(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hr_types::ResponseType;

    #[test]
    fn test_extraction_failure_asks_again_with_empty_state() {
        let envelope = AgentError::ExtractionFailure("falta la condición".into()).into_envelope();
        assert_eq!(envelope.response_type, ResponseType::DialogNeeded);
        assert!(envelope.conversation_state.is_empty());
    }

    #[test]
    fn test_persistence_failure_carries_store_message() {
        let err = AgentError::from(StoreError::DuplicateKey {
            table: "regions".into(),
            column: "region_id".into(),
            value: "4".into(),
        });
        let envelope = err.into_envelope();
        assert_eq!(envelope.response_type, ResponseType::Error);
        assert!(envelope.agent_text.contains("duplicate key value 4"));
    }
}
