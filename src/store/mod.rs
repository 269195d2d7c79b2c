//! Record-store collaborator
//!
//! The agent reads and writes rows only through [`RecordStore`]. Two
//! implementations ship with the crate:
//!
//! - [`MemoryStore`] - tables built from the vocabulary schemas, used by
//!   tests, the CLI and the server when no database is configured
//! - `PgRecordStore` (feature `database`) - PostgreSQL via sqlx

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use hr_nlu::Lexicon;
use hr_types::{Condition, FieldValue};

use crate::config::AgentConfig;
use crate::error::StoreError;

pub mod memory;
#[cfg(feature = "database")]
pub mod postgres;

pub use memory::MemoryStore;
#[cfg(feature = "database")]
pub use postgres::PgRecordStore;

/// Field name to value, as written by INSERT and UPDATE
pub type Values = BTreeMap<String, FieldValue>;

/// A persisted row: its fields in column order
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    fields: Vec<(String, FieldValue)>,
}

impl Record {
    pub fn new(fields: Vec<(String, FieldValue)>) -> Self {
        Self { fields }
    }

    /// Field names and values, in column order
    pub fn fields(&self) -> &[(String, FieldValue)] {
        &self.fields
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
    }
}

/// Filtered lookup, insert, bulk update and bulk delete over named tables.
///
/// Mutations are all-or-nothing: an implementation either applies the whole
/// change or leaves the table untouched and returns the error.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// At most `limit` rows matching `filter`
    async fn find(
        &self,
        table: &str,
        filter: Option<&Condition>,
        limit: usize,
    ) -> Result<Vec<Record>, StoreError>;

    async fn insert(&self, table: &str, values: &Values) -> Result<Record, StoreError>;

    /// Rows affected
    async fn bulk_update(
        &self,
        table: &str,
        filter: &Condition,
        values: &Values,
    ) -> Result<u64, StoreError>;

    /// Rows affected
    async fn bulk_delete(&self, table: &str, filter: &Condition) -> Result<u64, StoreError>;

    /// Largest value of an integer key column, `None` for an empty table
    async fn max_key(&self, table: &str, field: &str) -> Result<Option<i64>, StoreError>;
}

/// Store selected by configuration: PostgreSQL when a database URL is set and
/// the `database` feature is on, otherwise an empty in-memory store.
pub async fn connect(
    config: &AgentConfig,
    lexicon: &Lexicon,
) -> Result<Arc<dyn RecordStore>, StoreError> {
    #[cfg(feature = "database")]
    if config.database.database_url.is_some() {
        let store = PgRecordStore::connect(&config.database, lexicon.schemas()).await?;
        return Ok(Arc::new(store));
    }

    #[cfg(not(feature = "database"))]
    if config.database.database_url.is_some() {
        tracing::warn!("DATABASE_URL is set but the `database` feature is disabled");
    }

    tracing::info!("Using in-memory record store");
    Ok(Arc::new(MemoryStore::new(lexicon.schemas().iter().cloned())))
}
