//! In-memory record store.
//!
//! Behaves like a small relational database for the HR tables: values are
//! coerced to their column kind on write, unknown columns, missing required
//! values and duplicate primary keys are rejected, and comparisons follow
//! SQL (NULL never matches).

use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use hr_nlu::coerce_to_kind;
use hr_types::{Condition, ConditionOp, FieldValue, TableSchema};
use tokio::sync::RwLock;

use super::{Record, RecordStore, Values};
use crate::error::StoreError;

type Row = HashMap<String, FieldValue>;

struct Table {
    schema: TableSchema,
    rows: Vec<Row>,
}

impl Table {
    fn check_column(&self, column: &str) -> Result<(), StoreError> {
        if self.schema.has_field(column) {
            Ok(())
        } else {
            Err(StoreError::UnknownColumn {
                table: self.schema.name.clone(),
                column: column.to_string(),
            })
        }
    }

    /// Values coerced to their column kinds
    fn coerce(&self, values: &Values) -> Result<Row, StoreError> {
        values
            .iter()
            .map(|(column, value)| {
                let kind = self
                    .schema
                    .kind_of(column)
                    .ok_or_else(|| StoreError::UnknownColumn {
                        table: self.schema.name.clone(),
                        column: column.clone(),
                    })?;
                let value =
                    coerce_to_kind(value, kind).map_err(|source| StoreError::InvalidValue {
                        table: self.schema.name.clone(),
                        column: column.clone(),
                        source,
                    })?;
                Ok((column.clone(), value))
            })
            .collect()
    }

    fn record(&self, row: &Row) -> Record {
        Record::new(
            self.schema
                .fields()
                .map(|f| (f.to_string(), row.get(f).cloned().unwrap_or(FieldValue::Null)))
                .collect(),
        )
    }

    fn key_taken(&self, key: &str, value: &FieldValue, skip: Option<usize>) -> bool {
        self.rows
            .iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != skip)
            .any(|(_, row)| row.get(key).is_some_and(|v| same_value(v, value)))
    }

    fn duplicate(&self, key: &str, value: &FieldValue) -> StoreError {
        StoreError::DuplicateKey {
            table: self.schema.name.clone(),
            column: key.to_string(),
            value: value.to_string(),
        }
    }
}

/// Tables keyed by name, guarded by one lock so every mutation is atomic
pub struct MemoryStore {
    tables: RwLock<HashMap<String, Table>>,
}

impl MemoryStore {
    pub fn new(schemas: impl IntoIterator<Item = TableSchema>) -> Self {
        let tables = schemas
            .into_iter()
            .map(|schema| {
                (
                    schema.name.clone(),
                    Table {
                        schema,
                        rows: Vec::new(),
                    },
                )
            })
            .collect();
        Self {
            tables: RwLock::new(tables),
        }
    }
}

fn unknown_table(table: &str) -> StoreError {
    StoreError::UnknownTable(table.to_string())
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn find(
        &self,
        table: &str,
        filter: Option<&Condition>,
        limit: usize,
    ) -> Result<Vec<Record>, StoreError> {
        let tables = self.tables.read().await;
        let table = tables.get(table).ok_or_else(|| unknown_table(table))?;
        if let Some(filter) = filter {
            table.check_column(&filter.field)?;
        }

        Ok(table
            .rows
            .iter()
            .filter(|row| filter.map_or(true, |f| matches(row, f)))
            .take(limit)
            .map(|row| table.record(row))
            .collect())
    }

    async fn insert(&self, table: &str, values: &Values) -> Result<Record, StoreError> {
        let mut tables = self.tables.write().await;
        let table = tables.get_mut(table).ok_or_else(|| unknown_table(table))?;
        let row = table.coerce(values)?;

        for column in &table.schema.required {
            if row.get(column).map_or(true, FieldValue::is_null) {
                return Err(StoreError::NotNull {
                    table: table.schema.name.clone(),
                    column: column.clone(),
                });
            }
        }

        if let Some(key) = table.schema.primary_key() {
            match row.get(key) {
                None | Some(FieldValue::Null) => {
                    return Err(StoreError::NotNull {
                        table: table.schema.name.clone(),
                        column: key.to_string(),
                    })
                }
                Some(value) if table.key_taken(key, value, None) => {
                    return Err(table.duplicate(key, value))
                }
                Some(_) => {}
            }
        }

        let record = table.record(&row);
        table.rows.push(row);
        tracing::debug!(table = %table.schema.name, "inserted row");
        Ok(record)
    }

    async fn bulk_update(
        &self,
        table: &str,
        filter: &Condition,
        values: &Values,
    ) -> Result<u64, StoreError> {
        let mut tables = self.tables.write().await;
        let table = tables.get_mut(table).ok_or_else(|| unknown_table(table))?;
        table.check_column(&filter.field)?;
        let changes = table.coerce(values)?;

        let hits: Vec<usize> = table
            .rows
            .iter()
            .enumerate()
            .filter(|(_, row)| matches(row, filter))
            .map(|(i, _)| i)
            .collect();

        // Validate every change before touching any row
        for (column, value) in &changes {
            if table.schema.required.contains(column) && value.is_null() {
                return Err(StoreError::NotNull {
                    table: table.schema.name.clone(),
                    column: column.clone(),
                });
            }
            if table.schema.primary_key() == Some(column.as_str()) {
                let collides = hits.len() > 1
                    || hits
                        .first()
                        .is_some_and(|&i| table.key_taken(column, value, Some(i)));
                if collides {
                    return Err(table.duplicate(column, value));
                }
            }
        }

        for &i in &hits {
            for (column, value) in &changes {
                table.rows[i].insert(column.clone(), value.clone());
            }
        }
        tracing::debug!(table = %table.schema.name, rows = hits.len(), "updated rows");
        Ok(hits.len() as u64)
    }

    async fn bulk_delete(&self, table: &str, filter: &Condition) -> Result<u64, StoreError> {
        let mut tables = self.tables.write().await;
        let table = tables.get_mut(table).ok_or_else(|| unknown_table(table))?;
        table.check_column(&filter.field)?;

        let before = table.rows.len();
        table.rows.retain(|row| !matches(row, filter));
        let removed = (before - table.rows.len()) as u64;
        tracing::debug!(table = %table.schema.name, rows = removed, "deleted rows");
        Ok(removed)
    }

    async fn max_key(&self, table: &str, field: &str) -> Result<Option<i64>, StoreError> {
        let tables = self.tables.read().await;
        let table = tables.get(table).ok_or_else(|| unknown_table(table))?;
        table.check_column(field)?;

        Ok(table
            .rows
            .iter()
            .filter_map(|row| match row.get(field) {
                Some(FieldValue::Int(n)) => Some(*n),
                _ => None,
            })
            .max())
    }
}

// ============================================================================
// COMPARISON
// ============================================================================

fn matches(row: &Row, filter: &Condition) -> bool {
    let Some(ordering) = row.get(&filter.field).and_then(|v| compare(v, &filter.value)) else {
        return false;
    };
    match filter.op {
        ConditionOp::Gt => ordering == Ordering::Greater,
        ConditionOp::Lt => ordering == Ordering::Less,
        ConditionOp::Eq | ConditionOp::Assign => ordering == Ordering::Equal,
        ConditionOp::Ne => ordering != Ordering::Equal,
    }
}

/// Numeric when both sides are numbers, text otherwise; NULL is incomparable
fn compare(left: &FieldValue, right: &FieldValue) -> Option<Ordering> {
    if left.is_null() || right.is_null() {
        return None;
    }
    match (left.as_number(), right.as_number()) {
        (Some(l), Some(r)) => l.partial_cmp(&r),
        _ => Some(left.to_string().cmp(&right.to_string())),
    }
}

fn same_value(left: &FieldValue, right: &FieldValue) -> bool {
    compare(left, right) == Some(Ordering::Equal)
}
