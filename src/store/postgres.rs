//! PostgreSQL record store.
//!
//! Table and column names come only from the vocabulary schemas and are
//! checked before they are spliced into SQL. Values always travel as one
//! bound JSONB document and are converted to the column types by
//! `jsonb_populate_record`, so a single query shape serves every table.
//! Rows come back as `to_jsonb(row)`.

use std::collections::HashMap;

use async_trait::async_trait;
use hr_nlu::coerce_to_kind;
use hr_types::{Condition, FieldValue, TableSchema};
use serde_json::{Map, Value};
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{info, warn};

use super::{Record, RecordStore, Values};
use crate::config::{mask_database_url, DatabaseConfig};
use crate::error::StoreError;

pub struct PgRecordStore {
    pool: PgPool,
    schemas: HashMap<String, TableSchema>,
}

impl PgRecordStore {
    pub fn new(pool: PgPool, schemas: &[TableSchema]) -> Self {
        Self {
            pool,
            schemas: schemas.iter().map(|s| (s.name.clone(), s.clone())).collect(),
        }
    }

    /// Open a pool the way [`DatabaseConfig`] describes
    pub async fn connect(
        config: &DatabaseConfig,
        schemas: &[TableSchema],
    ) -> Result<Self, StoreError> {
        let url = config.database_url.as_deref().unwrap_or_default();
        info!("Connecting to database: {}", mask_database_url(url));

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.connection_timeout)
            .connect(url)
            .await
            .map_err(|e| {
                warn!("Failed to connect to database: {}", e);
                e
            })?;

        info!("Database connection pool created successfully");
        Ok(Self::new(pool, schemas))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn schema(&self, table: &str) -> Result<&TableSchema, StoreError> {
        self.schemas
            .get(table)
            .ok_or_else(|| StoreError::UnknownTable(table.to_string()))
    }

    fn check_column(schema: &TableSchema, column: &str) -> Result<(), StoreError> {
        if schema.has_field(column) {
            Ok(())
        } else {
            Err(StoreError::UnknownColumn {
                table: schema.name.clone(),
                column: column.to_string(),
            })
        }
    }

    /// JSON document of values coerced to their column kinds
    fn document<'a>(
        schema: &TableSchema,
        values: impl IntoIterator<Item = (&'a String, &'a FieldValue)>,
    ) -> Result<Value, StoreError> {
        let mut doc = Map::new();
        for (column, value) in values {
            let kind = schema.kind_of(column).ok_or_else(|| StoreError::UnknownColumn {
                table: schema.name.clone(),
                column: column.clone(),
            })?;
            let value = coerce_to_kind(value, kind).map_err(|source| StoreError::InvalidValue {
                table: schema.name.clone(),
                column: column.clone(),
                source,
            })?;
            doc.insert(column.clone(), to_json(&value));
        }
        Ok(Value::Object(doc))
    }

    fn filter_document(schema: &TableSchema, filter: &Condition) -> Result<Value, StoreError> {
        Self::check_column(schema, &filter.field)?;
        Self::document(schema, [(&filter.field, &filter.value)])
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn find(
        &self,
        table: &str,
        filter: Option<&Condition>,
        limit: usize,
    ) -> Result<Vec<Record>, StoreError> {
        let schema = self.schema(table)?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let rows: Vec<Json<Value>> = match filter {
            Some(filter) => {
                let doc = Self::filter_document(schema, filter)?;
                let sql = format!(
                    r#"SELECT to_jsonb(t) FROM {table} t, jsonb_populate_record(NULL::{table}, $1) f
                       WHERE t.{col} {op} f.{col} LIMIT $2"#,
                    table = ident(&schema.name),
                    col = ident(&filter.field),
                    op = filter.op.sql_symbol(),
                );
                sqlx::query_scalar(&sql)
                    .bind(Json(doc))
                    .bind(limit)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let sql = format!("SELECT to_jsonb(t) FROM {} t LIMIT $1", ident(&schema.name));
                sqlx::query_scalar(&sql)
                    .bind(limit)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        Ok(rows.into_iter().map(|Json(row)| record(schema, row)).collect())
    }

    async fn insert(&self, table: &str, values: &Values) -> Result<Record, StoreError> {
        let schema = self.schema(table)?;
        let doc = Self::document(schema, values)?;
        let columns = values.keys().map(|c| ident(c)).collect::<Vec<_>>().join(", ");
        let sql = format!(
            r#"INSERT INTO {table} AS t ({columns})
               SELECT {columns} FROM jsonb_populate_record(NULL::{table}, $1)
               RETURNING to_jsonb(t)"#,
            table = ident(&schema.name),
        );

        let mut tx = self.pool.begin().await?;
        let result = sqlx::query_scalar::<_, Json<Value>>(&sql)
            .bind(Json(doc))
            .fetch_one(&mut *tx)
            .await;
        let Json(row) = finish(tx, result).await?;

        info!(table, "inserted row");
        Ok(record(schema, row))
    }

    async fn bulk_update(
        &self,
        table: &str,
        filter: &Condition,
        values: &Values,
    ) -> Result<u64, StoreError> {
        let schema = self.schema(table)?;
        let filter_doc = Self::filter_document(schema, filter)?;
        let set_doc = Self::document(schema, values)?;
        let assignments = values
            .keys()
            .map(|c| format!("{col} = s.{col}", col = ident(c)))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            r#"UPDATE {table} AS t SET {assignments}
               FROM jsonb_populate_record(NULL::{table}, $1) s,
                    jsonb_populate_record(NULL::{table}, $2) f
               WHERE t.{col} {op} f.{col}"#,
            table = ident(&schema.name),
            col = ident(&filter.field),
            op = filter.op.sql_symbol(),
        );

        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(&sql)
            .bind(Json(set_doc))
            .bind(Json(filter_doc))
            .execute(&mut *tx)
            .await
            .map(|r| r.rows_affected());
        let affected = finish(tx, result).await?;

        info!(table, rows = affected, "updated rows");
        Ok(affected)
    }

    async fn bulk_delete(&self, table: &str, filter: &Condition) -> Result<u64, StoreError> {
        let schema = self.schema(table)?;
        let filter_doc = Self::filter_document(schema, filter)?;
        let sql = format!(
            r#"DELETE FROM {table} AS t
               USING jsonb_populate_record(NULL::{table}, $1) f
               WHERE t.{col} {op} f.{col}"#,
            table = ident(&schema.name),
            col = ident(&filter.field),
            op = filter.op.sql_symbol(),
        );

        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(&sql)
            .bind(Json(filter_doc))
            .execute(&mut *tx)
            .await
            .map(|r| r.rows_affected());
        let affected = finish(tx, result).await?;

        info!(table, rows = affected, "deleted rows");
        Ok(affected)
    }

    async fn max_key(&self, table: &str, field: &str) -> Result<Option<i64>, StoreError> {
        let schema = self.schema(table)?;
        Self::check_column(schema, field)?;
        let sql = format!(
            "SELECT MAX({})::bigint FROM {}",
            ident(field),
            ident(&schema.name)
        );
        let max: Option<i64> = sqlx::query_scalar(&sql).fetch_one(&self.pool).await?;
        Ok(max)
    }
}

/// Commit on success, roll back on error
async fn finish<T>(
    tx: Transaction<'static, Postgres>,
    result: Result<T, sqlx::Error>,
) -> Result<T, StoreError> {
    match result {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback) = tx.rollback().await {
                warn!("Rollback failed: {}", rollback);
            }
            Err(e.into())
        }
    }
}

/// Double-quoted identifier
fn ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn to_json(value: &FieldValue) -> Value {
    match value {
        FieldValue::Null => Value::Null,
        FieldValue::Int(i) => Value::from(*i),
        FieldValue::Float(f) => serde_json::Number::from_f64(*f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        FieldValue::Text(s) => Value::String(s.clone()),
    }
}

fn from_json(value: &Value) -> FieldValue {
    match value {
        Value::Null => FieldValue::Null,
        Value::Number(n) => match n.as_i64() {
            Some(i) => FieldValue::Int(i),
            None => n.as_f64().map(FieldValue::Float).unwrap_or(FieldValue::Null),
        },
        Value::String(s) => FieldValue::Text(s.clone()),
        other => FieldValue::Text(other.to_string()),
    }
}

/// Row document to a record in schema column order
fn record(schema: &TableSchema, row: Value) -> Record {
    let Value::Object(row) = row else {
        return Record::new(Vec::new());
    };
    Record::new(
        schema
            .fields()
            .map(|f| (f.to_string(), row.get(f).map(from_json).unwrap_or(FieldValue::Null)))
            .collect(),
    )
}
