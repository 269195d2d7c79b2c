//! SELECT / INSERT / UPDATE / DELETE execution against the record store

use std::collections::BTreeMap;

use hr_nlu::{
    coerce_key, coerce_to_kind, extract_condition, extract_update_params, ExtractionMode,
    MAX_INTEGER,
};
use hr_types::{
    ColumnKind, Condition, ConversationState, FieldValue, Intent, ResponseEnvelope, TableSchema,
};
use tracing::{debug, info};

use super::HrAgent;
use crate::error::{AgentError, StoreError};
use crate::mapper::map_record;
use crate::sql_display;
use crate::store::Values;

/// A condition value that does not fit its column
struct InvalidValue {
    field: String,
    value: FieldValue,
    reason: String,
}

impl InvalidValue {
    fn into_error(self) -> AgentError {
        AgentError::ExtractionFailure(format!(
            "El valor **{}** no es válido para **{}** ({}).",
            self.value, self.field, self.reason
        ))
    }
}

impl HrAgent {
    pub(super) async fn select(
        &self,
        text: &str,
        schema: &TableSchema,
    ) -> Result<ResponseEnvelope, AgentError> {
        let table = schema.name.as_str();
        let filter = match extract_condition(&self.lexicon, text, Some(table), ExtractionMode::Filter) {
            Some(condition) => {
                let kind = column_kind(schema, &condition.field)?;
                let value = condition.value.clone();
                Some(typed(condition, value, kind).map_err(InvalidValue::into_error)?)
            }
            None => None,
        };

        let records = self
            .store
            .find(table, filter.as_ref(), self.result_limit)
            .await?;
        let rows: Vec<_> = records.iter().map(map_record).collect();
        info!(table, rows = rows.len(), filtered = filter.is_some(), "select");

        Ok(ResponseEnvelope::rows(
            format!(
                "Mostrando los primeros {} registros de **{table}** encontrados.",
                rows.len()
            ),
            rows,
        )
        .with_sql(sql_display::select(table, filter.as_ref(), self.result_limit)))
    }

    /// Persist collected values, synthesizing the key when the table generates one
    pub(super) async fn insert(
        &self,
        schema: &TableSchema,
        collected: BTreeMap<String, FieldValue>,
    ) -> Result<ResponseEnvelope, AgentError> {
        let table = schema.name.as_str();
        let mut values: Values = collected
            .into_iter()
            .filter(|(field, _)| schema.has_field(field))
            .collect();

        if let Some(key) = &schema.key {
            if !values.contains_key(&key.field) {
                let next = match self.store.max_key(table, &key.field).await? {
                    Some(max) => max
                        .checked_add(1)
                        .filter(|next| *next <= MAX_INTEGER)
                        .ok_or_else(|| StoreError::KeyExhausted {
                            table: table.to_string(),
                            column: key.field.clone(),
                            last: max,
                        })?,
                    None => key.start,
                };
                debug!(table, key = %key.field, next, "generated key");
                values.insert(key.field.clone(), FieldValue::Int(next));
            }
        }

        let record = self.store.insert(table, &values).await?;
        info!(table, "insert");

        let sql = sql_display::insert(
            table,
            record
                .fields()
                .iter()
                .filter(|(field, _)| values.contains_key(field))
                .map(|(field, value)| (field.as_str(), value)),
        );
        Ok(
            ResponseEnvelope::success(format!("¡Inserción realizada con éxito en **{table}**!"))
                .with_sql(sql)
                .with_data(vec![map_record(&record)]),
        )
    }

    /// Single-sentence UPDATE: `<field> a <value> donde <field> es <value>`
    pub(super) async fn update(
        &self,
        text: &str,
        schema: &TableSchema,
    ) -> Result<ResponseEnvelope, AgentError> {
        let table = schema.name.as_str();
        let Some(params) = extract_update_params(&self.lexicon, text, Some(table)) else {
            return Err(AgentError::ExtractionFailure(format!(
                "Para actualizar **{table}** necesito el campo, el nuevo valor y la condición, \
                 por ejemplo: 'actualizar el salario del empleado a 5000 donde id es 101'."
            )));
        };

        let set_kind = column_kind(schema, &params.set.field)?;
        let filter_kind = column_kind(schema, &params.filter.field)?;
        let set_value = params.set.value.clone();
        let filter_value = coerce_key(&params.filter.value);
        let typed_params = typed(params.set, set_value, set_kind).and_then(|set| {
            typed(params.filter, filter_value, filter_kind).map(|filter| (set, filter))
        });
        let (set, filter) = match typed_params {
            Ok(pair) => pair,
            Err(invalid) => return Ok(self.retry_update(schema, invalid)),
        };

        let values: Values = [(set.field.clone(), set.value.clone())].into_iter().collect();
        let affected = self.store.bulk_update(table, &filter, &values).await?;
        info!(table, rows = affected, "update");

        let sql = sql_display::update(table, &set, &filter);
        Ok(if affected == 0 {
            ResponseEnvelope::status(format!(
                "No se encontró ningún registro en **{table}** que cumpla la condición. 0 filas actualizadas."
            ))
            .with_sql(sql)
        } else {
            ResponseEnvelope::success(format!(
                "Actualización realizada en **{table}**: {affected} fila(s) afectada(s)."
            ))
            .with_sql(sql)
        })
    }

    pub(super) async fn delete(
        &self,
        text: &str,
        schema: &TableSchema,
    ) -> Result<ResponseEnvelope, AgentError> {
        let table = schema.name.as_str();
        let condition = extract_condition(&self.lexicon, text, Some(table), ExtractionMode::Filter)
            .or_else(|| extract_condition(&self.lexicon, text, Some(table), ExtractionMode::Where));
        let Some(condition) = condition else {
            return Err(AgentError::ExtractionFailure(format!(
                "Para eliminar de **{table}** necesito una condición, por ejemplo: 'eliminar empleado con id 207'."
            )));
        };

        let kind = column_kind(schema, &condition.field)?;
        let value = coerce_key(&condition.value);
        let filter = typed(condition, value, kind).map_err(InvalidValue::into_error)?;

        let affected = self.store.bulk_delete(table, &filter).await?;
        info!(table, rows = affected, "delete");

        let sql = sql_display::delete(table, &filter);
        Ok(if affected == 0 {
            ResponseEnvelope::status(format!(
                "No se encontró ningún registro en **{table}** que cumpla la condición. 0 filas eliminadas."
            ))
            .with_sql(sql)
        } else {
            ResponseEnvelope::success(format!(
                "Eliminación realizada en **{table}**: {affected} fila(s) eliminada(s)."
            ))
            .with_sql(sql)
        })
    }

    /// Keep the UPDATE open so the caller can resend it with a valid value
    fn retry_update(&self, schema: &TableSchema, invalid: InvalidValue) -> ResponseEnvelope {
        debug!(table = %schema.name, field = %invalid.field, "update value rejected");
        let mut state = ConversationState::new(Intent::Update, Some(schema.name.clone()));
        let text = format!(
            "El valor **{}** no es válido para **{}** ({}). Repite la actualización con un valor válido.",
            invalid.value,
            self.display_name(&invalid.field),
            invalid.reason
        );
        state.last_asked_field = Some(invalid.field);
        ResponseEnvelope::dialog(text, state)
    }
}

fn column_kind(schema: &TableSchema, field: &str) -> Result<ColumnKind, AgentError> {
    schema.kind_of(field).ok_or_else(|| {
        AgentError::SchemaMismatch(format!(
            "Campo '{field}' no válido para la tabla '{}'",
            schema.name
        ))
    })
}

/// Condition with `value` converted to the column kind
fn typed(condition: Condition, value: FieldValue, kind: ColumnKind) -> Result<Condition, InvalidValue> {
    match coerce_to_kind(&value, kind) {
        Ok(value) => Ok(Condition::new(condition.field, condition.op, value)),
        Err(e) => Err(InvalidValue {
            field: condition.field,
            value,
            reason: e.to_string(),
        }),
    }
}
