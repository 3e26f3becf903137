//! SQLite-backed row store.
//!
//! # Responsibility
//! - Translate the fetch primitives into single `SELECT` statements.
//! - Decode stored values according to catalog column kinds.
//!
//! # Invariants
//! - Only catalog-declared table and column names are interpolated into SQL;
//!   values are always bound.
//! - Boolean columns must hold `0`, `1` or `NULL`.

use crate::meta::catalog::{ColumnKind, EntityMeta};
use crate::store::{ensure_column, FieldValue, Row, RowFilter, RowStore, StoreError, StoreResult};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};

/// Row store reading through a borrowed connection or transaction.
pub struct SqliteRowStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRowStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn query(
        &self,
        entity: &EntityMeta,
        where_sql: &str,
        binds: Vec<Value>,
    ) -> StoreResult<Vec<Row>> {
        let sql = format!("{} WHERE {where_sql};", select_sql(entity));
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(binds))?;
        let mut decoded = Vec::new();
        while let Some(row) = rows.next()? {
            decoded.push(decode_row(entity, row)?);
        }
        Ok(decoded)
    }
}

impl RowStore for SqliteRowStore<'_> {
    fn fetch_by_key(&self, entity: &EntityMeta, key: i64) -> StoreResult<Option<Row>> {
        let where_sql = format!("\"{}\" = ?1", entity.key_column);
        let mut rows = self.query(entity, &where_sql, vec![Value::Integer(key)])?;
        Ok(rows.pop())
    }

    fn fetch_by_foreign_key(
        &self,
        entity: &EntityMeta,
        fk_column: &str,
        key: i64,
    ) -> StoreResult<Vec<Row>> {
        ensure_column(entity, fk_column)?;
        let where_sql = format!("\"{fk_column}\" = ?1");
        self.query(entity, &where_sql, vec![Value::Integer(key)])
    }

    fn fetch_by_filter(&self, entity: &EntityMeta, filter: &RowFilter) -> StoreResult<Vec<Row>> {
        let mut where_sql = String::from("1 = 1");
        let mut binds = Vec::with_capacity(filter.conditions().len());
        for (column, value) in filter.conditions() {
            ensure_column(entity, column)?;
            if *value == FieldValue::Null {
                where_sql.push_str(&format!(" AND \"{column}\" IS NULL"));
            } else {
                where_sql.push_str(&format!(" AND \"{column}\" = ?"));
                binds.push(field_to_sql(value));
            }
        }
        self.query(entity, &where_sql, binds)
    }
}

fn select_sql(entity: &EntityMeta) -> String {
    let columns = entity
        .columns()
        .iter()
        .map(|column| format!("\"{}\"", column.name))
        .collect::<Vec<_>>()
        .join(", ");
    format!("SELECT {columns} FROM \"{}\"", entity.table)
}

fn field_to_sql(value: &FieldValue) -> Value {
    match value {
        FieldValue::Null => Value::Null,
        FieldValue::Integer(value) => Value::Integer(*value),
        FieldValue::Text(value) => Value::Text(value.clone()),
        FieldValue::Bool(value) => Value::Integer(i64::from(*value)),
    }
}

fn decode_row(entity: &EntityMeta, row: &rusqlite::Row<'_>) -> StoreResult<Row> {
    let key = match row.get::<_, Value>(0)? {
        Value::Integer(key) => key,
        other => {
            return Err(StoreError::InvalidData(format!(
                "invalid key value `{other:?}` in {}.{}",
                entity.table, entity.key_column
            )));
        }
    };

    let mut decoded = Row::new(entity.name, entity.key_column, key);
    for (index, column) in entity.columns().iter().enumerate().skip(1) {
        let raw = row.get::<_, Value>(index)?;
        let value = match (column.kind, raw) {
            (_, Value::Null) => FieldValue::Null,
            (ColumnKind::Integer, Value::Integer(value)) => FieldValue::Integer(value),
            (ColumnKind::Text, Value::Text(value)) => FieldValue::Text(value),
            (ColumnKind::Bool, Value::Integer(0)) => FieldValue::Bool(false),
            (ColumnKind::Bool, Value::Integer(1)) => FieldValue::Bool(true),
            (kind, other) => {
                return Err(StoreError::InvalidData(format!(
                    "invalid {kind:?} value `{other:?}` in {}.{} (key {key})",
                    entity.table, column.name
                )));
            }
        };
        decoded = decoded.with(column.name, value);
    }
    Ok(decoded)
}
