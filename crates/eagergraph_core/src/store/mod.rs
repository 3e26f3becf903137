//! Row store contract and implementations.
//!
//! # Responsibility
//! - Define the three fetch primitives the resolver consumes.
//! - Carry rows as untyped column maps tagged with their entity.
//!
//! # Invariants
//! - Every fetch call is exactly one round trip to the backing store.
//! - Stores never apply visibility rules; they return every candidate row.
//! - Read paths reject malformed persisted values instead of masking them.

use crate::db::DbError;
use serde::Serialize;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod memory;
pub mod sqlite;

pub use memory::MemoryRowStore;
pub use sqlite::SqliteRowStore;

use crate::meta::catalog::EntityMeta;

pub type StoreResult<T> = Result<T, StoreError>;

/// Row store transport and decoding errors.
#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    UnknownColumn { entity: String, column: String },
    InvalidData(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::UnknownColumn { entity, column } => {
                write!(f, "unknown column {column} on entity {entity}")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted row data: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::UnknownColumn { .. } | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// One stored attribute value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Integer(i64),
    Text(String),
    Bool(bool),
}

impl Display for FieldValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Integer(value) => write!(f, "{value}"),
            Self::Text(value) => write!(f, "'{value}'"),
            Self::Bool(value) => write!(f, "{value}"),
        }
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// Stored row of one entity, keyed by column name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Row {
    entity: &'static str,
    key: i64,
    values: BTreeMap<&'static str, FieldValue>,
}

impl Row {
    /// Creates a row holding only its surrogate key under `key_column`.
    pub fn new(entity: &'static str, key_column: &'static str, key: i64) -> Self {
        let mut values = BTreeMap::new();
        values.insert(key_column, FieldValue::Integer(key));
        Self {
            entity,
            key,
            values,
        }
    }

    /// Sets one column value.
    pub fn with(mut self, column: &'static str, value: impl Into<FieldValue>) -> Self {
        self.values.insert(column, value.into());
        self
    }

    pub fn entity(&self) -> &'static str {
        self.entity
    }

    /// Surrogate key; the row's identity.
    pub fn key(&self) -> i64 {
        self.key
    }

    pub fn get(&self, column: &str) -> Option<&FieldValue> {
        self.values.get(column)
    }

    /// Reads a nullable integer column.
    pub fn integer(&self, column: &str) -> StoreResult<Option<i64>> {
        match self.require(column)? {
            FieldValue::Null => Ok(None),
            FieldValue::Integer(value) => Ok(Some(*value)),
            other => Err(self.type_mismatch(column, "integer", other)),
        }
    }

    /// Reads a nullable text column.
    pub fn text(&self, column: &str) -> StoreResult<Option<&str>> {
        match self.require(column)? {
            FieldValue::Null => Ok(None),
            FieldValue::Text(value) => Ok(Some(value.as_str())),
            other => Err(self.type_mismatch(column, "text", other)),
        }
    }

    /// Reads a nullable boolean column.
    pub fn bool(&self, column: &str) -> StoreResult<Option<bool>> {
        match self.require(column)? {
            FieldValue::Null => Ok(None),
            FieldValue::Bool(value) => Ok(Some(*value)),
            other => Err(self.type_mismatch(column, "boolean", other)),
        }
    }

    fn require(&self, column: &str) -> StoreResult<&FieldValue> {
        self.values
            .get(column)
            .ok_or_else(|| StoreError::UnknownColumn {
                entity: self.entity.to_string(),
                column: column.to_string(),
            })
    }

    fn type_mismatch(&self, column: &str, expected: &str, found: &FieldValue) -> StoreError {
        StoreError::InvalidData(format!(
            "expected {expected} in {}.{column} (key {}), found {found}",
            self.entity, self.key
        ))
    }
}

/// Conjunction of column equality conditions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowFilter {
    conditions: Vec<(&'static str, FieldValue)>,
}

impl RowFilter {
    /// Starts a filter with one `column = value` condition.
    pub fn eq(column: &'static str, value: impl Into<FieldValue>) -> Self {
        Self::default().and_eq(column, value)
    }

    pub fn and_eq(mut self, column: &'static str, value: impl Into<FieldValue>) -> Self {
        self.conditions.push((column, value.into()));
        self
    }

    pub fn conditions(&self) -> &[(&'static str, FieldValue)] {
        &self.conditions
    }

    /// Returns whether `row` satisfies every condition.
    ///
    /// A `Null` condition matches a `Null` column, mirroring `IS NULL`.
    pub fn matches(&self, row: &Row) -> bool {
        self.conditions
            .iter()
            .all(|(column, value)| row.get(column) == Some(value))
    }

    /// Column names only, for logging without row payloads.
    pub fn columns(&self) -> Vec<&'static str> {
        self.conditions.iter().map(|(column, _)| *column).collect()
    }
}

impl Display for RowFilter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.conditions.is_empty() {
            return write!(f, "<all rows>");
        }
        for (index, (column, value)) in self.conditions.iter().enumerate() {
            if index > 0 {
                write!(f, " AND ")?;
            }
            write!(f, "{column} = {value}")?;
        }
        Ok(())
    }
}

/// Read primitives of a backing row store, scoped to one unit of work.
pub trait RowStore {
    /// Fetches the row whose surrogate key equals `key`.
    fn fetch_by_key(&self, entity: &EntityMeta, key: i64) -> StoreResult<Option<Row>>;
    /// Fetches every row whose `fk_column` equals `key`, visible or not.
    fn fetch_by_foreign_key(
        &self,
        entity: &EntityMeta,
        fk_column: &str,
        key: i64,
    ) -> StoreResult<Vec<Row>>;
    /// Fetches every row matching `filter`.
    fn fetch_by_filter(&self, entity: &EntityMeta, filter: &RowFilter) -> StoreResult<Vec<Row>>;
}

/// Checks that `column` is mapped on `entity`.
pub(crate) fn ensure_column(entity: &EntityMeta, column: &str) -> StoreResult<()> {
    if entity.find_column(column).is_none() {
        return Err(StoreError::UnknownColumn {
            entity: entity.name.to_string(),
            column: column.to_string(),
        });
    }
    Ok(())
}
