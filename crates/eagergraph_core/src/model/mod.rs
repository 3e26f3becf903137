//! Typed entities materialized from resolved graphs.
//!
//! # Responsibility
//! - Define the user/detail/skill records handed to callers.
//! - Convert untyped store rows into those records.
//!
//! # Invariants
//! - Equality and hashing of every entity use its surrogate key only.
//! - Materialization rejects rows of the wrong entity or with missing values.

use crate::store::{Row, StoreError, StoreResult};

pub mod user;

/// Conversion from a stored row of entity `ENTITY`.
pub trait FromRow: Sized {
    const ENTITY: &'static str;

    fn from_row(row: &Row) -> StoreResult<Self>;
}

/// Checks the row's entity before materialization.
pub(crate) fn expect_entity(row: &Row, entity: &str) -> StoreResult<()> {
    if row.entity() != entity {
        return Err(StoreError::InvalidData(format!(
            "cannot materialize {entity} from a {} row (key {})",
            row.entity(),
            row.key()
        )));
    }
    Ok(())
}

/// Reads a column that the schema declares `NOT NULL`.
pub(crate) fn required<T>(row: &Row, column: &str, value: Option<T>) -> StoreResult<T> {
    value.ok_or_else(|| {
        StoreError::InvalidData(format!(
            "unexpected NULL in {}.{column} (key {})",
            row.entity(),
            row.key()
        ))
    })
}
