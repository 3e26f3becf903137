//! Read-session scoping for graph resolution.

use super::DbError;
use rusqlite::{Connection, Transaction, TransactionBehavior};

/// Runs `work` inside one deferred read transaction.
///
/// The root fetch and every relation fetch issued by `work` observe the same
/// snapshot. The transaction is committed when `work` succeeds and rolled
/// back (on drop) when it fails.
pub fn with_read_session<T, E>(
    conn: &mut Connection,
    work: impl FnOnce(&Transaction<'_>) -> Result<T, E>,
) -> Result<T, E>
where
    E: From<DbError>,
{
    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Deferred)
        .map_err(DbError::from)?;
    let value = work(&tx)?;
    tx.commit().map_err(DbError::from)?;
    Ok(value)
}
