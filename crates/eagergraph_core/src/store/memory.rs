//! In-process row store with round-trip accounting.

use crate::meta::catalog::EntityMeta;
use crate::store::{ensure_column, FieldValue, Row, RowFilter, RowStore, StoreError, StoreResult};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Row store over in-memory tables.
///
/// Every fetch counts as one round trip, whatever it returns.
#[derive(Debug, Default)]
pub struct MemoryRowStore {
    tables: BTreeMap<&'static str, Vec<Row>>,
    round_trips: AtomicUsize,
}

impl MemoryRowStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a row, keyed by entity and surrogate key.
    pub fn insert(&mut self, row: Row) {
        let table = self.tables.entry(row.entity()).or_default();
        match table.iter_mut().find(|existing| existing.key() == row.key()) {
            Some(existing) => *existing = row,
            None => table.push(row),
        }
    }

    /// Number of fetch calls served since creation or the last reset.
    pub fn round_trips(&self) -> usize {
        self.round_trips.load(Ordering::SeqCst)
    }

    pub fn reset_round_trips(&self) {
        self.round_trips.store(0, Ordering::SeqCst);
    }

    fn rows(&self, entity: &EntityMeta) -> &[Row] {
        self.round_trips.fetch_add(1, Ordering::SeqCst);
        self.tables.get(entity.name).map(Vec::as_slice).unwrap_or_default()
    }
}

impl RowStore for MemoryRowStore {
    fn fetch_by_key(&self, entity: &EntityMeta, key: i64) -> StoreResult<Option<Row>> {
        let rows = self.rows(entity);
        Ok(rows.iter().find(|row| row.key() == key).cloned())
    }

    fn fetch_by_foreign_key(
        &self,
        entity: &EntityMeta,
        fk_column: &str,
        key: i64,
    ) -> StoreResult<Vec<Row>> {
        ensure_column(entity, fk_column)?;
        let expected = FieldValue::Integer(key);
        let mut matched = Vec::new();
        for row in self.rows(entity) {
            match row.get(fk_column) {
                Some(value) if *value == expected => matched.push(row.clone()),
                Some(_) => {}
                None => {
                    return Err(StoreError::UnknownColumn {
                        entity: entity.name.to_string(),
                        column: fk_column.to_string(),
                    });
                }
            }
        }
        Ok(matched)
    }

    fn fetch_by_filter(&self, entity: &EntityMeta, filter: &RowFilter) -> StoreResult<Vec<Row>> {
        for (column, _) in filter.conditions() {
            ensure_column(entity, column)?;
        }
        Ok(self
            .rows(entity)
            .iter()
            .filter(|row| filter.matches(row))
            .cloned()
            .collect())
    }
}
