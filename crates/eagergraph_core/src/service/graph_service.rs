//! Untyped graph resolution entry points.
//!
//! # Invariants
//! - Planning happens before a session is opened.
//! - Each call opens and releases its own read transaction; nothing is
//!   shared between calls except the immutable catalog and registry.

use crate::db::with_read_session;
use crate::graph::{GraphPlanner, GraphResolver, GraphResult, ResolvedGraph, RootLookup};
use crate::meta::catalog::Catalog;
use crate::store::{RowFilter, RowStore, SqliteRowStore};
use crate::visibility::VisibilityRegistry;
use rusqlite::Connection;

/// Owns the startup configuration needed to plan and resolve graphs.
#[derive(Debug, Clone)]
pub struct GraphService {
    catalog: Catalog,
    registry: VisibilityRegistry,
}

impl GraphService {
    pub fn new(catalog: Catalog, registry: VisibilityRegistry) -> Self {
        Self { catalog, registry }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn registry(&self) -> &VisibilityRegistry {
        &self.registry
    }

    /// Resolves `graph` for the `root` row with surrogate key `key`.
    pub fn resolve_by_id(
        &self,
        conn: &mut Connection,
        root: &str,
        graph: &str,
        key: i64,
    ) -> GraphResult<Option<ResolvedGraph>> {
        self.resolve_in_session(conn, root, graph, &RootLookup::Key(key))
    }

    /// Resolves `graph` for the single `root` row matching `filter`.
    ///
    /// Fails with `NonUniqueResult` when more than one row matches.
    pub fn resolve_by_filter(
        &self,
        conn: &mut Connection,
        root: &str,
        graph: &str,
        filter: &RowFilter,
    ) -> GraphResult<Option<ResolvedGraph>> {
        self.resolve_in_session(conn, root, graph, &RootLookup::Filter(filter.clone()))
    }

    /// Resolves against any row store; the caller owns the unit of work.
    pub fn resolve_with_store<S: RowStore>(
        &self,
        store: &S,
        root: &str,
        graph: &str,
        lookup: &RootLookup,
    ) -> GraphResult<Option<ResolvedGraph>> {
        let plan = GraphPlanner::new(&self.catalog).plan(root, graph)?;
        GraphResolver::new(store, &self.catalog, &self.registry).resolve(&plan, lookup)
    }

    fn resolve_in_session(
        &self,
        conn: &mut Connection,
        root: &str,
        graph: &str,
        lookup: &RootLookup,
    ) -> GraphResult<Option<ResolvedGraph>> {
        let plan = GraphPlanner::new(&self.catalog).plan(root, graph)?;
        with_read_session(conn, |tx| {
            let store = SqliteRowStore::new(tx);
            GraphResolver::new(&store, &self.catalog, &self.registry).resolve(&plan, lookup)
        })
    }
}
