//! Graph resolver.
//!
//! # Responsibility
//! - Fetch the root row, then each planned relation's candidate rows by
//!   foreign key, and keep only the rows the visibility registry admits.
//! - Collapse to-one relations into zero or one row.
//!
//! # Invariants
//! - One store round trip for the root, one per relation; never per row.
//! - Each candidate row is evaluated against its predicate exactly once.
//! - Nothing is cached between calls.

use crate::graph::planner::{GraphPlan, RelationPlan};
use crate::graph::{GraphError, GraphResult};
use crate::meta::catalog::{Cardinality, Catalog, CollectionOrder, EntityMeta};
use crate::store::{Row, RowFilter, RowStore};
use crate::visibility::{VisibilityPredicate, VisibilityRegistry};
use log::{debug, error, info};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Instant;

/// How the root row is located.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RootLookup {
    Key(i64),
    /// Single-result lookup; more than one match is an error.
    Filter(RowFilter),
}

impl RootLookup {
    fn mode(&self) -> &'static str {
        match self {
            Self::Key(_) => "key",
            Self::Filter(_) => "filter",
        }
    }
}

/// Populated value of one relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RelationValue {
    One(Option<Row>),
    Many(Vec<Row>),
}

/// Root row plus every planned relation, filtered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedGraph {
    pub root: Row,
    pub relations: BTreeMap<&'static str, RelationValue>,
}

impl ResolvedGraph {
    pub fn relation(&self, name: &str) -> Option<&RelationValue> {
        self.relations.get(name)
    }

    /// Visible row of a to-one relation; `None` when absent or not planned.
    pub fn single(&self, name: &str) -> Option<&Row> {
        match self.relation(name) {
            Some(RelationValue::One(row)) => row.as_ref(),
            _ => None,
        }
    }

    /// Visible rows of a to-many relation; empty when not planned.
    pub fn collection(&self, name: &str) -> &[Row] {
        match self.relation(name) {
            Some(RelationValue::Many(rows)) => rows,
            _ => &[],
        }
    }
}

/// Executes graph plans against a row store.
pub struct GraphResolver<'a, S: RowStore> {
    store: &'a S,
    catalog: &'a Catalog,
    registry: &'a VisibilityRegistry,
}

/// Plan step with its metadata and predicate looked up ahead of any fetch.
struct PreparedRelation<'p> {
    plan: &'p RelationPlan,
    target: &'p EntityMeta,
    predicate: &'p VisibilityPredicate,
}

impl<'a, S: RowStore> GraphResolver<'a, S> {
    pub fn new(store: &'a S, catalog: &'a Catalog, registry: &'a VisibilityRegistry) -> Self {
        Self {
            store,
            catalog,
            registry,
        }
    }

    /// Resolves `plan` for the root located by `lookup`.
    ///
    /// Returns `Ok(None)` when no root row matches.
    ///
    /// # Side effects
    /// - Read-only store access: `1 + plan.relations.len()` round trips.
    /// - Emits `graph_resolve` logging events with duration and status.
    pub fn resolve(
        &self,
        plan: &GraphPlan,
        lookup: &RootLookup,
    ) -> GraphResult<Option<ResolvedGraph>> {
        let started_at = Instant::now();
        let mut round_trips = 0_usize;

        match self.resolve_inner(plan, lookup, &mut round_trips) {
            Ok(resolved) => {
                info!(
                    "event=graph_resolve module=graph status=ok entity={} graph={} lookup={} found={} round_trips={} duration_ms={}",
                    plan.root,
                    plan.graph,
                    lookup.mode(),
                    resolved.is_some(),
                    round_trips,
                    started_at.elapsed().as_millis()
                );
                Ok(resolved)
            }
            Err(err) => {
                error!(
                    "event=graph_resolve module=graph status=error entity={} graph={} lookup={} round_trips={} duration_ms={} error_code={} error={}",
                    plan.root,
                    plan.graph,
                    lookup.mode(),
                    round_trips,
                    started_at.elapsed().as_millis(),
                    err.code(),
                    err
                );
                Err(err)
            }
        }
    }

    fn resolve_inner(
        &self,
        plan: &GraphPlan,
        lookup: &RootLookup,
        round_trips: &mut usize,
    ) -> GraphResult<Option<ResolvedGraph>> {
        let root_meta = self.entity(plan.root)?;
        let prepared = plan
            .relations
            .iter()
            .map(|relation| self.prepare(relation))
            .collect::<GraphResult<Vec<_>>>()?;

        *round_trips += 1;
        let Some(root) = self.fetch_root(root_meta, lookup)? else {
            return Ok(None);
        };

        let mut relations = BTreeMap::new();
        for relation in &prepared {
            *round_trips += 1;
            let value = self.resolve_relation(&root, relation)?;
            relations.insert(relation.plan.relation, value);
        }

        Ok(Some(ResolvedGraph { root, relations }))
    }

    fn prepare<'p>(&'p self, relation: &'p RelationPlan) -> GraphResult<PreparedRelation<'p>> {
        Ok(PreparedRelation {
            plan: relation,
            target: self.entity(relation.target)?,
            predicate: self.registry.predicate_for(relation.target)?,
        })
    }

    fn fetch_root(&self, root_meta: &EntityMeta, lookup: &RootLookup) -> GraphResult<Option<Row>> {
        match lookup {
            RootLookup::Key(key) => Ok(self.store.fetch_by_key(root_meta, *key)?),
            RootLookup::Filter(filter) => {
                let mut rows = self.store.fetch_by_filter(root_meta, filter)?;
                match rows.len() {
                    0 | 1 => Ok(rows.pop()),
                    count => Err(GraphError::NonUniqueResult {
                        entity: root_meta.name.to_string(),
                        filter: filter.to_string(),
                        count,
                    }),
                }
            }
        }
    }

    fn resolve_relation(
        &self,
        root: &Row,
        relation: &PreparedRelation<'_>,
    ) -> GraphResult<RelationValue> {
        let candidates = self.store.fetch_by_foreign_key(
            relation.target,
            relation.plan.foreign_key,
            root.key(),
        )?;
        let candidate_count = candidates.len();

        let mut visible = Vec::with_capacity(candidate_count);
        for row in candidates {
            if relation.predicate.evaluate(&row)? {
                visible.push(row);
            }
        }

        debug!(
            "event=relation_fetch module=graph status=ok entity={} key={} relation={} target={} candidates={} visible={}",
            root.entity(),
            root.key(),
            relation.plan.relation,
            relation.plan.target,
            candidate_count,
            visible.len()
        );

        match relation.plan.cardinality {
            Cardinality::ToOne => {
                if visible.len() > 1 {
                    return Err(GraphError::MultipleActiveRows {
                        entity: root.entity().to_string(),
                        key: root.key(),
                        relation: relation.plan.relation.to_string(),
                        target: relation.plan.target.to_string(),
                        count: visible.len(),
                    });
                }
                Ok(RelationValue::One(visible.pop()))
            }
            Cardinality::ToMany => {
                if relation.plan.order == CollectionOrder::KeyAscending {
                    visible.sort_by_key(Row::key);
                }
                Ok(RelationValue::Many(visible))
            }
        }
    }

    fn entity(&self, name: &str) -> GraphResult<&'a EntityMeta> {
        self.catalog
            .entity(name)
            .ok_or_else(|| GraphError::UnknownEntity(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::{GraphResolver, RelationValue, RootLookup};
    use crate::graph::{GraphError, GraphPlanner};
    use crate::meta::catalog::{Catalog, CollectionOrder, ColumnKind, EntityMeta, RelationMeta};
    use crate::store::{MemoryRowStore, Row, RowFilter, StoreError};
    use crate::visibility::{VisibilityError, VisibilityPredicate, VisibilityRegistry};

    fn catalog() -> Catalog {
        let shelf = EntityMeta::new("Shelf", "shelves", "shelf_id")
            .column("label", ColumnKind::Text)
            .relation(RelationMeta::to_one("front", "Book", "shelf_id"))
            .relation(
                RelationMeta::to_many("books", "Book", "shelf_id")
                    .ordered(CollectionOrder::KeyAscending),
            )
            .graph("all", &["front", "books"])
            .graph("books", &["books"]);
        let book = EntityMeta::new("Book", "books", "book_id")
            .column("shelf_id", ColumnKind::Integer)
            .column("on_display", ColumnKind::Bool);
        Catalog::new([shelf, book]).unwrap()
    }

    fn registry() -> VisibilityRegistry {
        let mut registry = VisibilityRegistry::new();
        registry
            .register("Book", VisibilityPredicate::flag("on_display", true))
            .unwrap();
        registry
    }

    fn book(key: i64, shelf: i64, on_display: bool) -> Row {
        Row::new("Book", "book_id", key)
            .with("shelf_id", shelf)
            .with("on_display", on_display)
    }

    fn store() -> MemoryRowStore {
        let mut store = MemoryRowStore::new();
        store.insert(Row::new("Shelf", "shelf_id", 1).with("label", "fiction"));
        store.insert(Row::new("Shelf", "shelf_id", 2).with("label", "poetry"));
        store.insert(Row::new("Shelf", "shelf_id", 3).with("label", "poetry"));
        store.insert(book(30, 1, true));
        store.insert(book(10, 1, false));
        store.insert(book(20, 2, true));
        store.insert(book(21, 2, true));
        store
    }

    #[test]
    fn resolves_books_in_key_order_and_skips_hidden_rows() {
        let catalog = catalog();
        let registry = registry();
        let mut store = store();
        store.insert(book(5, 2, true));
        let plan = GraphPlanner::new(&catalog).plan("Shelf", "books").unwrap();

        let graph = GraphResolver::new(&store, &catalog, &registry)
            .resolve(&plan, &RootLookup::Key(2))
            .unwrap()
            .unwrap();
        let keys = graph
            .collection("books")
            .iter()
            .map(Row::key)
            .collect::<Vec<_>>();
        assert_eq!(keys, vec![5, 20, 21]);
        assert_eq!(store.round_trips(), 2);
    }

    #[test]
    fn to_one_relation_collapses_to_single_visible_row() {
        let catalog = catalog();
        let registry = registry();
        let store = store();
        let plan = GraphPlanner::new(&catalog).plan("Shelf", "all").unwrap();

        let graph = GraphResolver::new(&store, &catalog, &registry)
            .resolve(&plan, &RootLookup::Key(1))
            .unwrap()
            .unwrap();
        assert_eq!(graph.single("front").map(Row::key), Some(30));
        assert_eq!(graph.collection("books").len(), 1);
        assert!(matches!(graph.relation("front"), Some(RelationValue::One(Some(_)))));
    }

    #[test]
    fn to_one_relation_with_two_visible_rows_fails() {
        let catalog = catalog();
        let registry = registry();
        let store = store();
        let plan = GraphPlanner::new(&catalog).plan("Shelf", "all").unwrap();

        let err = GraphResolver::new(&store, &catalog, &registry)
            .resolve(&plan, &RootLookup::Key(2))
            .unwrap_err();
        assert!(matches!(
            err,
            GraphError::MultipleActiveRows { key: 2, count: 2, ref relation, .. } if relation == "front"
        ));
    }

    #[test]
    fn missing_root_costs_one_round_trip() {
        let catalog = catalog();
        let registry = registry();
        let store = store();
        let plan = GraphPlanner::new(&catalog).plan("Shelf", "all").unwrap();

        let resolved = GraphResolver::new(&store, &catalog, &registry)
            .resolve(&plan, &RootLookup::Key(99))
            .unwrap();
        assert!(resolved.is_none());
        assert_eq!(store.round_trips(), 1);
    }

    #[test]
    fn filter_lookup_requires_a_unique_root() {
        let catalog = catalog();
        let registry = registry();
        let store = store();
        let plan = GraphPlanner::new(&catalog).plan("Shelf", "books").unwrap();
        let resolver = GraphResolver::new(&store, &catalog, &registry);

        let graph = resolver
            .resolve(&plan, &RootLookup::Filter(RowFilter::eq("label", "fiction")))
            .unwrap()
            .unwrap();
        assert_eq!(graph.root.key(), 1);

        let err = resolver
            .resolve(&plan, &RootLookup::Filter(RowFilter::eq("label", "poetry")))
            .unwrap_err();
        assert!(matches!(err, GraphError::NonUniqueResult { count: 2, .. }));

        let none = resolver
            .resolve(&plan, &RootLookup::Filter(RowFilter::eq("label", "drama")))
            .unwrap();
        assert!(none.is_none());
    }

    #[test]
    fn unregistered_target_fails_before_any_round_trip() {
        let catalog = catalog();
        let registry = VisibilityRegistry::new();
        let store = store();
        let plan = GraphPlanner::new(&catalog).plan("Shelf", "all").unwrap();

        let err = GraphResolver::new(&store, &catalog, &registry)
            .resolve(&plan, &RootLookup::Key(1))
            .unwrap_err();
        assert!(matches!(
            err,
            GraphError::Visibility(VisibilityError::UnregisteredType(entity)) if entity == "Book"
        ));
        assert_eq!(store.round_trips(), 0);
    }

    #[test]
    fn malformed_flag_surfaces_as_store_error() {
        let catalog = catalog();
        let registry = registry();
        let mut store = store();
        store.insert(
            Row::new("Book", "book_id", 40)
                .with("shelf_id", 1_i64)
                .with("on_display", 1_i64),
        );
        let plan = GraphPlanner::new(&catalog).plan("Shelf", "books").unwrap();

        let err = GraphResolver::new(&store, &catalog, &registry)
            .resolve(&plan, &RootLookup::Key(1))
            .unwrap_err();
        assert_eq!(err.code(), "store_failed");
        assert!(matches!(
            err,
            GraphError::Store(StoreError::InvalidData(ref message)) if message.contains("on_display")
        ));
        assert_eq!(store.round_trips(), 2);
    }
}
