//! Filtered eager-fetch resolution over SQLite.
//! A root entity is loaded together with its declared relations in a fixed
//! number of round trips, keeping only the related rows a per-type
//! visibility predicate admits.

pub mod db;
pub mod graph;
pub mod logging;
pub mod meta;
pub mod model;
pub mod repo;
pub mod service;
pub mod store;
pub mod visibility;

pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use graph::{
    GraphError, GraphPlan, GraphPlanner, GraphResolver, GraphResult, RelationPlan, RelationValue,
    ResolvedGraph, RootLookup,
};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use meta::catalog::{
    Cardinality, Catalog, CatalogError, CollectionOrder, ColumnKind, EntityMeta, RelationMeta,
};
pub use model::user::{User, UserDetail, UserId, UserSkill};
pub use repo::scenarios::{seed_scenario, Scenario, SCENARIOS};
pub use repo::user_repo::{RepoError, RepoResult, SqliteUserRepository, UserRepository};
pub use service::graph_service::GraphService;
pub use service::user_service::UserGraphService;
pub use store::{
    FieldValue, MemoryRowStore, Row, RowFilter, RowStore, SqliteRowStore, StoreError, StoreResult,
};
pub use visibility::{VisibilityError, VisibilityPredicate, VisibilityRegistry};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
