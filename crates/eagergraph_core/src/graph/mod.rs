//! Filtered eager-fetch planning and resolution.
//!
//! # Responsibility
//! - Turn a named graph into an ordered relation plan (`planner`).
//! - Execute a plan against a row store, filtering every relation through the
//!   visibility registry (`resolver`).
//!
//! # Invariants
//! - Resolving a plan of K relations costs exactly `1 + K` round trips when
//!   the root exists, and exactly one when it does not.
//! - A to-one relation never exposes more than one visible row.
//! - Configuration errors surface before the first round trip.

use crate::db::DbError;
use crate::meta::catalog::CatalogError;
use crate::store::StoreError;
use crate::visibility::VisibilityError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod planner;
pub mod resolver;

pub use planner::{GraphPlan, GraphPlanner, RelationPlan};
pub use resolver::{GraphResolver, RelationValue, ResolvedGraph, RootLookup};

pub type GraphResult<T> = Result<T, GraphError>;

/// Planning and resolution errors.
#[derive(Debug)]
pub enum GraphError {
    Catalog(CatalogError),
    UnknownEntity(String),
    UnknownGraph {
        entity: String,
        graph: String,
    },
    UnknownRelation {
        entity: String,
        relation: String,
    },
    Visibility(VisibilityError),
    /// A single-result root lookup matched several rows.
    NonUniqueResult {
        entity: String,
        filter: String,
        count: usize,
    },
    /// A to-one relation found several visible rows for one root.
    MultipleActiveRows {
        entity: String,
        key: i64,
        relation: String,
        target: String,
        count: usize,
    },
    Store(StoreError),
}

impl GraphError {
    /// Stable short code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Catalog(_) => "invalid_catalog",
            Self::UnknownEntity(_) => "unknown_entity",
            Self::UnknownGraph { .. } => "unknown_graph",
            Self::UnknownRelation { .. } => "unknown_relation",
            Self::Visibility(VisibilityError::UnregisteredType(_)) => "unregistered_type",
            Self::Visibility(VisibilityError::DuplicateRegistration(_)) => {
                "duplicate_registration"
            }
            Self::NonUniqueResult { .. } => "non_unique_result",
            Self::MultipleActiveRows { .. } => "multiple_active_rows",
            Self::Store(_) => "store_failed",
        }
    }
}

impl Display for GraphError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Catalog(err) => write!(f, "invalid catalog: {err}"),
            Self::UnknownEntity(entity) => write!(f, "entity not declared: {entity}"),
            Self::UnknownGraph { entity, graph } => {
                write!(f, "graph `{graph}` not declared for entity {entity}")
            }
            Self::UnknownRelation { entity, relation } => {
                write!(f, "relation `{relation}` not declared on entity {entity}")
            }
            Self::Visibility(err) => write!(f, "{err}"),
            Self::NonUniqueResult {
                entity,
                filter,
                count,
            } => write!(
                f,
                "expected one {entity} for filter `{filter}`, found {count}"
            ),
            Self::MultipleActiveRows {
                entity,
                key,
                relation,
                target,
                count,
            } => write!(
                f,
                "{entity} {key}: to-one relation `{relation}` has {count} visible {target} rows"
            ),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for GraphError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Catalog(err) => Some(err),
            Self::Visibility(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::UnknownEntity(_)
            | Self::UnknownGraph { .. }
            | Self::UnknownRelation { .. }
            | Self::NonUniqueResult { .. }
            | Self::MultipleActiveRows { .. } => None,
        }
    }
}

impl From<CatalogError> for GraphError {
    fn from(value: CatalogError) -> Self {
        Self::Catalog(value)
    }
}

impl From<VisibilityError> for GraphError {
    fn from(value: VisibilityError) -> Self {
        Self::Visibility(value)
    }
}

impl From<StoreError> for GraphError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<DbError> for GraphError {
    fn from(value: DbError) -> Self {
        Self::Store(StoreError::Db(value))
    }
}
