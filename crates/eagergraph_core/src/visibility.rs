//! Per-entity row visibility rules.
//!
//! # Responsibility
//! - Map an entity type to the predicate deciding which stored rows surface
//!   through an eager-fetch relation.
//!
//! # Invariants
//! - Predicates are pure and read only attributes already on the row.
//! - Every entity reachable through a graph plan must be registered, even
//!   when its rule is `Always`.
//! - A `NULL` flag never makes a row visible.

use crate::store::{Row, StoreResult};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;

/// Caller-supplied visibility rule.
pub type RowPredicate = Arc<dyn Fn(&Row) -> bool + Send + Sync>;

/// Visibility rule for one entity type.
#[derive(Clone)]
pub enum VisibilityPredicate {
    /// Every row is visible.
    Always,
    /// Visible when the boolean `column` equals `visible_when`.
    Flag {
        column: &'static str,
        visible_when: bool,
    },
    Custom(RowPredicate),
}

impl VisibilityPredicate {
    pub fn flag(column: &'static str, visible_when: bool) -> Self {
        Self::Flag {
            column,
            visible_when,
        }
    }

    pub fn custom(predicate: impl Fn(&Row) -> bool + Send + Sync + 'static) -> Self {
        Self::Custom(Arc::new(predicate))
    }

    /// Decides whether `row` is visible.
    ///
    /// Fails only when a flag column is missing or not boolean.
    pub fn evaluate(&self, row: &Row) -> StoreResult<bool> {
        match self {
            Self::Always => Ok(true),
            Self::Flag {
                column,
                visible_when,
            } => Ok(row.bool(column)? == Some(*visible_when)),
            Self::Custom(predicate) => Ok(predicate(row)),
        }
    }
}

impl Debug for VisibilityPredicate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Always => write!(f, "Always"),
            Self::Flag {
                column,
                visible_when,
            } => write!(f, "Flag({column} = {visible_when})"),
            Self::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

/// Registration/lookup errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VisibilityError {
    DuplicateRegistration(String),
    UnregisteredType(String),
}

impl Display for VisibilityError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateRegistration(entity) => {
                write!(f, "visibility predicate already registered for {entity}")
            }
            Self::UnregisteredType(entity) => {
                write!(f, "no visibility predicate registered for {entity}")
            }
        }
    }
}

impl Error for VisibilityError {}

/// Immutable-after-startup registry of visibility rules.
#[derive(Debug, Clone, Default)]
pub struct VisibilityRegistry {
    predicates: BTreeMap<&'static str, VisibilityPredicate>,
}

impl VisibilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the rule for one entity type.
    pub fn register(
        &mut self,
        entity: &'static str,
        predicate: VisibilityPredicate,
    ) -> Result<(), VisibilityError> {
        if self.predicates.contains_key(entity) {
            return Err(VisibilityError::DuplicateRegistration(entity.to_string()));
        }
        self.predicates.insert(entity, predicate);
        Ok(())
    }

    /// Returns the rule for `entity`.
    pub fn predicate_for(&self, entity: &str) -> Result<&VisibilityPredicate, VisibilityError> {
        self.predicates
            .get(entity)
            .ok_or_else(|| VisibilityError::UnregisteredType(entity.to_string()))
    }

    /// Returns sorted registered entity names.
    pub fn entities(&self) -> Vec<&'static str> {
        self.predicates.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }
}
