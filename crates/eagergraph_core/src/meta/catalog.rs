//! Entity, relation and graph declarations.
//!
//! # Responsibility
//! - Hold the mapping metadata the planner and stores read.
//! - Reject inconsistent declarations when the catalog is built.
//!
//! # Invariants
//! - Every entity has an integer surrogate key column.
//! - Every relation target is a declared entity owning the foreign-key column.
//! - Graph relation names are checked at planning time, not here.

use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Storage type of one mapped column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Integer,
    Text,
    /// Stored as INTEGER `0`/`1`.
    Bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMeta {
    pub name: &'static str,
    pub kind: ColumnKind,
}

/// Relation cardinality seen from the owning (root) side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    ToOne,
    ToMany,
}

/// Ordering applied to a resolved collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollectionOrder {
    /// Whatever order the store returned.
    #[default]
    Unspecified,
    /// Ascending by the target's surrogate key.
    KeyAscending,
}

/// Association declared on an owning entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationMeta {
    pub name: &'static str,
    pub cardinality: Cardinality,
    pub target: &'static str,
    /// Column on the target that stores the owner's key.
    pub foreign_key: &'static str,
    pub order: CollectionOrder,
}

impl RelationMeta {
    pub fn to_one(name: &'static str, target: &'static str, foreign_key: &'static str) -> Self {
        Self {
            name,
            cardinality: Cardinality::ToOne,
            target,
            foreign_key,
            order: CollectionOrder::Unspecified,
        }
    }

    pub fn to_many(name: &'static str, target: &'static str, foreign_key: &'static str) -> Self {
        Self {
            name,
            cardinality: Cardinality::ToMany,
            target,
            foreign_key,
            order: CollectionOrder::Unspecified,
        }
    }

    /// Requests a deterministic collection order.
    pub fn ordered(mut self, order: CollectionOrder) -> Self {
        self.order = order;
        self
    }
}

/// Mapping metadata for one entity type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityMeta {
    pub name: &'static str,
    pub table: &'static str,
    pub key_column: &'static str,
    columns: Vec<ColumnMeta>,
    relations: Vec<RelationMeta>,
    graphs: BTreeMap<&'static str, Vec<&'static str>>,
}

impl EntityMeta {
    /// Declares an entity; the key column is registered as its first column.
    pub fn new(name: &'static str, table: &'static str, key_column: &'static str) -> Self {
        Self {
            name,
            table,
            key_column,
            columns: vec![ColumnMeta {
                name: key_column,
                kind: ColumnKind::Integer,
            }],
            relations: Vec::new(),
            graphs: BTreeMap::new(),
        }
    }

    pub fn column(mut self, name: &'static str, kind: ColumnKind) -> Self {
        self.columns.push(ColumnMeta { name, kind });
        self
    }

    pub fn relation(mut self, relation: RelationMeta) -> Self {
        self.relations.push(relation);
        self
    }

    /// Declares a named eager-fetch graph as an ordered list of relation names.
    pub fn graph(mut self, name: &'static str, relations: &[&'static str]) -> Self {
        self.graphs.insert(name, relations.to_vec());
        self
    }

    /// Columns in declaration order, key column first.
    pub fn columns(&self) -> &[ColumnMeta] {
        &self.columns
    }

    pub fn find_column(&self, name: &str) -> Option<&ColumnMeta> {
        self.columns.iter().find(|column| column.name == name)
    }

    pub fn relations(&self) -> &[RelationMeta] {
        &self.relations
    }

    pub fn find_relation(&self, name: &str) -> Option<&RelationMeta> {
        self.relations.iter().find(|relation| relation.name == name)
    }

    pub fn find_graph(&self, name: &str) -> Option<&[&'static str]> {
        self.graphs.get(name).map(Vec::as_slice)
    }

    /// Like `find_graph`, also returning the declared graph name.
    pub fn graph_entry(&self, name: &str) -> Option<(&'static str, &[&'static str])> {
        self.graphs
            .get_key_value(name)
            .map(|(name, relations)| (*name, relations.as_slice()))
    }

    /// Returns sorted graph names.
    pub fn graph_names(&self) -> Vec<&'static str> {
        self.graphs.keys().copied().collect()
    }
}

/// Catalog construction errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    DuplicateEntity(String),
    DuplicateColumn {
        entity: String,
        column: String,
    },
    DuplicateRelation {
        entity: String,
        relation: String,
    },
    UnknownTarget {
        entity: String,
        relation: String,
        target: String,
    },
    UnknownForeignKey {
        entity: String,
        relation: String,
        column: String,
    },
    ForeignKeyNotInteger {
        entity: String,
        relation: String,
        column: String,
    },
}

impl Display for CatalogError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateEntity(entity) => write!(f, "entity declared twice: {entity}"),
            Self::DuplicateColumn { entity, column } => {
                write!(f, "column declared twice: {entity}.{column}")
            }
            Self::DuplicateRelation { entity, relation } => {
                write!(f, "relation declared twice: {entity}.{relation}")
            }
            Self::UnknownTarget {
                entity,
                relation,
                target,
            } => write!(
                f,
                "relation {entity}.{relation} targets undeclared entity {target}"
            ),
            Self::UnknownForeignKey {
                entity,
                relation,
                column,
            } => write!(
                f,
                "relation {entity}.{relation} uses foreign key {column} missing on target"
            ),
            Self::ForeignKeyNotInteger {
                entity,
                relation,
                column,
            } => write!(
                f,
                "relation {entity}.{relation} uses non-integer foreign key {column}"
            ),
        }
    }
}

impl Error for CatalogError {}

/// Immutable registry of entity metadata, built once at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    entities: BTreeMap<&'static str, EntityMeta>,
}

impl Catalog {
    /// Builds a catalog and validates cross-entity references.
    pub fn new(entities: impl IntoIterator<Item = EntityMeta>) -> Result<Self, CatalogError> {
        let mut by_name = BTreeMap::new();
        for entity in entities {
            validate_entity(&entity)?;
            if by_name.contains_key(entity.name) {
                return Err(CatalogError::DuplicateEntity(entity.name.to_string()));
            }
            by_name.insert(entity.name, entity);
        }

        for entity in by_name.values() {
            for relation in &entity.relations {
                let Some(target) = by_name.get(relation.target) else {
                    return Err(CatalogError::UnknownTarget {
                        entity: entity.name.to_string(),
                        relation: relation.name.to_string(),
                        target: relation.target.to_string(),
                    });
                };
                match target.find_column(relation.foreign_key) {
                    Some(column) if column.kind == ColumnKind::Integer => {}
                    Some(_) => {
                        return Err(CatalogError::ForeignKeyNotInteger {
                            entity: entity.name.to_string(),
                            relation: relation.name.to_string(),
                            column: relation.foreign_key.to_string(),
                        });
                    }
                    None => {
                        return Err(CatalogError::UnknownForeignKey {
                            entity: entity.name.to_string(),
                            relation: relation.name.to_string(),
                            column: relation.foreign_key.to_string(),
                        });
                    }
                }
            }
        }

        Ok(Self { entities: by_name })
    }

    pub fn entity(&self, name: &str) -> Option<&EntityMeta> {
        self.entities.get(name)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

fn validate_entity(entity: &EntityMeta) -> Result<(), CatalogError> {
    for (index, column) in entity.columns.iter().enumerate() {
        if entity.columns[..index]
            .iter()
            .any(|earlier| earlier.name == column.name)
        {
            return Err(CatalogError::DuplicateColumn {
                entity: entity.name.to_string(),
                column: column.name.to_string(),
            });
        }
    }
    for (index, relation) in entity.relations.iter().enumerate() {
        if entity.relations[..index]
            .iter()
            .any(|earlier| earlier.name == relation.name)
        {
            return Err(CatalogError::DuplicateRelation {
                entity: entity.name.to_string(),
                relation: relation.name.to_string(),
            });
        }
    }
    Ok(())
}
