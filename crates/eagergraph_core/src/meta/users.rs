//! User graph declarations.
//!
//! Three tables: `users` (root), `user_details` (many rows per user, at most
//! one active) and `user_skills` (many rows per user, soft-deleted).

use crate::meta::catalog::{Catalog, CatalogError, ColumnKind, EntityMeta, RelationMeta};
use crate::visibility::{VisibilityError, VisibilityPredicate, VisibilityRegistry};

pub const USER: &str = "User";
pub const USER_DETAIL: &str = "UserDetail";
pub const USER_SKILL: &str = "UserSkill";

pub const USER_ID: &str = "user_id";
pub const USER_NAME: &str = "user_name";
pub const DETAIL_ID: &str = "detail_id";
pub const DETAIL_CITY: &str = "city";
pub const DETAIL_ACTIVE: &str = "is_active";
pub const SKILL_ID: &str = "skill_id";
pub const SKILL_NAME: &str = "skill_name";
pub const SKILL_DELETED: &str = "has_deleted";

pub const DETAIL_RELATION: &str = "detail";
pub const SKILLS_RELATION: &str = "skills";

/// Eagerly loads both the active detail and the visible skills.
pub const USER_ENTITY_GRAPH: &str = "user-entity-graph";
/// Eagerly loads the active detail only.
pub const USER_DETAIL_GRAPH: &str = "user-detail-graph";
/// Loads the user row alone.
pub const USER_SUMMARY_GRAPH: &str = "user-summary-graph";

/// Builds the catalog for the user/detail/skill tables.
pub fn user_catalog() -> Result<Catalog, CatalogError> {
    let user = EntityMeta::new(USER, "users", USER_ID)
        .column(USER_NAME, ColumnKind::Text)
        .relation(RelationMeta::to_one(DETAIL_RELATION, USER_DETAIL, USER_ID))
        .relation(RelationMeta::to_many(SKILLS_RELATION, USER_SKILL, USER_ID))
        .graph(USER_ENTITY_GRAPH, &[DETAIL_RELATION, SKILLS_RELATION])
        .graph(USER_DETAIL_GRAPH, &[DETAIL_RELATION])
        .graph(USER_SUMMARY_GRAPH, &[]);

    let detail = EntityMeta::new(USER_DETAIL, "user_details", DETAIL_ID)
        .column(DETAIL_CITY, ColumnKind::Text)
        .column(DETAIL_ACTIVE, ColumnKind::Bool)
        .column(USER_ID, ColumnKind::Integer);

    let skill = EntityMeta::new(USER_SKILL, "user_skills", SKILL_ID)
        .column(SKILL_NAME, ColumnKind::Text)
        .column(SKILL_DELETED, ColumnKind::Bool)
        .column(USER_ID, ColumnKind::Integer);

    Catalog::new([user, detail, skill])
}

/// Builds the visibility rules: details must be active, skills not deleted.
pub fn user_visibility() -> Result<VisibilityRegistry, VisibilityError> {
    let mut registry = VisibilityRegistry::new();
    registry.register(USER, VisibilityPredicate::Always)?;
    registry.register(USER_DETAIL, VisibilityPredicate::flag(DETAIL_ACTIVE, true))?;
    registry.register(USER_SKILL, VisibilityPredicate::flag(SKILL_DELETED, false))?;
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::catalog::Cardinality;

    #[test]
    fn user_catalog_declares_three_entities() {
        let catalog = user_catalog().unwrap();
        assert_eq!(catalog.len(), 3);

        let user = catalog.entity(USER).unwrap();
        assert_eq!(user.table, "users");
        let detail = user.find_relation(DETAIL_RELATION).unwrap();
        assert_eq!(detail.cardinality, Cardinality::ToOne);
        assert_eq!(detail.target, USER_DETAIL);
        let skills = user.find_relation(SKILLS_RELATION).unwrap();
        assert_eq!(skills.cardinality, Cardinality::ToMany);
        assert_eq!(skills.foreign_key, USER_ID);
    }

    #[test]
    fn user_visibility_covers_every_entity() {
        let registry = user_visibility().unwrap();
        for entity in [USER, USER_DETAIL, USER_SKILL] {
            assert!(registry.predicate_for(entity).is_ok(), "{entity} missing");
        }
    }
}
