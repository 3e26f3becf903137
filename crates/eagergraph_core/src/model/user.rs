//! User aggregate: one active detail, many visible skills.

use crate::graph::{RelationValue, ResolvedGraph};
use crate::meta::users::{
    DETAIL_ACTIVE, DETAIL_CITY, DETAIL_RELATION, SKILLS_RELATION, SKILL_DELETED, SKILL_NAME, USER,
    USER_DETAIL, USER_NAME, USER_SKILL,
};
use crate::model::{expect_entity, required, FromRow};
use crate::store::{Row, StoreError, StoreResult};
use serde::Serialize;
use std::hash::{Hash, Hasher};

pub type UserId = i64;
pub type DetailId = i64;
pub type SkillId = i64;

/// Root of the user graph.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    /// The single active detail row, if any.
    pub detail: Option<UserDetail>,
    /// Skills not flagged as deleted.
    pub skills: Vec<UserSkill>,
}

/// Historical detail row; at most one per user is active.
#[derive(Debug, Clone, Serialize)]
pub struct UserDetail {
    pub id: DetailId,
    pub city: String,
    pub active: bool,
}

/// Soft-deletable skill row.
#[derive(Debug, Clone, Serialize)]
pub struct UserSkill {
    pub id: SkillId,
    pub skill_name: String,
    pub deleted: bool,
}

impl User {
    /// Materializes a user from a graph resolved over `User`.
    ///
    /// Relations missing from the graph's plan stay empty.
    pub fn from_graph(graph: &ResolvedGraph) -> StoreResult<Self> {
        let mut user = Self::from_row(&graph.root)?;

        user.detail = match graph.relation(DETAIL_RELATION) {
            None | Some(RelationValue::One(None)) => None,
            Some(RelationValue::One(Some(row))) => Some(UserDetail::from_row(row)?),
            Some(RelationValue::Many(_)) => {
                return Err(relation_shape_error(DETAIL_RELATION, "to-one"));
            }
        };

        user.skills = match graph.relation(SKILLS_RELATION) {
            None => Vec::new(),
            Some(RelationValue::Many(rows)) => rows
                .iter()
                .map(UserSkill::from_row)
                .collect::<StoreResult<Vec<_>>>()?,
            Some(RelationValue::One(_)) => {
                return Err(relation_shape_error(SKILLS_RELATION, "to-many"));
            }
        };

        Ok(user)
    }

    /// Skill names, sorted, for order-insensitive comparisons.
    pub fn skill_names(&self) -> Vec<&str> {
        let mut names = self
            .skills
            .iter()
            .map(|skill| skill.skill_name.as_str())
            .collect::<Vec<_>>();
        names.sort_unstable();
        names
    }
}

impl FromRow for User {
    const ENTITY: &'static str = USER;

    fn from_row(row: &Row) -> StoreResult<Self> {
        expect_entity(row, Self::ENTITY)?;
        Ok(Self {
            id: row.key(),
            name: required(row, USER_NAME, row.text(USER_NAME)?)?.to_string(),
            detail: None,
            skills: Vec::new(),
        })
    }
}

impl FromRow for UserDetail {
    const ENTITY: &'static str = USER_DETAIL;

    fn from_row(row: &Row) -> StoreResult<Self> {
        expect_entity(row, Self::ENTITY)?;
        Ok(Self {
            id: row.key(),
            city: required(row, DETAIL_CITY, row.text(DETAIL_CITY)?)?.to_string(),
            active: required(row, DETAIL_ACTIVE, row.bool(DETAIL_ACTIVE)?)?,
        })
    }
}

impl FromRow for UserSkill {
    const ENTITY: &'static str = USER_SKILL;

    fn from_row(row: &Row) -> StoreResult<Self> {
        expect_entity(row, Self::ENTITY)?;
        Ok(Self {
            id: row.key(),
            skill_name: required(row, SKILL_NAME, row.text(SKILL_NAME)?)?.to_string(),
            deleted: required(row, SKILL_DELETED, row.bool(SKILL_DELETED)?)?,
        })
    }
}

fn relation_shape_error(relation: &str, expected: &str) -> StoreError {
    StoreError::InvalidData(format!(
        "relation `{relation}` resolved with the wrong shape; expected {expected}"
    ))
}

macro_rules! identity_by_key {
    ($($entity:ty),+) => {
        $(
            impl PartialEq for $entity {
                fn eq(&self, other: &Self) -> bool {
                    self.id == other.id
                }
            }

            impl Eq for $entity {}

            impl Hash for $entity {
                fn hash<H: Hasher>(&self, state: &mut H) {
                    self.id.hash(state);
                }
            }
        )+
    };
}

identity_by_key!(User, UserDetail, UserSkill);
