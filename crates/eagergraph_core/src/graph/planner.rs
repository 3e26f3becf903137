//! Graph fetch planner.
//!
//! Planning is a pure metadata lookup: it never touches a store.

use crate::graph::{GraphError, GraphResult};
use crate::meta::catalog::{Cardinality, Catalog, CollectionOrder};
use log::debug;

/// One relation to populate, resolved against the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationPlan {
    pub relation: &'static str,
    pub cardinality: Cardinality,
    pub target: &'static str,
    /// Column on `target` holding the root key.
    pub foreign_key: &'static str,
    pub order: CollectionOrder,
}

/// Ordered relation plan for one named graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphPlan {
    pub root: &'static str,
    pub graph: &'static str,
    pub relations: Vec<RelationPlan>,
}

impl GraphPlan {
    /// Round trips a resolution of this plan costs when the root exists.
    pub fn round_trips(&self) -> usize {
        1 + self.relations.len()
    }
}

pub struct GraphPlanner<'a> {
    catalog: &'a Catalog,
}

impl<'a> GraphPlanner<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    /// Resolves `graph` declared on `root` into relation plans, in
    /// declaration order.
    pub fn plan(&self, root: &str, graph: &str) -> GraphResult<GraphPlan> {
        let entity = self
            .catalog
            .entity(root)
            .ok_or_else(|| GraphError::UnknownEntity(root.to_string()))?;

        let (graph_name, relation_names) = entity
            .graph_entry(graph)
            .ok_or_else(|| GraphError::UnknownGraph {
                entity: entity.name.to_string(),
                graph: graph.to_string(),
            })?;

        let relations = relation_names
            .iter()
            .map(|relation_name| {
                entity
                    .find_relation(relation_name)
                    .map(|relation| RelationPlan {
                        relation: relation.name,
                        cardinality: relation.cardinality,
                        target: relation.target,
                        foreign_key: relation.foreign_key,
                        order: relation.order,
                    })
                    .ok_or_else(|| GraphError::UnknownRelation {
                        entity: entity.name.to_string(),
                        relation: (*relation_name).to_string(),
                    })
            })
            .collect::<GraphResult<Vec<_>>>()?;

        debug!(
            "event=graph_plan module=graph status=ok entity={} graph={} relations={}",
            entity.name,
            graph_name,
            relations.len()
        );

        Ok(GraphPlan {
            root: entity.name,
            graph: graph_name,
            relations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::GraphPlanner;
    use crate::graph::GraphError;
    use crate::meta::catalog::{Cardinality, Catalog, ColumnKind, EntityMeta, RelationMeta};
    use crate::meta::users::{
        user_catalog, DETAIL_RELATION, SKILLS_RELATION, USER, USER_DETAIL, USER_ENTITY_GRAPH,
        USER_ID, USER_SKILL, USER_SUMMARY_GRAPH,
    };

    #[test]
    fn plan_keeps_declaration_order_and_cardinality() {
        let catalog = user_catalog().unwrap();
        let plan = GraphPlanner::new(&catalog)
            .plan(USER, USER_ENTITY_GRAPH)
            .unwrap();

        assert_eq!(plan.root, USER);
        assert_eq!(plan.graph, USER_ENTITY_GRAPH);
        assert_eq!(plan.round_trips(), 3);

        let detail = plan.relations[0];
        assert_eq!(detail.relation, DETAIL_RELATION);
        assert_eq!(detail.cardinality, Cardinality::ToOne);
        assert_eq!(detail.target, USER_DETAIL);
        assert_eq!(detail.foreign_key, USER_ID);

        let skills = plan.relations[1];
        assert_eq!(skills.relation, SKILLS_RELATION);
        assert_eq!(skills.cardinality, Cardinality::ToMany);
        assert_eq!(skills.target, USER_SKILL);
    }

    #[test]
    fn empty_graph_plans_root_only() {
        let catalog = user_catalog().unwrap();
        let plan = GraphPlanner::new(&catalog)
            .plan(USER, USER_SUMMARY_GRAPH)
            .unwrap();
        assert!(plan.relations.is_empty());
        assert_eq!(plan.round_trips(), 1);
    }

    #[test]
    fn unknown_entity_and_graph_are_rejected() {
        let catalog = user_catalog().unwrap();
        let planner = GraphPlanner::new(&catalog);

        let err = planner.plan("Account", USER_ENTITY_GRAPH).unwrap_err();
        assert!(matches!(err, GraphError::UnknownEntity(entity) if entity == "Account"));

        let err = planner.plan(USER, "no-such-graph").unwrap_err();
        assert!(matches!(
            err,
            GraphError::UnknownGraph { entity, graph } if entity == USER && graph == "no-such-graph"
        ));
    }

    #[test]
    fn graph_naming_undeclared_relation_is_rejected() {
        let team = EntityMeta::new("Team", "teams", "team_id")
            .relation(RelationMeta::to_many("members", "Member", "team_id"))
            .graph("broken", &["members", "sponsors"]);
        let member = EntityMeta::new("Member", "members", "member_id")
            .column("team_id", ColumnKind::Integer);
        let catalog = Catalog::new([team, member]).unwrap();

        let err = GraphPlanner::new(&catalog)
            .plan("Team", "broken")
            .unwrap_err();
        assert!(matches!(
            err,
            GraphError::UnknownRelation { entity, relation } if entity == "Team" && relation == "sponsors"
        ));
    }
}
