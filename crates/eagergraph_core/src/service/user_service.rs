//! Typed lookups over the user entity graph.

use crate::graph::{GraphError, GraphResult, ResolvedGraph};
use crate::meta::users::{user_catalog, user_visibility, USER, USER_ENTITY_GRAPH, USER_NAME};
use crate::model::user::{User, UserId};
use crate::service::graph_service::GraphService;
use crate::store::RowFilter;
use rusqlite::Connection;

/// Finds users with their active detail and visible skills loaded eagerly.
#[derive(Debug, Clone)]
pub struct UserGraphService {
    graphs: GraphService,
}

impl UserGraphService {
    /// Builds the service from the user catalog and visibility rules.
    pub fn try_new() -> GraphResult<Self> {
        Ok(Self {
            graphs: GraphService::new(user_catalog()?, user_visibility()?),
        })
    }

    pub fn graphs(&self) -> &GraphService {
        &self.graphs
    }

    /// Loads one user by id through `user-entity-graph`.
    pub fn find_user_by_id(&self, conn: &mut Connection, id: UserId) -> GraphResult<Option<User>> {
        let graph = self
            .graphs
            .resolve_by_id(conn, USER, USER_ENTITY_GRAPH, id)?;
        materialize(graph)
    }

    /// Loads the one user named `name` through `user-entity-graph`.
    ///
    /// # Errors
    /// - `NonUniqueResult` when several users share the name.
    pub fn find_user_by_name(
        &self,
        conn: &mut Connection,
        name: &str,
    ) -> GraphResult<Option<User>> {
        let filter = RowFilter::eq(USER_NAME, name);
        let graph = self
            .graphs
            .resolve_by_filter(conn, USER, USER_ENTITY_GRAPH, &filter)?;
        materialize(graph)
    }
}

fn materialize(graph: Option<ResolvedGraph>) -> GraphResult<Option<User>> {
    graph
        .as_ref()
        .map(User::from_graph)
        .transpose()
        .map_err(GraphError::from)
}

#[cfg(test)]
mod tests {
    use super::UserGraphService;
    use crate::db::open_db_in_memory;
    use crate::meta::users::{USER, USER_DETAIL, USER_SKILL};
    use crate::repo::scenarios::{seed_scenario, EVE};
    use crate::repo::user_repo::SqliteUserRepository;

    #[test]
    fn try_new_registers_every_user_entity() {
        let service = UserGraphService::try_new().unwrap();
        assert_eq!(service.graphs().catalog().len(), 3);
        assert_eq!(
            service.graphs().registry().entities(),
            vec![USER, USER_DETAIL, USER_SKILL]
        );
    }

    #[test]
    fn lookups_by_id_and_name_agree() {
        let mut conn = open_db_in_memory().unwrap();
        let id = seed_scenario(&SqliteUserRepository::new(&conn), &EVE).unwrap();
        let service = UserGraphService::try_new().unwrap();

        let by_id = service.find_user_by_id(&mut conn, id).unwrap().unwrap();
        let by_name = service
            .find_user_by_name(&mut conn, EVE.user_name)
            .unwrap()
            .unwrap();
        assert_eq!(by_id, by_name);
        assert_eq!(by_id.detail.as_ref().map(|d| d.city.as_str()), Some("Berlin"));
        assert_eq!(by_name.skill_names(), vec!["Ruby"]);
    }
}
