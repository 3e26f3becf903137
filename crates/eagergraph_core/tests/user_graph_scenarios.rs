use eagergraph_core::meta::users::{USER, USER_DETAIL, USER_DETAIL_GRAPH, USER_SUMMARY_GRAPH};
use eagergraph_core::{
    open_db_in_memory, seed_scenario, GraphError, RepoError, RowFilter, Scenario,
    SqliteUserRepository, User, UserGraphService, UserRepository, SCENARIOS,
};
use rusqlite::Connection;

fn seeded(scenarios: &[Scenario]) -> (Connection, Vec<i64>) {
    let conn = open_db_in_memory().unwrap();
    let ids = {
        let repo = SqliteUserRepository::new(&conn);
        scenarios
            .iter()
            .map(|scenario| seed_scenario(&repo, scenario).unwrap())
            .collect::<Vec<_>>()
    };
    (conn, ids)
}

fn assert_matches_scenario(user: &User, scenario: &Scenario) {
    assert_eq!(user.name, scenario.user_name);
    assert_eq!(
        user.detail.as_ref().map(|detail| detail.city.as_str()),
        scenario.expected_city,
        "detail of {}",
        scenario.user_name
    );
    if let Some(detail) = &user.detail {
        assert!(detail.active, "{} exposes an inactive detail", user.name);
    }
    assert!(
        user.skills.iter().all(|skill| !skill.deleted),
        "{} exposes a deleted skill",
        user.name
    );
    assert_eq!(
        user.skill_names(),
        scenario.expected_skills,
        "skills of {}",
        scenario.user_name
    );
}

#[test]
fn every_scenario_resolves_by_id() {
    let (mut conn, ids) = seeded(SCENARIOS);
    let service = UserGraphService::try_new().unwrap();

    for (scenario, id) in SCENARIOS.iter().zip(ids) {
        let user = service.find_user_by_id(&mut conn, id).unwrap().unwrap();
        assert_eq!(user.id, id);
        assert_matches_scenario(&user, scenario);
    }
}

#[test]
fn every_scenario_resolves_by_name() {
    let (mut conn, ids) = seeded(SCENARIOS);
    let service = UserGraphService::try_new().unwrap();

    for (scenario, id) in SCENARIOS.iter().zip(ids) {
        let user = service
            .find_user_by_name(&mut conn, scenario.user_name)
            .unwrap()
            .unwrap();
        assert_eq!(user.id, id);
        assert_matches_scenario(&user, scenario);
    }
}

#[test]
fn scenarios_resolve_the_same_way_after_reset() {
    let (mut conn, _) = seeded(SCENARIOS);
    let service = UserGraphService::try_new().unwrap();

    for scenario in SCENARIOS {
        SqliteUserRepository::new(&conn).delete_all().unwrap();
        let id = seed_scenario(&SqliteUserRepository::new(&conn), scenario).unwrap();

        let user = service.find_user_by_id(&mut conn, id).unwrap().unwrap();
        assert_matches_scenario(&user, scenario);
        assert_eq!(SqliteUserRepository::new(&conn).count_users().unwrap(), 1);
    }
}

#[test]
fn missing_user_is_none_not_an_error() {
    let (mut conn, _) = seeded(SCENARIOS);
    let service = UserGraphService::try_new().unwrap();

    assert!(service.find_user_by_id(&mut conn, 9_999).unwrap().is_none());
    assert!(service
        .find_user_by_name(&mut conn, "Mallory")
        .unwrap()
        .is_none());
}

#[test]
fn resolution_is_idempotent_without_writes() {
    let (mut conn, ids) = seeded(SCENARIOS);
    let service = UserGraphService::try_new().unwrap();

    for id in ids {
        let first = service.find_user_by_id(&mut conn, id).unwrap();
        let second = service.find_user_by_id(&mut conn, id).unwrap();
        assert_eq!(
            serde_json::to_value(&first).unwrap(),
            serde_json::to_value(&second).unwrap()
        );
    }
}

#[test]
fn two_active_details_fail_with_multiple_active_rows() {
    let (mut conn, _) = seeded(&[]);
    let user_id = {
        let repo = SqliteUserRepository::new(&conn);
        let user_id = repo.create_user("Heidi").unwrap();
        repo.create_detail(user_id, "Oslo", true).unwrap();
        repo.create_detail(user_id, "Bergen", true).unwrap();
        repo.create_detail(user_id, "Tromso", false).unwrap();
        user_id
    };
    let service = UserGraphService::try_new().unwrap();

    let err = service.find_user_by_id(&mut conn, user_id).unwrap_err();
    match err {
        GraphError::MultipleActiveRows {
            entity,
            key,
            relation,
            target,
            count,
        } => {
            assert_eq!(entity, USER);
            assert_eq!(key, user_id);
            assert_eq!(relation, "detail");
            assert_eq!(target, USER_DETAIL);
            assert_eq!(count, 2);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn duplicate_names_fail_with_non_unique_result() {
    let (mut conn, _) = seeded(&[SCENARIOS[0], SCENARIOS[0]]);
    let service = UserGraphService::try_new().unwrap();

    let err = service
        .find_user_by_name(&mut conn, SCENARIOS[0].user_name)
        .unwrap_err();
    assert!(matches!(
        err,
        GraphError::NonUniqueResult { ref entity, count: 2, .. } if entity == USER
    ));
    assert_eq!(err.code(), "non_unique_result");
}

#[test]
fn narrower_graphs_leave_unplanned_relations_empty() {
    let (mut conn, ids) = seeded(SCENARIOS);
    let service = UserGraphService::try_new().unwrap();
    let frank = SCENARIOS
        .iter()
        .position(|scenario| scenario.user_name == "Frank")
        .unwrap();
    let id = ids[frank];

    let detail_only = service
        .graphs()
        .resolve_by_id(&mut conn, USER, USER_DETAIL_GRAPH, id)
        .unwrap()
        .unwrap();
    let user = User::from_graph(&detail_only).unwrap();
    assert_eq!(user.detail.unwrap().city, "Madrid");
    assert!(user.skills.is_empty());

    let summary = service
        .graphs()
        .resolve_by_filter(
            &mut conn,
            USER,
            USER_SUMMARY_GRAPH,
            &RowFilter::eq("user_name", "Frank"),
        )
        .unwrap()
        .unwrap();
    assert!(summary.relations.is_empty());
    assert_eq!(summary.root.key(), id);
}

#[test]
fn unknown_graph_is_a_configuration_error() {
    let (mut conn, ids) = seeded(SCENARIOS);
    let service = UserGraphService::try_new().unwrap();

    let err = service
        .graphs()
        .resolve_by_id(&mut conn, USER, "user-everything-graph", ids[0])
        .unwrap_err();
    assert!(matches!(err, GraphError::UnknownGraph { .. }));
}

#[test]
fn repository_rejects_orphans_and_blank_values() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::new(&conn);

    let err = repo.create_skill(77, "Rust", false).unwrap_err();
    assert!(matches!(err, RepoError::UserNotFound(77)));

    let err = repo.create_user("   ").unwrap_err();
    assert!(matches!(err, RepoError::BlankValue(_)));

    let user_id = repo.create_user("Ivan").unwrap();
    let err = repo.create_detail(user_id, "", true).unwrap_err();
    assert!(matches!(err, RepoError::BlankValue(_)));
    assert_eq!(repo.count_users().unwrap(), 1);
}

#[test]
fn failed_resolution_releases_the_read_session() {
    let (mut conn, ids) = seeded(&[SCENARIOS[3]]);
    let user_id = {
        let repo = SqliteUserRepository::new(&conn);
        let user_id = repo.create_user("Mallory").unwrap();
        repo.create_detail(user_id, "Oslo", true).unwrap();
        repo.create_detail(user_id, "Bergen", true).unwrap();
        user_id
    };
    let service = UserGraphService::try_new().unwrap();

    let err = service.find_user_by_id(&mut conn, user_id).unwrap_err();
    assert!(matches!(err, GraphError::MultipleActiveRows { .. }));
    assert!(conn.is_autocommit());

    assert!(service
        .find_user_by_name(&mut conn, "nobody")
        .unwrap()
        .is_none());
    let david = service.find_user_by_id(&mut conn, ids[0]).unwrap().unwrap();
    assert_matches_scenario(&david, &SCENARIOS[3]);

    // Writes still work, so no transaction was left open.
    SqliteUserRepository::new(&conn).delete_all().unwrap();
    assert!(conn.is_autocommit());
}

#[test]
fn names_with_surrounding_whitespace_resolve_as_written() {
    let (mut conn, _) = seeded(&[]);
    let user_id = SqliteUserRepository::new(&conn)
        .create_user(" Alice ")
        .unwrap();
    let service = UserGraphService::try_new().unwrap();

    let user = service
        .find_user_by_name(&mut conn, " Alice ")
        .unwrap()
        .unwrap();
    assert_eq!(user.id, user_id);
    assert_eq!(user.name, " Alice ");
    assert!(service
        .find_user_by_name(&mut conn, "Alice")
        .unwrap()
        .is_none());
}
