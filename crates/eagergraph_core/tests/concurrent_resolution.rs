use eagergraph_core::{
    open_db, seed_scenario, SqliteUserRepository, UserGraphService, SCENARIOS,
};
use std::sync::Arc;
use std::thread;

#[test]
fn separate_connections_resolve_concurrently() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("concurrent.db");
    {
        let conn = open_db(&path).unwrap();
        let repo = SqliteUserRepository::new(&conn);
        for scenario in SCENARIOS {
            seed_scenario(&repo, scenario).unwrap();
        }
    }

    let service = Arc::new(UserGraphService::try_new().unwrap());
    let handles = (0..4)
        .map(|_| {
            let service = Arc::clone(&service);
            let path = path.clone();
            thread::spawn(move || {
                let mut conn = open_db(&path).unwrap();
                SCENARIOS
                    .iter()
                    .map(|scenario| {
                        let user = service
                            .find_user_by_name(&mut conn, scenario.user_name)
                            .unwrap()
                            .unwrap();
                        (
                            user.detail.map(|detail| detail.city),
                            user.skills.len(),
                        )
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect::<Vec<_>>();

    for handle in handles {
        let outcomes = handle.join().unwrap();
        for (scenario, (city, skills)) in SCENARIOS.iter().zip(outcomes) {
            assert_eq!(city.as_deref(), scenario.expected_city);
            assert_eq!(skills, scenario.expected_skills.len());
        }
    }
}
