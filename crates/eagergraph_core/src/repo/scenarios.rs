//! Seed data for the filtered eager-fetch scenarios.
//!
//! Each scenario is one user plus detail rows (`city`, `active`) and skill
//! rows (`skill_name`, `deleted`). Expected outcomes live next to the data.

use crate::model::user::UserId;
use crate::repo::user_repo::{RepoResult, UserRepository};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scenario {
    pub user_name: &'static str,
    pub details: &'static [(&'static str, bool)],
    pub skills: &'static [(&'static str, bool)],
    /// City of the only active detail, if any.
    pub expected_city: Option<&'static str>,
    /// Visible skill names, sorted.
    pub expected_skills: &'static [&'static str],
}

pub const ALICE: Scenario = Scenario {
    user_name: "Alice",
    details: &[],
    skills: &[],
    expected_city: None,
    expected_skills: &[],
};

pub const BOB: Scenario = Scenario {
    user_name: "Bob",
    details: &[("New York", false)],
    skills: &[],
    expected_city: None,
    expected_skills: &[],
};

pub const CHARLIE: Scenario = Scenario {
    user_name: "Charlie",
    details: &[("Paris", true)],
    skills: &[("Java", true)],
    expected_city: Some("Paris"),
    expected_skills: &[],
};

pub const DAVID: Scenario = Scenario {
    user_name: "David",
    details: &[("London", false), ("Rome", true)],
    skills: &[("Kotlin", false)],
    expected_city: Some("Rome"),
    expected_skills: &["Kotlin"],
};

pub const EVE: Scenario = Scenario {
    user_name: "Eve",
    details: &[("Moscow", false), ("Istanbul", false), ("Berlin", true)],
    skills: &[("Python", true), ("Ruby", false)],
    expected_city: Some("Berlin"),
    expected_skills: &["Ruby"],
};

pub const FRANK: Scenario = Scenario {
    user_name: "Frank",
    details: &[("Madrid", true)],
    skills: &[("Rust", true), ("Erlang", false), ("Go", false), ("C", true)],
    expected_city: Some("Madrid"),
    expected_skills: &["Erlang", "Go"],
};

pub const GRACE: Scenario = Scenario {
    user_name: "Grace",
    details: &[("Vienna", false), ("Barcelona", true)],
    skills: &[
        ("PHP", false),
        ("Swift", false),
        ("Dart", false),
        ("Scala", false),
    ],
    expected_city: Some("Barcelona"),
    expected_skills: &["Dart", "PHP", "Scala", "Swift"],
};

pub const SCENARIOS: &[Scenario] = &[ALICE, BOB, CHARLIE, DAVID, EVE, FRANK, GRACE];

/// Writes one scenario and returns the new user's id.
pub fn seed_scenario<R: UserRepository + ?Sized>(
    repo: &R,
    scenario: &Scenario,
) -> RepoResult<UserId> {
    let user_id = repo.create_user(scenario.user_name)?;
    for (city, active) in scenario.details {
        repo.create_detail(user_id, city, *active)?;
    }
    for (skill_name, deleted) in scenario.skills {
        repo.create_skill(user_id, skill_name, *deleted)?;
    }
    Ok(user_id)
}
