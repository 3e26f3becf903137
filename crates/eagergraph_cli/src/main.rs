//! CLI demo entry point.
//!
//! # Responsibility
//! - Seed the user scenarios into a database and resolve each user through
//!   `user-entity-graph`.
//! - Print one JSON document per user so the filtered graphs can be eyeballed.
//!
//! Usage: `eagergraph [DB_PATH]`. Without a path an in-memory database is used.
//! `EAGERGRAPH_LOG_DIR` (absolute) enables file logging at
//! `EAGERGRAPH_LOG_LEVEL` or the build's default level.

use eagergraph_core::{
    core_version, default_log_level, init_logging, open_db, open_db_in_memory, seed_scenario,
    SqliteUserRepository, UserGraphService, UserRepository, SCENARIOS,
};
use log::info;
use rusqlite::Connection;
use std::error::Error;
use std::process::ExitCode;

const LOG_DIR_ENV: &str = "EAGERGRAPH_LOG_DIR";
const LOG_LEVEL_ENV: &str = "EAGERGRAPH_LOG_LEVEL";

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("eagergraph: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    if let Ok(log_dir) = std::env::var(LOG_DIR_ENV) {
        let level = std::env::var(LOG_LEVEL_ENV).unwrap_or_else(|_| default_log_level().into());
        init_logging(&level, &log_dir)?;
    }

    println!("eagergraph_core version={}", core_version());

    let mut conn = match std::env::args().nth(1) {
        Some(path) => open_db(path)?,
        None => open_db_in_memory()?,
    };
    let seeded = seed_if_empty(&conn)?;
    info!("event=cli_seed module=cli status=ok seeded={seeded}");

    let service = UserGraphService::try_new()?;
    for scenario in SCENARIOS {
        match service.find_user_by_name(&mut conn, scenario.user_name)? {
            Some(user) => println!("{}", serde_json::to_string_pretty(&user)?),
            None => println!("{}: not found", scenario.user_name),
        }
    }
    Ok(())
}

/// Seeds every scenario into an empty database; returns how many were written.
fn seed_if_empty(conn: &Connection) -> Result<usize, Box<dyn Error>> {
    let repo = SqliteUserRepository::new(conn);
    if repo.count_users()? > 0 {
        return Ok(0);
    }
    for scenario in SCENARIOS {
        seed_scenario(&repo, scenario)?;
    }
    Ok(SCENARIOS.len())
}
