//! Repository layer for the user tables.
//!
//! # Responsibility
//! - Own the write path used to seed scenario data.
//! - Keep insert SQL out of the resolver and services.
//!
//! # Invariants
//! - Repository APIs return semantic errors (`UserNotFound`, `BlankValue`)
//!   in addition to DB transport errors.

pub mod scenarios;
pub mod user_repo;
