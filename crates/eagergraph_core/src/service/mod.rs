//! Use-case services over graph resolution.
//!
//! # Responsibility
//! - Expose `resolve_by_id` / `resolve_by_filter` to callers.
//! - Scope every resolution to one read session.
//! - Materialize the user graph into typed records.

pub mod graph_service;
pub mod user_service;
