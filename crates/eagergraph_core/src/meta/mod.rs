//! Mapping metadata declared at startup.
//!
//! # Responsibility
//! - Describe entities, columns, relations and named eager-fetch graphs.
//! - Provide the user/detail/skill declarations used by the harness.
//!
//! # Invariants
//! - Metadata is built explicitly, never discovered at runtime.
//! - A built `Catalog` is immutable and safe to share across threads.

pub mod catalog;
pub mod users;
