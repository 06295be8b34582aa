//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the persistence contract the attendance service depends on.
//! - Isolate SQLite query details from use-case orchestration.
//!
//! # Invariants
//! - Repository writes build records through model constructors, so blank
//!   names are rejected before any SQL runs.
//! - Cascade deletes and batch updates are never half-applied.

pub mod family_repo;
