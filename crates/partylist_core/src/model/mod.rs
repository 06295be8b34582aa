//! Domain model for families, members and attendance.
//!
//! # Responsibility
//! - Define canonical records shared by store, service and FFI layers.
//! - Own the pure derivations: sorted view, selection state, aggregates.
//!
//! # Invariants
//! - Every record is identified by a stable UUID that survives reloads.
//! - A member always references exactly one owning family.
//! - Attendance totals are derived, never stored.

pub mod attendance;
pub mod family;
pub mod member;
pub mod validation;
