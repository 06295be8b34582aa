//! Core domain logic for PartyList.
//! This crate is the single source of truth for family membership and
//! attendance invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::attendance::AttendanceSummary;
pub use model::family::{Family, FamilyId};
pub use model::member::{FamilyMember, MemberCategory, MemberId};
pub use model::validation::{normalize_name, ValidationError};
pub use repo::family_repo::{FamilyRepository, RepoError, RepoResult, SqliteFamilyRepository};
pub use service::attendance_service::{AttendanceService, ServiceError, ServiceResult};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
