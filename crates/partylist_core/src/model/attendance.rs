//! Attendance aggregation.
//!
//! # Responsibility
//! - Count attending adults and children over any set of members.
//!
//! # Invariants
//! - `total_attending()` is derived from the two counters, so
//!   `total == adults + children` holds for every value of this type.
//! - Summaries are computed on demand and never cached across mutations.

use crate::model::family::Family;
use crate::model::member::FamilyMember;
use serde::Serialize;

/// Attendance counts for a set of members.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AttendanceSummary {
    attending_adults: usize,
    attending_children: usize,
}

impl AttendanceSummary {
    /// Aggregates over every member of every family.
    pub fn from_families(families: &[Family]) -> Self {
        Self::from_members(families.iter().flat_map(|family| family.members.iter()))
    }

    /// Aggregates over an arbitrary member iterator.
    pub fn from_members<'a>(members: impl IntoIterator<Item = &'a FamilyMember>) -> Self {
        members
            .into_iter()
            .filter(|member| member.is_attending)
            .fold(Self::default(), |mut summary, member| {
                if member.is_adult {
                    summary.attending_adults += 1;
                } else {
                    summary.attending_children += 1;
                }
                summary
            })
    }

    pub fn attending_adults(&self) -> usize {
        self.attending_adults
    }

    pub fn attending_children(&self) -> usize {
        self.attending_children
    }

    pub fn total_attending(&self) -> usize {
        self.attending_adults + self.attending_children
    }

    /// `true` when nobody is attending.
    pub fn is_empty(&self) -> bool {
        self.total_attending() == 0
    }
}
