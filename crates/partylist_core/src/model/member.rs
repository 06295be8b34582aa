//! Family member domain model.
//!
//! # Responsibility
//! - Define the per-person record with category and attendance state.
//!
//! # Invariants
//! - `family_id` always points at the owning family.
//! - `is_attending` starts as `false`.
//! - `name` is normalized and never blank.

use crate::model::family::FamilyId;
use crate::model::validation::{normalize_name, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for one family member.
pub type MemberId = Uuid;

/// Binary member category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberCategory {
    Adult,
    Child,
}

impl MemberCategory {
    /// User-facing label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Adult => "Adult",
            Self::Child => "Child",
        }
    }
}

impl From<bool> for MemberCategory {
    fn from(is_adult: bool) -> Self {
        if is_adult {
            Self::Adult
        } else {
            Self::Child
        }
    }
}

/// One person belonging to exactly one family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyMember {
    /// Stable member id.
    pub id: MemberId,
    /// Owning family. Relation only; ownership flows family -> members.
    pub family_id: FamilyId,
    /// Display name, immutable after creation.
    pub name: String,
    pub is_adult: bool,
    pub is_attending: bool,
    /// Display order key within the family. Gaps and ties are allowed.
    pub sort_order: i64,
}

impl FamilyMember {
    /// Creates a non-attending member with a generated id.
    ///
    /// # Errors
    /// - `ValidationError::BlankMemberName` when `name` is blank after trim.
    pub fn new(family_id: FamilyId, name: &str, is_adult: bool) -> Result<Self, ValidationError> {
        Self::with_id(Uuid::new_v4(), family_id, name, is_adult)
    }

    /// Creates a non-attending member with a caller-provided id.
    ///
    /// # Errors
    /// - `ValidationError::NilId` when `id` or `family_id` is nil.
    /// - `ValidationError::BlankMemberName` when `name` is blank after trim.
    pub fn with_id(
        id: MemberId,
        family_id: FamilyId,
        name: &str,
        is_adult: bool,
    ) -> Result<Self, ValidationError> {
        if id.is_nil() || family_id.is_nil() {
            return Err(ValidationError::NilId);
        }
        let name = normalize_name(name).ok_or(ValidationError::BlankMemberName)?;
        Ok(Self {
            id,
            family_id,
            name,
            is_adult,
            is_attending: false,
            sort_order: 0,
        })
    }

    pub fn category(&self) -> MemberCategory {
        MemberCategory::from(self.is_adult)
    }

    /// Returns `"Adult"` or `"Child"`.
    pub fn type_label(&self) -> &'static str {
        self.category().label()
    }

    /// Flips attendance and returns the new state.
    pub fn toggle_attendance(&mut self) -> bool {
        self.is_attending = !self.is_attending;
        self.is_attending
    }
}
