//! Attendance use-case service.
//!
//! # Responsibility
//! - Expose the family/member mutations a UI shell invokes.
//! - Recompute attendance aggregates from a fresh read after every mutation.
//! - Apply selection rules (family bulk toggle, guarded global reset).
//!
//! # Invariants
//! - Blank names never reach the repository.
//! - Calls against already-deleted families or members are no-ops, except
//!   `add_member`, which cannot create an orphan member.
//! - Bulk attendance changes are applied as one repository write.

use crate::model::attendance::AttendanceSummary;
use crate::model::family::{Family, FamilyId};
use crate::model::member::{FamilyMember, MemberId};
use crate::model::validation::{normalize_name, ValidationError};
use crate::repo::family_repo::{FamilyRepository, RepoError};
use log::{debug, info};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from attendance service operations.
#[derive(Debug)]
pub enum ServiceError {
    /// Input rejected before any write.
    Validation(ValidationError),
    /// Target family does not exist.
    FamilyNotFound(FamilyId),
    /// Repository-level failure.
    Repo(RepoError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::FamilyNotFound(id) => write!(f, "family not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::FamilyNotFound(_) => None,
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Validation(err),
            RepoError::FamilyNotFound(family_id) => Self::FamilyNotFound(family_id),
            other => Self::Repo(other),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Use-case facade over a family repository.
pub struct AttendanceService<R: FamilyRepository> {
    repo: R,
}

impl<R: FamilyRepository> AttendanceService<R> {
    /// Creates service from repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates an empty family.
    ///
    /// # Errors
    /// - `ServiceError::Validation` when the trimmed name is empty.
    pub fn create_family(&self, name: &str) -> ServiceResult<Family> {
        let name = normalize_name(name).ok_or(ValidationError::BlankFamilyName)?;
        let family = self.repo.create_family(name.as_str())?;
        info!(
            "event=family_create module=service status=ok family_id={}",
            family.id
        );
        Ok(family)
    }

    /// Deletes a family together with all of its members.
    ///
    /// Returns `false` when the family was already gone.
    pub fn delete_family(&self, family_id: FamilyId) -> ServiceResult<bool> {
        let removed = self.repo.delete_family(family_id)?;
        let status = if removed { "ok" } else { "skip" };
        info!("event=family_delete module=service status={status} family_id={family_id}");
        Ok(removed)
    }

    /// Lists every family with members, sorted by name.
    pub fn list_families(&self) -> ServiceResult<Vec<Family>> {
        Ok(self.repo.list_families()?)
    }

    pub fn get_family(&self, family_id: FamilyId) -> ServiceResult<Option<Family>> {
        Ok(self.repo.get_family(family_id)?)
    }

    pub fn get_member(&self, member_id: MemberId) -> ServiceResult<Option<FamilyMember>> {
        Ok(self.repo.get_member(member_id)?)
    }

    /// Members of one family in display order. Empty when the family is gone.
    pub fn sorted_members(&self, family_id: FamilyId) -> ServiceResult<Vec<FamilyMember>> {
        let members = match self.repo.get_family(family_id)? {
            Some(family) => family.sorted_members().into_iter().cloned().collect(),
            None => Vec::new(),
        };
        Ok(members)
    }

    /// Appends a non-attending member to the end of a family.
    ///
    /// # Errors
    /// - `ServiceError::Validation` when the trimmed name is empty.
    /// - `ServiceError::FamilyNotFound` when the family does not exist.
    pub fn add_member(
        &self,
        family_id: FamilyId,
        name: &str,
        is_adult: bool,
    ) -> ServiceResult<FamilyMember> {
        let name = normalize_name(name).ok_or(ValidationError::BlankMemberName)?;
        let member = self
            .repo
            .create_member(family_id, name.as_str(), is_adult)?;
        info!(
            "event=member_add module=service status=ok family_id={family_id} member_id={} sort_order={}",
            member.id, member.sort_order
        );
        Ok(member)
    }

    /// Deletes one member of one family. Other members keep their order keys.
    pub fn delete_member(&self, family_id: FamilyId, member_id: MemberId) -> ServiceResult<bool> {
        let removed = self.repo.delete_members(family_id, &[member_id])? > 0;
        let status = if removed { "ok" } else { "skip" };
        info!(
            "event=member_delete module=service status={status} family_id={family_id} member_id={member_id}"
        );
        Ok(removed)
    }

    /// Deletes the members at the given positions of the sorted view.
    ///
    /// Out-of-range offsets are ignored. Returns the number removed.
    pub fn delete_members_at(&self, family_id: FamilyId, offsets: &[usize]) -> ServiceResult<usize> {
        let Some(family) = self.repo.get_family(family_id)? else {
            return Ok(0);
        };
        let sorted = family.sorted_members();
        let member_ids: Vec<MemberId> = offsets
            .iter()
            .filter_map(|&offset| sorted.get(offset).map(|member| member.id))
            .collect();

        let removed = self.repo.delete_members(family_id, &member_ids)?;
        info!(
            "event=member_delete module=service status=ok family_id={family_id} removed={removed}"
        );
        Ok(removed)
    }

    /// Moves the member at `from_index` to `to_index` in the sorted view.
    ///
    /// `to_index` is clamped to the end. Every member's order key is rewritten
    /// to its new position. Returns `false` when `from_index` is out of range.
    pub fn move_member(
        &self,
        family_id: FamilyId,
        from_index: usize,
        to_index: usize,
    ) -> ServiceResult<bool> {
        let moved = self.repo.move_member(family_id, from_index, to_index)?;
        let status = if moved { "ok" } else { "skip" };
        info!(
            "event=member_move module=service status={status} family_id={family_id} from={from_index} to={to_index}"
        );
        Ok(moved)
    }

    /// Flips one member's attendance and returns the new state.
    ///
    /// Returns `None` when the member no longer exists.
    pub fn toggle_attendance(&self, member_id: MemberId) -> ServiceResult<Option<bool>> {
        let Some(mut member) = self.repo.get_member(member_id)? else {
            debug!("event=attendance_toggle module=service status=skip member_id={member_id}");
            return Ok(None);
        };
        let attending = member.toggle_attendance();
        self.repo.set_attendance(member_id, attending)?;
        debug!(
            "event=attendance_toggle module=service status=ok member_id={member_id} attending={attending}"
        );
        Ok(Some(attending))
    }

    /// Sets one member's attendance. Returns whether the member exists.
    pub fn set_attendance(&self, member_id: MemberId, attending: bool) -> ServiceResult<bool> {
        Ok(self.repo.set_attendance(member_id, attending)?)
    }

    /// Selects every member of a family, or clears them when all are selected.
    ///
    /// Returns the attendance value applied, or `None` when the family is
    /// gone or has no members.
    pub fn toggle_family_selection(&self, family_id: FamilyId) -> ServiceResult<Option<bool>> {
        let Some(family) = self.repo.get_family(family_id)? else {
            return Ok(None);
        };
        if !family.can_toggle_selection() {
            return Ok(None);
        }

        let attending = family.selection_target();
        let changed = self.repo.set_family_attendance(family_id, attending)?;
        info!(
            "event=family_selection_toggle module=service status=ok family_id={family_id} attending={attending} members={changed}"
        );
        Ok(Some(attending))
    }

    /// Clears attendance for everyone.
    ///
    /// Rejected as a no-op returning `false` when nobody is attending.
    pub fn reset_attendance(&self) -> ServiceResult<bool> {
        if !self.can_reset_attendance()? {
            debug!("event=attendance_reset module=service status=skip reason=nobody_attending");
            return Ok(false);
        }
        let changed = self.repo.reset_attendance()?;
        info!("event=attendance_reset module=service status=ok members={changed}");
        Ok(true)
    }

    /// Whether a global reset would change anything.
    pub fn can_reset_attendance(&self) -> ServiceResult<bool> {
        Ok(!self.attendance_summary()?.is_empty())
    }

    /// Attendance counts over every family, recomputed from current state.
    pub fn attendance_summary(&self) -> ServiceResult<AttendanceSummary> {
        let families = self.repo.list_families()?;
        Ok(AttendanceSummary::from_families(&families))
    }

    pub fn attending_adults(&self) -> ServiceResult<usize> {
        Ok(self.attendance_summary()?.attending_adults())
    }

    pub fn attending_children(&self) -> ServiceResult<usize> {
        Ok(self.attendance_summary()?.attending_children())
    }

    pub fn total_attending(&self) -> ServiceResult<usize> {
        Ok(self.attendance_summary()?.total_attending())
    }
}
