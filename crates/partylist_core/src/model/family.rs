//! Family domain model.
//!
//! # Responsibility
//! - Define the named group that exclusively owns its members.
//! - Provide the stable sorted view and family-level selection state.
//!
//! # Invariants
//! - `members` is kept in insertion order; display order is derived.
//! - An empty family is never fully selected.
//! - Deleting a family deletes all of its members.

use crate::model::attendance::AttendanceSummary;
use crate::model::member::FamilyMember;
use crate::model::validation::{normalize_name, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for one family.
pub type FamilyId = Uuid;

/// Named group owning an ordered list of members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Family {
    /// Stable family id.
    pub id: FamilyId,
    /// Display name. Not unique.
    pub name: String,
    /// Members in insertion order.
    pub members: Vec<FamilyMember>,
}

impl Family {
    /// Creates an empty family with a generated id.
    ///
    /// # Errors
    /// - `ValidationError::BlankFamilyName` when `name` is blank after trim.
    pub fn new(name: &str) -> Result<Self, ValidationError> {
        Self::with_id(Uuid::new_v4(), name)
    }

    /// Creates an empty family with a caller-provided id.
    ///
    /// # Errors
    /// - `ValidationError::NilId` when `id` is nil.
    /// - `ValidationError::BlankFamilyName` when `name` is blank after trim.
    pub fn with_id(id: FamilyId, name: &str) -> Result<Self, ValidationError> {
        if id.is_nil() {
            return Err(ValidationError::NilId);
        }
        let name = normalize_name(name).ok_or(ValidationError::BlankFamilyName)?;
        Ok(Self {
            id,
            name,
            members: Vec::new(),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Members ordered ascending by `sort_order`.
    ///
    /// The sort is stable, so equal keys keep insertion order. Calling this
    /// twice without mutation yields identical sequences.
    pub fn sorted_members(&self) -> Vec<&FamilyMember> {
        let mut sorted: Vec<&FamilyMember> = self.members.iter().collect();
        sorted.sort_by_key(|member| member.sort_order);
        sorted
    }

    /// Order key that places a new member after every existing one.
    ///
    /// Equals the member count while orders are contiguous from zero.
    pub fn next_sort_order(&self) -> i64 {
        self.members
            .iter()
            .map(|member| member.sort_order + 1)
            .max()
            .unwrap_or(0)
    }

    /// `true` iff the family has members and every one is attending.
    pub fn is_fully_selected(&self) -> bool {
        !self.members.is_empty() && self.members.iter().all(|member| member.is_attending)
    }

    /// Bulk selection is meaningless for an empty family.
    pub fn can_toggle_selection(&self) -> bool {
        !self.members.is_empty()
    }

    /// Attendance value a selection toggle would apply to every member.
    pub fn selection_target(&self) -> bool {
        !self.is_fully_selected()
    }

    /// Label for the family selection action.
    pub fn selection_label(&self) -> &'static str {
        if self.is_fully_selected() {
            "Select None"
        } else {
            "Select All"
        }
    }

    /// Attendance counts scoped to this family.
    pub fn attendance(&self) -> AttendanceSummary {
        AttendanceSummary::from_members(self.members.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::Family;
    use crate::model::member::FamilyMember;

    fn member(family: &Family, name: &str, sort_order: i64) -> FamilyMember {
        let mut member = FamilyMember::new(family.id, name, true).unwrap();
        member.sort_order = sort_order;
        member
    }

    #[test]
    fn sorted_members_is_stable_for_equal_orders() {
        let mut family = Family::new("Smith").unwrap();
        family.members.push(member(&family, "Alice", 0));
        family.members.push(member(&family, "Bob", 0));
        family.members.push(member(&family, "Cleo", 0));

        let names: Vec<&str> = family
            .sorted_members()
            .into_iter()
            .map(|m| m.name.as_str())
            .collect();
        assert_eq!(names, ["Alice", "Bob", "Cleo"]);
        assert_eq!(family.sorted_members(), family.sorted_members());
    }

    #[test]
    fn sorted_members_orders_by_sort_key() {
        let mut family = Family::new("Smith").unwrap();
        family.members.push(member(&family, "Alice", 5));
        family.members.push(member(&family, "Bob", 1));
        family.members.push(member(&family, "Cleo", 3));

        let names: Vec<&str> = family
            .sorted_members()
            .into_iter()
            .map(|m| m.name.as_str())
            .collect();
        assert_eq!(names, ["Bob", "Cleo", "Alice"]);
    }

    #[test]
    fn next_sort_order_appends_past_gaps() {
        let mut family = Family::new("Smith").unwrap();
        assert_eq!(family.next_sort_order(), 0);

        family.members.push(member(&family, "Alice", 2));
        family.members.push(member(&family, "Bob", 3));
        assert_eq!(family.next_sort_order(), 4);
    }

    #[test]
    fn empty_family_is_never_fully_selected() {
        let family = Family::new("Empty").unwrap();
        assert!(!family.is_fully_selected());
        assert!(!family.can_toggle_selection());
        assert_eq!(family.selection_label(), "Select All");
    }

    #[test]
    fn selection_label_follows_full_selection() {
        let mut family = Family::new("Smith").unwrap();
        family.members.push(member(&family, "Alice", 0));
        family.members.push(member(&family, "Bob", 1));

        family.members[0].is_attending = true;
        assert!(!family.is_fully_selected());
        assert!(family.selection_target());

        family.members[1].is_attending = true;
        assert!(family.is_fully_selected());
        assert!(!family.selection_target());
        assert_eq!(family.selection_label(), "Select None");
    }
}
