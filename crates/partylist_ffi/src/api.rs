//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose family, member and attendance use-cases to the UI shell via FRB.
//! - Keep error semantics simple: envelopes with `ok` + `message`.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Ids cross the boundary as UUID strings; malformed ids yield failures.
//! - Every read returns freshly recomputed state; nothing is cached here.

use partylist_core::db::open_db;
use partylist_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    AttendanceService, Family, FamilyMember, ServiceError, SqliteFamilyRepository,
};
use log::warn;
use std::path::PathBuf;
use std::sync::OnceLock;
use uuid::Uuid;

const DB_FILE_NAME: &str = "partylist.sqlite3";
static DB_PATH: OnceLock<PathBuf> = OnceLock::new();

type Service<'conn> = AttendanceService<SqliteFamilyRepository<'conn>>;

/// Minimal health-check API for FRB smoke integration.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir`.
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// One member row as rendered by the UI shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberItem {
    pub member_id: String,
    pub name: String,
    /// `Adult` or `Child`.
    pub type_label: String,
    pub is_attending: bool,
}

/// One family section with members in display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FamilyItem {
    pub family_id: String,
    pub name: String,
    pub members: Vec<MemberItem>,
    pub fully_selected: bool,
    /// `false` for empty families.
    pub can_toggle_selection: bool,
    /// `Select All` or `Select None`.
    pub selection_label: String,
}

/// Family list envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FamilyListResponse {
    pub ok: bool,
    /// Families sorted by name (empty on failure).
    pub items: Vec<FamilyItem>,
    pub message: String,
}

/// Attendance counters envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceSummaryResponse {
    pub ok: bool,
    pub attending_adults: u32,
    pub attending_children: u32,
    pub total_attending: u32,
    /// Whether the reset action should be enabled.
    pub can_reset: bool,
    pub message: String,
}

/// Generic action response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    /// Whether operation succeeded.
    pub ok: bool,
    /// Created or affected record id, when there is one.
    pub id: Option<String>,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

impl ActionResponse {
    fn success(message: impl Into<String>, id: Option<String>) -> Self {
        Self {
            ok: true,
            id,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            id: None,
            message: message.into(),
        }
    }
}

/// Lists every family with members in display order.
#[flutter_rust_bridge::frb(sync)]
pub fn family_list() -> FamilyListResponse {
    match with_service(|service| service.list_families().map_err(|err| err.to_string())) {
        Ok(families) => {
            let items: Vec<FamilyItem> = families.iter().map(to_family_item).collect();
            let message = if items.is_empty() {
                "No families yet.".to_string()
            } else {
                format!("Loaded {} family(ies).", items.len())
            };
            FamilyListResponse {
                ok: true,
                items,
                message,
            }
        }
        Err(err) => FamilyListResponse {
            ok: false,
            items: Vec::new(),
            message: format!("family_list failed: {err}"),
        },
    }
}

/// Creates an empty family.
#[flutter_rust_bridge::frb(sync)]
pub fn family_create(name: String) -> ActionResponse {
    match with_service(|service| service.create_family(&name).map_err(service_message)) {
        Ok(family) => ActionResponse::success("Family created.", Some(family.id.to_string())),
        Err(err) => ActionResponse::failure(format!("family_create failed: {err}")),
    }
}

/// Deletes a family and all of its members. Unknown ids are a no-op.
#[flutter_rust_bridge::frb(sync)]
pub fn family_delete(family_id: String) -> ActionResponse {
    let result = parse_id(&family_id).and_then(|id| {
        with_service(|service| service.delete_family(id).map_err(service_message))
    });
    match result {
        Ok(true) => ActionResponse::success("Family deleted.", Some(family_id)),
        Ok(false) => ActionResponse::success("Family already deleted.", None),
        Err(err) => ActionResponse::failure(format!("family_delete failed: {err}")),
    }
}

/// Appends a member to a family.
#[flutter_rust_bridge::frb(sync)]
pub fn member_add(family_id: String, name: String, is_adult: bool) -> ActionResponse {
    let result = parse_id(&family_id).and_then(|id| {
        with_service(|service| {
            service
                .add_member(id, &name, is_adult)
                .map_err(service_message)
        })
    });
    match result {
        Ok(member) => ActionResponse::success("Member added.", Some(member.id.to_string())),
        Err(err) => ActionResponse::failure(format!("member_add failed: {err}")),
    }
}

/// Deletes one member of one family. Unknown ids are a no-op.
#[flutter_rust_bridge::frb(sync)]
pub fn member_delete(family_id: String, member_id: String) -> ActionResponse {
    let result = parse_id(&family_id)
        .and_then(|family| parse_id(&member_id).map(|member| (family, member)))
        .and_then(|(family, member)| {
            with_service(|service| {
                service
                    .delete_member(family, member)
                    .map_err(service_message)
            })
        });
    match result {
        Ok(true) => ActionResponse::success("Member deleted.", Some(member_id)),
        Ok(false) => ActionResponse::success("Member already deleted.", None),
        Err(err) => ActionResponse::failure(format!("member_delete failed: {err}")),
    }
}

/// Moves a member within the family's display order.
#[flutter_rust_bridge::frb(sync)]
pub fn member_move(family_id: String, from_index: u32, to_index: u32) -> ActionResponse {
    let result = parse_id(&family_id).and_then(|id| {
        with_service(|service| {
            service
                .move_member(id, from_index as usize, to_index as usize)
                .map_err(service_message)
        })
    });
    match result {
        Ok(true) => ActionResponse::success("Member moved.", Some(family_id)),
        Ok(false) => ActionResponse::success("Nothing to move.", None),
        Err(err) => ActionResponse::failure(format!("member_move failed: {err}")),
    }
}

/// Flips one member's attendance.
#[flutter_rust_bridge::frb(sync)]
pub fn attendance_toggle(member_id: String) -> ActionResponse {
    let result = parse_id(&member_id).and_then(|id| {
        with_service(|service| service.toggle_attendance(id).map_err(service_message))
    });
    match result {
        Ok(Some(true)) => ActionResponse::success("Attending.", Some(member_id)),
        Ok(Some(false)) => ActionResponse::success("Not attending.", Some(member_id)),
        Ok(None) => ActionResponse::success("Member no longer exists.", None),
        Err(err) => ActionResponse::failure(format!("attendance_toggle failed: {err}")),
    }
}

/// Selects all members of a family, or none when all are selected.
#[flutter_rust_bridge::frb(sync)]
pub fn family_selection_toggle(family_id: String) -> ActionResponse {
    let result = parse_id(&family_id).and_then(|id| {
        with_service(|service| {
            service
                .toggle_family_selection(id)
                .map_err(service_message)
        })
    });
    match result {
        Ok(Some(true)) => ActionResponse::success("All selected.", Some(family_id)),
        Ok(Some(false)) => ActionResponse::success("None selected.", Some(family_id)),
        Ok(None) => ActionResponse::success("Nothing to select.", None),
        Err(err) => ActionResponse::failure(format!("family_selection_toggle failed: {err}")),
    }
}

/// Clears attendance for everyone.
///
/// Returns `ok=false` without changes when nobody is attending.
#[flutter_rust_bridge::frb(sync)]
pub fn attendance_reset() -> ActionResponse {
    match with_service(|service| service.reset_attendance().map_err(service_message)) {
        Ok(true) => ActionResponse::success("Attendance reset.", None),
        Ok(false) => ActionResponse::failure("Nobody is attending."),
        Err(err) => ActionResponse::failure(format!("attendance_reset failed: {err}")),
    }
}

/// Current attendance counters across every family.
#[flutter_rust_bridge::frb(sync)]
pub fn attendance_summary() -> AttendanceSummaryResponse {
    match with_service(|service| service.attendance_summary().map_err(service_message)) {
        Ok(summary) => AttendanceSummaryResponse {
            ok: true,
            attending_adults: to_u32(summary.attending_adults()),
            attending_children: to_u32(summary.attending_children()),
            total_attending: to_u32(summary.total_attending()),
            can_reset: !summary.is_empty(),
            message: String::new(),
        },
        Err(err) => AttendanceSummaryResponse {
            ok: false,
            attending_adults: 0,
            attending_children: 0,
            total_attending: 0,
            can_reset: false,
            message: format!("attendance_summary failed: {err}"),
        },
    }
}

fn resolve_db_path() -> PathBuf {
    DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var("PARTYLIST_DB_PATH") {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(DB_FILE_NAME)
        })
        .clone()
}

fn with_service<T>(f: impl FnOnce(&Service<'_>) -> Result<T, String>) -> Result<T, String> {
    let db_path = resolve_db_path();
    let conn = open_db(&db_path).map_err(|err| {
        warn!("event=ffi_db_open module=ffi status=error error={err}");
        format!("DB open failed: {err}")
    })?;
    let repo = SqliteFamilyRepository::try_new(&conn).map_err(|err| {
        warn!("event=ffi_repo_init module=ffi status=error error={err}");
        format!("repo init failed: {err}")
    })?;
    let service = AttendanceService::new(repo);
    f(&service)
}

fn parse_id(value: &str) -> Result<Uuid, String> {
    Uuid::parse_str(value.trim()).map_err(|_| {
        warn!("event=ffi_parse_id module=ffi status=error");
        format!("invalid id `{value}`")
    })
}

fn service_message(err: ServiceError) -> String {
    err.to_string()
}

fn to_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

fn to_member_item(member: &FamilyMember) -> MemberItem {
    MemberItem {
        member_id: member.id.to_string(),
        name: member.name.clone(),
        type_label: member.type_label().to_string(),
        is_attending: member.is_attending,
    }
}

fn to_family_item(family: &Family) -> FamilyItem {
    FamilyItem {
        family_id: family.id.to_string(),
        name: family.name.clone(),
        members: family
            .sorted_members()
            .into_iter()
            .map(to_member_item)
            .collect(),
        fully_selected: family.is_fully_selected(),
        can_toggle_selection: family.can_toggle_selection(),
        selection_label: family.selection_label().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        attendance_summary, attendance_toggle, core_version, family_create, family_delete,
        family_list, family_selection_toggle, init_logging, member_add, member_delete,
        member_move, ping,
    };
    use partylist_core::db::open_db;
    use std::time::{SystemTime, UNIX_EPOCH};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        let error = init_logging("info".to_string(), String::new());
        assert!(!error.is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "tmp/logs".to_string());
        assert!(!error.is_empty());
    }

    #[test]
    fn family_create_rejects_blank_name() {
        let response = family_create("   ".to_string());
        assert!(!response.ok);
        assert!(response.message.contains("must not be blank"));
    }

    #[test]
    fn malformed_ids_are_reported_as_failures() {
        let response = member_add("not-a-uuid".to_string(), "Alice".to_string(), true);
        assert!(!response.ok);
        assert!(response.message.contains("invalid id"));

        assert!(!attendance_toggle("nope".to_string()).ok);
        assert!(!member_delete("nope".to_string(), "nope".to_string()).ok);
    }

    #[test]
    fn family_flow_is_visible_through_family_list() {
        let name = unique_token("family-flow");
        let family = family_create(name.clone());
        assert!(family.ok, "{}", family.message);
        let family_id = family.id.expect("family create should return id");

        let alice = member_add(family_id.clone(), "Alice".to_string(), true);
        let bob = member_add(family_id.clone(), "Bob".to_string(), false);
        assert!(alice.ok && bob.ok);

        let moved = member_move(family_id.clone(), 0, 1);
        assert!(moved.ok, "{}", moved.message);

        let selected = family_selection_toggle(family_id.clone());
        assert_eq!(selected.message, "All selected.");

        let listed = family_list();
        assert!(listed.ok, "{}", listed.message);
        let item = listed
            .items
            .iter()
            .find(|item| item.family_id == family_id)
            .expect("created family should be listed");
        assert_eq!(item.name, name);
        let names: Vec<&str> = item.members.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["Bob", "Alice"]);
        assert_eq!(item.members[0].type_label, "Child");
        assert!(item.fully_selected);
        assert_eq!(item.selection_label, "Select None");

        let deleted = family_delete(family_id.clone());
        assert!(deleted.ok, "{}", deleted.message);

        let conn = open_db(super::resolve_db_path()).expect("open db");
        let remaining: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM family_members WHERE family_uuid = ?1",
                [family_id.as_str()],
                |row| row.get(0),
            )
            .expect("count members");
        assert_eq!(remaining, 0);
    }

    #[test]
    fn attendance_summary_reports_consistent_totals() {
        let summary = attendance_summary();
        assert!(summary.ok, "{}", summary.message);
        assert_eq!(
            summary.total_attending,
            summary.attending_adults + summary.attending_children
        );
    }

    fn unique_token(prefix: &str) -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time went backwards")
            .as_nanos();
        format!("{prefix}-{nanos}")
    }
}
