//! Family repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist families and members with stable identities.
//! - Keep SQL, ordering and cascade details inside the repository boundary.
//!
//! # Invariants
//! - Families are listed by name, ties by creation order.
//! - Members are loaded in insertion order (`rowid ASC`); the sorted view is
//!   derived from that order, so ties resolve the same after every reload.
//! - Multi-row writes run in one `IMMEDIATE` transaction.
//! - Deleting a family removes its members explicitly, in the same transaction.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::family::{Family, FamilyId};
use crate::model::member::{FamilyMember, MemberId};
use crate::model::validation::ValidationError;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const FAMILY_SELECT_SQL: &str = "SELECT uuid, name FROM families";

const MEMBER_SELECT_SQL: &str = "SELECT
    uuid,
    family_uuid,
    name,
    is_adult,
    is_attending,
    sort_order
FROM family_members";

const FAMILY_COLUMNS: &[&str] = &["uuid", "name", "created_at", "updated_at"];

const MEMBER_COLUMNS: &[&str] = &[
    "uuid",
    "family_uuid",
    "name",
    "is_adult",
    "is_attending",
    "sort_order",
    "created_at",
    "updated_at",
];

/// Result type used by family repository operations.
pub type RepoResult<T> = Result<T, RepoError>;

/// Errors from family repository operations.
#[derive(Debug)]
pub enum RepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Record failed model validation before write.
    Validation(ValidationError),
    /// Target family does not exist.
    FamilyNotFound(FamilyId),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Persisted data cannot be converted to a valid model.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::FamilyNotFound(id) => write!(f, "family not found: {id}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "family repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "family repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "family repository requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted family data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Validation(err) => Some(err),
            Self::FamilyNotFound(_) => None,
            Self::UninitializedConnection { .. } => None,
            Self::MissingRequiredTable(_) => None,
            Self::MissingRequiredColumn { .. } => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Repository interface for families and their members.
pub trait FamilyRepository {
    /// Persists one new, empty family.
    fn create_family(&self, name: &str) -> RepoResult<Family>;
    /// Loads one family with members.
    fn get_family(&self, family_id: FamilyId) -> RepoResult<Option<Family>>;
    /// Lists every family with members, sorted by name.
    fn list_families(&self) -> RepoResult<Vec<Family>>;
    /// Deletes one family and all of its members. Returns whether it existed.
    fn delete_family(&self, family_id: FamilyId) -> RepoResult<bool>;
    /// Appends one non-attending member to the end of a family.
    fn create_member(&self, family_id: FamilyId, name: &str, is_adult: bool)
        -> RepoResult<FamilyMember>;
    /// Loads one member by id.
    fn get_member(&self, member_id: MemberId) -> RepoResult<Option<FamilyMember>>;
    /// Deletes the given members of one family. Returns the number removed.
    fn delete_members(&self, family_id: FamilyId, member_ids: &[MemberId]) -> RepoResult<usize>;
    /// Moves one member within the sorted view and rewrites orders to `0..n-1`.
    ///
    /// Returns `false` when `from_index` does not address a member.
    fn move_member(&self, family_id: FamilyId, from_index: usize, to_index: usize)
        -> RepoResult<bool>;
    /// Sets attendance for one member. Returns whether the member exists.
    fn set_attendance(&self, member_id: MemberId, attending: bool) -> RepoResult<bool>;
    /// Sets attendance for every member of one family in a single statement.
    fn set_family_attendance(&self, family_id: FamilyId, attending: bool) -> RepoResult<usize>;
    /// Clears attendance for every member. Returns the number of rows changed.
    fn reset_attendance(&self) -> RepoResult<usize>;
}

/// SQLite-backed family repository.
pub struct SqliteFamilyRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteFamilyRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_family_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl FamilyRepository for SqliteFamilyRepository<'_> {
    fn create_family(&self, name: &str) -> RepoResult<Family> {
        let family = Family::new(name)?;
        self.conn.execute(
            "INSERT INTO families (uuid, name) VALUES (?1, ?2);",
            params![family.id.to_string(), family.name.as_str()],
        )?;
        Ok(family)
    }

    fn get_family(&self, family_id: FamilyId) -> RepoResult<Option<Family>> {
        let family = self
            .conn
            .query_row(
                &format!("{FAMILY_SELECT_SQL} WHERE uuid = ?1;"),
                [family_id.to_string()],
                |row| Ok((row.get::<_, String>("uuid")?, row.get::<_, String>("name")?)),
            )
            .optional()?;

        let Some((uuid_text, name)) = family else {
            return Ok(None);
        };

        let mut family = Family {
            id: parse_uuid(&uuid_text, "families.uuid")?,
            name,
            members: Vec::new(),
        };
        family.members = list_family_members(self.conn, family.id)?;
        Ok(Some(family))
    }

    fn list_families(&self) -> RepoResult<Vec<Family>> {
        let mut stmt = self.conn.prepare(&format!(
            "{FAMILY_SELECT_SQL} ORDER BY name COLLATE NOCASE ASC, rowid ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut families = Vec::new();
        while let Some(row) = rows.next()? {
            let uuid_text: String = row.get("uuid")?;
            families.push(Family {
                id: parse_uuid(&uuid_text, "families.uuid")?,
                name: row.get("name")?,
                members: Vec::new(),
            });
        }

        let mut members_by_family = list_all_members(self.conn)?;
        for family in &mut families {
            if let Some(members) = members_by_family.remove(&family.id) {
                family.members = members;
            }
        }

        Ok(families)
    }

    fn delete_family(&self, family_id: FamilyId) -> RepoResult<bool> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute(
            "DELETE FROM family_members WHERE family_uuid = ?1;",
            [family_id.to_string()],
        )?;
        let removed = tx.execute(
            "DELETE FROM families WHERE uuid = ?1;",
            [family_id.to_string()],
        )?;
        tx.commit()?;
        Ok(removed > 0)
    }

    fn create_member(
        &self,
        family_id: FamilyId,
        name: &str,
        is_adult: bool,
    ) -> RepoResult<FamilyMember> {
        let mut member = FamilyMember::new(family_id, name, is_adult)?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if !family_exists(&tx, family_id)? {
            return Err(RepoError::FamilyNotFound(family_id));
        }
        member.sort_order = next_sort_order(&tx, family_id)?;
        tx.execute(
            "INSERT INTO family_members (
                uuid,
                family_uuid,
                name,
                is_adult,
                is_attending,
                sort_order
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                member.id.to_string(),
                family_id.to_string(),
                member.name.as_str(),
                bool_to_int(member.is_adult),
                bool_to_int(member.is_attending),
                member.sort_order,
            ],
        )?;
        tx.commit()?;

        Ok(member)
    }

    fn get_member(&self, member_id: MemberId) -> RepoResult<Option<FamilyMember>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{MEMBER_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([member_id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_member_row(row)?));
        }
        Ok(None)
    }

    fn delete_members(&self, family_id: FamilyId, member_ids: &[MemberId]) -> RepoResult<usize> {
        if member_ids.is_empty() {
            return Ok(0);
        }

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let mut removed = 0;
        for member_id in member_ids {
            removed += tx.execute(
                "DELETE FROM family_members
                 WHERE uuid = ?1
                   AND family_uuid = ?2;",
                params![member_id.to_string(), family_id.to_string()],
            )?;
        }
        tx.commit()?;
        Ok(removed)
    }

    fn move_member(
        &self,
        family_id: FamilyId,
        from_index: usize,
        to_index: usize,
    ) -> RepoResult<bool> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let mut member_ids = list_sorted_member_ids(&tx, family_id)?;
        if from_index >= member_ids.len() {
            return Ok(false);
        }

        let moved = member_ids.remove(from_index);
        let target_index = to_index.min(member_ids.len());
        member_ids.insert(target_index, moved);

        for (index, member_id) in member_ids.into_iter().enumerate() {
            tx.execute(
                "UPDATE family_members
                 SET sort_order = ?2,
                     updated_at = (strftime('%s', 'now') * 1000)
                 WHERE uuid = ?1;",
                params![member_id.to_string(), index as i64],
            )?;
        }

        tx.commit()?;
        Ok(true)
    }

    fn set_attendance(&self, member_id: MemberId, attending: bool) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "UPDATE family_members
             SET is_attending = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![member_id.to_string(), bool_to_int(attending)],
        )?;
        Ok(changed > 0)
    }

    fn set_family_attendance(&self, family_id: FamilyId, attending: bool) -> RepoResult<usize> {
        let changed = self.conn.execute(
            "UPDATE family_members
             SET is_attending = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE family_uuid = ?1;",
            params![family_id.to_string(), bool_to_int(attending)],
        )?;
        Ok(changed)
    }

    fn reset_attendance(&self) -> RepoResult<usize> {
        let changed = self.conn.execute(
            "UPDATE family_members
             SET is_attending = 0,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE is_attending = 1;",
            [],
        )?;
        Ok(changed)
    }
}

fn family_exists(conn: &Connection, family_id: FamilyId) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM families WHERE uuid = ?1);",
        [family_id.to_string()],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn next_sort_order(conn: &Connection, family_id: FamilyId) -> RepoResult<i64> {
    let next = conn.query_row(
        "SELECT COALESCE(MAX(sort_order), -1) + 1
         FROM family_members
         WHERE family_uuid = ?1;",
        [family_id.to_string()],
        |row| row.get(0),
    )?;
    Ok(next)
}

fn list_family_members(conn: &Connection, family_id: FamilyId) -> RepoResult<Vec<FamilyMember>> {
    let mut stmt = conn.prepare(&format!(
        "{MEMBER_SELECT_SQL} WHERE family_uuid = ?1 ORDER BY rowid ASC;"
    ))?;
    let mut rows = stmt.query([family_id.to_string()])?;
    let mut members = Vec::new();
    while let Some(row) = rows.next()? {
        members.push(parse_member_row(row)?);
    }
    Ok(members)
}

fn list_all_members(conn: &Connection) -> RepoResult<HashMap<FamilyId, Vec<FamilyMember>>> {
    let mut stmt = conn.prepare(&format!("{MEMBER_SELECT_SQL} ORDER BY rowid ASC;"))?;
    let mut rows = stmt.query([])?;
    let mut grouped: HashMap<FamilyId, Vec<FamilyMember>> = HashMap::new();
    while let Some(row) = rows.next()? {
        let member = parse_member_row(row)?;
        grouped.entry(member.family_id).or_default().push(member);
    }
    Ok(grouped)
}

fn list_sorted_member_ids(conn: &Connection, family_id: FamilyId) -> RepoResult<Vec<MemberId>> {
    let mut stmt = conn.prepare(
        "SELECT uuid
         FROM family_members
         WHERE family_uuid = ?1
         ORDER BY sort_order ASC, rowid ASC;",
    )?;
    let mut rows = stmt.query([family_id.to_string()])?;
    let mut ids = Vec::new();
    while let Some(row) = rows.next()? {
        let value: String = row.get(0)?;
        ids.push(parse_uuid(&value, "family_members.uuid")?);
    }
    Ok(ids)
}

fn parse_member_row(row: &Row<'_>) -> RepoResult<FamilyMember> {
    let uuid_text: String = row.get("uuid")?;
    let family_uuid_text: String = row.get("family_uuid")?;

    Ok(FamilyMember {
        id: parse_uuid(&uuid_text, "family_members.uuid")?,
        family_id: parse_uuid(&family_uuid_text, "family_members.family_uuid")?,
        name: row.get("name")?,
        is_adult: parse_flag(row.get("is_adult")?, "family_members.is_adult")?,
        is_attending: parse_flag(row.get("is_attending")?, "family_members.is_attending")?,
        sort_order: row.get("sort_order")?,
    })
}

fn parse_flag(value: i64, column: &'static str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid flag value `{other}` in {column}"
        ))),
    }
}

fn parse_uuid(value: &str, column: &'static str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

fn ensure_family_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for (table, columns) in [
        ("families", FAMILY_COLUMNS),
        ("family_members", MEMBER_COLUMNS),
    ] {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
        for &column in columns {
            if !table_has_column(conn, table, column)? {
                return Err(RepoError::MissingRequiredColumn { table, column });
            }
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
