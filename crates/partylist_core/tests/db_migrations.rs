use partylist_core::db::migrations::latest_version;
use partylist_core::db::{open_db, open_db_in_memory, DbError};
use partylist_core::{FamilyRepository, RepoError, SqliteFamilyRepository};
use rusqlite::Connection;

const V1_SCHEMA: &str = "
CREATE TABLE families (
    uuid TEXT PRIMARY KEY NOT NULL,
    name TEXT NOT NULL,
    created_at INTEGER NOT NULL DEFAULT 0,
    updated_at INTEGER NOT NULL DEFAULT 0
);
CREATE TABLE family_members (
    uuid TEXT PRIMARY KEY NOT NULL,
    family_uuid TEXT NOT NULL REFERENCES families(uuid) ON DELETE CASCADE,
    name TEXT NOT NULL,
    is_adult INTEGER NOT NULL,
    is_attending INTEGER NOT NULL DEFAULT 0,
    created_at INTEGER NOT NULL DEFAULT 0,
    updated_at INTEGER NOT NULL DEFAULT 0
);
PRAGMA user_version = 1;
";

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "families");
    assert_table_exists(&conn, "family_members");
    assert!(column_names(&conn, "family_members").contains(&"sort_order".to_string()));
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("partylist.db");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_table_exists(&conn_second, "family_members");
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn order_migration_backfills_insertion_position_per_family() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("v1.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(V1_SCHEMA).unwrap();
    conn.execute_batch(
        "INSERT INTO families (uuid, name) VALUES
            ('00000000-0000-4000-8000-0000000000f1', 'Smith'),
            ('00000000-0000-4000-8000-0000000000f2', 'Jones');
         INSERT INTO family_members (uuid, family_uuid, name, is_adult) VALUES
            ('00000000-0000-4000-8000-000000000001', '00000000-0000-4000-8000-0000000000f1', 'Alice', 1),
            ('00000000-0000-4000-8000-000000000002', '00000000-0000-4000-8000-0000000000f2', 'Dan', 0),
            ('00000000-0000-4000-8000-000000000003', '00000000-0000-4000-8000-0000000000f1', 'Bob', 0),
            ('00000000-0000-4000-8000-000000000004', '00000000-0000-4000-8000-0000000000f1', 'Cleo', 1),
            ('00000000-0000-4000-8000-000000000005', '00000000-0000-4000-8000-0000000000f2', 'Eve', 1);",
    )
    .unwrap();
    drop(conn);

    let conn = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn), latest_version());

    let repo = SqliteFamilyRepository::try_new(&conn).unwrap();
    let families = repo.list_families().unwrap();
    assert_eq!(families.len(), 2);
    assert_eq!(families[0].name, "Jones");
    assert_eq!(families[1].name, "Smith");

    let orders = |index: usize| -> Vec<(String, i64)> {
        families[index]
            .sorted_members()
            .into_iter()
            .map(|m| (m.name.clone(), m.sort_order))
            .collect()
    };
    assert_eq!(
        orders(0),
        vec![("Dan".to_string(), 0), ("Eve".to_string(), 1)]
    );
    assert_eq!(
        orders(1),
        vec![
            ("Alice".to_string(), 0),
            ("Bob".to_string(), 1),
            ("Cleo".to_string(), 2)
        ]
    );
}

#[test]
fn family_member_foreign_key_cascades_on_raw_delete() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteFamilyRepository::try_new(&conn).unwrap();
    let family = repo.create_family("Smith").unwrap();
    repo.create_member(family.id, "Alice", true).unwrap();

    conn.execute(
        "DELETE FROM families WHERE uuid = ?1;",
        [family.id.to_string()],
    )
    .unwrap();

    let remaining: i64 = conn
        .query_row("SELECT COUNT(*) FROM family_members;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(remaining, 0);
}

#[test]
fn repository_rejects_uninitialized_connection() {
    let conn = Connection::open_in_memory().unwrap();

    match SqliteFamilyRepository::try_new(&conn) {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        }) => assert_eq!(expected_version, latest_version()),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

#[test]
fn repository_rejects_connection_missing_order_column() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(V1_SCHEMA).unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    let result = SqliteFamilyRepository::try_new(&conn);
    assert!(matches!(
        result,
        Err(RepoError::MissingRequiredColumn {
            table: "family_members",
            column: "sort_order"
        })
    ));
}

#[test]
fn repository_rejects_connection_without_families_table() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    let result = SqliteFamilyRepository::try_new(&conn);
    assert!(matches!(
        result,
        Err(RepoError::MissingRequiredTable("families"))
    ));
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn column_names(conn: &Connection, table: &str) -> Vec<String> {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({table});"))
        .unwrap();
    let mut rows = stmt.query([]).unwrap();
    let mut columns = Vec::new();
    while let Some(row) = rows.next().unwrap() {
        columns.push(row.get(1).unwrap());
    }
    columns
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
