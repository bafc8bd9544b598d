use contactbook_core::db::migrations::{latest_version, schema_version};
use contactbook_core::db::{backup_to, check_connection, open_db, open_db_in_memory, DbError};
use contactbook_core::{ContactDraft, ContactService, SqliteContactRepository};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn).unwrap(), latest_version());
    assert_table_exists(&conn, "contacts");
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("contacts.sqlite3");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first).unwrap(), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second).unwrap(), latest_version());
    assert_table_exists(&conn_second, "contacts");
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.sqlite3");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
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
fn check_connection_succeeds_on_open_database() {
    let conn = open_db_in_memory().unwrap();
    check_connection(&conn).unwrap();
}

#[test]
fn backup_copies_contacts_and_refuses_to_overwrite() {
    let dir = tempfile::tempdir().unwrap();
    let conn = open_db(dir.path().join("contacts.sqlite3")).unwrap();
    {
        let service = ContactService::new(SqliteContactRepository::try_new(&conn).unwrap());
        service
            .add_contact(&ContactDraft::new("Test User", "1234567890"))
            .unwrap();
    }

    let backup_path = dir.path().join("backup.sqlite3");
    backup_to(&conn, &backup_path).unwrap();
    assert!(backup_path.exists());

    let restored = open_db(&backup_path).unwrap();
    let service = ContactService::new(SqliteContactRepository::try_new(&restored).unwrap());
    let contacts = service.list_contacts().unwrap();
    assert_eq!(contacts.len(), 1);
    assert_eq!(contacts[0].name, "Test User");

    let err = backup_to(&conn, &backup_path).unwrap_err();
    assert!(matches!(err, DbError::BackupTargetExists(path) if path == backup_path));
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
