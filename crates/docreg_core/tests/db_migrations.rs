use docreg_core::db::migrations::latest_version;
use docreg_core::db::{open_db, open_db_in_memory, DbError};
use docreg_core::{
    DirectoryError, Identity, OrganisationDirectory, RecordStore, RegistryError,
    SqliteRecordStore, StorageConfig, StoreError,
};
use rusqlite::Connection;
use uuid::Uuid;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "records");
    assert_index_exists(&conn, "idx_records_single_successor");
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("docreg.db");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_table_exists(&conn_second, "records");
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
fn record_store_refuses_database_from_newer_schema() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = SqliteRecordStore::open_scope(&path, Uuid::new_v4())
        .err()
        .unwrap();
    assert!(matches!(
        err,
        StoreError::Db(DbError::UnsupportedSchemaVersion { db_version: 999, .. })
    ));

    let owner = Identity::generate();
    let mut directory = OrganisationDirectory::new("Acme Ltd", owner)
        .unwrap()
        .with_store_factory(StorageConfig::Sqlite { path }.store_factory());
    let err = directory.deploy_register(owner, "contracts").unwrap_err();
    assert!(matches!(
        err,
        DirectoryError::Registry(RegistryError::Storage(StoreError::Db(
            DbError::UnsupportedSchemaVersion { .. }
        )))
    ));
    assert_eq!(directory.register_count(), 0);
}

#[test]
fn schema_rejects_second_successor_for_same_predecessor() {
    let conn = open_db_in_memory().unwrap();
    let scope = Uuid::new_v4().to_string();
    let creator = Uuid::new_v4().to_string();
    let past = vec![1u8; 32];

    insert_raw(&conn, &scope, &creator, &[2u8; 32], Some(&past)).unwrap();
    let err = insert_raw(&conn, &scope, &creator, &[3u8; 32], Some(&past)).unwrap_err();
    assert!(err.to_string().contains("UNIQUE"));

    let other_scope = Uuid::new_v4().to_string();
    insert_raw(&conn, &other_scope, &creator, &[3u8; 32], Some(&past)).unwrap();
}

#[test]
fn store_rejects_corrupted_rows() {
    let conn = open_db_in_memory().unwrap();
    let scope = Uuid::new_v4();
    conn.execute(
        "INSERT INTO records (
            registry_id, hash, creator, updater, source_document, reference_document,
            starts_at, expires_at, created_at, updated_at, past_document_hash, next_document_hash
        ) VALUES (?1, ?2, 'not-a-uuid', NULL, 'a', 'b', 0, 0, 10, 10, NULL, NULL);",
        rusqlite::params![scope.to_string(), vec![4u8; 32]],
    )
    .unwrap();

    let store = SqliteRecordStore::try_new(conn, scope).unwrap();
    let err = store
        .get(&docreg_core::DocumentHash::from_bytes([4u8; 32]))
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidData(_)));
}

fn insert_raw(
    conn: &Connection,
    scope: &str,
    creator: &str,
    hash: &[u8],
    past: Option<&Vec<u8>>,
) -> rusqlite::Result<usize> {
    conn.execute(
        "INSERT INTO records (
            registry_id, hash, creator, updater, source_document, reference_document,
            starts_at, expires_at, created_at, updated_at, past_document_hash, next_document_hash
        ) VALUES (?1, ?2, ?3, NULL, 'a', 'b', 0, 0, 10, 10, ?4, NULL);",
        rusqlite::params![scope, hash, creator, past],
    )
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    assert_schema_object_exists(conn, "table", table_name);
}

fn assert_index_exists(conn: &Connection, index_name: &str) {
    assert_schema_object_exists(conn, "index", index_name);
}

fn assert_schema_object_exists(conn: &Connection, kind: &str, name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = ?1 AND name = ?2
            );",
            [kind, name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "{kind} {name} does not exist");
}
