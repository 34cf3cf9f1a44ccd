//! SQLite-backed record store.
//!
//! # Responsibility
//! - Persist records of one registry scope inside a shared `records` table.
//! - Run every mutation in one immediate transaction.
//!
//! # Invariants
//! - Rows are keyed by `(registry_id, hash)`; the zero hash is stored as `NULL`
//!   in link columns and never as a key.
//! - Linkage updates are guarded by `next_document_hash IS NULL`.

use crate::db::{open_db, open_db_in_memory};
use crate::model::hash::DocumentHash;
use crate::model::identity::Identity;
use crate::model::record::{Record, Timestamp};
use crate::repo::record_store::{
    plan_append, plan_close, RecordStore, StoreError, StoreResult,
};
use log::debug;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use std::path::Path;
use uuid::Uuid;

const RECORD_SELECT_SQL: &str = "SELECT
    hash,
    creator,
    updater,
    source_document,
    reference_document,
    starts_at,
    expires_at,
    created_at,
    updated_at,
    past_document_hash,
    next_document_hash
FROM records";

/// Record store persisting one registry scope in SQLite.
pub struct SqliteRecordStore {
    conn: Connection,
    registry_id: Uuid,
}

impl SqliteRecordStore {
    /// Wraps a migrated connection for the given registry scope.
    pub fn try_new(conn: Connection, registry_id: Uuid) -> StoreResult<Self> {
        if !table_exists(&conn, "records")? {
            return Err(StoreError::MissingRequiredTable("records"));
        }
        Ok(Self { conn, registry_id })
    }

    /// Opens (and migrates) a database file with a fresh registry scope.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Self::try_new(open_db(path)?, Uuid::new_v4())
    }

    /// Opens a database file bound to `registry_id`, existing or new.
    pub fn open_scope(path: impl AsRef<Path>, registry_id: Uuid) -> StoreResult<Self> {
        Self::try_new(open_db(path)?, registry_id)
    }

    /// Opens a private in-memory database.
    pub fn in_memory() -> StoreResult<Self> {
        Self::try_new(open_db_in_memory()?, Uuid::new_v4())
    }

    pub fn registry_id(&self) -> Uuid {
        self.registry_id
    }
}

impl RecordStore for SqliteRecordStore {
    fn get(&self, hash: &DocumentHash) -> StoreResult<Option<Record>> {
        load_record(&self.conn, self.registry_id, hash)
    }

    fn append(&mut self, hash: DocumentHash, record: Record) -> StoreResult<Option<Record>> {
        let scope = self.registry_id;
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let existing = if hash.is_zero() {
            None
        } else {
            load_record(&tx, scope, &hash)?
        };
        let predecessor = match record.past_document_hash.non_zero() {
            Some(past) => load_record(&tx, scope, &past)?,
            None => None,
        };
        let plan = plan_append(hash, record, existing.as_ref(), predecessor.as_ref())?;

        insert_record(&tx, scope, &plan.hash, &plan.record)?;
        if let Some((past, linked)) = plan.predecessor.as_ref() {
            let changed = tx.execute(
                "UPDATE records
                 SET
                    next_document_hash = ?3,
                    updater = ?4,
                    updated_at = ?5,
                    expires_at = ?6
                 WHERE registry_id = ?1
                   AND hash = ?2
                   AND next_document_hash IS NULL;",
                params![
                    scope.to_string(),
                    past.as_bytes().as_slice(),
                    plan.hash.as_bytes().as_slice(),
                    linked.updater.map(|id| id.to_string()),
                    linked.updated_at,
                    linked.expires_at,
                ],
            )?;
            if changed == 0 {
                return Err(StoreError::DanglingLink(*past));
            }
        }

        tx.commit()?;
        debug!(
            "event=store_append module=repo status=ok registry_id={} hash={} linked={}",
            scope,
            plan.hash,
            plan.predecessor.is_some()
        );
        Ok(plan.predecessor.map(|(_, linked)| linked))
    }

    fn close(
        &mut self,
        hash: DocumentHash,
        updater: Identity,
        now: Timestamp,
    ) -> StoreResult<Record> {
        let scope = self.registry_id;
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let existing = if hash.is_zero() {
            None
        } else {
            load_record(&tx, scope, &hash)?
        };
        let closed = plan_close(hash, existing.as_ref(), updater, now)?;

        let changed = tx.execute(
            "UPDATE records
             SET
                expires_at = ?3,
                updated_at = ?4,
                updater = ?5
             WHERE registry_id = ?1
               AND hash = ?2
               AND expires_at = 0;",
            params![
                scope.to_string(),
                hash.as_bytes().as_slice(),
                closed.expires_at,
                closed.updated_at,
                updater.to_string(),
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::AlreadyClosed(hash));
        }

        tx.commit()?;
        debug!(
            "event=store_close module=repo status=ok registry_id={} hash={}",
            scope, hash
        );
        Ok(closed)
    }

    fn len(&self) -> StoreResult<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM records WHERE registry_id = ?1;",
            [self.registry_id.to_string()],
            |row| row.get(0),
        )?;
        usize::try_from(count)
            .map_err(|_| StoreError::InvalidData(format!("invalid record count `{count}`")))
    }
}

fn load_record(
    conn: &Connection,
    registry_id: Uuid,
    hash: &DocumentHash,
) -> StoreResult<Option<Record>> {
    let mut stmt = conn.prepare(&format!(
        "{RECORD_SELECT_SQL}
         WHERE registry_id = ?1
           AND hash = ?2;"
    ))?;
    let parsed = stmt
        .query_row(
            params![registry_id.to_string(), hash.as_bytes().as_slice()],
            |row| Ok(parse_record_row(row)),
        )
        .optional()?;
    parsed.transpose()
}

fn insert_record(
    conn: &Connection,
    registry_id: Uuid,
    hash: &DocumentHash,
    record: &Record,
) -> StoreResult<()> {
    conn.execute(
        "INSERT INTO records (
            registry_id,
            hash,
            creator,
            updater,
            source_document,
            reference_document,
            starts_at,
            expires_at,
            created_at,
            updated_at,
            past_document_hash,
            next_document_hash
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12);",
        params![
            registry_id.to_string(),
            hash.as_bytes().as_slice(),
            record.creator.to_string(),
            record.updater.map(|id| id.to_string()),
            record.source_document.as_str(),
            record.reference_document.as_str(),
            record.starts_at,
            record.expires_at,
            record.created_at,
            record.updated_at,
            hash_to_db(&record.past_document_hash),
            hash_to_db(&record.next_document_hash),
        ],
    )?;
    Ok(())
}

fn parse_record_row(row: &Row<'_>) -> StoreResult<Record> {
    let key_bytes: Vec<u8> = row.get("hash")?;
    let hash = DocumentHash::from_slice(&key_bytes)
        .map_err(|err| StoreError::InvalidData(format!("records.hash: {err}")))?;

    let record = Record {
        creator: parse_identity(&row.get::<_, String>("creator")?, "creator")?,
        updater: match row.get::<_, Option<String>>("updater")? {
            Some(value) => Some(parse_identity(&value, "updater")?),
            None => None,
        },
        source_document: row.get("source_document")?,
        reference_document: row.get("reference_document")?,
        starts_at: row.get("starts_at")?,
        expires_at: row.get("expires_at")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        past_document_hash: parse_link(row.get("past_document_hash")?, "past_document_hash")?,
        next_document_hash: parse_link(row.get("next_document_hash")?, "next_document_hash")?,
    };
    record.validate(&hash)?;
    Ok(record)
}

fn parse_identity(value: &str, column: &str) -> StoreResult<Identity> {
    Identity::parse(value).map_err(|_| {
        StoreError::InvalidData(format!("invalid identity `{value}` in records.{column}"))
    })
}

fn parse_link(value: Option<Vec<u8>>, column: &str) -> StoreResult<DocumentHash> {
    let Some(bytes) = value else {
        return Ok(DocumentHash::ZERO);
    };
    let hash = DocumentHash::from_slice(&bytes)
        .map_err(|err| StoreError::InvalidData(format!("records.{column}: {err}")))?;
    if hash.is_zero() {
        return Err(StoreError::InvalidData(format!(
            "records.{column} stores the zero hash instead of NULL"
        )));
    }
    Ok(hash)
}

fn hash_to_db(hash: &DocumentHash) -> Option<&[u8]> {
    hash.non_zero().map(|_| hash.as_bytes().as_slice())
}

fn table_exists(conn: &Connection, table: &str) -> StoreResult<bool> {
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
