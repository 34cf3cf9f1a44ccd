//! Record store contract and invariant planning.
//!
//! # Responsibility
//! - Define the keyed `DocumentHash -> Record` storage contract.
//! - Compute every write from a pure plan so failed preconditions never
//!   touch stored state.
//!
//! # Invariants
//! - Uniqueness: `append` rejects a hash that already holds a record.
//! - Chain well-formedness: a non-zero predecessor must exist and must not
//!   already have a successor.
//! - Single-set linkage: `next_document_hash` goes from zero to non-zero once.
//! - Invalidation idempotence: `close` only accepts records with `expires_at == 0`.
//! - The zero hash is never stored.

use crate::db::DbError;
use crate::model::hash::DocumentHash;
use crate::model::identity::Identity;
use crate::model::record::{Record, RecordValidationError, Timestamp};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Store-level error for record persistence and invariant checks.
#[derive(Debug)]
pub enum StoreError {
    /// The zero sentinel was used as a key.
    ZeroHash,
    Duplicate(DocumentHash),
    /// Predecessor is absent or already superseded.
    DanglingLink(DocumentHash),
    NotFound(DocumentHash),
    AlreadyClosed(DocumentHash),
    /// Call clock is earlier than the record's last update.
    ClockRegression {
        hash: DocumentHash,
        updated_at: Timestamp,
        now: Timestamp,
    },
    Validation(RecordValidationError),
    Db(DbError),
    InvalidData(String),
    MissingRequiredTable(&'static str),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ZeroHash => write!(f, "the zero hash cannot address a record"),
            Self::Duplicate(hash) => write!(f, "record already exists: {hash}"),
            Self::DanglingLink(hash) => {
                write!(f, "predecessor is missing or already superseded: {hash}")
            }
            Self::NotFound(hash) => write!(f, "record not found: {hash}"),
            Self::AlreadyClosed(hash) => write!(f, "record validity already closed: {hash}"),
            Self::ClockRegression {
                hash,
                updated_at,
                now,
            } => write!(
                f,
                "clock {now} is earlier than last update {updated_at} of record {hash}"
            ),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted record data: {message}"),
            Self::MissingRequiredTable(table) => write!(f, "required table is missing: {table}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RecordValidationError> for StoreError {
    fn from(value: RecordValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Storage interface with invariant-preserving mutation primitives.
///
/// Each mutating call either fully applies or leaves the store unchanged.
pub trait RecordStore: Send {
    /// Looks up the record stored at `hash`.
    fn get(&self, hash: &DocumentHash) -> StoreResult<Option<Record>>;

    /// Inserts `record` at `hash` and links its predecessor, atomically.
    ///
    /// Returns the predecessor as stored after linkage, if any.
    fn append(&mut self, hash: DocumentHash, record: Record) -> StoreResult<Option<Record>>;

    /// Closes the validity window of the record at `hash`.
    fn close(&mut self, hash: DocumentHash, updater: Identity, now: Timestamp)
        -> StoreResult<Record>;

    /// Number of stored records.
    fn len(&self) -> StoreResult<usize>;

    fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }
}

/// Fully validated result of an `append` precondition check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppendPlan {
    pub hash: DocumentHash,
    pub record: Record,
    /// Predecessor key and its post-linkage state.
    pub predecessor: Option<(DocumentHash, Record)>,
}

/// Checks append preconditions against current state and computes the writes.
///
/// `existing` is the record currently at `hash`; `predecessor` is the record
/// currently at `record.past_document_hash`.
pub fn plan_append(
    hash: DocumentHash,
    record: Record,
    existing: Option<&Record>,
    predecessor: Option<&Record>,
) -> StoreResult<AppendPlan> {
    if hash.is_zero() {
        return Err(StoreError::ZeroHash);
    }
    if existing.is_some_and(Record::exists) {
        return Err(StoreError::Duplicate(hash));
    }
    // An absent key cannot be its own predecessor.
    if record.past_document_hash == hash {
        return Err(StoreError::DanglingLink(hash));
    }
    record.validate(&hash)?;

    let Some(past) = record.past_document_hash.non_zero() else {
        return Ok(AppendPlan {
            hash,
            record,
            predecessor: None,
        });
    };

    let current = match predecessor {
        Some(current) if current.exists() && !current.is_superseded() => current,
        _ => return Err(StoreError::DanglingLink(past)),
    };
    let now = record.created_at;
    if now < current.updated_at {
        return Err(StoreError::ClockRegression {
            hash: past,
            updated_at: current.updated_at,
            now,
        });
    }

    let mut linked = current.clone();
    linked.next_document_hash = hash;
    linked.updater = Some(record.creator);
    linked.updated_at = now;
    if linked.is_open() {
        linked.expires_at = now;
    }

    Ok(AppendPlan {
        hash,
        record,
        predecessor: Some((past, linked)),
    })
}

/// Checks close preconditions and computes the closed record.
pub fn plan_close(
    hash: DocumentHash,
    existing: Option<&Record>,
    updater: Identity,
    now: Timestamp,
) -> StoreResult<Record> {
    // The zero key never holds a record.
    if hash.is_zero() {
        return Err(StoreError::NotFound(hash));
    }
    let current = match existing {
        Some(current) if current.exists() => current,
        _ => return Err(StoreError::NotFound(hash)),
    };
    if !current.is_open() {
        return Err(StoreError::AlreadyClosed(hash));
    }
    if now < current.updated_at {
        return Err(StoreError::ClockRegression {
            hash,
            updated_at: current.updated_at,
            now,
        });
    }

    let mut closed = current.clone();
    closed.expires_at = now;
    closed.updated_at = now;
    closed.updater = Some(updater);
    closed.validate(&hash)?;
    Ok(closed)
}
