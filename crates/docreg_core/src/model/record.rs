//! Record domain model.
//!
//! # Responsibility
//! - Define the stored shape of one registered document.
//! - Provide lifecycle predicates for the supersession chain.
//!
//! # Invariants
//! - A record exists iff `created_at != 0`.
//! - `updated_at >= created_at`; equal until the first mutation.
//! - `next_document_hash` is set at most once; `expires_at` leaves `0` at most once.
//! - `creator`, documents, `starts_at` and `past_document_hash` never change.

use crate::model::hash::DocumentHash;
use crate::model::identity::Identity;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Unix epoch milliseconds. `0` means "unset".
pub type Timestamp = i64;

/// One registered document version.
///
/// `Record::default()` is the all-zero placeholder returned for hashes that
/// were never created.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub creator: Identity,
    /// Last account that mutated this record after creation.
    pub updater: Option<Identity>,
    /// Opaque URI of the source document.
    pub source_document: String,
    /// Opaque URI of the reference document.
    pub reference_document: String,
    pub starts_at: Timestamp,
    /// `0` while the validity window is open.
    pub expires_at: Timestamp,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub past_document_hash: DocumentHash,
    pub next_document_hash: DocumentHash,
}

impl Record {
    /// Builds a freshly created record; `created_at == updated_at == now`.
    pub fn created(creator: Identity, request: &NewRecord, now: Timestamp) -> Self {
        Self {
            creator,
            updater: None,
            source_document: request.source_document.clone(),
            reference_document: request.reference_document.clone(),
            starts_at: request.starts_at,
            expires_at: request.expires_at,
            created_at: now,
            updated_at: now,
            past_document_hash: request.past_document_hash,
            next_document_hash: DocumentHash::ZERO,
        }
    }

    pub fn exists(&self) -> bool {
        self.created_at != 0
    }

    /// Whether the validity window is still open-ended.
    pub fn is_open(&self) -> bool {
        self.expires_at == 0
    }

    /// Whether a successor already names this record as predecessor.
    pub fn is_superseded(&self) -> bool {
        !self.next_document_hash.is_zero()
    }

    /// Validates persisted or planned state for `hash`.
    pub fn validate(&self, hash: &DocumentHash) -> Result<(), RecordValidationError> {
        if hash.is_zero() {
            return Err(RecordValidationError::ZeroKey);
        }
        if self.created_at <= 0 {
            return Err(RecordValidationError::MissingCreatedAt);
        }
        if self.updated_at < self.created_at {
            return Err(RecordValidationError::UpdatedBeforeCreated {
                created_at: self.created_at,
                updated_at: self.updated_at,
            });
        }
        if self.starts_at < 0 || self.expires_at < 0 {
            return Err(RecordValidationError::NegativeTimestamp);
        }
        if self.creator.is_zero() {
            return Err(RecordValidationError::ZeroCreator);
        }
        if self.past_document_hash == *hash || self.next_document_hash == *hash {
            return Err(RecordValidationError::SelfLink);
        }
        Ok(())
    }
}

/// Request model for creating a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRecord {
    pub hash: DocumentHash,
    pub source_document: String,
    pub reference_document: String,
    pub starts_at: Timestamp,
    /// `0` for an open-ended validity window.
    pub expires_at: Timestamp,
    /// `DocumentHash::ZERO` when the record starts a new chain.
    pub past_document_hash: DocumentHash,
}

impl NewRecord {
    /// Starts a new chain with an open validity window.
    pub fn new(
        hash: DocumentHash,
        source_document: impl Into<String>,
        reference_document: impl Into<String>,
    ) -> Self {
        Self {
            hash,
            source_document: source_document.into(),
            reference_document: reference_document.into(),
            starts_at: 0,
            expires_at: 0,
            past_document_hash: DocumentHash::ZERO,
        }
    }

    /// Names `past` as the predecessor this record supersedes.
    pub fn superseding(mut self, past: DocumentHash) -> Self {
        self.past_document_hash = past;
        self
    }

    pub fn with_validity(mut self, starts_at: Timestamp, expires_at: Timestamp) -> Self {
        self.starts_at = starts_at;
        self.expires_at = expires_at;
        self
    }
}

/// Record shape violations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordValidationError {
    ZeroKey,
    MissingCreatedAt,
    UpdatedBeforeCreated {
        created_at: Timestamp,
        updated_at: Timestamp,
    },
    NegativeTimestamp,
    ZeroCreator,
    SelfLink,
}

impl Display for RecordValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ZeroKey => write!(f, "record key must not be the zero hash"),
            Self::MissingCreatedAt => write!(f, "record created_at must be positive"),
            Self::UpdatedBeforeCreated {
                created_at,
                updated_at,
            } => write!(
                f,
                "record updated_at {updated_at} is earlier than created_at {created_at}"
            ),
            Self::NegativeTimestamp => write!(f, "record timestamps must not be negative"),
            Self::ZeroCreator => write!(f, "record creator must not be the zero identity"),
            Self::SelfLink => write!(f, "record must not link to itself"),
        }
    }
}

impl Error for RecordValidationError {}
