//! Record registry use-case service.
//!
//! # Responsibility
//! - Gate every mutation through `RoleAuthority`.
//! - Turn store writes into ordered domain events.
//!
//! # Invariants
//! - Capability checks run before any other precondition.
//! - A failed call leaves records and roles unchanged and emits nothing.
//! - Calls on one `RegistryHandle` are serialized by its mutex.

use crate::access::authority::{RoleAuthority, RoleError};
use crate::access::capability::Capability;
use crate::model::context::CallContext;
use crate::model::event::{RegistryEvent, UpdateCause};
use crate::model::hash::DocumentHash;
use crate::model::identity::Identity;
use crate::model::record::{NewRecord, Record, RecordValidationError, Timestamp};
use crate::repo::memory_store::MemoryRecordStore;
use crate::repo::record_store::{RecordStore, StoreError};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

pub type RegistryResult<T> = Result<T, RegistryError>;

/// Registry API error.
#[derive(Debug)]
pub enum RegistryError {
    Unauthorized {
        capability: Capability,
        caller: Identity,
    },
    /// Role target or deployer is the zero identity.
    InvalidAccount,
    DuplicateRecord(DocumentHash),
    /// Predecessor is absent or already superseded.
    DanglingLink(DocumentHash),
    NotFound(DocumentHash),
    AlreadyClosed(DocumentHash),
    ZeroHash,
    /// Call clock is zero or negative.
    InvalidTimestamp(Timestamp),
    ClockRegression {
        hash: DocumentHash,
        updated_at: Timestamp,
        now: Timestamp,
    },
    InvalidRecord(RecordValidationError),
    Storage(StoreError),
}

impl RegistryError {
    /// Stable machine-readable code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthorized { .. } => "unauthorized",
            Self::InvalidAccount => "invalid_account",
            Self::DuplicateRecord(_) => "duplicate_record",
            Self::DanglingLink(_) => "dangling_link",
            Self::NotFound(_) => "not_found",
            Self::AlreadyClosed(_) => "already_closed",
            Self::ZeroHash => "zero_hash",
            Self::InvalidTimestamp(_) => "invalid_timestamp",
            Self::ClockRegression { .. } => "clock_regression",
            Self::InvalidRecord(_) => "invalid_record",
            Self::Storage(_) => "storage",
        }
    }
}

impl Display for RegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthorized { capability, caller } => {
                write!(f, "account {caller} is missing capability {capability}")
            }
            Self::InvalidAccount => write!(f, "account must not be the zero identity"),
            Self::DuplicateRecord(hash) => write!(f, "record already exists: {hash}"),
            Self::DanglingLink(hash) => {
                write!(f, "predecessor is missing or already superseded: {hash}")
            }
            Self::NotFound(hash) => write!(f, "record not found: {hash}"),
            Self::AlreadyClosed(hash) => write!(f, "record validity already closed: {hash}"),
            Self::ZeroHash => write!(f, "the zero hash cannot address a record"),
            Self::InvalidTimestamp(now) => write!(f, "call timestamp must be positive, got {now}"),
            Self::ClockRegression {
                hash,
                updated_at,
                now,
            } => write!(
                f,
                "clock {now} is earlier than last update {updated_at} of record {hash}"
            ),
            Self::InvalidRecord(err) => write!(f, "{err}"),
            Self::Storage(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RegistryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidRecord(err) => Some(err),
            Self::Storage(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RoleError> for RegistryError {
    fn from(value: RoleError) -> Self {
        match value {
            RoleError::Unauthorized { capability, caller } => {
                Self::Unauthorized { capability, caller }
            }
            RoleError::InvalidAccount => Self::InvalidAccount,
        }
    }
}

impl From<StoreError> for RegistryError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::ZeroHash => Self::ZeroHash,
            StoreError::Duplicate(hash) => Self::DuplicateRecord(hash),
            StoreError::DanglingLink(hash) => Self::DanglingLink(hash),
            StoreError::NotFound(hash) => Self::NotFound(hash),
            StoreError::AlreadyClosed(hash) => Self::AlreadyClosed(hash),
            StoreError::ClockRegression {
                hash,
                updated_at,
                now,
            } => Self::ClockRegression {
                hash,
                updated_at,
                now,
            },
            StoreError::Validation(err) => Self::InvalidRecord(err),
            other => Self::Storage(other),
        }
    }
}

/// Permissioned registry of hashed document records for one organisation.
pub struct Registry {
    id: Uuid,
    organisation: Identity,
    metadata: String,
    roles: RoleAuthority,
    store: Box<dyn RecordStore>,
}

impl Registry {
    /// Creates an in-memory registry; `deployer` receives every capability.
    pub fn new(
        deployer: Identity,
        organisation: Identity,
        metadata: impl Into<String>,
    ) -> RegistryResult<Self> {
        Self::with_store(
            Uuid::new_v4(),
            deployer,
            organisation,
            metadata,
            Box::new(MemoryRecordStore::new()),
        )
    }

    /// Creates a registry over a caller-provided store.
    pub fn with_store(
        id: Uuid,
        deployer: Identity,
        organisation: Identity,
        metadata: impl Into<String>,
        store: Box<dyn RecordStore>,
    ) -> RegistryResult<Self> {
        let roles = RoleAuthority::with_admin(deployer)?;
        info!(
            "event=registry_init module=registry status=ok registry_id={} organisation={}",
            id, organisation
        );
        Ok(Self {
            id,
            organisation,
            metadata: metadata.into(),
            roles,
            store,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn organisation(&self) -> Identity {
        self.organisation
    }

    pub fn metadata(&self) -> &str {
        &self.metadata
    }

    pub fn has_role(&self, capability: Capability, account: Identity) -> bool {
        self.roles.check(capability, account)
    }

    pub fn role_members(&self, capability: Capability) -> Vec<Identity> {
        self.roles.members(capability)
    }

    /// Grants `capability` to `account`; caller must be an administrator.
    ///
    /// Returns `false` when the account already held the capability.
    pub fn grant_role(
        &mut self,
        caller: Identity,
        capability: Capability,
        account: Identity,
    ) -> RegistryResult<bool> {
        Ok(self.roles.grant(caller, capability, account)?)
    }

    /// Revokes `capability` from `account`; caller must be an administrator.
    pub fn revoke_role(
        &mut self,
        caller: Identity,
        capability: Capability,
        account: Identity,
    ) -> RegistryResult<bool> {
        Ok(self.roles.revoke(caller, capability, account)?)
    }

    /// Drops the caller's own membership in `capability`.
    pub fn renounce_role(&mut self, caller: Identity, capability: Capability) -> bool {
        self.roles.renounce(caller, capability)
    }

    /// Creates a record, superseding `request.past_document_hash` when non-zero.
    ///
    /// # Events
    /// - `RecordCreated(hash)` always.
    /// - `RecordUpdated(past)` when a predecessor was linked.
    ///
    /// # Errors
    /// - `Unauthorized` without `Capability::CreateRecord`.
    /// - `DuplicateRecord` when `hash` already holds a record.
    /// - `DanglingLink` when the predecessor is absent or already superseded.
    pub fn create_record(
        &mut self,
        ctx: &CallContext,
        request: &NewRecord,
    ) -> RegistryResult<Vec<RegistryEvent>> {
        let result = self.try_create_record(ctx, request);
        self.log_outcome("record_create", ctx, request.hash, &result);
        result
    }

    fn try_create_record(
        &mut self,
        ctx: &CallContext,
        request: &NewRecord,
    ) -> RegistryResult<Vec<RegistryEvent>> {
        self.roles.require(Capability::CreateRecord, ctx.caller)?;
        ensure_positive_clock(ctx.now)?;

        let record = Record::created(ctx.caller, request, ctx.now);
        let linked = self.store.append(request.hash, record)?;

        let mut events = vec![RegistryEvent::RecordCreated { hash: request.hash }];
        if linked.is_some() {
            events.push(RegistryEvent::RecordUpdated {
                hash: request.past_document_hash,
                cause: UpdateCause::Superseded { next: request.hash },
            });
        }
        Ok(events)
    }

    /// Closes the open validity window of the record at `hash`.
    ///
    /// # Events
    /// - `RecordUpdated(hash)`, also observable as `RecordInvalidated(hash)`.
    ///
    /// # Errors
    /// - `Unauthorized` without `Capability::InvalidateRecord`.
    /// - `NotFound` when no record exists at `hash`.
    /// - `AlreadyClosed` when `expires_at` is already set, which includes
    ///   every superseded record.
    pub fn invalidate_record(
        &mut self,
        ctx: &CallContext,
        hash: DocumentHash,
    ) -> RegistryResult<Vec<RegistryEvent>> {
        let result = self.try_invalidate_record(ctx, hash);
        self.log_outcome("record_invalidate", ctx, hash, &result);
        result
    }

    fn try_invalidate_record(
        &mut self,
        ctx: &CallContext,
        hash: DocumentHash,
    ) -> RegistryResult<Vec<RegistryEvent>> {
        self.roles.require(Capability::InvalidateRecord, ctx.caller)?;
        ensure_positive_clock(ctx.now)?;

        self.store.close(hash, ctx.caller, ctx.now)?;
        Ok(vec![RegistryEvent::RecordUpdated {
            hash,
            cause: UpdateCause::Invalidated,
        }])
    }

    /// Returns the record at `hash`, or `NotFound`.
    pub fn read(&self, hash: DocumentHash) -> RegistryResult<Record> {
        if hash.is_zero() {
            return Err(RegistryError::NotFound(hash));
        }
        self.store
            .get(&hash)?
            .filter(Record::exists)
            .ok_or(RegistryError::NotFound(hash))
    }

    /// Returns the record at `hash`, or the all-zero record when absent.
    pub fn records(&self, hash: DocumentHash) -> RegistryResult<Record> {
        match self.read(hash) {
            Err(RegistryError::NotFound(_)) => Ok(Record::default()),
            other => other,
        }
    }

    pub fn record_count(&self) -> RegistryResult<usize> {
        Ok(self.store.len()?)
    }

    fn log_outcome(
        &self,
        operation: &str,
        ctx: &CallContext,
        hash: DocumentHash,
        result: &RegistryResult<Vec<RegistryEvent>>,
    ) {
        match result {
            Ok(events) => info!(
                "event={operation} module=registry status=ok registry_id={} hash={} caller={} events={}",
                self.id,
                hash,
                ctx.caller,
                events.len()
            ),
            Err(err) => warn!(
                "event={operation} module=registry status=error registry_id={} hash={} caller={} error_code={}",
                self.id,
                hash,
                ctx.caller,
                err.code()
            ),
        }
    }
}

impl Debug for Registry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("id", &self.id)
            .field("organisation", &self.organisation)
            .finish_non_exhaustive()
    }
}

fn ensure_positive_clock(now: Timestamp) -> RegistryResult<()> {
    if now <= 0 {
        return Err(RegistryError::InvalidTimestamp(now));
    }
    Ok(())
}

/// Shared, serialized access to one registry.
///
/// Clones refer to the same registry. Handles compare by registry id.
#[derive(Clone)]
pub struct RegistryHandle {
    id: Uuid,
    inner: Arc<Mutex<Registry>>,
}

impl RegistryHandle {
    pub fn new(registry: Registry) -> Self {
        Self {
            id: registry.id(),
            inner: Arc::new(Mutex::new(registry)),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Runs `f` with exclusive access; the whole closure is one critical section.
    pub fn with<T>(&self, f: impl FnOnce(&mut Registry) -> T) -> T {
        f(&mut self.lock())
    }

    pub fn organisation(&self) -> Identity {
        self.lock().organisation()
    }

    pub fn metadata(&self) -> String {
        self.lock().metadata().to_string()
    }

    pub fn has_role(&self, capability: Capability, account: Identity) -> bool {
        self.lock().has_role(capability, account)
    }

    pub fn grant_role(
        &self,
        caller: Identity,
        capability: Capability,
        account: Identity,
    ) -> RegistryResult<bool> {
        self.lock().grant_role(caller, capability, account)
    }

    pub fn revoke_role(
        &self,
        caller: Identity,
        capability: Capability,
        account: Identity,
    ) -> RegistryResult<bool> {
        self.lock().revoke_role(caller, capability, account)
    }

    pub fn renounce_role(&self, caller: Identity, capability: Capability) -> bool {
        self.lock().renounce_role(caller, capability)
    }

    pub fn role_members(&self, capability: Capability) -> Vec<Identity> {
        self.lock().role_members(capability)
    }

    pub fn create_record(
        &self,
        ctx: &CallContext,
        request: &NewRecord,
    ) -> RegistryResult<Vec<RegistryEvent>> {
        self.lock().create_record(ctx, request)
    }

    pub fn invalidate_record(
        &self,
        ctx: &CallContext,
        hash: DocumentHash,
    ) -> RegistryResult<Vec<RegistryEvent>> {
        self.lock().invalidate_record(ctx, hash)
    }

    pub fn read(&self, hash: DocumentHash) -> RegistryResult<Record> {
        self.lock().read(hash)
    }

    pub fn records(&self, hash: DocumentHash) -> RegistryResult<Record> {
        self.lock().records(hash)
    }

    pub fn record_count(&self) -> RegistryResult<usize> {
        self.lock().record_count()
    }

    // Operations validate before writing, so a poisoned guard still holds
    // committed state.
    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PartialEq for RegistryHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for RegistryHandle {}

impl Debug for RegistryHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryHandle")
            .field("id", &self.id)
            .finish()
    }
}
