//! Core domain logic for the document registry.
//! This crate is the single source of truth for record chain invariants.

pub mod access;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use access::authority::{RoleAuthority, RoleError};
pub use access::capability::{parse_capability, Capability, CapabilityParseError};
pub use config::{ConfigError, CoreConfig, StorageConfig};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::context::CallContext;
pub use model::event::{DirectoryEvent, RegistryEvent, UpdateCause};
pub use model::hash::{DocumentHash, HashParseError};
pub use model::identity::Identity;
pub use model::record::{NewRecord, Record, RecordValidationError, Timestamp};
pub use repo::memory_store::MemoryRecordStore;
pub use repo::record_store::{RecordStore, StoreError, StoreResult};
pub use repo::sqlite_store::SqliteRecordStore;
pub use service::directory::{
    memory_store_factory, DirectoryError, DirectoryResult, OrganisationDirectory, StoreFactory,
};
pub use service::registry::{Registry, RegistryError, RegistryHandle, RegistryResult};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
