//! Record storage contracts and implementations.
//!
//! # Responsibility
//! - Define the `RecordStore` contract enforcing chain invariants.
//! - Provide in-memory and SQLite-backed stores behind that contract.
//!
//! # Invariants
//! - Store writes are computed by `plan_append`/`plan_close` before mutation.
//! - Read paths reject invalid persisted state instead of masking it.

pub mod memory_store;
pub mod record_store;
pub mod sqlite_store;
