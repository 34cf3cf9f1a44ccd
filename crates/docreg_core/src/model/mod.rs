//! Registry domain model.
//!
//! # Responsibility
//! - Define canonical data structures used by registry business logic.
//! - Keep sentinel semantics (zero hash, zero identity) in one place.
//!
//! # Invariants
//! - Records are keyed by non-zero `DocumentHash`.
//! - Records are never deleted; lifecycle is expressed by timestamps and links.

pub mod context;
pub mod event;
pub mod hash;
pub mod identity;
pub mod record;
