//! Capability-based access control.
//!
//! Membership checks are a pure predicate `(capability, caller) -> bool`
//! consulted at the top of every mutating registry operation.

pub mod authority;
pub mod capability;
