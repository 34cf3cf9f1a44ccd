//! Registry use-case services.
//!
//! # Responsibility
//! - Compose role checks and record storage into registry operations.
//! - Deploy and catalog registries per organisation.

pub mod directory;
pub mod registry;
