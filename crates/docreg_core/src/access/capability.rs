//! Capability identifiers gating registry mutations.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Named permission; holders may perform one class of operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Capability {
    /// May grant and revoke every capability.
    Admin,
    CreateRecord,
    InvalidateRecord,
}

/// Stable identifier for the administrative capability.
pub const DEFAULT_ADMIN_ROLE: &str = "DEFAULT_ADMIN_ROLE";
/// Stable identifier for the record creation capability.
pub const CAN_CREATE_RECORD_ROLE: &str = "CAN_CREATE_RECORD_ROLE";
/// Stable identifier for the record invalidation capability.
pub const CAN_INVALIDATE_RECORD_ROLE: &str = "CAN_INVALIDATE_RECORD_ROLE";

impl Capability {
    pub const ALL: [Capability; 3] = [
        Capability::Admin,
        Capability::CreateRecord,
        Capability::InvalidateRecord,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => DEFAULT_ADMIN_ROLE,
            Self::CreateRecord => CAN_CREATE_RECORD_ROLE,
            Self::InvalidateRecord => CAN_INVALIDATE_RECORD_ROLE,
        }
    }
}

impl Display for Capability {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses one capability identifier. Matching is exact.
pub fn parse_capability(value: &str) -> Result<Capability, CapabilityParseError> {
    let normalized = value.trim();
    if normalized.is_empty() {
        return Err(CapabilityParseError::Empty);
    }

    match normalized {
        DEFAULT_ADMIN_ROLE => Ok(Capability::Admin),
        CAN_CREATE_RECORD_ROLE => Ok(Capability::CreateRecord),
        CAN_INVALIDATE_RECORD_ROLE => Ok(Capability::InvalidateRecord),
        other => Err(CapabilityParseError::Unsupported(other.to_string())),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapabilityParseError {
    Empty,
    Unsupported(String),
}

impl Display for CapabilityParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "capability value must not be empty"),
            Self::Unsupported(value) => write!(f, "capability is unsupported: {value}"),
        }
    }
}

impl Error for CapabilityParseError {}
