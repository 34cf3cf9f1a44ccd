//! Account and organisation identities.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Opaque account identity. The nil UUID is the "absent" sentinel.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Identity(Uuid);

impl Identity {
    /// Sentinel meaning "no account".
    pub const ZERO: Self = Self(Uuid::nil());

    /// Mints a fresh random identity.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_nil()
    }

    /// Parses the hyphenated UUID text form.
    pub fn parse(value: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(value.trim()).map(Self)
    }
}

impl Display for Identity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for Identity {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}
