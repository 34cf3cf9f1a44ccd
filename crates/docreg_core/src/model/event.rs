//! Domain events emitted by registry and directory mutations.
//!
//! The direct-invalidation path emits one logical event that answers to both
//! `RecordUpdated` and `RecordInvalidated`.

use crate::model::hash::DocumentHash;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const RECORD_CREATED: &str = "RecordCreated";
pub const RECORD_UPDATED: &str = "RecordUpdated";
pub const RECORD_INVALIDATED: &str = "RecordInvalidated";
pub const REGISTER_DEPLOYED: &str = "RegisterDeployed";
pub const ORGANISATION_METADATA_EDITED: &str = "OrganisationMetadataEdited";

/// Why an existing record changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum UpdateCause {
    /// A new record named this one as predecessor.
    Superseded { next: DocumentHash },
    /// Closed by a direct invalidation call.
    Invalidated,
}

/// Registry event, in emission order within one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "event")]
pub enum RegistryEvent {
    RecordCreated {
        hash: DocumentHash,
    },
    RecordUpdated {
        hash: DocumentHash,
        cause: UpdateCause,
    },
}

impl RegistryEvent {
    /// Hash the event is about.
    pub fn hash(&self) -> DocumentHash {
        match self {
            Self::RecordCreated { hash } | Self::RecordUpdated { hash, .. } => *hash,
        }
    }

    /// Every name this event is observable under.
    pub fn names(&self) -> &'static [&'static str] {
        match self {
            Self::RecordCreated { .. } => &[RECORD_CREATED],
            Self::RecordUpdated {
                cause: UpdateCause::Superseded { .. },
                ..
            } => &[RECORD_UPDATED],
            Self::RecordUpdated {
                cause: UpdateCause::Invalidated,
                ..
            } => &[RECORD_UPDATED, RECORD_INVALIDATED],
        }
    }

    pub fn is_named(&self, name: &str) -> bool {
        self.names().contains(&name)
    }
}

/// Organisation directory event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "event")]
pub enum DirectoryEvent {
    RegisterDeployed { index: usize, registry_id: Uuid },
    OrganisationMetadataEdited,
}

impl DirectoryEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::RegisterDeployed { .. } => REGISTER_DEPLOYED,
            Self::OrganisationMetadataEdited => ORGANISATION_METADATA_EDITED,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{RegistryEvent, UpdateCause, RECORD_INVALIDATED, RECORD_UPDATED};
    use crate::model::hash::DocumentHash;

    #[test]
    fn invalidation_answers_to_both_names() {
        let hash = DocumentHash::from_bytes([7; 32]);
        let event = RegistryEvent::RecordUpdated {
            hash,
            cause: UpdateCause::Invalidated,
        };
        assert!(event.is_named(RECORD_UPDATED));
        assert!(event.is_named(RECORD_INVALIDATED));
        assert_eq!(event.hash(), hash);
    }

    #[test]
    fn supersession_is_only_an_update() {
        let event = RegistryEvent::RecordUpdated {
            hash: DocumentHash::from_bytes([1; 32]),
            cause: UpdateCause::Superseded {
                next: DocumentHash::from_bytes([2; 32]),
            },
        };
        assert!(event.is_named(RECORD_UPDATED));
        assert!(!event.is_named(RECORD_INVALIDATED));
    }
}
