//! Organisation directory: identity, metadata and deployed registries.
//!
//! # Invariants
//! - `owner` is fixed at construction and never the zero identity.
//! - Every mutation requires `caller == owner`; failures change nothing.
//! - Deployed registries keep their catalog index forever.

use crate::model::event::DirectoryEvent;
use crate::model::identity::Identity;
use crate::repo::memory_store::MemoryRecordStore;
use crate::repo::record_store::{RecordStore, StoreResult};
use crate::service::registry::{Registry, RegistryError, RegistryHandle};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;
use uuid::Uuid;

/// Builds the backing store for a newly deployed registry id.
pub type StoreFactory = Arc<dyn Fn(Uuid) -> StoreResult<Box<dyn RecordStore>> + Send + Sync>;

pub type DirectoryResult<T> = Result<T, DirectoryError>;

/// Organisation directory errors.
#[derive(Debug)]
pub enum DirectoryError {
    /// Caller is not the directory owner.
    Unauthorized { caller: Identity },
    /// Owner is the zero identity.
    InvalidOwner,
    Registry(RegistryError),
}

impl Display for DirectoryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthorized { caller } => {
                write!(f, "account {caller} is not the organisation owner")
            }
            Self::InvalidOwner => write!(f, "organisation owner must not be the zero identity"),
            Self::Registry(err) => write!(f, "{err}"),
        }
    }
}

impl Error for DirectoryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Registry(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RegistryError> for DirectoryError {
    fn from(value: RegistryError) -> Self {
        Self::Registry(value)
    }
}

/// In-memory store factory used by default.
pub fn memory_store_factory() -> StoreFactory {
    Arc::new(|_: Uuid| -> StoreResult<Box<dyn RecordStore>> {
        Ok(Box::new(MemoryRecordStore::new()))
    })
}

/// Single-owner catalog of an organisation's registries.
pub struct OrganisationDirectory {
    identity: Identity,
    owner: Identity,
    metadata: String,
    registers: Vec<RegistryHandle>,
    store_factory: StoreFactory,
}

impl OrganisationDirectory {
    /// Creates a directory with a freshly minted organisation identity.
    pub fn new(metadata: impl Into<String>, owner: Identity) -> DirectoryResult<Self> {
        Self::with_identity(Identity::generate(), metadata, owner)
    }

    /// Creates a directory for an existing organisation identity.
    pub fn with_identity(
        identity: Identity,
        metadata: impl Into<String>,
        owner: Identity,
    ) -> DirectoryResult<Self> {
        if owner.is_zero() || identity.is_zero() {
            return Err(DirectoryError::InvalidOwner);
        }
        info!(
            "event=directory_init module=directory status=ok organisation={} owner={}",
            identity, owner
        );
        Ok(Self {
            identity,
            owner,
            metadata: metadata.into(),
            registers: Vec::new(),
            store_factory: memory_store_factory(),
        })
    }

    /// Replaces how future registries are backed.
    pub fn with_store_factory(mut self, store_factory: StoreFactory) -> Self {
        self.store_factory = store_factory;
        self
    }

    pub fn identity(&self) -> Identity {
        self.identity
    }

    pub fn owner(&self) -> Identity {
        self.owner
    }

    pub fn metadata(&self) -> &str {
        &self.metadata
    }

    /// Registry deployed at catalog position `index`.
    pub fn registers(&self, index: usize) -> Option<RegistryHandle> {
        self.registers.get(index).cloned()
    }

    pub fn register_count(&self) -> usize {
        self.registers.len()
    }

    /// Replaces organisation metadata; owner only.
    pub fn edit_metadata(
        &mut self,
        caller: Identity,
        metadata: impl Into<String>,
    ) -> DirectoryResult<DirectoryEvent> {
        self.require_owner(caller, "metadata_edit")?;
        self.metadata = metadata.into();
        info!(
            "event=metadata_edit module=directory status=ok organisation={}",
            self.identity
        );
        Ok(DirectoryEvent::OrganisationMetadataEdited)
    }

    /// Deploys a registry bound to this organisation; owner only.
    ///
    /// The owner becomes the new registry's administrator. The handle is
    /// appended at the next catalog index.
    pub fn deploy_register(
        &mut self,
        caller: Identity,
        metadata: impl Into<String>,
    ) -> DirectoryResult<(RegistryHandle, DirectoryEvent)> {
        self.require_owner(caller, "register_deploy")?;

        let registry_id = Uuid::new_v4();
        let store = (self.store_factory)(registry_id).map_err(RegistryError::from)?;
        let registry = Registry::with_store(registry_id, caller, self.identity, metadata, store)?;
        let handle = RegistryHandle::new(registry);

        let index = self.registers.len();
        self.registers.push(handle.clone());
        info!(
            "event=register_deploy module=directory status=ok organisation={} index={} registry_id={}",
            self.identity, index, registry_id
        );
        Ok((
            handle,
            DirectoryEvent::RegisterDeployed { index, registry_id },
        ))
    }

    fn require_owner(&self, caller: Identity, operation: &str) -> DirectoryResult<()> {
        if caller == self.owner {
            return Ok(());
        }
        warn!(
            "event={operation} module=directory status=denied organisation={} caller={}",
            self.identity, caller
        );
        Err(DirectoryError::Unauthorized { caller })
    }
}

impl Debug for OrganisationDirectory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrganisationDirectory")
            .field("identity", &self.identity)
            .field("owner", &self.owner)
            .field("registers", &self.registers)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::{DirectoryError, OrganisationDirectory, StoreFactory};
    use crate::model::identity::Identity;
    use crate::repo::record_store::{RecordStore, StoreError, StoreResult};
    use std::sync::Arc;
    use uuid::Uuid;

    #[test]
    fn rejects_zero_owner() {
        let err = OrganisationDirectory::new("meta", Identity::ZERO)
            .expect_err("zero owner must fail");
        assert!(matches!(err, DirectoryError::InvalidOwner));
    }

    #[test]
    fn failed_store_factory_leaves_catalog_empty() {
        let owner = Identity::generate();
        let failing: StoreFactory = Arc::new(|_: Uuid| -> StoreResult<Box<dyn RecordStore>> {
            Err(StoreError::InvalidData("backend offline".to_string()))
        });
        let mut directory = OrganisationDirectory::new("meta", owner)
            .expect("directory")
            .with_store_factory(failing);

        let err = directory
            .deploy_register(owner, "register")
            .expect_err("factory failure must surface");
        assert!(matches!(err, DirectoryError::Registry(_)));
        assert_eq!(directory.register_count(), 0);
    }
}
