//! Capability membership, independent of registry semantics.
//!
//! # Invariants
//! - `check` is pure and never fails.
//! - `grant`/`revoke` require the caller to hold `Capability::Admin`.
//! - Granting an existing member and revoking a non-member are no-ops.
//! - The zero identity never becomes a member.

use crate::access::capability::Capability;
use crate::model::identity::Identity;
use log::{debug, warn};
use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Role membership errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleError {
    /// Caller lacks the capability required for the operation.
    Unauthorized {
        capability: Capability,
        caller: Identity,
    },
    /// Target account is the zero identity.
    InvalidAccount,
}

impl Display for RoleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthorized { capability, caller } => {
                write!(f, "account {caller} is missing capability {capability}")
            }
            Self::InvalidAccount => write!(f, "capability target must not be the zero identity"),
        }
    }
}

impl Error for RoleError {}

/// Membership mapping from capability to accounts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleAuthority {
    members: BTreeMap<Capability, BTreeSet<Identity>>,
}

impl RoleAuthority {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an authority where `admin` holds every capability.
    pub fn with_admin(admin: Identity) -> Result<Self, RoleError> {
        if admin.is_zero() {
            return Err(RoleError::InvalidAccount);
        }
        let mut authority = Self::new();
        for capability in Capability::ALL {
            authority.insert(capability, admin);
        }
        Ok(authority)
    }

    /// Returns whether `account` holds `capability`.
    pub fn check(&self, capability: Capability, account: Identity) -> bool {
        self.members
            .get(&capability)
            .is_some_and(|holders| holders.contains(&account))
    }

    /// Fails `Unauthorized` unless `account` holds `capability`.
    pub fn require(&self, capability: Capability, account: Identity) -> Result<(), RoleError> {
        if self.check(capability, account) {
            return Ok(());
        }
        warn!(
            "event=capability_denied module=access status=denied capability={} caller={}",
            capability, account
        );
        Err(RoleError::Unauthorized {
            capability,
            caller: account,
        })
    }

    /// Adds `account` to `capability`. Returns whether membership changed.
    pub fn grant(
        &mut self,
        caller: Identity,
        capability: Capability,
        account: Identity,
    ) -> Result<bool, RoleError> {
        self.require(Capability::Admin, caller)?;
        if account.is_zero() {
            return Err(RoleError::InvalidAccount);
        }
        let changed = self.insert(capability, account);
        debug!(
            "event=capability_grant module=access status=ok capability={} account={} changed={}",
            capability, account, changed
        );
        Ok(changed)
    }

    /// Removes `account` from `capability`. Returns whether membership changed.
    pub fn revoke(
        &mut self,
        caller: Identity,
        capability: Capability,
        account: Identity,
    ) -> Result<bool, RoleError> {
        self.require(Capability::Admin, caller)?;
        if account.is_zero() {
            return Err(RoleError::InvalidAccount);
        }
        let changed = self.remove(capability, account);
        debug!(
            "event=capability_revoke module=access status=ok capability={} account={} changed={}",
            capability, account, changed
        );
        Ok(changed)
    }

    /// Drops the caller's own membership; no admin capability needed.
    pub fn renounce(&mut self, caller: Identity, capability: Capability) -> bool {
        let changed = self.remove(capability, caller);
        debug!(
            "event=capability_renounce module=access status=ok capability={} account={} changed={}",
            capability, caller, changed
        );
        changed
    }

    /// Holders of `capability` in identity order.
    pub fn members(&self, capability: Capability) -> Vec<Identity> {
        self.members
            .get(&capability)
            .map(|holders| holders.iter().copied().collect())
            .unwrap_or_default()
    }

    fn insert(&mut self, capability: Capability, account: Identity) -> bool {
        self.members.entry(capability).or_default().insert(account)
    }

    fn remove(&mut self, capability: Capability, account: Identity) -> bool {
        let Some(holders) = self.members.get_mut(&capability) else {
            return false;
        };
        let removed = holders.remove(&account);
        if holders.is_empty() {
            self.members.remove(&capability);
        }
        removed
    }
}
