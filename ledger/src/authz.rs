//! Authorization registry: the owning identity plus granted verifiers.
//!
//! The owner is set once at construction and never changes; there is no
//! transfer operation. The owner always counts as a verifier.

use crate::errors::LedgerError;
use crate::identity::Identity;
use std::collections::BTreeSet;

pub struct AuthorizationRegistry {
    owner: Identity,
    verifiers: BTreeSet<Identity>,
}

impl AuthorizationRegistry {
    pub fn new(owner: Identity) -> Self {
        Self {
            owner,
            verifiers: BTreeSet::new(),
        }
    }

    /// Rebuild a registry from persisted state. Null identities are not
    /// restorable grant targets and are dropped.
    pub fn restore(owner: Identity, verifiers: impl IntoIterator<Item = Identity>) -> Self {
        Self {
            owner,
            verifiers: verifiers.into_iter().filter(|v| !v.is_null()).collect(),
        }
    }

    pub fn owner(&self) -> Identity {
        self.owner
    }

    pub fn is_owner(&self, id: Identity) -> bool {
        id == self.owner
    }

    pub fn is_verifier(&self, id: Identity) -> bool {
        id == self.owner || self.verifiers.contains(&id)
    }

    /// Grant the verifier capability to `target`. Owner-only; idempotent.
    pub fn grant(&mut self, caller: Identity, target: Identity) -> Result<(), LedgerError> {
        if !self.is_owner(caller) {
            return Err(LedgerError::Unauthorized);
        }
        if target.is_null() {
            return Err(LedgerError::InvalidTarget);
        }

        self.verifiers.insert(target);
        Ok(())
    }

    /// Revoke the verifier capability from `target`. Owner-only; the owner's
    /// implicit capability cannot be revoked. No-op if absent.
    pub fn revoke(&mut self, caller: Identity, target: Identity) -> Result<(), LedgerError> {
        if !self.is_owner(caller) {
            return Err(LedgerError::Unauthorized);
        }
        if target == self.owner {
            return Err(LedgerError::CannotRemoveOwner);
        }

        self.verifiers.remove(&target);
        Ok(())
    }

    /// Granted verifiers, excluding the owner's implicit capability.
    pub fn verifiers(&self) -> impl Iterator<Item = Identity> + '_ {
        self.verifiers.iter().copied()
    }
}
