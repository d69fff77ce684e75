//! Admin set and manufacturer authorization registry
//!
//! Admins are fixed when the ledger is created: the owner plus any admins
//! named in configuration. Admins flip manufacturer status between
//! `Authorized` and `Revoked`; a status is never removed once recorded.

use crate::facts::LedgerFact;
use pharmtrace_core::{Identity, LedgerError, LedgerResult, ManufacturerStatus};
use std::collections::{BTreeMap, BTreeSet};

/// Identities allowed to perform admin operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminSet {
    owner: Identity,
    admins: BTreeSet<Identity>,
}

impl AdminSet {
    /// Owner plus additional admins
    pub fn new(owner: Identity, admins: impl IntoIterator<Item = Identity>) -> Self {
        let mut set: BTreeSet<Identity> = admins.into_iter().collect();
        set.insert(owner);
        Self { owner, admins: set }
    }

    /// Ledger owner
    pub fn owner(&self) -> Identity {
        self.owner
    }

    /// Whether `identity` holds the admin role
    pub fn is_admin(&self, identity: Identity) -> bool {
        self.admins.contains(&identity)
    }

    /// Fail with `Unauthorized` unless `caller` is an admin
    pub fn require_admin(&self, caller: Identity, action: &str) -> LedgerResult<()> {
        if self.is_admin(caller) {
            Ok(())
        } else {
            Err(LedgerError::unauthorized(caller, action))
        }
    }

    /// All admins, owner included
    pub fn members(&self) -> impl Iterator<Item = Identity> + '_ {
        self.admins.iter().copied()
    }
}

/// Recorded status for every manufacturer an admin has acted on
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorizationRegistry {
    statuses: BTreeMap<Identity, ManufacturerStatus>,
}

impl AuthorizationRegistry {
    /// Status of `identity`; `Unknown` when never recorded
    pub fn status(&self, identity: Identity) -> ManufacturerStatus {
        self.statuses.get(&identity).copied().unwrap_or_default()
    }

    /// Whether `identity` is currently `Authorized`
    pub fn is_authorized(&self, identity: Identity) -> bool {
        self.status(identity) == ManufacturerStatus::Authorized
    }

    /// Every recorded manufacturer with its status, ordered by identity
    pub fn entries(&self) -> impl Iterator<Item = (Identity, ManufacturerStatus)> + '_ {
        self.statuses.iter().map(|(id, status)| (*id, *status))
    }

    /// Validate a status change and produce its fact.
    ///
    /// Returns `Ok(None)` when `target` already has `status`.
    pub(crate) fn stage_transition(
        &self,
        admins: &AdminSet,
        admin: Identity,
        target: Identity,
        status: ManufacturerStatus,
    ) -> LedgerResult<Option<LedgerFact>> {
        let action = match status {
            ManufacturerStatus::Authorized => "authorize manufacturers",
            _ => "revoke manufacturers",
        };
        admins.require_admin(admin, action)?;
        let target = target.ensure_nonzero()?;

        if self.status(target) == status {
            return Ok(None);
        }
        Ok(Some(LedgerFact::ManufacturerStatusChanged {
            admin,
            target,
            status,
        }))
    }

    pub(crate) fn apply(&mut self, target: Identity, status: ManufacturerStatus) {
        self.statuses.insert(target, status);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u8) -> Identity {
        Identity::from_bytes([n; 20])
    }

    #[test]
    fn owner_is_always_admin() {
        let admins = AdminSet::new(id(1), [id(2)]);
        assert!(admins.is_admin(id(1)));
        assert!(admins.is_admin(id(2)));
        assert!(!admins.is_admin(id(3)));
        assert_eq!(admins.members().count(), 2);
    }

    #[test]
    fn non_admin_is_refused_before_target_checks() {
        let registry = AuthorizationRegistry::default();
        let admins = AdminSet::new(id(1), []);
        let err = registry
            .stage_transition(&admins, id(9), Identity::ZERO, ManufacturerStatus::Authorized)
            .unwrap_err();
        assert!(matches!(err, LedgerError::Unauthorized { .. }));
    }

    #[test]
    fn zero_target_is_invalid() {
        let registry = AuthorizationRegistry::default();
        let admins = AdminSet::new(id(1), []);
        let err = registry
            .stage_transition(&admins, id(1), Identity::ZERO, ManufacturerStatus::Revoked)
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidAddress { .. }));
    }

    #[test]
    fn repeating_a_status_is_a_no_op() {
        let mut registry = AuthorizationRegistry::default();
        let admins = AdminSet::new(id(1), []);
        let fact = registry
            .stage_transition(&admins, id(1), id(5), ManufacturerStatus::Authorized)
            .unwrap();
        assert!(fact.is_some());
        registry.apply(id(5), ManufacturerStatus::Authorized);

        let again = registry
            .stage_transition(&admins, id(1), id(5), ManufacturerStatus::Authorized)
            .unwrap();
        assert!(again.is_none());
        assert!(registry.is_authorized(id(5)));
    }

    #[test]
    fn unseen_identity_is_unknown() {
        let registry = AuthorizationRegistry::default();
        assert_eq!(registry.status(id(4)), ManufacturerStatus::Unknown);
        assert!(!registry.is_authorized(id(4)));
    }
}
