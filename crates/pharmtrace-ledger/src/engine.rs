//! Transition engine
//!
//! The single entry point for mutation. Every write runs under the state
//! write lock for its whole validate, persist and apply window:
//!
//! 1. stage: run every check against current state and collect the facts
//! 2. persist: append the facts to the journal as one commit
//! 3. apply: fold the commit into state
//!
//! A failure in (1) or (2) returns before (3), so a rejected write changes
//! nothing. If a failed append cannot be rolled back the journal may hold a
//! commit the state never saw, and the engine refuses all further writes. Reads take the read lock and never see a half-applied commit.

use crate::authorization::AdminSet;
use crate::batches::BatchProvenance;
use crate::config::{CheckpointPolicy, LedgerConfig, RegistrationPolicy};
use crate::facts::{Commit, LedgerFact};
use crate::journal::{Journal, MemoryJournal};
use crate::state::LedgerState;
use parking_lot::{Mutex, RwLock};
use pharmtrace_core::{
    registration_digest, BatchRecord, CheckpointEntry, Clock, DrugFields, Identity, LedgerError,
    LedgerResult, ManufacturerStatus, SystemClock,
};
use pharmtrace_signature::{verify_claimed_signer, RecoverableSignature};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Registration relayed on behalf of a manufacturer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRegistration {
    /// Claimed signer; the registration is attributed to this identity
    pub signer: Identity,
    /// Drug fields covered by the signature
    pub drug: DrugFields,
    /// Nonce the signature is bound to
    pub nonce: u64,
    /// 65-byte `r || s || v` signature over the registration digest
    pub signature: Vec<u8>,
}

/// Single-writer state machine over the provenance ledger
pub struct TransitionEngine {
    state: RwLock<LedgerState>,
    journal: Mutex<Box<dyn Journal>>,
    admins: AdminSet,
    registration_policy: RegistrationPolicy,
    checkpoint_policy: CheckpointPolicy,
    clock: Arc<dyn Clock>,
    journal_dirty: AtomicBool,
}

impl TransitionEngine {
    /// Ledger with no durable storage
    pub fn in_memory(config: &LedgerConfig) -> LedgerResult<Self> {
        Self::open(config, Box::new(MemoryJournal::new()))
    }

    /// Open a ledger over `journal`, replaying every commit it holds
    pub fn open(config: &LedgerConfig, mut journal: Box<dyn Journal>) -> LedgerResult<Self> {
        let owner = config.owner.ensure_nonzero()?;
        for admin in &config.admins {
            admin.ensure_nonzero()?;
        }

        let mut state = LedgerState::default();
        let commits = journal.load()?;
        for commit in &commits {
            if commit.sequence != state.sequence() + 1 {
                return Err(LedgerError::storage(format!(
                    "journal gap: expected commit {}, found {}",
                    state.sequence() + 1,
                    commit.sequence
                )));
            }
            state.apply(commit);
        }
        debug!(
            commits = commits.len(),
            batches = state.batches().len(),
            "replayed ledger journal"
        );

        Ok(Self {
            state: RwLock::new(state),
            journal: Mutex::new(journal),
            admins: AdminSet::new(owner, config.admins.iter().copied()),
            registration_policy: config.registration_policy,
            checkpoint_policy: config.checkpoint_policy,
            clock: Arc::new(SystemClock),
            journal_dirty: AtomicBool::new(false),
        })
    }

    /// Replace the clock used for registration timestamps
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Admin set fixed at creation
    pub fn admins(&self) -> &AdminSet {
        &self.admins
    }

    // ---------------------------------------------------------------------
    // Writes
    // ---------------------------------------------------------------------

    /// Grant `target` permission to register batches
    pub fn authorize(&self, admin: Identity, target: Identity) -> LedgerResult<()> {
        self.set_status(admin, target, ManufacturerStatus::Authorized)
    }

    /// Withdraw `target`'s permission to register batches
    pub fn revoke(&self, admin: Identity, target: Identity) -> LedgerResult<()> {
        self.set_status(admin, target, ManufacturerStatus::Revoked)
    }

    fn set_status(
        &self,
        admin: Identity,
        target: Identity,
        status: ManufacturerStatus,
    ) -> LedgerResult<()> {
        let operation = match status {
            ManufacturerStatus::Authorized => "authorize",
            _ => "revoke",
        };
        self.commit(operation, |state| {
            let fact = state
                .registry()
                .stage_transition(&self.admins, admin, target, status)?;
            Ok(fact.into_iter().collect())
        })
    }

    /// Register a batch attributed to `caller` without a signature
    pub fn register(&self, caller: Identity, drug: DrugFields) -> LedgerResult<()> {
        self.commit("register", |state| {
            drug.validate()?;
            self.check_registration_policy(state, caller)?;
            let record = BatchRecord {
                drug,
                registered_by: caller,
                registered_at: self.clock.now_unix(),
            };
            Ok(vec![state.batches().stage_registration(record)?])
        })
    }

    /// Register a batch relayed on behalf of a signing manufacturer.
    ///
    /// Checks run in order: signer authorized, nonce current, batch new,
    /// signature recovers to the signer. Record creation and nonce
    /// consumption commit together.
    pub fn register_with_signature(&self, request: SignedRegistration) -> LedgerResult<()> {
        let SignedRegistration {
            signer,
            drug,
            nonce,
            signature,
        } = request;

        self.commit("register_with_signature", |state| {
            drug.validate()?;
            if !state.registry().is_authorized(signer) {
                return Err(LedgerError::NotAuthorized { signer });
            }
            state.nonces().check(signer, nonce)?;
            if state.batches().contains(&drug.drug_id) {
                return Err(LedgerError::duplicate_batch(&drug.drug_id));
            }

            let signature = RecoverableSignature::from_slice(&signature)?;
            let digest = registration_digest(&drug, nonce);
            verify_claimed_signer(&digest, &signature, signer)?;

            let record = BatchRecord {
                drug,
                registered_by: signer,
                registered_at: self.clock.now_unix(),
            };
            Ok(vec![
                state.batches().stage_registration(record)?,
                state.nonces().consume(signer, nonce)?,
            ])
        })
    }

    /// Append a custody checkpoint to an existing batch
    pub fn update_location(
        &self,
        caller: Identity,
        drug_id: &str,
        location: impl Into<String>,
        timestamp: impl Into<String>,
    ) -> LedgerResult<()> {
        let entry = CheckpointEntry::new(location, timestamp, caller);
        self.commit("update_location", |state| {
            if drug_id.trim().is_empty() {
                return Err(LedgerError::missing_field("drugId"));
            }
            self.check_checkpoint_policy(state, caller)?;
            Ok(vec![state.batches().stage_checkpoint(drug_id, entry)?])
        })
    }

    fn check_registration_policy(&self, state: &LedgerState, caller: Identity) -> LedgerResult<()> {
        let allowed = match self.registration_policy {
            RegistrationPolicy::OperatorOnly => self.admins.is_admin(caller),
            RegistrationPolicy::OperatorOrAuthorized => {
                self.admins.is_admin(caller) || state.registry().is_authorized(caller)
            }
            RegistrationPolicy::Open => true,
        };
        if allowed {
            Ok(())
        } else {
            Err(LedgerError::unauthorized(caller, "register batches"))
        }
    }

    fn check_checkpoint_policy(&self, state: &LedgerState, caller: Identity) -> LedgerResult<()> {
        match self.checkpoint_policy {
            CheckpointPolicy::Open => Ok(()),
            CheckpointPolicy::Restricted
                if self.admins.is_admin(caller) || state.registry().is_authorized(caller) =>
            {
                Ok(())
            }
            CheckpointPolicy::Restricted => {
                Err(LedgerError::unauthorized(caller, "append checkpoints"))
            }
        }
    }

    fn commit<F>(&self, operation: &'static str, stage: F) -> LedgerResult<()>
    where
        F: FnOnce(&LedgerState) -> LedgerResult<Vec<LedgerFact>>,
    {
        let mut state = self.state.write();
        if self.journal_dirty.load(Ordering::Acquire) {
            return Err(LedgerError::storage(
                "journal holds an unrolled-back commit; reopen the ledger",
            ));
        }

        let facts = match stage(&state) {
            Ok(facts) => facts,
            Err(err) => {
                warn!(operation, code = err.code(), error = %err, "rejected ledger write");
                return Err(err);
            }
        };
        if facts.is_empty() {
            debug!(operation, "ledger write was a no-op");
            return Ok(());
        }

        let commit = Commit {
            sequence: state.sequence() + 1,
            facts,
        };
        if let Err(err) = self.journal.lock().append(&commit) {
            error!(operation, sequence = commit.sequence, error = %err, "journal append failed");
            if err.leaves_journal_dirty() {
                self.journal_dirty.store(true, Ordering::Release);
            }
            return Err(err.into());
        }
        state.apply(&commit);

        info!(
            operation,
            sequence = commit.sequence,
            facts = ?commit.facts.iter().map(LedgerFact::kind).collect::<Vec<_>>(),
            "committed ledger write"
        );
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Reads
    // ---------------------------------------------------------------------

    /// Current nonce for `identity`
    pub fn current_nonce(&self, identity: Identity) -> u64 {
        self.state.read().nonces().current(identity)
    }

    /// Whether `identity` is an authorized manufacturer
    pub fn is_authorized(&self, identity: Identity) -> bool {
        self.state.read().registry().is_authorized(identity)
    }

    /// Recorded status of `identity`
    pub fn manufacturer_status(&self, identity: Identity) -> ManufacturerStatus {
        self.state.read().registry().status(identity)
    }

    /// Every manufacturer an admin has acted on
    pub fn manufacturers(&self) -> Vec<(Identity, ManufacturerStatus)> {
        self.state.read().registry().entries().collect()
    }

    /// Registration record for `drug_id`
    pub fn get_details(&self, drug_id: &str) -> LedgerResult<BatchRecord> {
        self.state.read().batches().get_details(drug_id).cloned()
    }

    /// Checkpoint history for `drug_id`, in append order
    pub fn get_history(&self, drug_id: &str) -> LedgerResult<Vec<CheckpointEntry>> {
        self.state
            .read()
            .batches()
            .get_history(drug_id)
            .map(<[CheckpointEntry]>::to_vec)
    }

    /// Record and history read under one lock
    pub fn provenance(&self, drug_id: &str) -> LedgerResult<BatchProvenance> {
        self.state.read().batches().provenance(drug_id)
    }

    /// Number of registered batches
    pub fn batch_count(&self) -> usize {
        self.state.read().batches().len()
    }

    /// Sequence number of the last commit
    pub fn sequence(&self) -> u64 {
        self.state.read().sequence()
    }
}

impl std::fmt::Debug for TransitionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransitionEngine")
            .field("owner", &self.admins.owner())
            .field("registration_policy", &self.registration_policy)
            .field("checkpoint_policy", &self.checkpoint_policy)
            .field("sequence", &self.sequence())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::{FileJournal, JournalError};
    use pharmtrace_core::FixedClock;

    fn id(n: u8) -> Identity {
        Identity::from_bytes([n; 20])
    }

    fn engine(policy: RegistrationPolicy) -> TransitionEngine {
        let mut config = LedgerConfig::new(id(1));
        config.registration_policy = policy;
        TransitionEngine::in_memory(&config)
            .unwrap()
            .with_clock(Arc::new(FixedClock::new(1_700_000_000)))
    }

    fn drug(drug_id: &str) -> DrugFields {
        DrugFields::new(drug_id, "Ibuprofen", "Ibuprofen", "200mg", "B-7", "2029-09-30")
    }

    #[test]
    fn operator_registration_stamps_clock_time() {
        let engine = engine(RegistrationPolicy::OperatorOrAuthorized);
        engine.register(id(1), drug("D1")).unwrap();
        let record = engine.get_details("D1").unwrap();
        assert_eq!(record.registered_by, id(1));
        assert_eq!(record.registered_at, 1_700_000_000);
        assert_eq!(engine.sequence(), 1);
    }

    #[test]
    fn operator_only_policy_refuses_authorized_manufacturer() {
        let engine = engine(RegistrationPolicy::OperatorOnly);
        engine.authorize(id(1), id(5)).unwrap();
        let err = engine.register(id(5), drug("D1")).unwrap_err();
        assert!(matches!(err, LedgerError::Unauthorized { .. }));
    }

    #[test]
    fn open_policy_accepts_anyone() {
        let engine = engine(RegistrationPolicy::Open);
        engine.register(id(42), drug("D1")).unwrap();
        assert_eq!(engine.batch_count(), 1);
    }

    #[test]
    fn idempotent_authorization_does_not_commit() {
        let engine = engine(RegistrationPolicy::OperatorOrAuthorized);
        engine.authorize(id(1), id(5)).unwrap();
        engine.authorize(id(1), id(5)).unwrap();
        assert_eq!(engine.sequence(), 1);
        assert_eq!(engine.manufacturers(), vec![(id(5), ManufacturerStatus::Authorized)]);
    }

    #[test]
    fn restricted_checkpoints_require_a_role() {
        let mut config = LedgerConfig::new(id(1));
        config.checkpoint_policy = CheckpointPolicy::Restricted;
        let engine = TransitionEngine::in_memory(&config).unwrap();
        engine.register(id(1), drug("D1")).unwrap();

        let err = engine
            .update_location(id(8), "D1", "Dock", "1700000001")
            .unwrap_err();
        assert!(matches!(err, LedgerError::Unauthorized { .. }));

        engine.authorize(id(1), id(8)).unwrap();
        engine
            .update_location(id(8), "D1", "Dock", "1700000001")
            .unwrap();
        assert_eq!(engine.get_history("D1").unwrap().len(), 1);
    }

    #[test]
    fn zero_owner_cannot_open_a_ledger() {
        let config = LedgerConfig::new(Identity::ZERO);
        assert!(matches!(
            TransitionEngine::in_memory(&config),
            Err(LedgerError::InvalidAddress { .. })
        ));
    }

    #[test]
    fn failed_append_does_not_break_later_writes_or_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal.jsonl");
        let config = LedgerConfig::new(id(1));

        let mut journal = FileJournal::open(&path).unwrap();
        journal.fail_next_sync();
        let engine = TransitionEngine::open(&config, Box::new(journal)).unwrap();

        assert!(matches!(
            engine.register(id(1), drug("D1")),
            Err(LedgerError::Storage { .. })
        ));
        assert_eq!(engine.sequence(), 0);
        engine.register(id(1), drug("D2")).unwrap();
        assert_eq!(engine.sequence(), 1);
        drop(engine);

        let reopened =
            TransitionEngine::open(&config, Box::new(FileJournal::open(&path).unwrap())).unwrap();
        assert_eq!(reopened.sequence(), 1);
        assert_eq!(reopened.batch_count(), 1);
        assert!(reopened.get_details("D2").is_ok());
        assert!(matches!(
            reopened.get_details("D1"),
            Err(LedgerError::BatchNotFound { .. })
        ));
    }

    /// Journal whose first append fails without being able to roll back
    struct UnrecoverableJournal {
        failed: bool,
    }

    impl Journal for UnrecoverableJournal {
        fn append(&mut self, _commit: &Commit) -> Result<(), JournalError> {
            if self.failed {
                return Ok(());
            }
            self.failed = true;
            Err(JournalError::RollbackFailed {
                reason: "sync failed".into(),
                source: std::io::Error::new(std::io::ErrorKind::Other, "truncate failed"),
            })
        }

        fn load(&mut self) -> Result<Vec<Commit>, JournalError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn unrecoverable_append_stops_all_writes() {
        let config = LedgerConfig::new(id(1));
        let engine =
            TransitionEngine::open(&config, Box::new(UnrecoverableJournal { failed: false }))
                .unwrap();

        assert!(matches!(
            engine.register(id(1), drug("D1")),
            Err(LedgerError::Storage { .. })
        ));
        assert!(matches!(
            engine.register(id(1), drug("D2")),
            Err(LedgerError::Storage { .. })
        ));
        assert!(matches!(
            engine.authorize(id(1), id(5)),
            Err(LedgerError::Storage { .. })
        ));
        assert_eq!(engine.sequence(), 0);
        assert_eq!(engine.batch_count(), 0);
    }
}
