//! Aggregate in-memory ledger state

use crate::authorization::AuthorizationRegistry;
use crate::batches::BatchLedger;
use crate::facts::{Commit, LedgerFact};
use crate::nonce::NonceTable;

/// Everything the transition engine reads and mutates
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerState {
    registry: AuthorizationRegistry,
    nonces: NonceTable,
    batches: BatchLedger,
    sequence: u64,
}

impl LedgerState {
    /// Manufacturer authorization registry
    pub fn registry(&self) -> &AuthorizationRegistry {
        &self.registry
    }

    /// Replay-protection counters
    pub fn nonces(&self) -> &NonceTable {
        &self.nonces
    }

    /// Batch records and histories
    pub fn batches(&self) -> &BatchLedger {
        &self.batches
    }

    /// Sequence number of the last applied commit (0 before any)
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Apply every fact of a commit in order
    pub fn apply(&mut self, commit: &Commit) {
        for fact in &commit.facts {
            self.apply_fact(fact.clone());
        }
        self.sequence = commit.sequence;
    }

    fn apply_fact(&mut self, fact: LedgerFact) {
        match fact {
            LedgerFact::ManufacturerStatusChanged { target, status, .. } => {
                self.registry.apply(target, status);
            }
            LedgerFact::BatchRegistered { record } => {
                let drug_id = record.drug_id().to_string();
                if !self.batches.apply_registration(record) {
                    tracing::warn!(%drug_id, "ignoring registration of an existing batch");
                }
            }
            LedgerFact::NonceConsumed { identity, consumed } => {
                self.nonces.apply(identity, consumed);
            }
            LedgerFact::CheckpointAppended { drug_id, entry } => {
                if !self.batches.apply_checkpoint(&drug_id, entry) {
                    tracing::warn!(%drug_id, "ignoring checkpoint for an unknown batch");
                }
            }
        }
    }
}
