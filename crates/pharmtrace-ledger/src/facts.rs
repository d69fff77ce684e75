//! Ledger facts
//!
//! A fact is the effect of a validated transition, recorded after every
//! check has passed. Applying a fact cannot fail, so replaying the journal
//! rebuilds exactly the committed state.

use pharmtrace_core::{BatchRecord, CheckpointEntry, Identity, ManufacturerStatus};
use serde::{Deserialize, Serialize};

/// State change produced by a committed transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LedgerFact {
    /// Admin moved a manufacturer to a new status
    ManufacturerStatusChanged {
        /// Admin that made the change
        admin: Identity,
        /// Manufacturer affected
        target: Identity,
        /// New status
        status: ManufacturerStatus,
    },

    /// Batch registered (directly or by signature)
    BatchRegistered {
        /// Immutable registration record
        record: BatchRecord,
    },

    /// Signed write consumed a nonce
    NonceConsumed {
        /// Signer whose counter advanced
        identity: Identity,
        /// Nonce that was used; the counter becomes `consumed + 1`
        consumed: u64,
    },

    /// Checkpoint appended to a batch history
    CheckpointAppended {
        /// Batch the checkpoint belongs to
        drug_id: String,
        /// Appended entry
        entry: CheckpointEntry,
    },
}

impl LedgerFact {
    /// Short label for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ManufacturerStatusChanged { .. } => "manufacturer_status_changed",
            Self::BatchRegistered { .. } => "batch_registered",
            Self::NonceConsumed { .. } => "nonce_consumed",
            Self::CheckpointAppended { .. } => "checkpoint_appended",
        }
    }
}

/// All facts of one accepted operation, applied together or not at all
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    /// 1-based position in the journal
    pub sequence: u64,
    /// Facts in application order
    pub facts: Vec<LedgerFact>,
}
