//! Response types
//!
//! Every response carries `ok`. Failures add the human-readable `error` and
//! the stable `kind` code from [`LedgerError::code`].

use pharmtrace_core::{CheckpointEntry, Identity, LedgerError, ManufacturerStatus};
use pharmtrace_ledger::BatchProvenance;
use serde::Serialize;

/// Verify payload: registration fields plus the custody chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchView {
    /// Always `true`
    pub ok: bool,
    /// Batch identifier
    pub drug_id: String,
    /// Commercial drug name
    pub drug_name: String,
    /// Active ingredients
    pub composition: String,
    /// Dosage
    pub dosage: String,
    /// Manufacturer batch number
    pub batch_no: String,
    /// Expiry date
    pub expiry: String,
    /// Identity the registration is attributed to
    pub registered_by: Identity,
    /// Unix seconds at registration
    pub registered_at: u64,
    /// Checkpoints in append order
    pub history: Vec<CheckpointEntry>,
}

impl From<BatchProvenance> for BatchView {
    fn from(provenance: BatchProvenance) -> Self {
        let BatchProvenance { record, history } = provenance;
        let drug = record.drug;
        Self {
            ok: true,
            drug_id: drug.drug_id,
            drug_name: drug.drug_name,
            composition: drug.composition,
            dosage: drug.dosage,
            batch_no: drug.batch_no,
            expiry: drug.expiry_date,
            registered_by: record.registered_by,
            registered_at: record.registered_at,
            history,
        }
    }
}

/// Response to one request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum LedgerResponse {
    /// Write accepted
    Message {
        /// Always `true`
        ok: bool,
        /// Confirmation text
        msg: String,
    },
    /// Current nonce of an address
    Nonce {
        /// Always `true`
        ok: bool,
        /// Next nonce the address must sign over
        nonce: u64,
    },
    /// Manufacturer status
    Status {
        /// Always `true`
        ok: bool,
        /// Queried address
        address: Identity,
        /// Status of that address
        status: ManufacturerStatus,
    },
    /// Batch details and history
    Batch(Box<BatchView>),
    /// Rejected request
    Failure {
        /// Always `false`
        ok: bool,
        /// Human-readable reason
        error: String,
        /// Stable error code
        kind: String,
    },
}

impl LedgerResponse {
    pub(crate) fn message(msg: impl Into<String>) -> Self {
        Self::Message {
            ok: true,
            msg: msg.into(),
        }
    }

    pub(crate) fn invalid_request(error: impl Into<String>) -> Self {
        Self::Failure {
            ok: false,
            error: error.into(),
            kind: "invalid_request".to_string(),
        }
    }

    /// Whether the request succeeded
    pub fn is_ok(&self) -> bool {
        !matches!(self, Self::Failure { .. })
    }

    /// Failure code, if any
    pub fn kind(&self) -> Option<&str> {
        match self {
            Self::Failure { kind, .. } => Some(kind),
            _ => None,
        }
    }
}

impl From<&LedgerError> for LedgerResponse {
    fn from(err: &LedgerError) -> Self {
        Self::Failure {
            ok: false,
            error: err.to_string(),
            kind: err.code().to_string(),
        }
    }
}
