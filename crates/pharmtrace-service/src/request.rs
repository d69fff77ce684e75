//! Request types
//!
//! Identity and signature fields stay as text here so malformed values are
//! reported as ledger errors (`invalid_address`, `invalid_signature`,
//! `missing_fields`) rather than as unparseable requests.

use pharmtrace_core::DrugFields;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Checkpoint timestamp as sent by scanners: a number or a string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimestampValue {
    /// Unix time or counter
    Number(u64),
    /// Any textual timestamp, kept verbatim
    Text(String),
}

impl fmt::Display for TimestampValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// One external request, tagged by `op`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op")]
pub enum LedgerRequest {
    /// Direct registration attributed to `from` (default: the operator)
    #[serde(rename = "register")]
    Register {
        /// Drug fields
        #[serde(flatten)]
        drug: DrugFields,
        /// Caller identity
        #[serde(default, skip_serializing_if = "Option::is_none")]
        from: Option<String>,
    },

    /// Registration relayed on behalf of a signing manufacturer
    #[serde(rename = "registerWithSig")]
    RegisterWithSig {
        /// Drug fields covered by the signature
        #[serde(flatten)]
        drug: DrugFields,
        /// Claimed signer address
        #[serde(default)]
        signer: String,
        /// Hex-encoded 65-byte signature
        #[serde(default)]
        signature: String,
        /// Nonce the signature is bound to; the signer's current nonce when absent
        #[serde(default, skip_serializing_if = "Option::is_none")]
        nonce: Option<u64>,
    },

    /// Append a custody checkpoint
    #[serde(rename = "updateLocation", rename_all = "camelCase")]
    UpdateLocation {
        /// Batch identifier
        #[serde(default)]
        drug_id: String,
        /// Location label
        #[serde(default)]
        location: String,
        /// Caller-supplied timestamp
        #[serde(default)]
        timestamp: Option<TimestampValue>,
        /// Caller identity
        #[serde(default, skip_serializing_if = "Option::is_none")]
        from: Option<String>,
    },

    /// Current nonce of an address
    #[serde(rename = "nonce")]
    Nonce {
        /// Address to query
        #[serde(default)]
        address: String,
    },

    /// Batch details plus full custody chain
    #[serde(rename = "verify", rename_all = "camelCase")]
    Verify {
        /// Batch identifier
        #[serde(default)]
        drug_id: String,
    },

    /// Grant manufacturer authorization
    #[serde(rename = "authorizeManufacturer")]
    AuthorizeManufacturer {
        /// Manufacturer address
        #[serde(default)]
        address: String,
        /// Admin identity
        #[serde(default, skip_serializing_if = "Option::is_none")]
        from: Option<String>,
    },

    /// Revoke manufacturer authorization
    #[serde(rename = "revokeManufacturer")]
    RevokeManufacturer {
        /// Manufacturer address
        #[serde(default)]
        address: String,
        /// Admin identity
        #[serde(default, skip_serializing_if = "Option::is_none")]
        from: Option<String>,
    },

    /// Manufacturer status lookup
    #[serde(rename = "status")]
    Status {
        /// Manufacturer address
        #[serde(default)]
        address: String,
    },
}

impl LedgerRequest {
    /// Wire name of the operation
    pub fn op(&self) -> &'static str {
        match self {
            Self::Register { .. } => "register",
            Self::RegisterWithSig { .. } => "registerWithSig",
            Self::UpdateLocation { .. } => "updateLocation",
            Self::Nonce { .. } => "nonce",
            Self::Verify { .. } => "verify",
            Self::AuthorizeManufacturer { .. } => "authorizeManufacturer",
            Self::RevokeManufacturer { .. } => "revokeManufacturer",
            Self::Status { .. } => "status",
        }
    }
}
