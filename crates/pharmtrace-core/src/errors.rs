//! Unified error system for the provenance ledger
//!
//! Every ledger operation returns a typed [`LedgerError`]. Failures are local
//! to the operation that produced them; nothing is applied when one is
//! returned.

use crate::identifiers::Identity;
use serde::{Deserialize, Serialize};

/// Reasons a signature can fail to authenticate a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum SignatureError {
    /// Wrong length, bad encoding or an out-of-range recovery byte
    #[error("malformed signature: {reason}")]
    Malformed {
        /// What was wrong with the encoding
        reason: String,
    },

    /// The signature is well-formed but no public key recovers from it
    #[error("signature recovery failed: {reason}")]
    RecoveryFailed {
        /// Underlying cryptographic failure
        reason: String,
    },

    /// A key recovered, but it belongs to someone other than the claimed signer
    #[error("recovered signer {recovered} does not match claimed signer {claimed}")]
    SignerMismatch {
        /// Identity named in the request
        claimed: Identity,
        /// Identity the signature actually recovers to
        recovered: Identity,
    },
}

impl SignatureError {
    /// Create a malformed signature error
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::Malformed {
            reason: reason.into(),
        }
    }

    /// Create a recovery failure
    pub fn recovery_failed(reason: impl Into<String>) -> Self {
        Self::RecoveryFailed {
            reason: reason.into(),
        }
    }
}

/// Unified error type for all ledger operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum LedgerError {
    /// Caller lacks the role the operation requires
    #[error("{caller} is not permitted to {action}")]
    Unauthorized {
        /// Identity that attempted the operation
        caller: Identity,
        /// Operation that was refused
        action: String,
    },

    /// Signer is not an authorized manufacturer at the time of the write
    #[error("manufacturer {signer} is not authorized")]
    NotAuthorized {
        /// Identity named as signer
        signer: Identity,
    },

    /// Malformed or zero identity
    #[error("invalid address: {message}")]
    InvalidAddress {
        /// What was wrong with the address
        message: String,
    },

    /// A batch with this identifier is already registered
    #[error("batch {drug_id} is already registered")]
    DuplicateBatch {
        /// Offending batch identifier
        drug_id: String,
    },

    /// No batch is registered under this identifier
    #[error("batch {drug_id} not found")]
    BatchNotFound {
        /// Requested batch identifier
        drug_id: String,
    },

    /// Nonce mismatch: a replay or an out-of-order submission
    #[error("stale nonce for {identity}: expected {expected}, current is {current}")]
    StaleNonce {
        /// Identity whose counter was checked
        identity: Identity,
        /// Nonce the message was bound to
        expected: u64,
        /// Nonce currently stored for the identity
        current: u64,
    },

    /// Signature does not authenticate the claimed signer
    #[error("invalid signature: {0}")]
    InvalidSignature(#[from] SignatureError),

    /// Required field absent or empty
    #[error("missing required field: {field}")]
    MissingFields {
        /// Name of the first missing field
        field: String,
    },

    /// Durable journal could not be read or written
    #[error("storage error: {message}")]
    Storage {
        /// Error message describing the storage failure
        message: String,
    },
}

impl LedgerError {
    /// Create an unauthorized-caller error
    pub fn unauthorized(caller: Identity, action: impl Into<String>) -> Self {
        Self::Unauthorized {
            caller,
            action: action.into(),
        }
    }

    /// Create an invalid address error
    pub fn invalid_address(message: impl Into<String>) -> Self {
        Self::InvalidAddress {
            message: message.into(),
        }
    }

    /// Create a duplicate batch error
    pub fn duplicate_batch(drug_id: impl Into<String>) -> Self {
        Self::DuplicateBatch {
            drug_id: drug_id.into(),
        }
    }

    /// Create a batch not found error
    pub fn batch_not_found(drug_id: impl Into<String>) -> Self {
        Self::BatchNotFound {
            drug_id: drug_id.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingFields {
            field: field.into(),
        }
    }

    /// Create a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Stable snake_case code surfaced to callers alongside the message
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthorized { .. } => "unauthorized",
            Self::NotAuthorized { .. } => "not_authorized",
            Self::InvalidAddress { .. } => "invalid_address",
            Self::DuplicateBatch { .. } => "duplicate_batch",
            Self::BatchNotFound { .. } => "batch_not_found",
            Self::StaleNonce { .. } => "stale_nonce",
            Self::InvalidSignature(_) => "invalid_signature",
            Self::MissingFields { .. } => "missing_fields",
            Self::Storage { .. } => "storage",
        }
    }

    /// Whether resubmitting with fresh state (a newly fetched nonce) can succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StaleNonce { .. })
    }
}

impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        Self::storage(err.to_string())
    }
}

/// Standard Result type for ledger operations
pub type LedgerResult<T> = std::result::Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_stable() {
        let id = Identity::from_bytes([1u8; 20]);
        assert_eq!(LedgerError::unauthorized(id, "authorize").code(), "unauthorized");
        assert_eq!(LedgerError::duplicate_batch("D1").code(), "duplicate_batch");
        assert_eq!(
            LedgerError::from(SignatureError::malformed("short")).code(),
            "invalid_signature"
        );
    }

    #[test]
    fn test_only_stale_nonce_is_retryable() {
        let id = Identity::from_bytes([1u8; 20]);
        let stale = LedgerError::StaleNonce {
            identity: id,
            expected: 0,
            current: 1,
        };
        assert!(stale.is_retryable());
        assert!(!LedgerError::batch_not_found("D1").is_retryable());
        assert!(!LedgerError::duplicate_batch("D1").is_retryable());
    }

    #[test]
    fn test_error_display() {
        let err = LedgerError::batch_not_found("D9");
        assert_eq!(err.to_string(), "batch D9 not found");
    }
}
