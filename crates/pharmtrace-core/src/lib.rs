//! # Pharmtrace Core - Foundation Types
//!
//! **Purpose**: Define the shared vocabulary of the provenance ledger.
//!
//! Every other pharmtrace crate depends on this one and nothing here depends
//! on them.
//!
//! - YES identities, batch records, checkpoints, manufacturer status
//! - YES the canonical (versioned) digest of a signed registration
//! - YES the ledger error taxonomy
//! - NO signature recovery (that's `pharmtrace-signature`)
//! - NO state transitions or persistence (that's `pharmtrace-ledger`)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Batch, checkpoint and manufacturer status types
pub mod batch;

/// Canonical packed encoding and Keccak-256 digests
pub mod digest;

/// Unified ledger error types
pub mod errors;

/// Address-like identities
pub mod identifiers;

/// Wall-clock abstraction used for registration timestamps
pub mod time;

pub use batch::{BatchRecord, CheckpointEntry, DrugFields, ManufacturerStatus};
pub use digest::{keccak256, registration_digest, Digest32, DigestVersion, PackedEncoder};
pub use errors::{LedgerError, LedgerResult, SignatureError};
pub use identifiers::Identity;
pub use time::{Clock, FixedClock, SystemClock};
