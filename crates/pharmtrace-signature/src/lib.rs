//! # Pharmtrace Signature - Delegated Write Authentication
//!
//! Recovers the signer of a registration digest so a relayer can submit a
//! write on behalf of a manufacturer without holding the manufacturer's key.
//!
//! Signatures follow Ethereum personal-message signing: the digest is wrapped
//! as `"\x19Ethereum Signed Message:\n32" || digest`, hashed with Keccak-256
//! and signed with recoverable ECDSA over secp256k1. The 65-byte encoding is
//! `r || s || v`. An identity is the last 20 bytes of the Keccak-256 hash of
//! the uncompressed public key.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Manufacturer signing keys
pub mod keys;

/// Signer recovery and verification
pub mod recovery;

/// 65-byte recoverable signature encoding
pub mod signature;

pub use keys::{KeyError, ManufacturerKey};
pub use recovery::{
    identity_from_verifying_key, personal_message_hash, recover_signer, verify,
    verify_claimed_signer,
};
pub use signature::RecoverableSignature;
