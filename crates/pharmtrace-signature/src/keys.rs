//! Manufacturer signing keys
//!
//! Used by operator tooling to produce signed registration payloads and by
//! tests. The ledger itself never holds a manufacturer key.

use crate::recovery::{identity_from_verifying_key, personal_message_hash};
use crate::signature::RecoverableSignature;
use k256::ecdsa::SigningKey;
use pharmtrace_core::{Digest32, Identity};
use rand::rngs::OsRng;

/// Key handling failures
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    /// Secret key text is not valid hex
    #[error("secret key is not hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    /// Bytes are not a valid secp256k1 scalar
    #[error("secret key is not a valid secp256k1 scalar")]
    InvalidScalar,

    /// Signing failed
    #[error("signing failed: {0}")]
    Signing(String),
}

/// secp256k1 key belonging to a manufacturer (or the ledger operator)
#[derive(Clone)]
pub struct ManufacturerKey {
    signing_key: SigningKey,
    identity: Identity,
}

impl ManufacturerKey {
    /// Generate a fresh key from the OS RNG
    pub fn generate() -> Self {
        Self::from_signing_key(SigningKey::random(&mut OsRng))
    }

    /// Load from 32 raw secret bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        let signing_key = SigningKey::from_slice(bytes).map_err(|_| KeyError::InvalidScalar)?;
        Ok(Self::from_signing_key(signing_key))
    }

    /// Load from hex, with or without a `0x` prefix
    pub fn from_hex(text: &str) -> Result<Self, KeyError> {
        let trimmed = text.trim();
        let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        Self::from_bytes(&hex::decode(digits)?)
    }

    fn from_signing_key(signing_key: SigningKey) -> Self {
        let identity = identity_from_verifying_key(signing_key.verifying_key());
        Self {
            signing_key,
            identity,
        }
    }

    /// Identity this key signs as
    pub fn identity(&self) -> Identity {
        self.identity
    }

    /// Secret key as `0x`-prefixed hex
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.signing_key.to_bytes()))
    }

    /// Personal-message signature over `digest`
    pub fn sign_digest(&self, digest: &Digest32) -> Result<RecoverableSignature, KeyError> {
        let prehash = personal_message_hash(digest);
        let (signature, recovery_id) = self
            .signing_key
            .sign_prehash_recoverable(&prehash)
            .map_err(|e| KeyError::Signing(e.to_string()))?;
        Ok(RecoverableSignature::new(signature, recovery_id))
    }
}

impl std::fmt::Debug for ManufacturerKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManufacturerKey")
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}
