//! 65-byte `r || s || v` signature encoding

use k256::ecdsa::{RecoveryId, Signature};
use pharmtrace_core::SignatureError;
use std::fmt;
use std::str::FromStr;

/// Length of an encoded recoverable signature
pub const SIGNATURE_LEN: usize = 65;

/// Parsed recoverable signature with a normalized recovery id
#[derive(Clone, PartialEq, Eq)]
pub struct RecoverableSignature {
    signature: Signature,
    recovery_id: RecoveryId,
}

impl RecoverableSignature {
    /// Assemble from an ECDSA signature and its recovery id
    pub fn new(signature: Signature, recovery_id: RecoveryId) -> Self {
        Self {
            signature,
            recovery_id,
        }
    }

    /// Parse `r || s || v`, accepting `v` as 0/1 or the legacy 27/28
    pub fn from_slice(bytes: &[u8]) -> Result<Self, SignatureError> {
        if bytes.len() != SIGNATURE_LEN {
            return Err(SignatureError::malformed(format!(
                "expected {SIGNATURE_LEN} bytes, got {}",
                bytes.len()
            )));
        }

        let v = bytes[64];
        let parity = match v {
            0 | 1 => v,
            27 | 28 => v - 27,
            other => {
                return Err(SignatureError::malformed(format!(
                    "recovery byte {other} is not one of 0, 1, 27, 28"
                )))
            }
        };
        let recovery_id = RecoveryId::from_byte(parity)
            .ok_or_else(|| SignatureError::malformed(format!("recovery byte {v}")))?;

        let signature = Signature::from_slice(&bytes[..64])
            .map_err(|e| SignatureError::malformed(format!("invalid r/s scalars: {e}")))?;

        Ok(Self {
            signature,
            recovery_id,
        })
    }

    /// The ECDSA `(r, s)` pair
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Recovery id (y-parity of the ephemeral point)
    pub fn recovery_id(&self) -> RecoveryId {
        self.recovery_id
    }

    /// Encode as `r || s || v` with `v` in `{27, 28}`
    pub fn to_bytes(&self) -> [u8; SIGNATURE_LEN] {
        let mut out = [0u8; SIGNATURE_LEN];
        out[..64].copy_from_slice(self.signature.to_bytes().as_slice());
        out[64] = 27 + self.recovery_id.to_byte();
        out
    }

    /// `0x`-prefixed hex encoding
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.to_bytes()))
    }
}

impl FromStr for RecoverableSignature {
    type Err = SignatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        let bytes = hex::decode(digits)
            .map_err(|e| SignatureError::malformed(format!("signature is not hex: {e}")))?;
        Self::from_slice(&bytes)
    }
}

impl fmt::Display for RecoverableSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for RecoverableSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecoverableSignature({})", self.to_hex())
    }
}
