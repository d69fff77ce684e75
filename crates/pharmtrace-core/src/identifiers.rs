//! Address-like identities
//!
//! An [`Identity`] is the 20-byte unit of authorization and signing. On the
//! wire it is always a `0x`-prefixed hex string; parsing accepts any letter
//! case so checksummed (EIP-55) addresses round-trip to the same value.

use crate::errors::LedgerError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Length in bytes of an identity.
pub const IDENTITY_LEN: usize = 20;

/// 20-byte address identifying a manufacturer, operator or scanning actor.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Identity([u8; IDENTITY_LEN]);

impl Identity {
    /// The all-zero identity. Never a valid authorization target.
    pub const ZERO: Identity = Identity([0u8; IDENTITY_LEN]);

    /// Create an identity from raw bytes
    pub const fn from_bytes(bytes: [u8; IDENTITY_LEN]) -> Self {
        Self(bytes)
    }

    /// Create an identity from a slice, which must be exactly 20 bytes
    pub fn from_slice(bytes: &[u8]) -> Result<Self, LedgerError> {
        let raw: [u8; IDENTITY_LEN] = bytes.try_into().map_err(|_| {
            LedgerError::invalid_address(format!(
                "expected {IDENTITY_LEN} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(raw))
    }

    /// Get the raw bytes
    pub fn as_bytes(&self) -> &[u8; IDENTITY_LEN] {
        &self.0
    }

    /// Whether this is the zero identity
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; IDENTITY_LEN]
    }

    /// Reject the zero identity where a concrete target is required
    pub fn ensure_nonzero(self) -> Result<Self, LedgerError> {
        if self.is_zero() {
            Err(LedgerError::invalid_address("zero identity"))
        } else {
            Ok(self)
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identity({self})")
    }
}

impl FromStr for Identity {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        if digits.len() != IDENTITY_LEN * 2 {
            return Err(LedgerError::invalid_address(format!(
                "'{s}' is not a {}-digit hex address",
                IDENTITY_LEN * 2
            )));
        }

        let bytes = hex::decode(digits)
            .map_err(|e| LedgerError::invalid_address(format!("'{s}': {e}")))?;
        Self::from_slice(&bytes)
    }
}

impl From<[u8; IDENTITY_LEN]> for Identity {
    fn from(bytes: [u8; IDENTITY_LEN]) -> Self {
        Self(bytes)
    }
}

impl Serialize for Identity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Identity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_checksummed_and_lowercase_forms() {
        let checksummed: Identity = "0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf"
            .parse()
            .unwrap();
        let lower: Identity = "7e5f4552091a69125d5dfcb7b8c2659029395bdf".parse().unwrap();
        assert_eq!(checksummed, lower);
        assert_eq!(
            checksummed.to_string(),
            "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf"
        );
    }

    #[test]
    fn rejects_wrong_length_and_bad_hex() {
        assert!(matches!(
            "0x1234".parse::<Identity>(),
            Err(LedgerError::InvalidAddress { .. })
        ));
        assert!(matches!(
            "0xzz5f4552091a69125d5dfcb7b8c2659029395bdf".parse::<Identity>(),
            Err(LedgerError::InvalidAddress { .. })
        ));
    }

    #[test]
    fn zero_identity_is_rejected_as_target() {
        assert!(Identity::ZERO.is_zero());
        assert!(Identity::ZERO.ensure_nonzero().is_err());
        assert!(Identity::from_bytes([7u8; 20]).ensure_nonzero().is_ok());
    }

    #[test]
    fn serde_uses_hex_string() {
        let id = Identity::from_bytes([0xab; 20]);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"0x{}\"", "ab".repeat(20)));
        let back: Identity = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
