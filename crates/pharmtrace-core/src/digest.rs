//! Canonical digest of a signed registration
//!
//! The signed object is the Keccak-256 hash of the tightly packed tuple
//! `(drugId, drugName, composition, dosage, batchNo, expiryDate, nonce)`:
//! each string contributes its UTF-8 bytes with no length prefix or
//! separator, and the nonce contributes a 32-byte big-endian integer. This is
//! the same byte layout as Solidity's `abi.encodePacked`, so digests computed
//! by existing web3 tooling match.
//!
//! Field order and types are part of the protocol. Changing either requires
//! a new [`DigestVersion`].

use crate::batch::DrugFields;
use sha3::{Digest, Keccak256};

/// 32-byte digest
pub type Digest32 = [u8; 32];

/// Versions of the registration digest layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DigestVersion {
    /// Packed strings followed by a uint256 nonce
    #[default]
    V1,
}

/// Keccak-256 of arbitrary bytes
pub fn keccak256(data: &[u8]) -> Digest32 {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Builder for tightly packed encodings
#[derive(Debug, Default, Clone)]
pub struct PackedEncoder {
    buf: Vec<u8>,
}

impl PackedEncoder {
    /// Start an empty encoding
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a string's raw UTF-8 bytes
    pub fn string(mut self, value: &str) -> Self {
        self.buf.extend_from_slice(value.as_bytes());
        self
    }

    /// Append an unsigned integer widened to 256 bits, big-endian
    pub fn uint256(mut self, value: u64) -> Self {
        self.buf.extend_from_slice(&[0u8; 24]);
        self.buf.extend_from_slice(&value.to_be_bytes());
        self
    }

    /// Encoded bytes so far
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Hash the encoding
    pub fn finish(self) -> Digest32 {
        keccak256(&self.buf)
    }
}

/// Digest a manufacturer signs to register `drug` at `nonce`
pub fn registration_digest(drug: &DrugFields, nonce: u64) -> Digest32 {
    registration_digest_versioned(DigestVersion::V1, drug, nonce)
}

/// Digest under an explicit layout version
pub fn registration_digest_versioned(
    version: DigestVersion,
    drug: &DrugFields,
    nonce: u64,
) -> Digest32 {
    match version {
        DigestVersion::V1 => PackedEncoder::new()
            .string(&drug.drug_id)
            .string(&drug.drug_name)
            .string(&drug.composition)
            .string(&drug.dosage)
            .string(&drug.batch_no)
            .string(&drug.expiry_date)
            .uint256(nonce)
            .finish(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo_drug() -> DrugFields {
        DrugFields::new(
            "DRUG-1",
            "Amoxicillin",
            "Amoxicillin",
            "250mg",
            "B-002",
            "2027-01-01",
        )
    }

    #[test]
    fn keccak_of_empty_input() {
        assert_eq!(
            hex::encode(keccak256(b"")),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn registration_digest_matches_packed_vector() {
        assert_eq!(
            hex::encode(registration_digest(&demo_drug(), 0)),
            "6399f63504fa23a55da766412f69d6520fbddb8e81a2927b51372071590ffc1e"
        );
        assert_eq!(
            hex::encode(registration_digest(&demo_drug(), 1)),
            "7b83c0bf6dacc616c95fef2ad8544b6083dcea34dfd20a730a008026597c6516"
        );
    }

    #[test]
    fn uint256_is_left_padded_big_endian() {
        let encoded = PackedEncoder::new().uint256(0x0102);
        let bytes = encoded.as_bytes();
        assert_eq!(bytes.len(), 32);
        assert!(bytes[..30].iter().all(|b| *b == 0));
        assert_eq!(&bytes[30..], &[0x01, 0x02]);
    }

    #[test]
    fn any_field_change_changes_the_digest() {
        let base = registration_digest(&demo_drug(), 0);
        let mut altered = demo_drug();
        altered.dosage = "500mg".into();
        assert_ne!(registration_digest(&altered, 0), base);
    }
}
