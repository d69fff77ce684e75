//! Signer recovery and verification

use crate::signature::RecoverableSignature;
use k256::ecdsa::VerifyingKey;
use k256::elliptic_curve::sec1::ToEncodedPoint;
use pharmtrace_core::{keccak256, Digest32, Identity, SignatureError};

const PERSONAL_MESSAGE_PREFIX: &[u8] = b"\x19Ethereum Signed Message:\n32";

/// Hash actually signed for a 32-byte digest under personal-message signing
pub fn personal_message_hash(digest: &Digest32) -> Digest32 {
    let mut message = Vec::with_capacity(PERSONAL_MESSAGE_PREFIX.len() + digest.len());
    message.extend_from_slice(PERSONAL_MESSAGE_PREFIX);
    message.extend_from_slice(digest);
    keccak256(&message)
}

/// Identity derived from a public key
pub fn identity_from_verifying_key(key: &VerifyingKey) -> Identity {
    let point = k256::PublicKey::from(key).to_encoded_point(false);
    // Skip the 0x04 uncompressed-point tag
    let hash = keccak256(&point.as_bytes()[1..]);
    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..]);
    Identity::from_bytes(address)
}

/// Recover the identity that signed `digest`
pub fn recover_signer(
    digest: &Digest32,
    signature: &RecoverableSignature,
) -> Result<Identity, SignatureError> {
    let prehash = personal_message_hash(digest);
    let key = VerifyingKey::recover_from_prehash(
        &prehash,
        signature.signature(),
        signature.recovery_id(),
    )
    .map_err(|e| SignatureError::recovery_failed(e.to_string()))?;
    Ok(identity_from_verifying_key(&key))
}

/// Require that `signature` over `digest` recovers to `claimed`
pub fn verify_claimed_signer(
    digest: &Digest32,
    signature: &RecoverableSignature,
    claimed: Identity,
) -> Result<(), SignatureError> {
    let recovered = recover_signer(digest, signature)?;
    if recovered != claimed {
        tracing::debug!(%claimed, %recovered, "signature recovered to a different signer");
        return Err(SignatureError::SignerMismatch { claimed, recovered });
    }
    Ok(())
}

/// Whether `signature` over `digest` was produced by `claimed`
pub fn verify(digest: &Digest32, signature: &RecoverableSignature, claimed: Identity) -> bool {
    matches!(recover_signer(digest, signature), Ok(recovered) if recovered == claimed)
}
