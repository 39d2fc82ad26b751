//! Signature verification. A well-formed signature that does not match is a
//! normal `Ok(false)`; only input that cannot be a signature at all is an
//! error.

use rsa::pkcs1v15::{Signature, VerifyingKey};
use rsa::signature::Verifier;
use sha2::Sha256;
use thiserror::Error;

use super::keys::PublicKeyHandle;
use super::signer::signing_input;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VerificationError {
    #[error("malformed signature: {0}")]
    MalformedSignature(String),
}

/// Checks `signature` over `content` against `public_key`.
pub fn verify(
    public_key: &PublicKeyHandle,
    content: &[u8],
    signature: &[u8],
) -> Result<bool, VerificationError> {
    if signature.is_empty() {
        return Err(VerificationError::MalformedSignature(
            "signature is empty".to_string(),
        ));
    }
    // A length that does not match this key's modulus is just a mismatch,
    // e.g. a signature made by a key of another size.
    let signature = Signature::try_from(signature)
        .map_err(|e| VerificationError::MalformedSignature(format!("{e}")))?;
    let verifying_key = VerifyingKey::<Sha256>::new(public_key.as_rsa().clone());
    Ok(verifying_key
        .verify(signing_input(content).as_bytes(), &signature)
        .is_ok())
}

/// Same as [`verify`] for a hex-encoded signature.
pub fn verify_hex(
    public_key: &PublicKeyHandle,
    content: &[u8],
    signature_hex: &str,
) -> Result<bool, VerificationError> {
    let signature = hex::decode(signature_hex.trim())
        .map_err(|e| VerificationError::MalformedSignature(format!("{e}")))?;
    verify(public_key, content, &signature)
}
