//! RSA-PKCS#1 v1.5 signing over section digests.
//!
//! The message handed to the RSA primitive is the lowercase hex text of the
//! SHA-256 content digest, and the primitive hashes that text again with
//! SHA-256 before padding. Signatures already issued depend on this exact
//! two-stage pipeline, so it must not be collapsed into a single hash.

use rand::rngs::OsRng;
use rsa::pkcs1v15::SigningKey;
use rsa::signature::{RandomizedSigner, SignatureEncoding};
use sha2::Sha256;
use thiserror::Error;

use super::digest::digest_hex;
use super::keys::PrivateKeyHandle;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SigningError {
    #[error("signing primitive rejected the input: {0}")]
    Primitive(String),
}

/// Bytes actually passed to the RSA primitive for `content`.
pub fn signing_input(content: &[u8]) -> String {
    digest_hex(content)
}

/// Signs `content` and returns the raw signature, which is exactly
/// `modulus_bits / 8` bytes long.
pub fn sign(private_key: &PrivateKeyHandle, content: &[u8]) -> Result<Vec<u8>, SigningError> {
    let signing_key = SigningKey::<Sha256>::new(private_key.as_rsa().clone());
    // Blinded signing; PKCS#1 v1.5 output is still deterministic.
    let signature = signing_key
        .try_sign_with_rng(&mut OsRng, signing_input(content).as_bytes())
        .map_err(|e| SigningError::Primitive(format!("{e}")))?;
    Ok(signature.to_vec())
}
