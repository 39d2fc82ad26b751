//! Key codec for RSA key material supplied as PEM text.
//!
//! Private keys travel as PKCS#1 (`RSA PRIVATE KEY`) and public keys as X.509
//! SubjectPublicKeyInfo (`PUBLIC KEY`). The two encodings are not
//! interchangeable, so each direction has its own parser and exporter and the
//! handles they produce are separate types: a public handle can never reach
//! the signer and a private handle never reaches the verifier.

use std::fmt;

use rand::rngs::OsRng;
use rsa::pkcs1::{DecodeRsaPrivateKey, EncodeRsaPrivateKey};
use rsa::pkcs8::{DecodePublicKey, EncodePublicKey, LineEnding};
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use thiserror::Error;
use tracing::warn;
use zeroize::Zeroizing;

/// PEM label of a PKCS#1 private key.
pub const PKCS1_PRIVATE_LABEL: &str = "RSA PRIVATE KEY";
/// PEM label of an X.509 SubjectPublicKeyInfo public key.
pub const SPKI_PUBLIC_LABEL: &str = "PUBLIC KEY";

/// Modulus size used when the caller does not ask for one.
pub const DEFAULT_MODULUS_BITS: usize = 2048;
pub const MIN_MODULUS_BITS: usize = 1024;
pub const MAX_MODULUS_BITS: usize = 4096;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeyFormatError {
    #[error("key material is not PEM encoded")]
    NotPem,
    #[error("expected a PEM block labelled `{expected}`, found `{found}`")]
    WrongFormat { expected: &'static str, found: String },
    #[error("malformed key material: {0}")]
    Malformed(String),
    #[error("unsupported RSA modulus of {0} bits")]
    UnsupportedModulus(usize),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeyGenerationError {
    #[error("modulus of {0} bits is not supported; use a multiple of 8 between 1024 and 4096")]
    InvalidModulus(usize),
    #[error("key generation failed: {0}")]
    Primitive(String),
    #[error("key export failed: {0}")]
    Export(String),
}

/// Algorithm family carried by every key handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAlgorithm {
    Rsa,
}

impl KeyAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyAlgorithm::Rsa => "rsa",
        }
    }
}

/// A signing-capable RSA key. Built per request and dropped afterwards; the
/// underlying key zeroizes itself on drop.
#[derive(Clone)]
pub struct PrivateKeyHandle {
    key: RsaPrivateKey,
}

impl PrivateKeyHandle {
    pub fn algorithm(&self) -> KeyAlgorithm {
        KeyAlgorithm::Rsa
    }

    pub fn modulus_bits(&self) -> usize {
        self.key.size() * 8
    }

    /// Derives the verifying half of this key.
    pub fn public_key(&self) -> PublicKeyHandle {
        PublicKeyHandle {
            key: self.key.to_public_key(),
        }
    }

    /// Exports the key as PKCS#1 PEM. The returned text is wiped on drop.
    pub fn to_pkcs1_pem(&self) -> Result<Zeroizing<String>, KeyGenerationError> {
        self.key
            .to_pkcs1_pem(LineEnding::LF)
            .map_err(|e| KeyGenerationError::Export(format!("{e}")))
    }

    pub(crate) fn as_rsa(&self) -> &RsaPrivateKey {
        &self.key
    }
}

// Hand-written so that key components never end up in logs.
impl fmt::Debug for PrivateKeyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKeyHandle")
            .field("algorithm", &self.algorithm())
            .field("modulus_bits", &self.modulus_bits())
            .finish_non_exhaustive()
    }
}

/// A verification-only RSA key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKeyHandle {
    key: RsaPublicKey,
}

impl PublicKeyHandle {
    pub fn algorithm(&self) -> KeyAlgorithm {
        KeyAlgorithm::Rsa
    }

    pub fn modulus_bits(&self) -> usize {
        self.key.size() * 8
    }

    /// Size of a well-formed signature for this key, in bytes.
    pub fn signature_len(&self) -> usize {
        self.key.size()
    }

    /// Exports the key as SubjectPublicKeyInfo PEM.
    pub fn to_spki_pem(&self) -> Result<String, KeyGenerationError> {
        self.key
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| KeyGenerationError::Export(format!("{e}")))
    }

    pub(crate) fn as_rsa(&self) -> &RsaPublicKey {
        &self.key
    }
}

/// Either kind of handle, for callers that accept key material without
/// knowing in advance which half they were given.
#[derive(Debug, Clone)]
pub enum KeyHandle {
    Private(PrivateKeyHandle),
    Public(PublicKeyHandle),
}

impl KeyHandle {
    pub fn algorithm(&self) -> KeyAlgorithm {
        match self {
            KeyHandle::Private(key) => key.algorithm(),
            KeyHandle::Public(key) => key.algorithm(),
        }
    }

    pub fn modulus_bits(&self) -> usize {
        match self {
            KeyHandle::Private(key) => key.modulus_bits(),
            KeyHandle::Public(key) => key.modulus_bits(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            KeyHandle::Private(_) => "private",
            KeyHandle::Public(_) => "public",
        }
    }

    pub fn as_private(&self) -> Option<&PrivateKeyHandle> {
        match self {
            KeyHandle::Private(key) => Some(key),
            KeyHandle::Public(_) => None,
        }
    }

    pub fn as_public(&self) -> Option<&PublicKeyHandle> {
        match self {
            KeyHandle::Private(_) => None,
            KeyHandle::Public(key) => Some(key),
        }
    }
}

/// Returns the label of the first PEM block in `pem`, if any.
fn pem_label(pem: &str) -> Option<&str> {
    let first = pem.trim_start().lines().next()?.trim_end();
    first.strip_prefix("-----BEGIN ")?.strip_suffix("-----")
}

fn expect_label(pem: &str, expected: &'static str) -> Result<(), KeyFormatError> {
    let found = pem_label(pem).ok_or(KeyFormatError::NotPem)?;
    if found != expected {
        return Err(KeyFormatError::WrongFormat {
            expected,
            found: found.to_string(),
        });
    }
    Ok(())
}

fn check_modulus(bits: usize) -> Result<(), KeyFormatError> {
    if !(MIN_MODULUS_BITS..=MAX_MODULUS_BITS).contains(&bits) {
        return Err(KeyFormatError::UnsupportedModulus(bits));
    }
    Ok(())
}

/// Parses a PKCS#1 PEM private key.
pub fn parse_private_key(pem: &str) -> Result<PrivateKeyHandle, KeyFormatError> {
    let result = expect_label(pem, PKCS1_PRIVATE_LABEL).and_then(|()| {
        let key = RsaPrivateKey::from_pkcs1_pem(pem.trim_start())
            .map_err(|e| KeyFormatError::Malformed(format!("{e}")))?;
        key.validate()
            .map_err(|e| KeyFormatError::Malformed(format!("{e}")))?;
        check_modulus(key.size() * 8)?;
        Ok(PrivateKeyHandle { key })
    });
    if let Err(err) = &result {
        warn!(error = %err, "rejected private key material");
    }
    result
}

/// Parses an X.509 SubjectPublicKeyInfo PEM public key. Non-RSA keys are
/// rejected even though their PEM label matches.
pub fn parse_public_key(pem: &str) -> Result<PublicKeyHandle, KeyFormatError> {
    let result = expect_label(pem, SPKI_PUBLIC_LABEL).and_then(|()| {
        let key = RsaPublicKey::from_public_key_pem(pem.trim_start())
            .map_err(|e| KeyFormatError::Malformed(format!("{e}")))?;
        check_modulus(key.size() * 8)?;
        Ok(PublicKeyHandle { key })
    });
    if let Err(err) = &result {
        warn!(error = %err, "rejected public key material");
    }
    result
}

/// Parses either kind of key, choosing the parser from the PEM label.
pub fn parse_key(pem: &str) -> Result<KeyHandle, KeyFormatError> {
    match pem_label(pem) {
        Some(PKCS1_PRIVATE_LABEL) => parse_private_key(pem).map(KeyHandle::Private),
        Some(SPKI_PUBLIC_LABEL) => parse_public_key(pem).map(KeyHandle::Public),
        Some(other) => Err(KeyFormatError::WrongFormat {
            expected: "RSA PRIVATE KEY or PUBLIC KEY",
            found: other.to_string(),
        }),
        None => Err(KeyFormatError::NotPem),
    }
}

/// Generates a fresh RSA keypair with the given modulus size.
pub fn generate_keypair(
    modulus_bits: usize,
) -> Result<(PrivateKeyHandle, PublicKeyHandle), KeyGenerationError> {
    if !(MIN_MODULUS_BITS..=MAX_MODULUS_BITS).contains(&modulus_bits) || modulus_bits % 8 != 0 {
        return Err(KeyGenerationError::InvalidModulus(modulus_bits));
    }
    let key = RsaPrivateKey::new(&mut OsRng, modulus_bits)
        .map_err(|e| KeyGenerationError::Primitive(format!("{e}")))?;
    let private = PrivateKeyHandle { key };
    let public = private.public_key();
    Ok((private, public))
}
