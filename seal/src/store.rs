//! In-memory record store for signed sections.
//!
//! Every section maps to one [`SectionRecord`] holding its content and the
//! signature over that content. Records are replaced whole under a single
//! write lock, so a reader observes either the previous pair or the new one.
//! Signing and verification happen outside the lock.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::crypto::keys::{PrivateKeyHandle, PublicKeyHandle};
use crate::crypto::signer::{self, SigningError};
use crate::crypto::verifier::{self, VerificationError};

/// Section present in every bootstrapped store.
pub const BOOTSTRAP_SECTION: &str = "section1";
pub const BOOTSTRAP_CONTENT: &str = "This is the content of section 1";
/// SPKI public key that verifies the bootstrap section's signature.
pub const BOOTSTRAP_PUBLIC_KEY_PEM: &str = include_str!("../keys/bootstrap_public.pem");
const BOOTSTRAP_SIGNATURE: &[u8] = include_bytes!("../keys/bootstrap_signature.bin");

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("section {0} not found")]
    NotFound(String),
    #[error("section {0} has never been signed")]
    Unsigned(String),
    #[error("section {0} already exists")]
    AlreadyExists(String),
    #[error(transparent)]
    Signing(#[from] SigningError),
    #[error(transparent)]
    Verification(#[from] VerificationError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionState {
    Unsigned,
    Signed,
}

/// A named section and the signature over its current content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionRecord {
    name: String,
    content: Vec<u8>,
    signature: Option<Vec<u8>>,
}

impl SectionRecord {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn signature(&self) -> Option<&[u8]> {
        self.signature.as_deref()
    }

    pub fn signature_hex(&self) -> Option<String> {
        self.signature.as_ref().map(hex::encode)
    }

    pub fn state(&self) -> SectionState {
        if self.signature.is_some() {
            SectionState::Signed
        } else {
            SectionState::Unsigned
        }
    }
}

/// Shared store of section records. Wrap it in an `Arc` to hand it to
/// concurrent callers.
#[derive(Debug, Default)]
pub struct SectionStore {
    sections: RwLock<HashMap<String, SectionRecord>>,
}

impl SectionStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store holding the signed demo section `section1`.
    pub fn with_bootstrap() -> Self {
        let store = Self::new();
        store.upsert_signed(
            BOOTSTRAP_SECTION,
            BOOTSTRAP_CONTENT.as_bytes().to_vec(),
            BOOTSTRAP_SIGNATURE.to_vec(),
        );
        store
    }

    // Records are only ever swapped whole, so a panic while a guard was held
    // cannot have left a torn pair behind and the poison flag can be ignored.
    fn read_sections(&self) -> RwLockReadGuard<'_, HashMap<String, SectionRecord>> {
        self.sections.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_sections(&self) -> RwLockWriteGuard<'_, HashMap<String, SectionRecord>> {
        self.sections.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn len(&self) -> usize {
        self.read_sections().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_sections().is_empty()
    }

    /// Creates an unsigned section.
    pub fn register(&self, name: &str, content: Vec<u8>) -> Result<SectionRecord, StoreError> {
        let mut sections = self.write_sections();
        if sections.contains_key(name) {
            return Err(StoreError::AlreadyExists(name.to_string()));
        }
        let record = SectionRecord {
            name: name.to_string(),
            content,
            signature: None,
        };
        sections.insert(name.to_string(), record.clone());
        debug!(section = name, "registered unsigned section");
        Ok(record)
    }

    /// Signs `content` and stores it as the section's new (content, signature)
    /// pair. On failure the existing record is untouched.
    pub fn sign(
        &self,
        name: &str,
        content: Vec<u8>,
        private_key: &PrivateKeyHandle,
    ) -> Result<SectionRecord, StoreError> {
        let signature = signer::sign(private_key, &content).map_err(|err| {
            warn!(section = name, error = %err, "signing failed; section left unchanged");
            err
        })?;
        Ok(self.upsert_signed(name, content, signature))
    }

    /// Replaces the section's content and signature in one step. The caller
    /// is responsible for `signature` having been produced over `content`.
    pub fn upsert_signed(&self, name: &str, content: Vec<u8>, signature: Vec<u8>) -> SectionRecord {
        let record = SectionRecord {
            name: name.to_string(),
            content,
            signature: Some(signature),
        };
        self.write_sections().insert(name.to_string(), record.clone());
        info!(
            section = name,
            content_len = record.content.len(),
            "section signed"
        );
        record
    }

    pub fn contains(&self, name: &str) -> bool {
        self.read_sections().contains_key(name)
    }

    pub fn get_full(&self, name: &str) -> Result<SectionRecord, StoreError> {
        self.read_sections()
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(name.to_string()))
    }

    pub fn get_content(&self, name: &str) -> Result<Vec<u8>, StoreError> {
        self.get_full(name).map(|record| record.content)
    }

    pub fn get_signature(&self, name: &str) -> Result<Vec<u8>, StoreError> {
        self.get_full(name)?
            .signature
            .ok_or_else(|| StoreError::Unsigned(name.to_string()))
    }

    pub fn state(&self, name: &str) -> Result<SectionState, StoreError> {
        self.get_full(name).map(|record| record.state())
    }

    /// Verifies the section's stored pair against `public_key`. Returns
    /// `Ok(false)` when the signature does not match.
    pub fn verify(&self, name: &str, public_key: &PublicKeyHandle) -> Result<bool, StoreError> {
        let record = self.get_full(name)?;
        let signature = record
            .signature
            .as_deref()
            .ok_or_else(|| StoreError::Unsigned(name.to_string()))?;
        let valid = verifier::verify(public_key, &record.content, signature)?;
        debug!(section = name, valid, "verified section");
        Ok(valid)
    }

    /// Every record, ordered by section name.
    pub fn snapshot(&self) -> Vec<SectionRecord> {
        let mut records: Vec<SectionRecord> = self.read_sections().values().cloned().collect();
        records.sort_by(|a, b| a.name.cmp(&b.name));
        records
    }
}
