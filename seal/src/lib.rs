//! Signed document sections. Each section's content is hashed with SHA-256,
//! signed with an RSA key supplied as PEM, and kept in an in-memory store so
//! that anyone holding the matching public key can later confirm the content
//! has not changed.

pub mod config;
pub mod crypto;
pub mod service;
pub mod store;

pub use crypto::digest::{digest, digest_hex};
pub use crypto::keys::{
    generate_keypair, parse_key, parse_private_key, parse_public_key, KeyAlgorithm, KeyHandle,
    PrivateKeyHandle, PublicKeyHandle,
};
pub use crypto::signer::sign;
pub use crypto::verifier::{verify, verify_hex};
pub use service::{SectionService, ServiceError};
pub use store::{SectionRecord, SectionState, SectionStore, StoreError};
