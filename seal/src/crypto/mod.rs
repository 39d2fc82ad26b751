//! Signature lifecycle primitives: content digests, key parsing and
//! generation, signing, and verification. Each submodule owns one step so the
//! pipeline between them stays easy to audit.

pub mod digest;
pub mod keys;
pub mod signer;
pub mod verifier;
