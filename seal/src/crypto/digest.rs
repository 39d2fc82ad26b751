//! Digest engine. Every signature in the system is computed over the SHA-256
//! digest produced here, so swapping the algorithm invalidates every record
//! ever signed.

use sha2::{Digest, Sha256};

/// Length in bytes of a section digest.
pub const DIGEST_LEN: usize = 32;

/// Produces the raw SHA-256 digest of the provided bytes.
pub fn digest(content: &[u8]) -> [u8; DIGEST_LEN] {
    let mut hasher = Sha256::new();
    hasher.update(content);
    hasher.finalize().into()
}

/// Returns the lowercase hexadecimal form of [`digest`].
pub fn digest_hex(content: &[u8]) -> String {
    hex::encode(digest(content))
}

#[cfg(test)]
mod tests {
    use super::{digest, digest_hex, DIGEST_LEN};

    #[test]
    fn hashes_to_hex() {
        assert_eq!(
            digest_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn hashes_empty_input() {
        assert_eq!(
            digest_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn bootstrap_content_digest() {
        assert_eq!(
            digest_hex(b"This is the content of section 1"),
            "ab915e912f6b87829403d0a69d6a2bcb9620b588fcf5484e1c76f800c1b2f522"
        );
    }

    #[test]
    fn raw_and_hex_agree() {
        let raw = digest(b"section");
        assert_eq!(raw.len(), DIGEST_LEN);
        assert_eq!(hex::encode(raw), digest_hex(b"section"));
    }
}
