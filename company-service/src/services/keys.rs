//! Catalog API key material.
//!
//! Keys are opaque `lzr_` strings. The plaintext leaves the service exactly
//! once, in the issue response; lookups go through the SHA-256 digest.

use rand::Rng;
use sha2::{Digest, Sha256};

/// Generate a fresh API key.
pub fn generate_key() -> String {
    let mut rng = rand::thread_rng();
    let bytes: Vec<u8> = (0..32).map(|_| rng.gen()).collect();
    format!("lzr_{}", hex::encode(bytes))
}

/// Hash a key for storage and comparison.
pub fn digest_key(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hex::encode(hasher.finalize())
}

/// Display prefix stored alongside the digest so keys can be told apart in
/// listings without revealing them.
pub fn key_prefix(key: &str) -> String {
    key.chars().take(12).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_keys_are_unique_and_prefixed() {
        let a = generate_key();
        let b = generate_key();
        assert_ne!(a, b);
        assert!(a.starts_with("lzr_"));
        assert_eq!(a.len(), 4 + 64);
    }

    #[test]
    fn digest_is_stable_and_hex() {
        let key = "lzr_0000";
        assert_eq!(digest_key(key), digest_key(key));
        assert_eq!(digest_key(key).len(), 64);
        assert!(digest_key(key).chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn prefix_is_short_enough_to_be_safe() {
        let key = generate_key();
        let prefix = key_prefix(&key);
        assert_eq!(prefix.len(), 12);
        assert!(key.starts_with(&prefix));
    }
}
