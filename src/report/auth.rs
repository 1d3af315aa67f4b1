//! Credential checks.

use sha2::{Digest, Sha256};

/// Salt used when none is configured.
pub const DEFAULT_SALT: &str = "viettel_secure_salt_2025";

/// Length of a hex-encoded SHA-256 digest.
const HASH_LEN: usize = 64;

/// Hex SHA-256 of `salt + secret`.
pub fn hash_secret(secret: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(secret.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Check a submitted secret against a stored reference.
///
/// A 64-character reference is a salted hash from [`hash_secret`]; anything
/// else is a legacy plaintext value compared as is.
pub fn verify_secret(provided: &str, stored: &str, salt: &str) -> bool {
    let stored = stored.trim();
    if stored.len() == HASH_LEN && stored.chars().all(|c| c.is_ascii_hexdigit()) {
        constant_time_eq(
            hash_secret(provided, salt).as_bytes(),
            stored.to_ascii_lowercase().as_bytes(),
        )
    } else {
        provided == stored
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
