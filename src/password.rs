//! Password hashing with Argon2id.
//!
//! Hashing is the only computationally expensive step on the login path;
//! its cost is bounded by the Argon2 default parameters. Verification is
//! constant-time on the digest comparison.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use thiserror::Error;

/// Failure to produce a digest. Verification never returns this; a bad
/// stored digest simply fails to verify.
#[derive(Debug, Error)]
#[error("password hashing failed: {0}")]
pub struct PasswordHashError(String);

/// Hash a plaintext password into an Argon2id PHC-format digest.
///
/// A fresh random salt is generated per call, so hashing the same
/// plaintext twice yields different digests that both verify.
pub fn hash_password(plaintext: &str) -> Result<String, PasswordHashError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordHashError(e.to_string()))
}

/// Verify a plaintext password against a stored digest.
///
/// Returns `false` for a mismatch *and* for a malformed digest: stored
/// hashes are untrusted input to this function and must never turn a login
/// attempt into an error path.
pub fn verify_password(plaintext: &str, digest: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(digest) else {
        return false;
    };
    Argon2::default()
        .verify_password(plaintext.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let digest = hash_password("operario123").unwrap();
        assert!(verify_password("operario123", &digest));
    }

    #[test]
    fn wrong_password_rejected() {
        let digest = hash_password("operario123").unwrap();
        assert!(!verify_password("operario124", &digest));
        assert!(!verify_password("", &digest));
    }

    #[test]
    fn salts_are_random() {
        let a = hash_password("same-input").unwrap();
        let b = hash_password("same-input").unwrap();
        assert_ne!(a, b);
        assert!(verify_password("same-input", &a));
        assert!(verify_password("same-input", &b));
    }

    #[test]
    fn malformed_digest_verifies_false() {
        assert!(!verify_password("whatever", "not-a-phc-string"));
        assert!(!verify_password("whatever", ""));
        assert!(!verify_password("whatever", "$argon2id$garbage"));
    }
}
