//! Password hashing with Argon2id.
//!
//! Hashing happens exactly once per password value: at registration and when
//! a reset completes. Plaintext is never logged or persisted.

use anyhow::{anyhow, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Hash a plaintext password into a PHC-format string with a fresh salt.
///
/// # Errors
/// Returns an error if the hasher rejects the input.
pub fn hash(plaintext: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| anyhow!("failed to hash password: {err}"))
}

/// Verify a plaintext password against a stored hash. Malformed hashes
/// verify as false rather than erroring; login treats them as a mismatch.
#[must_use]
pub fn verify(plaintext: &str, stored: &str) -> bool {
    PasswordHash::new(stored)
        .map(|parsed| {
            Argon2::default()
                .verify_password(plaintext.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}
