//! Argon2 helpers shared by passwords and verification codes.
//!
//! Every hash gets a fresh random salt and is stored as a PHC string, so the
//! parameters travel with the hash.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::errors::{AppError, AppResult};

/// Hash a secret with Argon2id and a random salt.
pub(crate) fn hash_secret(plain_text: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = argon2()
        .hash_password(plain_text.as_bytes(), &salt)
        .map_err(|e| AppError::internal(format!("Secret hash failed: {}", e)))?;
    Ok(hash.to_string())
}

/// Verify a secret against a stored PHC string.
///
/// Unparseable hashes (e.g. the unusable-password marker) never verify.
pub(crate) fn verify_secret(plain_text: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => argon2()
            .verify_password(plain_text.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

#[inline]
fn argon2() -> Argon2<'static> {
    Argon2::default()
}
