//! Password value object.

use super::hashing::{hash_secret, verify_secret};
use crate::config::{MIN_PASSWORD_LENGTH, UNUSABLE_PASSWORD_HASH};
use crate::errors::{AppError, AppResult};

/// A hashed account password.
///
/// Holds only the Argon2 PHC string; the plain text never outlives `new`.
#[derive(Clone, PartialEq, Eq)]
pub struct Password {
    hash: String,
}

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Password")
            .field("hash", &"[REDACTED]")
            .finish()
    }
}

impl Password {
    /// Hash a new password.
    ///
    /// # Errors
    /// Returns a field error on `password` if it is shorter than the minimum.
    pub fn new(plain_text: &str) -> AppResult<Self> {
        if plain_text.chars().count() < MIN_PASSWORD_LENGTH as usize {
            return Err(AppError::field(
                "password",
                format!("Password must be at least {} characters", MIN_PASSWORD_LENGTH),
            ));
        }

        Ok(Self {
            hash: hash_secret(plain_text)?,
        })
    }

    /// Wrap a hash loaded from storage.
    pub fn from_hash(hash: String) -> Self {
        Self { hash }
    }

    /// Marker for accounts that can only sign in through a social provider.
    pub fn unusable() -> Self {
        Self {
            hash: UNUSABLE_PASSWORD_HASH.to_string(),
        }
    }

    /// Fixed hash used when the account does not exist, so a failed login
    /// costs the same as a wrong password.
    pub fn dummy() -> Self {
        Self::from_hash(
            "$argon2id$v=19$m=19456,t=2,p=1$ZHVtbXlzYWx0MTIzNDU2$ZHVtbXloYXNoZHVtbXloYXNoZHVtbXloYXNoMTIzNDU"
                .to_string(),
        )
    }

    pub fn is_usable(&self) -> bool {
        self.hash != UNUSABLE_PASSWORD_HASH
    }

    pub fn as_str(&self) -> &str {
        &self.hash
    }

    pub fn into_string(self) -> String {
        self.hash
    }

    /// Check a plain text password against this hash.
    pub fn verify(&self, plain_text: &str) -> bool {
        self.is_usable() && verify_secret(plain_text, &self.hash)
    }
}

impl From<Password> for String {
    fn from(password: Password) -> Self {
        password.hash
    }
}
