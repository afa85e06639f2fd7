//! User domain entity and related types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Password;

/// User domain entity.
///
/// A user starts inactive (pending) and is activated exactly once, either by
/// a verification code or by a social provider vouching for the email.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    /// Normalized (trimmed, lower-cased) email address
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new pending (inactive) user
    pub fn new(id: Uuid, email: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            email,
            password_hash,
            is_active: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Stored password as a value object
    pub fn password(&self) -> Password {
        Password::from_hash(self.password_hash.clone())
    }

    /// Mark the account as verified
    pub fn activate(&mut self) {
        self.is_active = true;
        self.updated_at = Utc::now();
    }
}

/// Normalize an email address for storage and lookup.
///
/// Uniqueness is enforced on the normalized form, so `A@X.com` and `a@x.com`
/// are the same account.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
