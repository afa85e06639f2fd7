//! Contact form submissions.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::user::normalize_email;

/// A message left through the public contact form.
#[derive(Debug, Clone, Serialize)]
pub struct ContactSubmission {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl ContactSubmission {
    /// Build a new submission; text fields are trimmed, email normalized.
    pub fn new(name: &str, email: &str, subject: &str, message: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.trim().to_string(),
            email: normalize_email(email),
            subject: subject.trim().to_string(),
            message: message.trim().to_string(),
            created_at: Utc::now(),
        }
    }
}
