//! Email verification codes.
//!
//! A pending user owns at most one [`VerificationCode`]. The record stores an
//! Argon2 hash of the six digit [`OtpCode`] that was mailed out, when it was
//! issued, and how many wrong guesses have been made against it.
//!
//! ```text
//! PendingNoCode --register--> CodeIssued --right code--> Verified
//!                                 |  ^
//!                      wrong code |  | (attempts < max)
//!                                 v  |
//!                             CodeIssued --attempts == max--> AttemptsExhausted
//!                                 |
//!                                 +--window elapsed--> Expired
//! ```

use chrono::{DateTime, Duration, Utc};
use rand::{rngs::OsRng, Rng};
use uuid::Uuid;

use super::hashing::{hash_secret, verify_secret};
use crate::config::{
    Config, DEFAULT_VERIFICATION_CODE_TTL_MINUTES, DEFAULT_VERIFICATION_MAX_ATTEMPTS,
    VERIFICATION_CODE_LENGTH,
};
use crate::errors::AppResult;

/// Plaintext one-time code. Only ever handed to the mailer.
#[derive(Clone, PartialEq, Eq)]
pub struct OtpCode(String);

impl std::fmt::Debug for OtpCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("OtpCode([REDACTED])")
    }
}

impl OtpCode {
    /// Draw a fresh code from the OS random source, digits 0-9 uniformly.
    pub fn generate() -> Self {
        let code = (0..VERIFICATION_CODE_LENGTH)
            .map(|_| char::from(b'0' + OsRng.gen_range(0..10u8)))
            .collect();
        Self(code)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Salted one-way hash for storage.
    pub fn hash(&self) -> AppResult<String> {
        hash_secret(&self.0)
    }
}

/// Validity window and attempt ceiling for verification codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerificationPolicy {
    pub ttl: Duration,
    pub max_attempts: u32,
}

impl Default for VerificationPolicy {
    fn default() -> Self {
        Self {
            ttl: Duration::minutes(DEFAULT_VERIFICATION_CODE_TTL_MINUTES),
            max_attempts: DEFAULT_VERIFICATION_MAX_ATTEMPTS,
        }
    }
}

impl VerificationPolicy {
    pub fn new(ttl: Duration, max_attempts: u32) -> Self {
        Self { ttl, max_attempts }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Duration::minutes(config.verification_code_ttl_minutes),
            config.verification_max_attempts,
        )
    }

    /// Whole minutes of validity, for the email body.
    pub fn ttl_minutes(&self) -> i64 {
        self.ttl.num_minutes()
    }
}

/// Lifecycle state of a (user, code) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationState {
    PendingNoCode,
    CodeIssued,
    Verified,
    Expired,
    AttemptsExhausted,
}

impl VerificationState {
    /// Terminal states need a new registration (or nothing, once verified).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            VerificationState::Verified
                | VerificationState::Expired
                | VerificationState::AttemptsExhausted
        )
    }
}

/// Result of checking one submitted code against a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// Code matched inside the window. Activate the user, delete the record.
    Verified,
    /// Wrong code; the record stays with the new attempt count.
    Rejected { attempts: u32 },
    /// Wrong code that hit the ceiling. Delete the record.
    Exhausted,
    /// Window elapsed. Delete the record.
    Expired,
}

impl AttemptOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, AttemptOutcome::Verified)
    }

    /// State the pair is in once this outcome has been applied.
    pub fn resulting_state(&self) -> VerificationState {
        match self {
            AttemptOutcome::Verified => VerificationState::Verified,
            AttemptOutcome::Rejected { .. } => VerificationState::CodeIssued,
            AttemptOutcome::Exhausted => VerificationState::AttemptsExhausted,
            AttemptOutcome::Expired => VerificationState::Expired,
        }
    }
}

/// Stored verification code bound to one user.
#[derive(Clone, PartialEq, Eq)]
pub struct VerificationCode {
    pub id: Uuid,
    pub user_id: Uuid,
    pub code_hash: String,
    pub attempts: u32,
    pub created_at: DateTime<Utc>,
}

impl std::fmt::Debug for VerificationCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerificationCode")
            .field("id", &self.id)
            .field("user_id", &self.user_id)
            .field("code_hash", &"[REDACTED]")
            .field("attempts", &self.attempts)
            .field("created_at", &self.created_at)
            .finish()
    }
}

impl VerificationCode {
    /// Fresh record around an already computed hash: timestamped now, zero attempts.
    pub fn new(user_id: Uuid, code_hash: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            code_hash,
            attempts: 0,
            created_at: Utc::now(),
        }
    }

    /// Hash `code` and build a fresh record for it.
    pub fn issue(user_id: Uuid, code: &OtpCode) -> AppResult<Self> {
        Ok(Self::new(user_id, code.hash()?))
    }

    pub fn expires_at(&self, policy: &VerificationPolicy) -> DateTime<Utc> {
        self.created_at + policy.ttl
    }

    /// Expired once `now` is strictly past the end of the window.
    pub fn is_expired_at(&self, now: DateTime<Utc>, policy: &VerificationPolicy) -> bool {
        now > self.expires_at(policy)
    }

    pub fn is_expired(&self, policy: &VerificationPolicy) -> bool {
        self.is_expired_at(Utc::now(), policy)
    }

    /// False when expired, otherwise whether `raw_code` matches the hash.
    pub fn check_code_at(
        &self,
        raw_code: &str,
        now: DateTime<Utc>,
        policy: &VerificationPolicy,
    ) -> bool {
        !self.is_expired_at(now, policy) && verify_secret(raw_code, &self.code_hash)
    }

    pub fn check_code(&self, raw_code: &str, policy: &VerificationPolicy) -> bool {
        self.check_code_at(raw_code, Utc::now(), policy)
    }

    pub fn state_at(&self, now: DateTime<Utc>, policy: &VerificationPolicy) -> VerificationState {
        if self.attempts >= policy.max_attempts {
            VerificationState::AttemptsExhausted
        } else if self.is_expired_at(now, policy) {
            VerificationState::Expired
        } else {
            VerificationState::CodeIssued
        }
    }

    /// Decide the transition for one submitted code. Pure; the caller
    /// persists the outcome.
    pub fn evaluate(
        &self,
        raw_code: &str,
        now: DateTime<Utc>,
        policy: &VerificationPolicy,
    ) -> AttemptOutcome {
        match self.state_at(now, policy) {
            VerificationState::AttemptsExhausted => return AttemptOutcome::Exhausted,
            VerificationState::Expired => return AttemptOutcome::Expired,
            _ => {}
        }

        if verify_secret(raw_code, &self.code_hash) {
            return AttemptOutcome::Verified;
        }

        let attempts = self.attempts + 1;
        if attempts >= policy.max_attempts {
            AttemptOutcome::Exhausted
        } else {
            AttemptOutcome::Rejected { attempts }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn issued(code: &str) -> VerificationCode {
        VerificationCode::issue(Uuid::new_v4(), &OtpCode(code.to_string())).unwrap()
    }

    #[test]
    fn test_generated_code_is_six_digits() {
        for _ in 0..200 {
            let code = OtpCode::generate();
            assert_eq!(code.as_str().len(), VERIFICATION_CODE_LENGTH);
            assert!(code.as_str().chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_generated_codes_vary() {
        let codes: HashSet<String> = (0..50)
            .map(|_| OtpCode::generate().as_str().to_string())
            .collect();
        assert!(codes.len() > 1);
    }

    #[test]
    fn test_generated_codes_cover_all_digits() {
        let digits: HashSet<char> = (0..200)
            .flat_map(|_| OtpCode::generate().as_str().chars().collect::<Vec<_>>())
            .collect();
        assert_eq!(digits.len(), 10);
    }

    #[test]
    fn test_debug_does_not_leak_plaintext() {
        let code = OtpCode("123456".to_string());
        assert!(!format!("{:?}", code).contains("123456"));
    }

    #[test]
    fn test_issue_stores_salted_hash_only() {
        let first = issued("123456");
        let second = issued("123456");

        assert_eq!(first.attempts, 0);
        assert_ne!(first.code_hash, "123456");
        assert!(!first.code_hash.contains("123456"));
        assert!(first.code_hash.starts_with("$argon2id$"));
        // same code, different salt
        assert_ne!(first.code_hash, second.code_hash);
    }

    #[test]
    fn test_check_code() {
        let policy = VerificationPolicy::default();
        let record = issued("123456");

        assert!(!record.is_expired(&policy));
        assert!(record.check_code("123456", &policy));
        assert!(!record.check_code("000000", &policy));
    }

    #[test]
    fn test_expiry_window_boundary() {
        let policy = VerificationPolicy::default();
        let record = issued("123456");
        let deadline = record.created_at + Duration::minutes(20);

        assert!(!record.is_expired_at(deadline, &policy));
        assert!(record.is_expired_at(deadline + Duration::seconds(1), &policy));
        assert!(!record.check_code_at("123456", deadline + Duration::seconds(1), &policy));
    }

    #[test]
    fn test_evaluate_success() {
        let policy = VerificationPolicy::default();
        let record = issued("123456");

        let outcome = record.evaluate("123456", Utc::now(), &policy);
        assert_eq!(outcome, AttemptOutcome::Verified);
        assert!(outcome.is_success());
        assert_eq!(outcome.resulting_state(), VerificationState::Verified);
    }

    #[test]
    fn test_evaluate_wrong_code_counts_attempt() {
        let policy = VerificationPolicy::default();
        let record = issued("123456");

        let outcome = record.evaluate("000000", Utc::now(), &policy);
        assert_eq!(outcome, AttemptOutcome::Rejected { attempts: 1 });
        assert!(!outcome.resulting_state().is_terminal());
    }

    #[test]
    fn test_evaluate_fifth_wrong_attempt_exhausts() {
        let policy = VerificationPolicy::default();
        let mut record = issued("123456");
        record.attempts = 4;

        assert_eq!(
            record.evaluate("000000", Utc::now(), &policy),
            AttemptOutcome::Exhausted
        );
    }

    #[test]
    fn test_evaluate_exhausted_record_rejects_right_code() {
        let policy = VerificationPolicy::default();
        let mut record = issued("123456");
        record.attempts = 5;

        assert_eq!(
            record.evaluate("123456", Utc::now(), &policy),
            AttemptOutcome::Exhausted
        );
    }

    #[test]
    fn test_evaluate_expired_rejects_right_code() {
        let policy = VerificationPolicy::default();
        let record = issued("123456");
        let later = record.created_at + Duration::minutes(21);

        let outcome = record.evaluate("123456", later, &policy);
        assert_eq!(outcome, AttemptOutcome::Expired);
        assert!(outcome.resulting_state().is_terminal());
    }

    #[test]
    fn test_custom_policy() {
        let policy = VerificationPolicy::new(Duration::minutes(1), 2);
        let mut record = issued("123456");
        record.attempts = 1;

        assert_eq!(policy.ttl_minutes(), 1);
        assert_eq!(
            record.evaluate("999999", Utc::now(), &policy),
            AttemptOutcome::Exhausted
        );
    }
}
