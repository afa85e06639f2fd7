//! Domain layer - Core business entities and logic
//!
//! Users, the verification-code lifecycle and contact submissions,
//! independent of storage and transport.

mod hashing;

pub mod contact;
pub mod password;
pub mod user;
pub mod verification_code;

pub use contact::ContactSubmission;
pub use password::Password;
pub use user::{normalize_email, User};
pub use verification_code::{
    AttemptOutcome, OtpCode, VerificationCode, VerificationPolicy, VerificationState,
};
