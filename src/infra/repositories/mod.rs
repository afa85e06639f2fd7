//! Repository layer - Data access abstraction
//!
//! Repositories provide an abstraction over data persistence,
//! following the Repository pattern for clean separation of concerns.

mod contact_repository;
pub(crate) mod entities;
mod user_repository;
mod verification_code_repository;

pub use contact_repository::{ContactRepository, ContactStore};
pub use user_repository::{UserRepository, UserStore};
pub use verification_code_repository::{VerificationCodeRepository, VerificationCodeStore};

// Export mocks for tests (both unit and integration)
#[cfg(any(test, feature = "test-utils"))]
pub use contact_repository::MockContactRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use user_repository::MockUserRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use verification_code_repository::MockVerificationCodeRepository;
