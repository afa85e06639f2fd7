//! Infrastructure layer - External systems integration
//!
//! This module handles all external system concerns:
//! - Database connections, migrations and repositories
//! - Redis (rate limits, credential revocation)
//! - Outbound mail and identity provider HTTP clients
//! - Unit of Work for transaction management

pub mod cache;
pub mod db;
pub mod identity;
pub mod mailer;
pub mod repositories;
pub mod unit_of_work;

pub use cache::{Cache, CacheStore};
pub use db::{Database, DatabaseHealth, Migrator};
pub use identity::{IdentityProvider, ProviderProfile, SocialProvider, UserInfoClient};
pub use mailer::{mailer_from_config, EmailMessage, HttpMailer, LogMailer, Mailer};
pub use repositories::{
    ContactRepository, ContactStore, UserRepository, UserStore, VerificationCodeRepository,
    VerificationCodeStore,
};
pub use unit_of_work::{
    Persistence, TransactionContext, TxUserRepository, TxVerificationCodeRepository, UnitOfWork,
};

#[cfg(any(test, feature = "test-utils"))]
pub use cache::MockCacheStore;
#[cfg(any(test, feature = "test-utils"))]
pub use db::MockDatabaseHealth;
#[cfg(any(test, feature = "test-utils"))]
pub use identity::MockIdentityProvider;
#[cfg(any(test, feature = "test-utils"))]
pub use mailer::MockMailer;
#[cfg(any(test, feature = "test-utils"))]
pub use repositories::{MockContactRepository, MockUserRepository, MockVerificationCodeRepository};
