//! Service Container - Centralized service access.
//!
//! Wires the concrete services to one shared [`Persistence`] unit of work
//! and hands them out as trait objects.

use std::sync::Arc;

use super::{
    AuthService, Authenticator, ContactDesk, ContactService, CredentialIssuer, JwtIssuer,
    Registrar, RegistrationService,
};
use crate::config::Config;
use crate::domain::VerificationPolicy;
use crate::errors::AppResult;
use crate::infra::{
    mailer_from_config, CacheStore, IdentityProvider, Mailer, Persistence, UserInfoClient,
};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Service container trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
pub trait ServiceContainer: Send + Sync {
    fn registration(&self) -> Arc<dyn RegistrationService>;

    fn auth(&self) -> Arc<dyn AuthService>;

    fn contact(&self) -> Arc<dyn ContactService>;

    fn credentials(&self) -> Arc<dyn CredentialIssuer>;
}

/// External collaborators the services need.
pub struct Collaborators {
    pub mailer: Arc<dyn Mailer>,
    pub google: Arc<dyn IdentityProvider>,
    pub facebook: Arc<dyn IdentityProvider>,
}

impl Collaborators {
    /// Real mailer and provider clients from configuration.
    pub fn from_config(config: &Config) -> AppResult<Self> {
        Ok(Self {
            mailer: mailer_from_config(config)?,
            google: Arc::new(UserInfoClient::google(config)?),
            facebook: Arc::new(UserInfoClient::facebook(config)?),
        })
    }
}

/// Concrete implementation of ServiceContainer
pub struct Services {
    registration_service: Arc<dyn RegistrationService>,
    auth_service: Arc<dyn AuthService>,
    contact_service: Arc<dyn ContactService>,
    credentials: Arc<dyn CredentialIssuer>,
}

impl Services {
    /// Assemble every service over one database connection.
    pub fn build(
        db: sea_orm::DatabaseConnection,
        credentials: Arc<dyn CredentialIssuer>,
        collaborators: Collaborators,
        policy: VerificationPolicy,
    ) -> Self {
        let uow = Arc::new(Persistence::new(db));

        Self {
            registration_service: Arc::new(Registrar::new(
                uow.clone(),
                collaborators.mailer,
                credentials.clone(),
                policy,
            )),
            auth_service: Arc::new(Authenticator::new(
                uow.clone(),
                credentials.clone(),
                collaborators.google,
                collaborators.facebook,
            )),
            contact_service: Arc::new(ContactDesk::new(uow)),
            credentials,
        }
    }

    /// Create service container from database connection and config
    pub fn from_connection(
        db: sea_orm::DatabaseConnection,
        config: &Config,
        cache: Arc<dyn CacheStore>,
    ) -> AppResult<Self> {
        let credentials: Arc<dyn CredentialIssuer> =
            Arc::new(JwtIssuer::from_config(config, cache));
        let collaborators = Collaborators::from_config(config)?;

        Ok(Self::build(
            db,
            credentials,
            collaborators,
            VerificationPolicy::from_config(config),
        ))
    }
}

impl ServiceContainer for Services {
    fn registration(&self) -> Arc<dyn RegistrationService> {
        self.registration_service.clone()
    }

    fn auth(&self) -> Arc<dyn AuthService> {
        self.auth_service.clone()
    }

    fn contact(&self) -> Arc<dyn ContactService> {
        self.contact_service.clone()
    }

    fn credentials(&self) -> Arc<dyn CredentialIssuer> {
        self.credentials.clone()
    }
}
