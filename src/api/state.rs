//! Application state - Dependency injection container.
//!
//! Everything is held as a trait object so the router can be exercised with
//! mocks.

use std::sync::Arc;

use crate::config::Config;
use crate::errors::AppResult;
use crate::infra::{CacheStore, DatabaseHealth};
use crate::services::{
    AuthService, ContactService, CredentialIssuer, RegistrationService, ServiceContainer,
    Services,
};

/// Application state containing all services (DI container).
#[derive(Clone)]
pub struct AppState {
    pub registration_service: Arc<dyn RegistrationService>,
    pub auth_service: Arc<dyn AuthService>,
    pub contact_service: Arc<dyn ContactService>,
    /// Validates bearer credentials for protected routes
    pub credentials: Arc<dyn CredentialIssuer>,
    /// Rate-limit counters
    pub cache: Arc<dyn CacheStore>,
    pub database: Arc<dyn DatabaseHealth>,
    /// Take the client address from proxy headers instead of the socket
    pub trust_proxy_headers: bool,
}

impl AppState {
    /// Build the real service graph over a database connection.
    pub fn from_config(
        database: Arc<crate::infra::Database>,
        cache: Arc<dyn CacheStore>,
        config: &Config,
    ) -> AppResult<Self> {
        let container = Services::from_connection(database.get_connection(), config, cache.clone())?;
        Ok(Self::from_container(&container, cache, database)
            .with_trusted_proxy(config.trust_proxy_headers))
    }

    /// Pull every service out of a container.
    pub fn from_container(
        container: &dyn ServiceContainer,
        cache: Arc<dyn CacheStore>,
        database: Arc<dyn DatabaseHealth>,
    ) -> Self {
        Self {
            registration_service: container.registration(),
            auth_service: container.auth(),
            contact_service: container.contact(),
            credentials: container.credentials(),
            cache,
            database,
            trust_proxy_headers: false,
        }
    }

    pub fn with_trusted_proxy(mut self, trust: bool) -> Self {
        self.trust_proxy_headers = trust;
        self
    }
}
