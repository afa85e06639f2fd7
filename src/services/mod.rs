//! Application services layer - Use cases and business logic.
//!
//! Services orchestrate domain logic and infrastructure to fulfill
//! application use cases. They depend on abstractions (traits) for
//! dependency inversion, and reach storage through the Unit of Work.

mod auth_service;
mod contact_service;
pub mod container;
mod credentials;
mod registration_service;

// Service Container
pub use container::{Collaborators, ServiceContainer, Services};

// Service traits and implementations
pub use auth_service::{AuthService, Authenticator};
pub use contact_service::{ContactDesk, ContactService};
pub use credentials::{AuthenticatedUser, Claims, CredentialIssuer, JwtIssuer, TokenResponse};
pub use registration_service::{Registrar, RegistrationService};

#[cfg(any(test, feature = "test-utils"))]
pub use container::MockServiceContainer;
#[cfg(any(test, feature = "test-utils"))]
pub use credentials::MockCredentialIssuer;
