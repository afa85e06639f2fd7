//! OpenAPI documentation configuration.
//!
//! Provides Swagger UI for API exploration and testing.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::api::handlers::{auth_handler, contact_handler, social_handler};
use crate::services::TokenResponse;
use crate::types::MessageResponse;

/// OpenAPI documentation for the OTP auth service
#[derive(OpenApi)]
#[openapi(
    info(
        title = "OTP Auth Service",
        version = "0.1.0",
        description = "Email registration with one-time verification codes, password and social login",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:3000", description = "Local development server")
    ),
    paths(
        auth_handler::register,
        auth_handler::verify,
        auth_handler::login,
        auth_handler::logout,
        social_handler::google_login,
        social_handler::facebook_login,
        contact_handler::submit_contact,
    ),
    components(
        schemas(
            TokenResponse,
            MessageResponse,
            auth_handler::RegisterRequest,
            auth_handler::VerifyRequest,
            auth_handler::LoginRequest,
            auth_handler::CredentialResponse,
            social_handler::SocialLoginRequest,
            contact_handler::ContactRequest,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Registration, email verification, login and logout"),
        (name = "Social login", description = "Sign in with Google or Facebook"),
        (name = "Contact", description = "Contact form")
    )
)]
pub struct ApiDoc;

/// Security scheme modifier for JWT Bearer authentication
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Credential returned by /auth/login, /auth/verify or social login"))
                        .build(),
                ),
            );
        }
    }
}
