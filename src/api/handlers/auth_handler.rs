//! Registration, verification, login and logout handlers.

use axum::{extract::State, response::Json, routing::post, Extension, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::api::extractors::ValidatedJson;
use crate::api::middleware::CurrentUser;
use crate::api::AppState;
use crate::config::VERIFICATION_CODE_LENGTH;
use crate::errors::AppResult;
use crate::services::{AuthenticatedUser, TokenResponse};
use crate::types::{Created, MessageResponse};

/// User registration request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    /// User email address
    #[validate(email(message = "Enter a valid email address."))]
    #[schema(example = "user@example.com")]
    pub email: String,
    /// User password (minimum 8 characters)
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    #[schema(example = "SecurePass123!", min_length = 8)]
    pub password: String,
}

/// Email verification request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct VerifyRequest {
    #[validate(email(message = "Enter a valid email address."))]
    #[schema(example = "user@example.com")]
    pub email: String,
    /// The six digit code from the verification email
    #[validate(custom(function = "validate_code_format"))]
    #[schema(example = "042917", min_length = 6, max_length = 6)]
    pub code: String,
}

fn validate_code_format(code: &str) -> Result<(), ValidationError> {
    if code.len() == VERIFICATION_CODE_LENGTH && code.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ValidationError::new("code_format")
            .with_message(format!("Code must be {} digits", VERIFICATION_CODE_LENGTH).into()))
    }
}

/// User login request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email(message = "Enter a valid email address."))]
    #[schema(example = "user@example.com")]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    #[schema(example = "SecurePass123!")]
    pub password: String,
}

/// Successful verification or login
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CredentialResponse {
    #[schema(example = "Login successful.")]
    pub message: String,
    #[schema(example = "user@example.com")]
    pub email: String,
    pub credential: TokenResponse,
}

impl CredentialResponse {
    pub fn new(message: impl Into<String>, authenticated: AuthenticatedUser) -> Self {
        Self {
            message: message.into(),
            email: authenticated.user.email,
            credential: authenticated.credential,
        }
    }
}

/// Public authentication routes
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/verify", post(verify))
        .route("/login", post(login))
}

/// Routes that need a valid bearer credential
pub fn session_routes() -> Router<AppState> {
    Router::new().route("/logout", post(logout))
}

/// Register and receive a verification code by email
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "Authentication",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Verification code sent", body = MessageResponse),
        (status = 400, description = "Validation error or email already registered")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RegisterRequest>,
) -> AppResult<Created<MessageResponse>> {
    state
        .registration_service
        .register(payload.email, payload.password)
        .await?;

    Ok(Created(MessageResponse::new(
        "Verification code sent to your email.",
    )))
}

/// Redeem a verification code
#[utoipa::path(
    post,
    path = "/auth/verify",
    tag = "Authentication",
    request_body = VerifyRequest,
    responses(
        (status = 200, description = "Email verified", body = CredentialResponse),
        (status = 400, description = "Invalid or expired code")
    )
)]
pub async fn verify(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<VerifyRequest>,
) -> AppResult<Json<CredentialResponse>> {
    let verified = state
        .registration_service
        .verify(payload.email, payload.code)
        .await?;

    Ok(Json(CredentialResponse::new(
        "Email verified successfully!",
        verified,
    )))
}

/// Login with email and password
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Authentication",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = CredentialResponse),
        (status = 400, description = "Invalid credentials or email not verified")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> AppResult<Json<CredentialResponse>> {
    let authenticated = state
        .auth_service
        .login(payload.email, payload.password)
        .await?;

    Ok(Json(CredentialResponse::new("Login successful.", authenticated)))
}

/// Revoke the presented credential
#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "Authentication",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Logged out", body = MessageResponse),
        (status = 401, description = "Missing, invalid or revoked credential")
    )
)]
pub async fn logout(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
) -> AppResult<Json<MessageResponse>> {
    state.auth_service.logout(&current_user.claims).await?;

    Ok(Json(MessageResponse::new("Logout successful.")))
}
