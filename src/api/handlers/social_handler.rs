//! Social sign-in handlers.

use axum::{extract::State, response::Json, routing::post, Router};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use super::auth_handler::CredentialResponse;
use crate::api::extractors::ValidatedJson;
use crate::api::AppState;
use crate::errors::AppResult;
use crate::infra::SocialProvider;

/// Provider access token obtained by the client
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SocialLoginRequest {
    #[validate(length(min = 1, message = "Access token required"))]
    #[schema(example = "ya29.a0AfH6SM...")]
    pub access_token: String,
}

pub fn social_routes() -> Router<AppState> {
    Router::new()
        .route("/google", post(google_login))
        .route("/facebook", post(facebook_login))
}

async fn social_login(
    state: AppState,
    provider: SocialProvider,
    access_token: String,
    message: &str,
) -> AppResult<Json<CredentialResponse>> {
    let authenticated = state
        .auth_service
        .social_login(provider, access_token)
        .await?;

    Ok(Json(CredentialResponse::new(message, authenticated)))
}

/// Sign in with a Google access token
#[utoipa::path(
    post,
    path = "/auth/social/google",
    tag = "Social login",
    request_body = SocialLoginRequest,
    responses(
        (status = 200, description = "Login successful", body = CredentialResponse),
        (status = 400, description = "Invalid access token")
    )
)]
pub async fn google_login(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<SocialLoginRequest>,
) -> AppResult<Json<CredentialResponse>> {
    social_login(
        state,
        SocialProvider::Google,
        payload.access_token,
        "Google login successful",
    )
    .await
}

/// Sign in with a Facebook access token
#[utoipa::path(
    post,
    path = "/auth/social/facebook",
    tag = "Social login",
    request_body = SocialLoginRequest,
    responses(
        (status = 200, description = "Login successful", body = CredentialResponse),
        (status = 400, description = "Invalid access token")
    )
)]
pub async fn facebook_login(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<SocialLoginRequest>,
) -> AppResult<Json<CredentialResponse>> {
    social_login(
        state,
        SocialProvider::Facebook,
        payload.access_token,
        "Facebook login successful",
    )
    .await
}
