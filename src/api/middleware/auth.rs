//! JWT authentication middleware.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::api::AppState;
use crate::config::BEARER_TOKEN_PREFIX;
use crate::errors::AppError;
use crate::services::Claims;

/// Authenticated caller, inserted into request extensions by
/// [`auth_middleware`].
#[derive(Clone, Debug)]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: String,
    /// The presented credential, needed to revoke it
    pub claims: Claims,
}

impl From<Claims> for CurrentUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            email: claims.email.clone(),
            claims,
        }
    }
}

/// Validate the bearer credential and inject the [`CurrentUser`].
///
/// Missing, malformed, expired and revoked credentials all answer 401.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(AppError::Unauthorized)?;

    let token = auth_header
        .strip_prefix(BEARER_TOKEN_PREFIX)
        .ok_or(AppError::Unauthorized)?;

    let claims = state.credentials.authenticate(token).await?;

    request.extensions_mut().insert(CurrentUser::from(claims));

    Ok(next.run(request).await)
}
