//! Credential issuance - HS256 bearer tokens with a revocation list.
//!
//! Each token carries a `jti`. Logging out stores that id in the cache until
//! the token would have expired anyway, and [`CredentialIssuer::authenticate`]
//! refuses any token whose id is on the list.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::{Config, CACHE_PREFIX_REVOKED_TOKEN, SECONDS_PER_HOUR, TOKEN_TYPE_BEARER};
use crate::domain::User;
use crate::errors::{AppError, AppResult};
use crate::infra::CacheStore;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// JWT claims payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    /// Token id, the revocation key
    pub jti: Uuid,
    pub exp: i64,
    pub iat: i64,
}

/// Token response returned after successful authentication
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    /// JWT access token
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub access_token: String,
    /// Token type (always "Bearer")
    #[schema(example = "Bearer")]
    pub token_type: String,
    /// Token expiration time in seconds
    #[schema(example = 86400)]
    pub expires_in: i64,
}

/// A user together with the credential just issued to them.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user: User,
    pub credential: TokenResponse,
}

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait CredentialIssuer: Send + Sync {
    /// Sign a new credential for `user`.
    fn issue(&self, user: &User) -> AppResult<TokenResponse>;

    /// Decode and check a presented credential, including revocation.
    async fn authenticate(&self, token: &str) -> AppResult<Claims>;

    /// Put the credential described by `claims` on the revocation list.
    async fn revoke(&self, claims: &Claims) -> AppResult<()>;
}

pub struct JwtIssuer {
    secret: Vec<u8>,
    expiration_hours: i64,
    revocations: Arc<dyn CacheStore>,
}

impl JwtIssuer {
    pub fn new(
        secret: impl Into<Vec<u8>>,
        expiration_hours: i64,
        revocations: Arc<dyn CacheStore>,
    ) -> Self {
        Self {
            secret: secret.into(),
            expiration_hours,
            revocations,
        }
    }

    pub fn from_config(config: &Config, revocations: Arc<dyn CacheStore>) -> Self {
        Self::new(
            config.jwt_secret_bytes(),
            config.jwt_expiration_hours,
            revocations,
        )
    }
}

fn revocation_key(jti: &Uuid) -> String {
    format!("{}{}", CACHE_PREFIX_REVOKED_TOKEN, jti)
}

#[async_trait]
impl CredentialIssuer for JwtIssuer {
    fn issue(&self, user: &User) -> AppResult<TokenResponse> {
        let now = Utc::now();
        let expires_at = now + Duration::hours(self.expiration_hours);

        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            jti: Uuid::new_v4(),
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(&self.secret),
        )?;

        Ok(TokenResponse {
            access_token: token,
            token_type: TOKEN_TYPE_BEARER.to_string(),
            expires_in: self.expiration_hours * SECONDS_PER_HOUR,
        })
    }

    async fn authenticate(&self, token: &str) -> AppResult<Claims> {
        let claims = decode::<Claims>(
            token,
            &DecodingKey::from_secret(&self.secret),
            &Validation::default(),
        )?
        .claims;

        if self.revocations.exists(&revocation_key(&claims.jti)).await? {
            tracing::debug!(user_id = %claims.sub, "Rejected revoked credential");
            return Err(AppError::Unauthorized);
        }

        Ok(claims)
    }

    async fn revoke(&self, claims: &Claims) -> AppResult<()> {
        let remaining = (claims.exp - Utc::now().timestamp()).max(1) as u64;
        self.revocations
            .mark(&revocation_key(&claims.jti), remaining)
            .await
    }
}
