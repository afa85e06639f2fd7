//! Social identity providers.
//!
//! An access token obtained by the client is exchanged for the profile at the
//! provider's userinfo endpoint. Only the email matters to us; every failure
//! (bad status, unreadable body, no email, transport error) is reported as
//! [`AppError::ProviderRejected`].

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

use crate::config::Config;
use crate::errors::{AppError, AppResult};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Supported providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocialProvider {
    Google,
    Facebook,
}

impl SocialProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            SocialProvider::Google => "google",
            SocialProvider::Facebook => "facebook",
        }
    }

    /// Extra query parameters the provider needs besides the token.
    fn query(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            SocialProvider::Google => &[],
            SocialProvider::Facebook => &[("fields", "id,name,email")],
        }
    }
}

impl std::fmt::Display for SocialProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The parts of a provider profile we keep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderProfile {
    pub email: String,
}

#[derive(Deserialize)]
struct UserInfo {
    email: Option<String>,
}

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolve an access token to the profile it belongs to.
    async fn fetch_profile(&self, access_token: &str) -> AppResult<ProviderProfile>;
}

/// Userinfo endpoint client for one provider.
pub struct UserInfoClient {
    provider: SocialProvider,
    client: Client,
    endpoint: String,
}

impl UserInfoClient {
    pub fn new(provider: SocialProvider, endpoint: String, timeout: Duration) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            provider,
            client,
            endpoint,
        })
    }

    pub fn google(config: &Config) -> AppResult<Self> {
        Self::new(
            SocialProvider::Google,
            config.google_userinfo_url.clone(),
            Duration::from_secs(config.http_client_timeout_seconds),
        )
    }

    pub fn facebook(config: &Config) -> AppResult<Self> {
        Self::new(
            SocialProvider::Facebook,
            config.facebook_userinfo_url.clone(),
            Duration::from_secs(config.http_client_timeout_seconds),
        )
    }
}

#[async_trait]
impl IdentityProvider for UserInfoClient {
    async fn fetch_profile(&self, access_token: &str) -> AppResult<ProviderProfile> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(self.provider.query())
            .query(&[("access_token", access_token)])
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(provider = %self.provider, error = %e, "Userinfo request failed");
                AppError::ProviderRejected
            })?;

        if response.status() != StatusCode::OK {
            tracing::info!(
                provider = %self.provider,
                status = %response.status(),
                "Provider rejected access token"
            );
            return Err(AppError::ProviderRejected);
        }

        let info: UserInfo = response.json().await.map_err(|e| {
            tracing::warn!(provider = %self.provider, error = %e, "Malformed userinfo body");
            AppError::ProviderRejected
        })?;

        profile_from(info).ok_or_else(|| {
            tracing::info!(provider = %self.provider, "Provider returned no email");
            AppError::ProviderRejected
        })
    }
}

fn profile_from(info: UserInfo) -> Option<ProviderProfile> {
    let email = info.email.map(|e| e.trim().to_string()).filter(|e| !e.is_empty())?;
    Some(ProviderProfile { email })
}
