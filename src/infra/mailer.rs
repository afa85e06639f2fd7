//! Outbound email.
//!
//! Without `MAIL_API_URL` the [`LogMailer`] records that a message would have
//! gone out. With it, [`HttpMailer`] posts the message as JSON to the mail
//! provider's HTTP API.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::errors::{AppError, AppResult};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// A single outgoing email.
#[derive(Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

// Bodies carry verification codes.
impl std::fmt::Debug for EmailMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailMessage")
            .field("to", &self.to)
            .field("subject", &self.subject)
            .field("body", &"[REDACTED]")
            .finish()
    }
}

impl EmailMessage {
    pub fn new(to: impl Into<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            body: body.into(),
        }
    }
}

/// Mail dispatch.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: EmailMessage) -> AppResult<()>;
}

/// Pick the mailer the configuration asks for.
pub fn mailer_from_config(config: &Config) -> AppResult<Arc<dyn Mailer>> {
    match &config.mail_api_url {
        Some(url) => Ok(Arc::new(HttpMailer::new(
            url.clone(),
            config.mail_api_key().map(str::to_string),
            config.mail_from.clone(),
            Duration::from_secs(config.http_client_timeout_seconds),
        )?)),
        None => {
            tracing::warn!("MAIL_API_URL not set - emails will be logged, not sent");
            Ok(Arc::new(LogMailer::new(config.mail_from.clone())))
        }
    }
}

/// Development mailer. Logs envelope data only, never the body.
pub struct LogMailer {
    from: String,
}

impl LogMailer {
    pub fn new(from: impl Into<String>) -> Self {
        Self { from: from.into() }
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: EmailMessage) -> AppResult<()> {
        tracing::info!(
            to = %message.to,
            from = %self.from,
            subject = %message.subject,
            "Email not sent (no mail API configured)"
        );
        Ok(())
    }
}

#[derive(Serialize)]
struct MailPayload<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
}

/// Sends through a JSON mail API with bearer authentication.
pub struct HttpMailer {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    from: String,
}

impl HttpMailer {
    pub fn new(
        endpoint: String,
        api_key: Option<String>,
        from: String,
        timeout: Duration,
    ) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build mail client: {}", e)))?;

        Ok(Self {
            client,
            endpoint,
            api_key,
            from,
        })
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, message: EmailMessage) -> AppResult<()> {
        let payload = MailPayload {
            from: &self.from,
            to: &message.to,
            subject: &message.subject,
            text: &message.body,
        };

        let mut request = self.client.post(&self.endpoint).json(&payload);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::internal(format!("Mail API request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::internal(format!(
                "Mail API returned {}",
                response.status()
            )));
        }

        tracing::info!(to = %message.to, subject = %message.subject, "Email sent");
        Ok(())
    }
}
