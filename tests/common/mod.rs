//! Shared fixtures for the integration tests.
//!
//! Services run against an in-memory SQLite database with the real
//! migrations applied. Mail and Redis are replaced by in-process fakes.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use axum::{extract::Query, http::StatusCode, routing::get, Json, Router};
use sea_orm::{ConnectOptions, DatabaseConnection};
use serde_json::{json, Value};

use otp_auth_service::domain::VerificationPolicy;
use otp_auth_service::errors::{AppError, AppResult};
use otp_auth_service::infra::{
    CacheStore, Database, EmailMessage, IdentityProvider, Mailer, Persistence, SocialProvider,
    UserInfoClient,
};
use otp_auth_service::services::{
    AuthService, Collaborators, CredentialIssuer, JwtIssuer, RegistrationService,
    ServiceContainer, Services,
};

pub const TEST_SECRET: &str = "integration-test-secret-at-least-32-chars";
pub const GOOD_TOKEN: &str = "good-token";
pub const NO_EMAIL_TOKEN: &str = "no-email-token";
pub const PROVIDER_EMAIL: &str = "Social.User@Example.com";

/// Fresh in-memory database with every migration applied.
///
/// One connection only: each SQLite memory connection is its own database.
pub async fn memory_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);

    let connection = sea_orm::Database::connect(options)
        .await
        .expect("sqlite connection");
    Database::from_connection(connection.clone())
        .run_migrations()
        .await
        .expect("migrations");
    connection
}

/// Mailer that keeps every message it is handed.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<EmailMessage>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }

    /// The code from the latest message addressed to `to`.
    pub fn last_code_for(&self, to: &str) -> Option<String> {
        self.sent()
            .iter()
            .rev()
            .find(|m| m.to == to)
            .and_then(|m| extract_code(&m.body))
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: EmailMessage) -> AppResult<()> {
        self.sent.lock().unwrap().push(message);
        Ok(())
    }
}

/// Mailer whose provider is always down.
pub struct FailingMailer;

#[async_trait]
impl Mailer for FailingMailer {
    async fn send(&self, _message: EmailMessage) -> AppResult<()> {
        Err(AppError::internal("mail provider unavailable"))
    }
}

pub fn extract_code(body: &str) -> Option<String> {
    let line = body.lines().next()?;
    let code = line.rsplit(": ").next()?.trim();
    (code.len() == 6 && code.chars().all(|c| c.is_ascii_digit())).then(|| code.to_string())
}

/// In-process stand-in for Redis.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, (u64, Instant)>>,
}

impl MemoryCache {
    fn live(&self, key: &str) -> Option<u64> {
        let entries = self.entries.lock().unwrap();
        entries
            .get(key)
            .filter(|(_, expires)| *expires > Instant::now())
            .map(|(count, _)| *count)
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn check_rate_limit(
        &self,
        identifier: &str,
        max_requests: u64,
        window_seconds: u64,
    ) -> AppResult<(u64, bool)> {
        let count = self.live(identifier).unwrap_or(0) + 1;
        let mut entries = self.entries.lock().unwrap();
        let expires = match entries.get(identifier) {
            Some((_, expires)) if count > 1 => *expires,
            _ => Instant::now() + Duration::from_secs(window_seconds),
        };
        entries.insert(identifier.to_string(), (count, expires));
        Ok((count, count <= max_requests))
    }

    async fn mark(&self, key: &str, ttl_seconds: u64) -> AppResult<()> {
        self.entries.lock().unwrap().insert(
            key.to_string(),
            (1, Instant::now() + Duration::from_secs(ttl_seconds)),
        );
        Ok(())
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        Ok(self.live(key).is_some())
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}

/// Userinfo endpoint double. `GOOD_TOKEN` yields a profile,
/// `NO_EMAIL_TOKEN` a profile without email, anything else a 401.
pub async fn spawn_userinfo_server() -> String {
    async fn userinfo(
        Query(params): Query<HashMap<String, String>>,
    ) -> (StatusCode, Json<Value>) {
        match params.get("access_token").map(String::as_str) {
            Some(GOOD_TOKEN) => (
                StatusCode::OK,
                Json(json!({ "id": "42", "name": "Social User", "email": PROVIDER_EMAIL })),
            ),
            Some(NO_EMAIL_TOKEN) => (StatusCode::OK, Json(json!({ "id": "43", "name": "No Mail" }))),
            _ => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "invalid_token" })),
            ),
        }
    }

    let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
        .await
        .expect("bind userinfo server");
    let addr = listener.local_addr().expect("local addr");
    let app = Router::new().route("/userinfo", get(userinfo));
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("userinfo server");
    });

    format!("http://{}/userinfo", addr)
}

/// Everything a flow test needs, wired the way the server wires it.
pub struct TestContext {
    pub db: DatabaseConnection,
    pub uow: Persistence,
    pub mailer: Arc<RecordingMailer>,
    pub cache: Arc<MemoryCache>,
    pub services: Services,
}

impl TestContext {
    pub async fn new() -> Self {
        Self::with_policy(VerificationPolicy::default()).await
    }

    pub async fn with_policy(policy: VerificationPolicy) -> Self {
        let userinfo = spawn_userinfo_server().await;
        let mailer = Arc::new(RecordingMailer::default());
        Self::build(policy, mailer.clone(), mailer, &userinfo).await
    }

    /// Registration still succeeds when the mail provider fails.
    pub async fn with_failing_mailer() -> Self {
        let userinfo = spawn_userinfo_server().await;
        Self::build(
            VerificationPolicy::default(),
            Arc::new(RecordingMailer::default()),
            Arc::new(FailingMailer),
            &userinfo,
        )
        .await
    }

    async fn build(
        policy: VerificationPolicy,
        recorder: Arc<RecordingMailer>,
        mailer: Arc<dyn Mailer>,
        userinfo: &str,
    ) -> Self {
        let db = memory_db().await;
        let cache = Arc::new(MemoryCache::default());
        let credentials: Arc<dyn CredentialIssuer> =
            Arc::new(JwtIssuer::new(TEST_SECRET, 1, cache.clone()));

        let google: Arc<dyn IdentityProvider> = Arc::new(
            UserInfoClient::new(
                SocialProvider::Google,
                userinfo.to_string(),
                Duration::from_secs(5),
            )
            .expect("google client"),
        );
        let facebook: Arc<dyn IdentityProvider> = Arc::new(
            UserInfoClient::new(
                SocialProvider::Facebook,
                userinfo.to_string(),
                Duration::from_secs(5),
            )
            .expect("facebook client"),
        );

        let services = Services::build(
            db.clone(),
            credentials,
            Collaborators {
                mailer,
                google,
                facebook,
            },
            policy,
        );

        Self {
            uow: Persistence::new(db.clone()),
            db,
            mailer: recorder,
            cache,
            services,
        }
    }

    pub fn registration(&self) -> Arc<dyn RegistrationService> {
        self.services.registration()
    }

    pub fn auth(&self) -> Arc<dyn AuthService> {
        self.services.auth()
    }

    pub fn credentials(&self) -> Arc<dyn CredentialIssuer> {
        self.services.credentials()
    }
}
