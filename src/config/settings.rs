//! Application settings loaded from environment variables.

use std::env;
use std::str::FromStr;

use super::constants::{
    DEFAULT_DATABASE_URL, DEFAULT_FACEBOOK_USERINFO_URL, DEFAULT_GOOGLE_USERINFO_URL,
    DEFAULT_HTTP_CLIENT_TIMEOUT_SECONDS, DEFAULT_JWT_EXPIRATION_HOURS, DEFAULT_MAIL_FROM,
    DEFAULT_REDIS_URL, DEFAULT_SERVER_HOST, DEFAULT_SERVER_PORT, DEFAULT_TRUST_PROXY_HEADERS,
    DEFAULT_VERIFICATION_CODE_TTL_MINUTES, DEFAULT_VERIFICATION_MAX_ATTEMPTS,
    MAX_VERIFICATION_CODE_TTL_MINUTES, MIN_JWT_SECRET_LENGTH,
};

/// Application configuration
#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    jwt_secret: String,
    pub jwt_expiration_hours: i64,
    pub server_host: String,
    pub server_port: u16,
    pub verification_code_ttl_minutes: i64,
    pub verification_max_attempts: u32,
    /// HTTP mail API endpoint. When unset, mail is logged instead of sent.
    pub mail_api_url: Option<String>,
    mail_api_key: Option<String>,
    pub mail_from: String,
    pub google_userinfo_url: String,
    pub facebook_userinfo_url: String,
    pub http_client_timeout_seconds: u64,
    /// Key rate limits on forwarded client addresses. Only safe behind a
    /// proxy that overwrites those headers.
    pub trust_proxy_headers: bool,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &"[REDACTED]")
            .field("redis_url", &"[REDACTED]")
            .field("jwt_secret", &"[REDACTED]")
            .field("jwt_expiration_hours", &self.jwt_expiration_hours)
            .field("server_host", &self.server_host)
            .field("server_port", &self.server_port)
            .field("verification_code_ttl_minutes", &self.verification_code_ttl_minutes)
            .field("verification_max_attempts", &self.verification_max_attempts)
            .field("mail_api_url", &self.mail_api_url)
            .field("mail_api_key", &self.mail_api_key.as_ref().map(|_| "[REDACTED]"))
            .field("mail_from", &self.mail_from)
            .field("google_userinfo_url", &self.google_userinfo_url)
            .field("facebook_userinfo_url", &self.facebook_userinfo_url)
            .field("http_client_timeout_seconds", &self.http_client_timeout_seconds)
            .field("trust_proxy_headers", &self.trust_proxy_headers)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Panics
    /// Panics if JWT_SECRET is not set or is too short (security requirement),
    /// or if the verification TTL or attempt limit is out of range.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| {
            if cfg!(debug_assertions) {
                // Development mode: use default but warn
                tracing::warn!("JWT_SECRET not set, using insecure default for development");
                "dev-secret-key-minimum-32-chars!!".to_string()
            } else {
                panic!("JWT_SECRET environment variable must be set in production");
            }
        });

        if jwt_secret.len() < MIN_JWT_SECRET_LENGTH {
            panic!(
                "JWT_SECRET must be at least {} characters long",
                MIN_JWT_SECRET_LENGTH
            );
        }

        let verification_code_ttl_minutes = parse_or(
            "VERIFICATION_CODE_TTL_MINUTES",
            DEFAULT_VERIFICATION_CODE_TTL_MINUTES,
        );
        let verification_max_attempts =
            parse_or("VERIFICATION_MAX_ATTEMPTS", DEFAULT_VERIFICATION_MAX_ATTEMPTS);
        if let Err(reason) =
            validate_verification_settings(verification_code_ttl_minutes, verification_max_attempts)
        {
            panic!("{}", reason);
        }

        Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            redis_url: env::var("REDIS_URL").unwrap_or_else(|_| DEFAULT_REDIS_URL.to_string()),
            jwt_secret,
            jwt_expiration_hours: parse_or("JWT_EXPIRATION_HOURS", DEFAULT_JWT_EXPIRATION_HOURS),
            server_host: env::var("SERVER_HOST")
                .unwrap_or_else(|_| DEFAULT_SERVER_HOST.to_string()),
            server_port: parse_or("SERVER_PORT", DEFAULT_SERVER_PORT),
            verification_code_ttl_minutes,
            verification_max_attempts,
            mail_api_url: env::var("MAIL_API_URL").ok().filter(|v| !v.is_empty()),
            mail_api_key: env::var("MAIL_API_KEY").ok().filter(|v| !v.is_empty()),
            mail_from: env::var("MAIL_FROM").unwrap_or_else(|_| DEFAULT_MAIL_FROM.to_string()),
            google_userinfo_url: env::var("GOOGLE_USERINFO_URL")
                .unwrap_or_else(|_| DEFAULT_GOOGLE_USERINFO_URL.to_string()),
            facebook_userinfo_url: env::var("FACEBOOK_USERINFO_URL")
                .unwrap_or_else(|_| DEFAULT_FACEBOOK_USERINFO_URL.to_string()),
            http_client_timeout_seconds: parse_or(
                "HTTP_CLIENT_TIMEOUT_SECONDS",
                DEFAULT_HTTP_CLIENT_TIMEOUT_SECONDS,
            ),
            trust_proxy_headers: parse_or("TRUST_PROXY_HEADERS", DEFAULT_TRUST_PROXY_HEADERS),
        }
    }

    /// Get JWT secret bytes for token signing/verification.
    pub fn jwt_secret_bytes(&self) -> &[u8] {
        self.jwt_secret.as_bytes()
    }

    /// API key for the mail provider, if configured.
    pub fn mail_api_key(&self) -> Option<&str> {
        self.mail_api_key.as_deref()
    }
}

fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// A code must live at least a minute and at most a day, and allow at
/// least one attempt.
fn validate_verification_settings(ttl_minutes: i64, max_attempts: u32) -> Result<(), String> {
    if !(1..=MAX_VERIFICATION_CODE_TTL_MINUTES).contains(&ttl_minutes) {
        return Err(format!(
            "VERIFICATION_CODE_TTL_MINUTES must be between 1 and {}",
            MAX_VERIFICATION_CODE_TTL_MINUTES
        ));
    }
    if max_attempts == 0 {
        return Err("VERIFICATION_MAX_ATTEMPTS must be at least 1".to_string());
    }
    Ok(())
}
