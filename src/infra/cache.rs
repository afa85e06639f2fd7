//! Redis cache implementation.
//!
//! Backs rate-limit counters and the credential revocation list. Callers
//! depend on [`CacheStore`] so handlers and services can run against a mock.

use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands, Client, RedisError};

use crate::config::{Config, CACHE_PREFIX_RATE_LIMIT};
use crate::errors::AppResult;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Key/value operations the application needs from the cache.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Count one request for `identifier` in the current window.
    /// Returns `(current_count, is_allowed)`.
    async fn check_rate_limit(
        &self,
        identifier: &str,
        max_requests: u64,
        window_seconds: u64,
    ) -> AppResult<(u64, bool)>;

    /// Set a marker key that expires after `ttl_seconds`.
    async fn mark(&self, key: &str, ttl_seconds: u64) -> AppResult<()>;

    async fn exists(&self, key: &str) -> AppResult<bool>;

    async fn ping(&self) -> AppResult<()>;
}

/// Redis cache wrapper with connection pooling.
#[derive(Clone)]
pub struct Cache {
    connection: ConnectionManager,
}

impl Cache {
    /// Connect to Redis. The connection manager reconnects on its own after
    /// this succeeds.
    pub async fn connect(config: &Config) -> Result<Self, RedisError> {
        let client = Client::open(config.redis_url.as_str())?;
        let connection = ConnectionManager::new(client).await?;

        tracing::info!("Redis cache connected");

        Ok(Self { connection })
    }
}

#[async_trait]
impl CacheStore for Cache {
    async fn check_rate_limit(
        &self,
        identifier: &str,
        max_requests: u64,
        window_seconds: u64,
    ) -> AppResult<(u64, bool)> {
        let key = format!("{}{}", CACHE_PREFIX_RATE_LIMIT, identifier);
        let mut conn = self.connection.clone();

        let count: i64 = conn.incr(&key, 1).await?;
        if count == 1 {
            // First request opens the window
            let _: () = conn.expire(&key, window_seconds as i64).await?;
        }

        let count = count.max(0) as u64;
        Ok((count, count <= max_requests))
    }

    async fn mark(&self, key: &str, ttl_seconds: u64) -> AppResult<()> {
        let mut conn = self.connection.clone();
        let _: () = conn.set_ex(key, 1i64, ttl_seconds.max(1)).await?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        let mut conn = self.connection.clone();
        let exists: bool = conn.exists(key).await?;
        Ok(exists)
    }

    async fn ping(&self) -> AppResult<()> {
        let mut conn = self.connection.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}
