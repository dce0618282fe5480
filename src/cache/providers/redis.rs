//! Redis (or Dragonfly) backend for the task cache
//!
//! One `ConnectionManager` is shared by every clone. It multiplexes commands
//! over a single connection and reconnects by itself after a drop.

use super::super::errors::{CacheError, CacheResult};
use super::super::traits::{write_ttl, CacheService};
use crate::config::{redact_url, RedisConfig};
use redis::aio::ConnectionManager;
use redis::{Cmd, FromRedisValue};
use std::time::Duration;
use tracing::debug;

const BACKEND: &str = "redis";

#[derive(Clone)]
pub struct RedisCacheService {
    connection: ConnectionManager,
    /// Connection URL with the password masked
    endpoint: String,
}

impl std::fmt::Debug for RedisCacheService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCacheService")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl RedisCacheService {
    pub async fn connect(config: &RedisConfig) -> CacheResult<Self> {
        let endpoint = redact_url(&config.url);

        let client = redis::Client::open(config.url.as_str())
            .map_err(|e| CacheError::unavailable(BACKEND, format!("{endpoint}: {e}")))?;
        let connection = ConnectionManager::new(client)
            .await
            .map_err(|e| CacheError::unavailable(BACKEND, format!("{endpoint}: {e}")))?;

        debug!(endpoint = %endpoint, "Task cache connected to Redis");
        Ok(Self {
            connection,
            endpoint,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn run<T: FromRedisValue>(&self, command: &'static str, cmd: &Cmd) -> CacheResult<T> {
        let mut connection = self.connection.clone();
        cmd.query_async(&mut connection)
            .await
            .map_err(|e| CacheError::command(BACKEND, command, e))
    }
}

impl CacheService for RedisCacheService {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let mut cmd = redis::cmd("GET");
        cmd.arg(key);
        let value: Option<String> = self.run("GET", &cmd).await?;

        debug!(key = key, hit = value.is_some(), "Task cache GET (redis)");
        Ok(value)
    }

    /// `SET key value EX ttl`; Redis rejects a zero expiry, so the floor is one second
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        let ttl_seconds = write_ttl(ttl).as_secs().max(1);

        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value).arg("EX").arg(ttl_seconds);
        self.run::<()>("SET", &cmd).await?;

        debug!(key = key, ttl_seconds, "Task cache SET (redis)");
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        let mut cmd = redis::cmd("DEL");
        cmd.arg(key);
        let removed: u64 = self.run("DEL", &cmd).await?;

        debug!(key = key, removed, "Task cache DEL (redis)");
        Ok(())
    }

    async fn health_check(&self) -> CacheResult<bool> {
        let reply: String = self.run("PING", &redis::cmd("PING")).await?;
        Ok(reply == "PONG")
    }

    fn provider_name(&self) -> &'static str {
        BACKEND
    }
}
