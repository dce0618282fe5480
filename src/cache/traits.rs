//! Backend contract for the task cache

use super::errors::CacheResult;
use crate::config::MAX_CACHE_TTL;
use std::future::Future;
use std::time::Duration;

/// Key/value storage behind [`CacheProvider`](super::CacheProvider)
///
/// Backends only ever see prefixed keys and JSON-encoded tasks. Key layout,
/// encoding and call timeouts belong to the provider.
pub trait CacheService: Send + Sync {
    fn get(&self, key: &str) -> impl Future<Output = CacheResult<Option<String>>> + Send;

    /// Store `value` under `key` for at most `ttl`, capped by [`write_ttl`]
    fn set(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> impl Future<Output = CacheResult<()>> + Send;

    fn delete(&self, key: &str) -> impl Future<Output = CacheResult<()>> + Send;

    /// `Ok(false)` means reachable but refusing work
    fn health_check(&self) -> impl Future<Output = CacheResult<bool>> + Send;

    fn provider_name(&self) -> &'static str;
}

/// TTL a backend actually applies to a write
pub fn write_ttl(requested: Duration) -> Duration {
    requested.min(MAX_CACHE_TTL)
}
