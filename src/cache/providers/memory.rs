//! Process-local task cache backed by `moka`
//!
//! Every entry expires after the TTL it was written with, and moka's
//! housekeeping drops expired entries whether or not they are read again.
//! `max_capacity` bounds the cache even when nothing expires.
//!
//! **Not distributed**: each process holds its own copy. Also used as the
//! cache test double, so it can be switched off to simulate an outage and
//! inspected without going through that switch.

use super::super::errors::{CacheError, CacheResult};
use super::super::traits::{write_ttl, CacheService};
use crate::config::MemoryCacheConfig;
use moka::future::Cache;
use moka::Expiry;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

const BACKEND: &str = "memory";

#[derive(Debug, Clone)]
struct Entry {
    value: Arc<str>,
    ttl: Duration,
}

/// Expires an entry after its own TTL, restarting the clock on overwrite
struct EntryTtl;

impl Expiry<String, Entry> for EntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        entry: &Entry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(entry.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        entry: &Entry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(entry.ttl)
    }
}

/// In-memory task cache; clones share entries and the availability switch
#[derive(Clone)]
pub struct InMemoryCacheService {
    cache: Cache<String, Entry>,
    available: Arc<AtomicBool>,
}

impl std::fmt::Debug for InMemoryCacheService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryCacheService")
            .field("max_capacity", &self.cache.policy().max_capacity())
            .field("entry_count", &self.cache.entry_count())
            .field("available", &self.available.load(Ordering::SeqCst))
            .finish()
    }
}

impl Default for InMemoryCacheService {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryCacheService {
    pub fn new() -> Self {
        Self::from_config(&MemoryCacheConfig::default())
    }

    pub fn from_config(config: &MemoryCacheConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.max_capacity)
            .expire_after(EntryTtl)
            .build();

        debug!(
            max_capacity = config.max_capacity,
            "In-memory task cache created"
        );

        Self {
            cache,
            available: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Simulate the backend going down (`false`) or recovering (`true`)
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Write an entry regardless of the availability switch
    pub async fn insert_raw(&self, key: &str, value: &str, ttl: Duration) {
        let entry = Entry {
            value: Arc::from(value),
            ttl: write_ttl(ttl),
        };
        self.cache.insert(key.to_string(), entry).await;
    }

    /// Read a live entry regardless of the availability switch
    pub async fn peek(&self, key: &str) -> Option<String> {
        self.cache.get(key).await.map(|entry| entry.value.to_string())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.cache.contains_key(key)
    }

    /// Live entries, after pending expirations and evictions have been applied
    pub async fn entry_count(&self) -> u64 {
        self.cache.run_pending_tasks().await;
        self.cache.entry_count()
    }

    fn ensure_available(&self, command: &'static str) -> CacheResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(CacheError::unavailable(
                BACKEND,
                format!("switched off, rejected {command}"),
            ))
        }
    }
}

impl CacheService for InMemoryCacheService {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        self.ensure_available("GET")?;
        let value = self.peek(key).await;
        debug!(key = key, hit = value.is_some(), "Task cache GET (memory)");
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        self.ensure_available("SET")?;
        self.insert_raw(key, value, ttl).await;
        debug!(
            key = key,
            ttl_seconds = write_ttl(ttl).as_secs(),
            "Task cache SET (memory)"
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        self.ensure_available("DEL")?;
        self.cache.invalidate(key).await;
        debug!(key = key, "Task cache DEL (memory)");
        Ok(())
    }

    async fn health_check(&self) -> CacheResult<bool> {
        Ok(self.available.load(Ordering::SeqCst))
    }

    fn provider_name(&self) -> &'static str {
        BACKEND
    }
}
