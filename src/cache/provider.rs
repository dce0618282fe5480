//! Task-level cache facade with bounded operation latency
//!
//! [`CacheProvider`] is what the task service talks to. It turns a task id
//! into a backend key, encodes tasks as JSON, applies the configured TTL and
//! wraps every backend call in a timeout so a slow backend degrades into a
//! miss instead of stalling the request. Backends are selected by enum
//! dispatch from configuration.

use super::errors::{CacheError, CacheResult};
use super::providers::InMemoryCacheService;
use super::traits::{write_ttl, CacheService};
use crate::config::CacheConfig;
use crate::models::Task;
use std::future::Future;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

#[cfg(feature = "cache-redis")]
use super::providers::RedisCacheService;

/// Default upper bound for a single cache call
pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_millis(250);

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);

pub const DEFAULT_KEY_PREFIX: &str = "task:";

#[derive(Debug, Clone)]
enum CacheBackend {
    /// Boxed to keep the enum small
    #[cfg(feature = "cache-redis")]
    Redis(Box<RedisCacheService>),

    Memory(InMemoryCacheService),

    /// Caching off: every read misses, every write is dropped
    Disabled,
}

impl CacheBackend {
    fn provider_name(&self) -> &'static str {
        match self {
            #[cfg(feature = "cache-redis")]
            Self::Redis(s) => s.provider_name(),
            Self::Memory(s) => s.provider_name(),
            Self::Disabled => "noop",
        }
    }

    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        match self {
            #[cfg(feature = "cache-redis")]
            Self::Redis(s) => s.get(key).await,
            Self::Memory(s) => s.get(key).await,
            Self::Disabled => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        match self {
            #[cfg(feature = "cache-redis")]
            Self::Redis(s) => s.set(key, value, ttl).await,
            Self::Memory(s) => s.set(key, value, ttl).await,
            Self::Disabled => Ok(()),
        }
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        match self {
            #[cfg(feature = "cache-redis")]
            Self::Redis(s) => s.delete(key).await,
            Self::Memory(s) => s.delete(key).await,
            Self::Disabled => Ok(()),
        }
    }

    async fn health_check(&self) -> CacheResult<bool> {
        match self {
            #[cfg(feature = "cache-redis")]
            Self::Redis(s) => s.health_check().await,
            Self::Memory(s) => s.health_check().await,
            Self::Disabled => Ok(true),
        }
    }
}

/// Read-through cache of [`Task`]s keyed by task id
///
/// ## Backends
///
/// - **redis** (alias **dragonfly**): shared across instances
/// - **memory**: process-local, bounded, also the test double
/// - **noop**: caching disabled or the configured backend unreachable
#[derive(Debug, Clone)]
pub struct CacheProvider {
    backend: CacheBackend,
    operation_timeout: Duration,
    ttl: Duration,
    key_prefix: String,
}

impl CacheProvider {
    fn with_backend(backend: CacheBackend) -> Self {
        Self {
            backend,
            operation_timeout: DEFAULT_OPERATION_TIMEOUT,
            ttl: DEFAULT_CACHE_TTL,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
        }
    }

    /// Build the configured backend, degrading to NoOp instead of failing
    ///
    /// An unreachable Redis or an unknown backend name is logged and the
    /// service starts without a cache.
    pub async fn from_config_graceful(config: &CacheConfig) -> Self {
        let backend = Self::create_backend(config).await;
        Self {
            backend,
            operation_timeout: config.operation_timeout(),
            ttl: config.ttl(),
            key_prefix: config.key_prefix.clone(),
        }
    }

    async fn create_backend(config: &CacheConfig) -> CacheBackend {
        if !config.enabled {
            info!("Task cache disabled by configuration");
            return CacheBackend::Disabled;
        }

        match config.backend.as_str() {
            "redis" | "dragonfly" => Self::create_redis_backend(config).await,
            "memory" | "in-memory" => {
                info!(
                    backend = "memory",
                    max_capacity = config.memory.max_capacity,
                    "Task cache provider initialized"
                );
                CacheBackend::Memory(InMemoryCacheService::from_config(&config.memory))
            }
            "noop" | "none" => CacheBackend::Disabled,
            other => {
                warn!(backend = other, "Unknown cache backend, caching disabled");
                CacheBackend::Disabled
            }
        }
    }

    #[cfg(feature = "cache-redis")]
    async fn create_redis_backend(config: &CacheConfig) -> CacheBackend {
        let Some(redis_config) = &config.redis else {
            warn!("Redis cache selected without a [cache.redis] section, caching disabled");
            return CacheBackend::Disabled;
        };

        let connect = tokio::time::timeout(
            config.operation_timeout().max(Duration::from_secs(1)),
            RedisCacheService::connect(redis_config),
        )
        .await;

        match connect {
            Ok(Ok(service)) => {
                info!(
                    backend = "redis",
                    endpoint = service.endpoint(),
                    "Task cache provider initialized"
                );
                CacheBackend::Redis(Box::new(service))
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Redis unreachable, caching disabled");
                CacheBackend::Disabled
            }
            Err(_) => {
                warn!("Timed out connecting to Redis, caching disabled");
                CacheBackend::Disabled
            }
        }
    }

    #[cfg(not(feature = "cache-redis"))]
    async fn create_redis_backend(_config: &CacheConfig) -> CacheBackend {
        warn!("Redis cache selected but the 'cache-redis' feature is off, caching disabled");
        CacheBackend::Disabled
    }

    pub fn noop() -> Self {
        Self::with_backend(CacheBackend::Disabled)
    }

    /// Wrap an in-memory service; the caller may keep a clone to inspect or
    /// break the backend
    pub fn in_memory(service: InMemoryCacheService) -> Self {
        Self::with_backend(CacheBackend::Memory(service))
    }

    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = write_ttl(ttl);
        self
    }

    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// False when running without a cache
    pub fn is_enabled(&self) -> bool {
        !matches!(self.backend, CacheBackend::Disabled)
    }

    pub fn provider_name(&self) -> &'static str {
        self.backend.provider_name()
    }

    pub fn operation_timeout(&self) -> Duration {
        self.operation_timeout
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Backend key holding the given task
    pub fn key_for(&self, task_id: Uuid) -> String {
        format!("{}{}", self.key_prefix, task_id)
    }

    /// Cached copy of a task, or `None` on a miss
    ///
    /// A value that no longer decodes is reported as [`CacheError::Corrupt`];
    /// the next `put_task` for the id overwrites it.
    pub async fn get_task(&self, task_id: Uuid) -> CacheResult<Option<Task>> {
        let key = self.key_for(task_id);
        let Some(raw) = self.bounded("GET", self.backend.get(&key)).await? else {
            return Ok(None);
        };

        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| CacheError::Corrupt { task_id, source })
    }

    pub async fn put_task(&self, task: &Task) -> CacheResult<()> {
        let value = serde_json::to_string(task).map_err(|source| CacheError::Encode {
            task_id: task.id,
            source,
        })?;

        let key = self.key_for(task.id);
        self.bounded("SET", self.backend.set(&key, &value, self.ttl))
            .await
    }

    pub async fn invalidate_task(&self, task_id: Uuid) -> CacheResult<()> {
        let key = self.key_for(task_id);
        self.bounded("DEL", self.backend.delete(&key)).await
    }

    pub async fn health_check(&self) -> CacheResult<bool> {
        self.bounded("PING", self.backend.health_check()).await
    }

    async fn bounded<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = CacheResult<T>>,
    ) -> CacheResult<T> {
        tokio::time::timeout(self.operation_timeout, call)
            .await
            .unwrap_or(Err(CacheError::Timeout {
                operation,
                timeout: self.operation_timeout,
            }))
    }
}
