//! # Task Cache Module
//!
//! Read-through cache for tasks, keyed by task id.
//!
//! ## Architecture
//!
//! ```text
//! CacheProvider (struct)             <- task ids in, tasks out; keys, JSON, TTL, timeouts
//!   ├── Redis(RedisCacheService)     <- ConnectionManager-based async Redis
//!   ├── Memory(InMemoryCacheService) <- moka, process-local, test double
//!   └── Disabled                     <- always miss, always succeed
//! ```
//!
//! ## Design Decisions
//!
//! - **Enum dispatch**: no vtable, backends selected from configuration
//! - **Graceful degradation**: Redis failure at startup → caching disabled
//! - **Best-effort everywhere**: the task service logs cache errors and never
//!   propagates them; the store stays the source of truth

pub mod errors;
pub mod provider;
pub mod providers;
pub mod traits;

pub use errors::{CacheError, CacheResult};
pub use provider::{CacheProvider, DEFAULT_CACHE_TTL, DEFAULT_KEY_PREFIX};
pub use providers::InMemoryCacheService;
pub use traits::CacheService;

#[cfg(feature = "cache-redis")]
pub use providers::RedisCacheService;
