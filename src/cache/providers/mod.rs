//! Task cache backends

pub mod memory;

#[cfg(feature = "cache-redis")]
pub mod redis;

pub use memory::InMemoryCacheService;

#[cfg(feature = "cache-redis")]
pub use self::redis::RedisCacheService;
