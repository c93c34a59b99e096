//! Result cache boundary.
//!
//! One entry per index, holding either the pending sentinel or the computed
//! value as text. The dispatcher seeds the pending entry; the worker
//! overwrites it. Nothing expires entries.

pub mod in_memory;
#[cfg(feature = "redis")]
pub mod redis;

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

pub use in_memory::InMemoryResultCache;
#[cfg(feature = "redis")]
pub use self::redis::RedisResultCache;

/// Default hash key holding every cache entry.
pub const DEFAULT_CACHE_HASH_KEY: &str = "values";

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache unavailable: {0}")]
    Unavailable(String),

    #[error("cache command failed: {0}")]
    Command(String),
}

/// String key/value cache.
///
/// Implementations provide atomic single-key writes and are safe to share
/// across handlers and the worker. Last write wins; callers add no
/// compare-and-swap.
#[async_trait::async_trait]
pub trait ResultCache: Send + Sync {
    async fn set(&self, key: &str, value: String) -> Result<(), CacheError>;

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn get_all(&self) -> Result<HashMap<String, String>, CacheError>;
}

#[async_trait::async_trait]
impl<C> ResultCache for Arc<C>
where
    C: ResultCache + ?Sized,
{
    async fn set(&self, key: &str, value: String) -> Result<(), CacheError> {
        (**self).set(key, value).await
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        (**self).get(key).await
    }

    async fn get_all(&self) -> Result<HashMap<String, String>, CacheError> {
        (**self).get_all().await
    }
}
