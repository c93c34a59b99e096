//! Redis hash-backed result cache.
//!
//! Every entry is a field of one hash (`HSET values 7 13`), so the whole
//! cache is read with a single `HGETALL`.

use std::collections::HashMap;

use redis::AsyncCommands;
use redis::aio::MultiplexedConnection;
use tracing::instrument;

use super::{CacheError, DEFAULT_CACHE_HASH_KEY, ResultCache};

#[derive(Clone)]
pub struct RedisResultCache {
    conn: MultiplexedConnection,
    hash_key: String,
}

impl std::fmt::Debug for RedisResultCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisResultCache")
            .field("hash_key", &self.hash_key)
            .finish_non_exhaustive()
    }
}

impl RedisResultCache {
    /// Open a multiplexed connection to `redis_url`.
    ///
    /// * `hash_key` - hash holding the entries (default: "values")
    pub async fn connect(
        redis_url: impl AsRef<str>,
        hash_key: Option<String>,
    ) -> Result<Self, CacheError> {
        let client = redis::Client::open(redis_url.as_ref())
            .map_err(|e| CacheError::Unavailable(e.to_string()))?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| CacheError::Unavailable(e.to_string()))?;

        Ok(Self {
            conn,
            hash_key: hash_key.unwrap_or_else(|| DEFAULT_CACHE_HASH_KEY.to_string()),
        })
    }

    pub fn hash_key(&self) -> &str {
        &self.hash_key
    }
}

#[async_trait::async_trait]
impl ResultCache for RedisResultCache {
    #[instrument(skip(self, value), fields(hash_key = %self.hash_key), err)]
    async fn set(&self, key: &str, value: String) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let _: i64 = conn
            .hset(&self.hash_key, key, value)
            .await
            .map_err(|e| CacheError::Command(format!("HSET failed: {e}")))?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.conn.clone();
        conn.hget(&self.hash_key, key)
            .await
            .map_err(|e| CacheError::Command(format!("HGET failed: {e}")))
    }

    async fn get_all(&self) -> Result<HashMap<String, String>, CacheError> {
        let mut conn = self.conn.clone();
        conn.hgetall(&self.hash_key)
            .await
            .map_err(|e| CacheError::Command(format!("HGETALL failed: {e}")))
    }
}
