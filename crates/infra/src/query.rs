//! Read side: submission history and current cache values.

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::warn;

use fibcalc_core::{CacheValue, Index};

use crate::cache::{CacheError, ResultCache};
use crate::durable_store::{DurableStore, StoreError};

#[derive(Debug, Error)]
pub enum QueryError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// Pure reads over the two stores. Empty stores yield empty collections.
#[derive(Debug)]
pub struct QueryService<S, C> {
    store: S,
    cache: C,
}

impl<S, C> QueryService<S, C> {
    pub fn new(store: S, cache: C) -> Self {
        Self { store, cache }
    }
}

impl<S, C> QueryService<S, C>
where
    S: DurableStore,
    C: ResultCache,
{
    /// Every accepted submission, in insertion order (duplicates included).
    pub async fn list_all(&self) -> Result<Vec<Index>, QueryError> {
        Ok(self.store.list_all().await?)
    }

    /// Current value per index, pending entries included.
    ///
    /// The cache hash may be shared with other writers, so entries whose key
    /// or value is not ours are skipped rather than failing the read.
    pub async fn list_current(&self) -> Result<BTreeMap<Index, CacheValue>, QueryError> {
        let raw = self.cache.get_all().await?;

        let mut current = BTreeMap::new();
        for (key, value) in raw {
            let index = match key.parse::<Index>() {
                Ok(i) => i,
                Err(_) => {
                    warn!(key = %key, "skipping cache entry with non-index key");
                    continue;
                }
            };
            match value.parse::<CacheValue>() {
                Ok(v) => {
                    current.insert(index, v);
                }
                Err(_) => warn!(key = %key, value = %value, "skipping unrecognised cache value"),
            }
        }

        Ok(current)
    }

    /// Current value of a single index, `None` if it was never seeded.
    pub async fn current_value(&self, index: Index) -> Result<Option<CacheValue>, QueryError> {
        let raw = self.cache.get(&index.to_string()).await?;
        Ok(raw.and_then(|v| v.parse().ok()))
    }
}
