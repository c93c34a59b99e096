use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

use super::{CacheError, ResultCache};

/// In-memory cache for tests/dev.
///
/// `fail_writes(true)` makes every subsequent `set` fail, which is how tests
/// exercise the "cache write failed after durable append" paths.
#[derive(Debug, Default)]
pub struct InMemoryResultCache {
    entries: RwLock<HashMap<String, String>>,
    failing: AtomicBool,
}

impl InMemoryResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_writes(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl ResultCache for InMemoryResultCache {
    async fn set(&self, key: &str, value: String) -> Result<(), CacheError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(CacheError::Unavailable("writes disabled".to_string()));
        }
        let mut entries = self
            .entries
            .write()
            .map_err(|_| CacheError::Unavailable("lock poisoned".to_string()))?;
        entries.insert(key.to_string(), value);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| CacheError::Unavailable("lock poisoned".to_string()))?;
        Ok(entries.get(key).cloned())
    }

    async fn get_all(&self) -> Result<HashMap<String, String>, CacheError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| CacheError::Unavailable("lock poisoned".to_string()))?;
        Ok(entries.clone())
    }
}
