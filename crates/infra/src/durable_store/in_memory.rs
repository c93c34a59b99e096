use std::sync::RwLock;

use fibcalc_core::Index;

use super::r#trait::{DurableStore, StoreError};

/// In-memory append-only store.
///
/// Intended for tests/dev. Rows live as long as the process.
#[derive(Debug, Default)]
pub struct InMemoryDurableStore {
    rows: RwLock<Vec<Index>>,
}

impl InMemoryDurableStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
impl DurableStore for InMemoryDurableStore {
    async fn append(&self, index: Index) -> Result<(), StoreError> {
        let mut rows = self
            .rows
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;
        rows.push(index);
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<Index>, StoreError> {
        let rows = self
            .rows
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;
        Ok(rows.clone())
    }
}
