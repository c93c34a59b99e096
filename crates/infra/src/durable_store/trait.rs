use std::sync::Arc;

use thiserror::Error;

use fibcalc_core::Index;

/// Durable store operation error.
///
/// ## Error Categories
///
/// - **Unavailable**: the backend could not be reached (pool closed, network)
/// - **Query**: the backend rejected the statement
/// - **Decode**: a stored row could not be turned back into an `Index`
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("durable store unavailable: {0}")]
    Unavailable(String),

    #[error("durable store query failed: {0}")]
    Query(String),

    #[error("durable store row could not be decoded: {0}")]
    Decode(String),
}

/// Append-only record of submitted indices.
///
/// ## Guarantees expected from implementations
///
/// - **Append-only**: `append` adds one row per call, duplicates included
/// - **Insertion order**: `list_all` returns rows in the order they were appended
/// - **Thread safety**: concurrent appends from many request handlers are safe;
///   callers add no locking of their own
#[async_trait::async_trait]
pub trait DurableStore: Send + Sync {
    async fn append(&self, index: Index) -> Result<(), StoreError>;

    async fn list_all(&self) -> Result<Vec<Index>, StoreError>;
}

#[async_trait::async_trait]
impl<S> DurableStore for Arc<S>
where
    S: DurableStore + ?Sized,
{
    async fn append(&self, index: Index) -> Result<(), StoreError> {
        (**self).append(index).await
    }

    async fn list_all(&self) -> Result<Vec<Index>, StoreError> {
        (**self).list_all().await
    }
}
