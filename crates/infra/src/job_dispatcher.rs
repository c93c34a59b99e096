//! Submission pipeline (API side of the job flow).
//!
//! ## Submission Flow
//!
//! ```text
//! raw index
//!   ↓
//! 1. Validate (parse, non-negative, ≤ limit)          : no side effects on failure
//!   ↓
//! 2. Append to durable store                          : StoreError stops here, nothing else written
//!   ↓
//! 3. Seed pending placeholder in the result cache     : CacheError leaves an orphan durable row
//!   ↓
//! 4. Publish the job message                          : PublishError leaves row + pending entry
//! ```
//!
//! Step 3 strictly precedes step 4: a reader polling right after a
//! successful submit always finds at least a pending entry, never a missing
//! key. Nothing is rolled back when a later step fails; the durable record
//! stays and the client may resubmit.
//!
//! The dispatcher never waits for the computation.

use thiserror::Error;
use tracing::{debug, instrument};

use fibcalc_core::{CacheValue, DomainError, Index, IndexLimit};
use fibcalc_events::{BusError, DEFAULT_JOB_CHANNEL, JobMessage, MessageBus};

use crate::cache::{CacheError, ResultCache};
use crate::durable_store::{DurableStore, StoreError};

#[derive(Debug, Error)]
pub enum DispatchError {
    /// Input rejected before any side effect.
    #[error("{0}")]
    Validation(String),

    /// Durable append failed; nothing else was written.
    #[error("failed to record index: {0}")]
    Store(#[from] StoreError),

    /// Durable row exists, pending placeholder was not written, no job published.
    #[error("index {index} recorded but cache placeholder failed: {source}")]
    Cache {
        index: Index,
        #[source]
        source: CacheError,
    },

    /// Durable row and pending placeholder exist, but no job was published.
    #[error("index {index} recorded but job publication failed: {source}")]
    Publish {
        index: Index,
        #[source]
        source: BusError,
    },
}

impl From<DomainError> for DispatchError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) => DispatchError::Validation(msg),
        }
    }
}

/// Accepts indices and hands them to the worker tier.
///
/// ## Generic Parameters
///
/// - `S`: durable store (append-only history)
/// - `C`: result cache (pending placeholder)
/// - `B`: message bus (job announcement)
///
/// All three are injected handles; the dispatcher holds no state of its own
/// beyond configuration, so one instance serves every request concurrently.
#[derive(Debug)]
pub struct JobDispatcher<S, C, B> {
    store: S,
    cache: C,
    bus: B,
    limit: IndexLimit,
    channel: String,
}

impl<S, C, B> JobDispatcher<S, C, B> {
    pub fn new(store: S, cache: C, bus: B, limit: IndexLimit) -> Self {
        Self {
            store,
            cache,
            bus,
            limit,
            channel: DEFAULT_JOB_CHANNEL.to_string(),
        }
    }

    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = channel.into();
        self
    }

    pub fn limit(&self) -> IndexLimit {
        self.limit
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn into_parts(self) -> (S, C, B) {
        (self.store, self.cache, self.bus)
    }
}

impl<S, C, B> JobDispatcher<S, C, B>
where
    S: DurableStore,
    C: ResultCache,
    B: MessageBus,
{
    /// Validate raw client input and run the submission pipeline.
    ///
    /// Returns the accepted index once the job is published.
    #[instrument(skip(self), fields(channel = %self.channel))]
    pub async fn submit(&self, raw: &str) -> Result<Index, DispatchError> {
        let index = Index::parse(raw, self.limit)?;
        self.submit_index(index).await?;
        Ok(index)
    }

    /// Same as [`submit`](Self::submit) for input that is already numeric.
    pub async fn submit_value(&self, value: u32) -> Result<Index, DispatchError> {
        let index = Index::new(value, self.limit)?;
        self.submit_index(index).await?;
        Ok(index)
    }

    async fn submit_index(&self, index: Index) -> Result<(), DispatchError> {
        // 1) Durable history first.
        self.store.append(index).await?;
        debug!(%index, "index recorded");

        // 2) Placeholder before publish.
        self.cache
            .set(&index.to_string(), CacheValue::Pending.to_text())
            .await
            .map_err(|source| DispatchError::Cache { index, source })?;
        debug!(%index, "pending placeholder written");

        // 3) Announce.
        self.bus
            .publish(&self.channel, JobMessage::new(index).encode())
            .await
            .map_err(|source| DispatchError::Publish { index, source })?;
        debug!(%index, "job published");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use fibcalc_events::InMemoryMessageBus;

    use super::*;
    use crate::cache::InMemoryResultCache;
    use crate::durable_store::InMemoryDurableStore;

    type Dispatcher = JobDispatcher<
        Arc<InMemoryDurableStore>,
        Arc<InMemoryResultCache>,
        Arc<InMemoryMessageBus>,
    >;

    fn setup() -> (
        Dispatcher,
        Arc<InMemoryDurableStore>,
        Arc<InMemoryResultCache>,
        Arc<InMemoryMessageBus>,
    ) {
        let store = Arc::new(InMemoryDurableStore::new());
        let cache = Arc::new(InMemoryResultCache::new());
        let bus = Arc::new(InMemoryMessageBus::new());
        let dispatcher = JobDispatcher::new(
            store.clone(),
            cache.clone(),
            bus.clone(),
            IndexLimit::new(40),
        );
        (dispatcher, store, cache, bus)
    }

    #[tokio::test]
    async fn accepted_index_is_recorded_seeded_and_published() {
        let (dispatcher, store, cache, bus) = setup();
        let mut sub = bus.subscribe("insert").await.unwrap();

        let index = dispatcher.submit("5").await.unwrap();

        assert_eq!(index.value(), 5);
        assert_eq!(store.list_all().await.unwrap(), vec![index]);
        assert_eq!(cache.get("5").await.unwrap().as_deref(), Some("Nothing yet!"));
        assert_eq!(sub.try_recv().as_deref(), Some("5"));
    }

    #[tokio::test]
    async fn rejected_input_has_no_side_effects() {
        let (dispatcher, store, cache, bus) = setup();
        let mut sub = bus.subscribe("insert").await.unwrap();

        for raw in ["41", "-1", "seven", ""] {
            let err = dispatcher.submit(raw).await.unwrap_err();
            assert!(matches!(err, DispatchError::Validation(_)), "{raw:?}: {err:?}");
        }
        assert!(matches!(
            dispatcher.submit_value(100).await,
            Err(DispatchError::Validation(_))
        ));

        assert!(store.is_empty());
        assert!(cache.get_all().await.unwrap().is_empty());
        assert_eq!(sub.try_recv(), None);
    }

    #[tokio::test]
    async fn cache_failure_leaves_orphan_row_and_no_job() {
        let (dispatcher, store, cache, bus) = setup();
        let mut sub = bus.subscribe("insert").await.unwrap();
        cache.fail_writes(true);

        let err = dispatcher.submit("3").await.unwrap_err();

        assert!(matches!(err, DispatchError::Cache { .. }));
        assert_eq!(store.len(), 1);
        assert!(cache.get_all().await.unwrap().is_empty());
        assert_eq!(sub.try_recv(), None);
    }

    #[tokio::test]
    async fn custom_channel_is_used_for_publication() {
        let (dispatcher, _store, _cache, bus) = setup();
        let dispatcher = dispatcher.with_channel("jobs");
        let mut default_sub = bus.subscribe("insert").await.unwrap();
        let mut jobs_sub = bus.subscribe("jobs").await.unwrap();

        dispatcher.submit_value(2).await.unwrap();

        assert_eq!(default_sub.try_recv(), None);
        assert_eq!(jobs_sub.try_recv().as_deref(), Some("2"));
    }
}
