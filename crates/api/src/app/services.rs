use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use fibcalc_core::{CacheValue, Index, RecursiveFibonacci};
use fibcalc_events::{BusError, InMemoryMessageBus, MessageBus};
use fibcalc_infra::{
    AppConfig, CacheError, ComputeWorker, ConfigError, DispatchError, InMemoryDurableStore,
    InMemoryResultCache, JobDispatcher, QueryError, QueryService, StoreError, WorkerHandle,
    WorkerStats,
    cache::RedisResultCache,
    durable_store::PostgresDurableStore,
    event_bus::RedisPubSubBus,
};

/// Failure while wiring services at startup.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Bus(#[from] BusError),
}

// Dispatcher/query over in-memory adapters (dev/test)
type InMemoryDispatcher =
    JobDispatcher<Arc<InMemoryDurableStore>, Arc<InMemoryResultCache>, Arc<InMemoryMessageBus>>;
type InMemoryQuery = QueryService<Arc<InMemoryDurableStore>, Arc<InMemoryResultCache>>;

// Dispatcher/query over Postgres + Redis
type PersistentDispatcher =
    JobDispatcher<Arc<PostgresDurableStore>, Arc<RedisResultCache>, Arc<RedisPubSubBus>>;
type PersistentQuery = QueryService<Arc<PostgresDurableStore>, Arc<RedisResultCache>>;

/// Everything the handlers need; shared across requests behind an `Arc`.
pub enum AppServices {
    /// Self-contained: stores, bus and the compute worker all live in this process.
    InMemory {
        dispatcher: InMemoryDispatcher,
        query: InMemoryQuery,
        worker: WorkerHandle,
    },
    /// Postgres + Redis; the compute worker runs as the separate `fibcalc-worker` process.
    Persistent {
        dispatcher: PersistentDispatcher,
        query: PersistentQuery,
    },
}

pub async fn build_services(config: &AppConfig) -> Result<AppServices, ServiceError> {
    if config.use_persistent_stores {
        build_persistent_services(config).await
    } else {
        build_in_memory_services(config).await
    }
}

async fn build_in_memory_services(config: &AppConfig) -> Result<AppServices, ServiceError> {
    let store = Arc::new(InMemoryDurableStore::new());
    let cache = Arc::new(InMemoryResultCache::new());
    let bus = Arc::new(InMemoryMessageBus::new());

    // Background worker: bus -> compute -> cache. Subscribed before the
    // dispatcher exists so no early job is missed.
    let sub = bus.subscribe(&config.job_channel).await?;
    let worker = ComputeWorker::new(RecursiveFibonacci, cache.clone()).spawn(sub);

    let dispatcher = JobDispatcher::new(store.clone(), cache.clone(), bus, config.max_index)
        .with_channel(config.job_channel.clone());
    let query = QueryService::new(store, cache);

    info!("in-memory services ready (in-process compute worker)");
    Ok(AppServices::InMemory {
        dispatcher,
        query,
        worker,
    })
}

async fn build_persistent_services(config: &AppConfig) -> Result<AppServices, ServiceError> {
    let database_url = config.require_database_url()?;

    let store = Arc::new(PostgresDurableStore::connect(database_url).await?);
    store.ensure_schema().await?;

    let cache = Arc::new(
        RedisResultCache::connect(&config.redis_url, Some(config.cache_hash_key.clone())).await?,
    );
    let bus = Arc::new(RedisPubSubBus::connect(&config.redis_url).await?);

    let dispatcher = JobDispatcher::new(store.clone(), cache.clone(), bus, config.max_index)
        .with_channel(config.job_channel.clone());
    let query = QueryService::new(store, cache);

    info!("persistent services ready (postgres + redis)");
    Ok(AppServices::Persistent { dispatcher, query })
}

impl AppServices {
    pub async fn submit(&self, raw: &str) -> Result<Index, DispatchError> {
        match self {
            AppServices::InMemory { dispatcher, .. } => dispatcher.submit(raw).await,
            AppServices::Persistent { dispatcher, .. } => dispatcher.submit(raw).await,
        }
    }

    pub async fn list_all(&self) -> Result<Vec<Index>, QueryError> {
        match self {
            AppServices::InMemory { query, .. } => query.list_all().await,
            AppServices::Persistent { query, .. } => query.list_all().await,
        }
    }

    pub async fn list_current(&self) -> Result<BTreeMap<Index, CacheValue>, QueryError> {
        match self {
            AppServices::InMemory { query, .. } => query.list_current().await,
            AppServices::Persistent { query, .. } => query.list_current().await,
        }
    }

    /// Stats of the in-process worker; `None` when the worker runs elsewhere.
    pub fn worker_stats(&self) -> Option<WorkerStats> {
        match self {
            AppServices::InMemory { worker, .. } => Some(worker.stats()),
            AppServices::Persistent { .. } => None,
        }
    }
}
