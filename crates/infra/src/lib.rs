//! Infrastructure layer: stores, cache, bus adapters and the job pipeline.

pub mod cache;
pub mod config;
pub mod dead_letter;
pub mod durable_store;
pub mod event_bus;
pub mod job_dispatcher;
pub mod query;
pub mod workers;


pub use cache::{CacheError, InMemoryResultCache, ResultCache};
pub use config::{AppConfig, ConfigError};
pub use dead_letter::{DeadLetterEntry, DeadLetterSink, InMemoryDeadLetters};
pub use durable_store::{DurableStore, InMemoryDurableStore, StoreError};
pub use job_dispatcher::{DispatchError, JobDispatcher};
pub use query::{QueryError, QueryService};
pub use workers::{ComputeFailure, ComputeWorker, WorkerHandle, WorkerStats};
