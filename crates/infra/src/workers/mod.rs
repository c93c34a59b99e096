//! Background workers.
//!
//! The compute worker is deployed as a single instance. Two running workers
//! would both receive every job, compute it twice and overwrite the same cache
//! entry; harmless for a pure function but wasted work, and nothing here
//! coordinates them.

pub mod compute_worker;

pub use compute_worker::{ComputeFailure, ComputeWorker, WorkerHandle, WorkerStats};
