use std::sync::{Arc, Mutex};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use fibcalc_core::{CacheValue, Computation, ComputeError, Index};
use fibcalc_events::{BusError, JobMessage, MessageBus, Subscription};

use crate::cache::{CacheError, ResultCache};
use crate::dead_letter::{DeadLetterEntry, DeadLetterSink};

/// Why a single job message was dropped.
#[derive(Debug, Error)]
pub enum ComputeFailure {
    #[error("malformed job message: {0}")]
    Malformed(#[from] BusError),

    #[error("computation for index {index} failed: {source}")]
    Compute {
        index: Index,
        #[source]
        source: ComputeError,
    },

    #[error("computation for index {index} panicked")]
    Panicked { index: Index },

    #[error("writing result for index {index} failed: {source}")]
    CacheWrite {
        index: Index,
        #[source]
        source: CacheError,
    },
}

impl ComputeFailure {
    fn index(&self) -> Option<Index> {
        match self {
            ComputeFailure::Malformed(_) => None,
            ComputeFailure::Compute { index, .. }
            | ComputeFailure::Panicked { index }
            | ComputeFailure::CacheWrite { index, .. } => Some(*index),
        }
    }
}

/// Worker runtime statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct WorkerStats {
    pub jobs_received: u64,
    pub jobs_succeeded: u64,
    pub jobs_failed: u64,
    pub jobs_malformed: u64,
    pub jobs_dead_lettered: u64,
}

/// Handle to control and observe a running worker.
#[derive(Debug)]
pub struct WorkerHandle {
    shutdown: watch::Sender<bool>,
    join: Option<JoinHandle<()>>,
    stats: Arc<Mutex<WorkerStats>>,
}

impl WorkerHandle {
    /// Request shutdown and wait for the loop to exit.
    ///
    /// A computation already running is not interrupted; shutdown takes effect
    /// once it finishes.
    pub async fn shutdown(mut self) {
        let _ = self.shutdown.send(true);
        if let Some(join) = self.join.take() {
            let _ = join.await;
        }
    }

    /// Wait for the loop to exit on its own (inbox closed).
    pub async fn join(mut self) {
        if let Some(join) = self.join.take() {
            let _ = join.await;
        }
    }

    pub fn is_finished(&self) -> bool {
        self.join.as_ref().map(|j| j.is_finished()).unwrap_or(true)
    }

    pub fn stats(&self) -> WorkerStats {
        lock_stats(&self.stats).clone()
    }
}

/// Consumes job messages one at a time and writes results to the cache.
///
/// - One message is fully processed (decode, compute, write) before the next
///   is taken from the inbox
/// - Computations run on the blocking pool so they do not stall the runtime,
///   but the loop awaits each one; there is no internal parallelism
/// - A failed job is logged and dropped; its cache entry stays pending. With a
///   dead-letter sink attached the failure is also recorded there
pub struct ComputeWorker<P, C> {
    name: &'static str,
    computation: Arc<P>,
    cache: C,
    dead_letters: Option<Arc<dyn DeadLetterSink>>,
}

impl<P, C> std::fmt::Debug for ComputeWorker<P, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComputeWorker")
            .field("name", &self.name)
            .field("dead_letters", &self.dead_letters.is_some())
            .finish_non_exhaustive()
    }
}

impl<P, C> ComputeWorker<P, C>
where
    P: Computation + 'static,
    C: ResultCache + 'static,
{
    pub fn new(computation: P, cache: C) -> Self {
        Self {
            name: "compute-worker",
            computation: Arc::new(computation),
            cache,
            dead_letters: None,
        }
    }

    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    pub fn with_dead_letters(mut self, sink: Arc<dyn DeadLetterSink>) -> Self {
        self.dead_letters = Some(sink);
        self
    }

    /// Spawn the consumption loop on the current runtime.
    pub fn spawn(self, subscription: Subscription) -> WorkerHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let stats = Arc::new(Mutex::new(WorkerStats::default()));
        let loop_stats = stats.clone();

        let join = tokio::spawn(async move {
            self.run(subscription, shutdown_rx, loop_stats).await;
        });

        WorkerHandle {
            shutdown: shutdown_tx,
            join: Some(join),
            stats,
        }
    }

    /// The consumption loop. Returns when shutdown is requested or the inbox
    /// closes.
    pub async fn run(
        &self,
        mut subscription: Subscription,
        mut shutdown: watch::Receiver<bool>,
        stats: Arc<Mutex<WorkerStats>>,
    ) {
        info!(worker = self.name, channel = subscription.channel(), "compute worker started");

        loop {
            let payload = tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                    continue;
                }
                msg = subscription.recv() => match msg {
                    Some(payload) => payload,
                    None => break,
                },
            };

            lock_stats(&stats).jobs_received += 1;

            match self.process(&payload).await {
                Ok((index, value)) => {
                    lock_stats(&stats).jobs_succeeded += 1;
                    info!(worker = self.name, %index, %value, "result written");
                }
                Err(failure) => self.handle_failure(&payload, failure, &stats),
            }
        }

        info!(worker = self.name, "compute worker stopped");
    }

    /// Consume `channel` on `bus` forever on one connection, subscribing again
    /// `retry_delay` after the inbox closes or a subscribe attempt fails.
    ///
    /// Jobs published between two subscriptions are lost.
    pub async fn run_resubscribing<B>(&self, bus: &B, channel: &str, retry_delay: Duration)
    where
        B: MessageBus,
    {
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let stats = Arc::new(Mutex::new(WorkerStats::default()));

        loop {
            match bus.subscribe(channel).await {
                Ok(subscription) => {
                    self.run(subscription, shutdown_rx.clone(), stats.clone()).await;
                    warn!(worker = self.name, channel, "job subscription closed; resubscribing");
                }
                Err(e) => warn!(worker = self.name, channel, error = %e, "subscribe failed; retrying"),
            }
            tokio::time::sleep(retry_delay).await;
        }
    }

    /// Decode, compute and write one job message.
    pub async fn process(&self, payload: &str) -> Result<(Index, u64), ComputeFailure> {
        let index = JobMessage::decode(payload)?.index();

        let computation = self.computation.clone();
        let value = match tokio::task::spawn_blocking(move || computation.compute(index)).await {
            Ok(Ok(value)) => value,
            Ok(Err(source)) => return Err(ComputeFailure::Compute { index, source }),
            Err(_) => return Err(ComputeFailure::Panicked { index }),
        };

        self.cache
            .set(&index.to_string(), CacheValue::Computed(value).to_text())
            .await
            .map_err(|source| ComputeFailure::CacheWrite { index, source })?;

        Ok((index, value))
    }

    fn handle_failure(&self, payload: &str, failure: ComputeFailure, stats: &Mutex<WorkerStats>) {
        warn!(worker = self.name, payload, error = %failure, "job dropped");

        let mut s = lock_stats(stats);
        if matches!(failure, ComputeFailure::Malformed(_)) {
            s.jobs_malformed += 1;
        } else {
            s.jobs_failed += 1;
        }

        if let Some(sink) = &self.dead_letters {
            sink.record(DeadLetterEntry::new(payload, failure.index(), failure.to_string()));
            s.jobs_dead_lettered += 1;
        }
    }
}

fn lock_stats(stats: &Mutex<WorkerStats>) -> std::sync::MutexGuard<'_, WorkerStats> {
    stats.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
