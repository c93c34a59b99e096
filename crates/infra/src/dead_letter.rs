//! Opt-in record of job messages the worker gave up on.
//!
//! By default the worker only logs a failed job and the cache entry stays
//! pending. Attaching a sink keeps the failure inspectable without changing
//! what clients see: the entry still stays pending and nothing is retried.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;

use fibcalc_core::Index;

/// A job message that failed processing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeadLetterEntry {
    /// Raw payload as received from the bus.
    pub payload: String,
    /// Decoded index, absent when the payload itself was malformed.
    pub index: Option<Index>,
    pub reason: String,
    pub failed_at: DateTime<Utc>,
}

impl DeadLetterEntry {
    pub fn new(payload: impl Into<String>, index: Option<Index>, reason: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
            index,
            reason: reason.into(),
            failed_at: Utc::now(),
        }
    }
}

/// Receives dead-lettered jobs. Must not block the worker for long.
pub trait DeadLetterSink: Send + Sync {
    fn record(&self, entry: DeadLetterEntry);
}

/// In-memory dead-letter list for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryDeadLetters {
    inner: Mutex<Vec<DeadLetterEntry>>,
}

impl InMemoryDeadLetters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn list(&self) -> Vec<DeadLetterEntry> {
        self.inner
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }
}

impl DeadLetterSink for InMemoryDeadLetters {
    fn record(&self, entry: DeadLetterEntry) {
        if let Ok(mut entries) = self.inner.lock() {
            entries.push(entry);
        }
    }
}
