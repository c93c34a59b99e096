//! Message publishing/subscription abstraction (mechanics only).
//!
//! The bus announces work; it does not store it. The durable store is the
//! record of what was submitted, the bus only tells a connected worker that
//! something needs computing.
//!
//! ## Delivery
//!
//! - **At most once per connected subscriber**: a message published while no
//!   subscriber is connected is gone
//! - **No acknowledgment**: the bus never learns whether a subscriber
//!   processed a message
//! - **Per-publisher ordering only**: messages from one publisher arrive in
//!   publish order; nothing is promised across publishers

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Debug, Error)]
pub enum BusError {
    /// The transport could not be reached or refused the operation.
    #[error("bus transport error: {0}")]
    Transport(String),

    /// A payload did not decode into the expected message.
    #[error("malformed message {payload:?}: {reason}")]
    Decode { payload: String, reason: String },

    /// Internal state of an in-process bus was poisoned.
    #[error("bus state poisoned")]
    Poisoned,
}

/// A subscription to one channel.
///
/// The subscription is the worker's inbox: messages queue here in delivery
/// order until the consumer takes them. The inbox is unbounded, so a slow
/// consumer never pushes back on publishers.
///
/// ```ignore
/// let mut sub = bus.subscribe("insert").await?;
/// while let Some(payload) = sub.recv().await {
///     handle(payload);
/// }
/// ```
///
/// Subscriptions are meant for a single consumer.
#[derive(Debug)]
pub struct Subscription {
    channel: String,
    receiver: mpsc::UnboundedReceiver<String>,
}

impl Subscription {
    pub fn new(channel: impl Into<String>, receiver: mpsc::UnboundedReceiver<String>) -> Self {
        Self {
            channel: channel.into(),
            receiver,
        }
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Wait for the next message. `None` once the bus side has gone away.
    pub async fn recv(&mut self) -> Option<String> {
        self.receiver.recv().await
    }

    /// Take a message if one is already queued.
    pub fn try_recv(&mut self) -> Option<String> {
        self.receiver.try_recv().ok()
    }
}

/// Transport-agnostic pub/sub bus.
///
/// `publish()` can fail (transport down). The dispatcher surfaces that to the
/// submitting client; nothing retries it.
#[async_trait::async_trait]
pub trait MessageBus: Send + Sync {
    async fn publish(&self, channel: &str, message: String) -> Result<(), BusError>;

    async fn subscribe(&self, channel: &str) -> Result<Subscription, BusError>;
}

#[async_trait::async_trait]
impl<B> MessageBus for Arc<B>
where
    B: MessageBus + ?Sized,
{
    async fn publish(&self, channel: &str, message: String) -> Result<(), BusError> {
        (**self).publish(channel, message).await
    }

    async fn subscribe(&self, channel: &str) -> Result<Subscription, BusError> {
        (**self).subscribe(channel).await
    }
}
