//! In-memory pub/sub bus for tests/dev.

use std::collections::HashMap;
use std::sync::Mutex;

use tokio::sync::mpsc;

use crate::bus::{BusError, MessageBus, Subscription};

/// In-process pub/sub bus.
///
/// - Fan-out to every subscriber of a channel
/// - Publishing to a channel nobody listens on drops the message
/// - Closed subscriptions are pruned on the next publish
#[derive(Debug, Default)]
pub struct InMemoryMessageBus {
    channels: Mutex<HashMap<String, Vec<mpsc::UnboundedSender<String>>>>,
}

impl InMemoryMessageBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live subscribers on `channel`.
    pub fn subscriber_count(&self, channel: &str) -> usize {
        self.channels
            .lock()
            .map(|c| {
                c.get(channel)
                    .map(|subs| subs.iter().filter(|tx| !tx.is_closed()).count())
                    .unwrap_or(0)
            })
            .unwrap_or(0)
    }
}

#[async_trait::async_trait]
impl MessageBus for InMemoryMessageBus {
    async fn publish(&self, channel: &str, message: String) -> Result<(), BusError> {
        let mut channels = self.channels.lock().map_err(|_| BusError::Poisoned)?;

        if let Some(subs) = channels.get_mut(channel) {
            subs.retain(|tx| tx.send(message.clone()).is_ok());
        } else {
            tracing::debug!(channel, "published with no subscribers; message dropped");
        }

        Ok(())
    }

    async fn subscribe(&self, channel: &str) -> Result<Subscription, BusError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut channels = self.channels.lock().map_err(|_| BusError::Poisoned)?;
        channels.entry(channel.to_string()).or_default().push(tx);
        Ok(Subscription::new(channel, rx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fans_out_to_channel_subscribers_only() {
        let bus = InMemoryMessageBus::new();
        let mut a = bus.subscribe("insert").await.unwrap();
        let mut b = bus.subscribe("insert").await.unwrap();
        let mut other = bus.subscribe("other").await.unwrap();

        bus.publish("insert", "7".to_string()).await.unwrap();

        assert_eq!(a.recv().await.as_deref(), Some("7"));
        assert_eq!(b.recv().await.as_deref(), Some("7"));
        assert_eq!(other.try_recv(), None);
    }

    #[tokio::test]
    async fn message_without_subscriber_is_lost() {
        let bus = InMemoryMessageBus::new();
        bus.publish("insert", "3".to_string()).await.unwrap();

        let mut late = bus.subscribe("insert").await.unwrap();
        assert_eq!(late.try_recv(), None);
    }

    #[tokio::test]
    async fn dropped_subscribers_are_pruned() {
        let bus = InMemoryMessageBus::new();
        let sub = bus.subscribe("insert").await.unwrap();
        assert_eq!(bus.subscriber_count("insert"), 1);
        drop(sub);

        bus.publish("insert", "1".to_string()).await.unwrap();
        assert_eq!(bus.subscriber_count("insert"), 0);
    }

    #[tokio::test]
    async fn preserves_publish_order() {
        let bus = InMemoryMessageBus::new();
        let mut sub = bus.subscribe("insert").await.unwrap();
        for i in 0..5 {
            bus.publish("insert", i.to_string()).await.unwrap();
        }
        for i in 0..5 {
            assert_eq!(sub.recv().await, Some(i.to_string()));
        }
    }
}
