//! Redis pub/sub-backed message bus.
//!
//! Note: Redis pub/sub is not durable. A message published while the worker
//! is disconnected is dropped by Redis, and the matching cache entry stays
//! pending. That is the delivery contract of the pipeline, not a gap this
//! adapter tries to close.

use redis::AsyncCommands;
use redis::aio::MultiplexedConnection;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tracing::{debug, instrument, warn};

use fibcalc_events::{BusError, MessageBus, Subscription};

/// Redis pub/sub bus for plain-text job messages.
///
/// Publishing goes through a shared multiplexed connection. Each
/// subscription gets its own dedicated connection, since a connection in
/// subscribe mode cannot issue other commands.
#[derive(Clone)]
pub struct RedisPubSubBus {
    client: redis::Client,
    publisher: MultiplexedConnection,
}

impl std::fmt::Debug for RedisPubSubBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisPubSubBus").finish_non_exhaustive()
    }
}

impl RedisPubSubBus {
    pub async fn connect(redis_url: impl AsRef<str>) -> Result<Self, BusError> {
        let client = redis::Client::open(redis_url.as_ref())
            .map_err(|e| BusError::Transport(e.to_string()))?;
        let publisher = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| BusError::Transport(e.to_string()))?;

        Ok(Self { client, publisher })
    }
}

#[async_trait::async_trait]
impl MessageBus for RedisPubSubBus {
    #[instrument(skip(self), err)]
    async fn publish(&self, channel: &str, message: String) -> Result<(), BusError> {
        let mut conn = self.publisher.clone();
        let receivers: i64 = conn
            .publish(channel, message)
            .await
            .map_err(|e| BusError::Transport(format!("PUBLISH failed: {e}")))?;

        if receivers == 0 {
            debug!(channel, "published with no subscribers; message dropped");
        }
        Ok(())
    }

    async fn subscribe(&self, channel: &str) -> Result<Subscription, BusError> {
        let mut pubsub = self
            .client
            .get_async_pubsub()
            .await
            .map_err(|e| BusError::Transport(e.to_string()))?;
        pubsub
            .subscribe(channel)
            .await
            .map_err(|e| BusError::Transport(format!("SUBSCRIBE failed: {e}")))?;

        let (tx, rx) = mpsc::unbounded_channel();
        let channel_name = channel.to_string();

        // Forwarding task: pub/sub connection -> subscription inbox. Ends when
        // the connection drops or the subscription is dropped.
        tokio::spawn(async move {
            let mut messages = pubsub.into_on_message();
            while let Some(msg) = messages.next().await {
                let payload: String = match msg.get_payload() {
                    Ok(p) => p,
                    Err(e) => {
                        warn!(channel = %channel_name, error = %e, "dropping non-text payload");
                        continue;
                    }
                };

                if tx.send(payload).is_err() {
                    return;
                }
            }
            warn!(channel = %channel_name, "redis subscription connection closed");
        });

        Ok(Subscription::new(channel, rx))
    }
}
