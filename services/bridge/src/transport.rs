//! # Transport Seam - Broker Client Abstraction
//!
//! ## Purpose
//! The broker connection (consumer-group membership, producer sessions) is
//! long-lived, externally owned infrastructure. This module defines the two
//! handles the bridge borrows from it: a [`Subscription`] the listener pulls
//! deliveries from, and a [`Producer`] the publisher sends through. Both are
//! injected at construction; reconnects, backoff, and send timeouts are the
//! transport's own concern.
//!
//! ## Ordering Model
//! Every delivery is tagged with the shard it was read from. The listener
//! guarantees per-shard processing order; the transport guarantees that a
//! shard's deliveries arrive in order.
//!
//! [`MemoryBroker`] is the in-process implementation used by tests and the
//! local demo wiring.

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;

/// Ordered subdivision of a topic. Deliveries from one shard are processed
/// strictly in order.
pub type ShardId = u32;

/// One raw message pulled from the subscription.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub shard: ShardId,
    pub payload: Bytes,
}

/// Transport-level failures.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TransportError {
    #[error("subscription closed")]
    Closed,

    #[error("send to '{topic}' rejected: {reason}")]
    Rejected { topic: String, reason: String },
}

/// Pull side of the broker client.
#[async_trait]
pub trait Subscription: Send {
    /// Pull the next delivery. `Ok(None)` means the subscription has ended
    /// and no further deliveries will arrive.
    async fn pull(&mut self) -> Result<Option<Delivery>, TransportError>;
}

/// Push side of the broker client. Shared between workers; implementations
/// must be safe for concurrent sends.
#[async_trait]
pub trait Producer: Send + Sync {
    async fn send(&self, topic: &str, payload: Bytes) -> Result<(), TransportError>;
}

/// In-process broker: a topic table of unbounded channels.
///
/// Topics exist once subscribed to; sending to a topic nobody subscribed to
/// is rejected, which doubles as the delivery-failure path in tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryBroker {
    topics: Arc<DashMap<String, mpsc::UnboundedSender<Delivery>>>,
}

impl MemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscription for `topic`, replacing any previous one.
    pub fn subscribe(&self, topic: impl Into<String>) -> MemorySubscription {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.topics.insert(topic.into(), sender);
        MemorySubscription { receiver }
    }

    /// Producer handle over this broker's topic table.
    pub fn producer(&self) -> MemoryProducer {
        MemoryProducer {
            topics: Arc::clone(&self.topics),
        }
    }

    /// Inject a delivery on a specific shard, as the broker side would.
    pub fn publish(
        &self,
        topic: &str,
        shard: ShardId,
        payload: Bytes,
    ) -> Result<(), TransportError> {
        let sender = self
            .topics
            .get(topic)
            .ok_or_else(|| TransportError::Rejected {
                topic: topic.to_string(),
                reason: "no such topic".to_string(),
            })?;
        sender
            .send(Delivery { shard, payload })
            .map_err(|_| TransportError::Rejected {
                topic: topic.to_string(),
                reason: "subscriber gone".to_string(),
            })
    }

    /// End a topic's subscription; its consumer drains and then sees
    /// `Ok(None)`.
    pub fn close(&self, topic: &str) {
        self.topics.remove(topic);
    }
}

/// Receiving end of a [`MemoryBroker`] topic.
#[derive(Debug)]
pub struct MemorySubscription {
    receiver: mpsc::UnboundedReceiver<Delivery>,
}

#[async_trait]
impl Subscription for MemorySubscription {
    async fn pull(&mut self) -> Result<Option<Delivery>, TransportError> {
        Ok(self.receiver.recv().await)
    }
}

/// Sending end over a [`MemoryBroker`] topic table. All sends land on shard
/// 0; shard fan-out is the broker's job, not the producer's.
#[derive(Debug, Clone)]
pub struct MemoryProducer {
    topics: Arc<DashMap<String, mpsc::UnboundedSender<Delivery>>>,
}

#[async_trait]
impl Producer for MemoryProducer {
    async fn send(&self, topic: &str, payload: Bytes) -> Result<(), TransportError> {
        let sender = self
            .topics
            .get(topic)
            .ok_or_else(|| TransportError::Rejected {
                topic: topic.to_string(),
                reason: "no such topic".to_string(),
            })?;
        sender
            .send(Delivery { shard: 0, payload })
            .map_err(|_| TransportError::Rejected {
                topic: topic.to_string(),
                reason: "subscriber gone".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_reaches_subscriber_in_order() {
        let broker = MemoryBroker::new();
        let mut subscription = broker.subscribe("orders");

        broker.publish("orders", 3, Bytes::from_static(b"one")).unwrap();
        broker.publish("orders", 3, Bytes::from_static(b"two")).unwrap();

        let first = subscription.pull().await.unwrap().unwrap();
        assert_eq!(first.shard, 3);
        assert_eq!(first.payload, Bytes::from_static(b"one"));
        let second = subscription.pull().await.unwrap().unwrap();
        assert_eq!(second.payload, Bytes::from_static(b"two"));
    }

    #[tokio::test]
    async fn send_to_unknown_topic_is_rejected() {
        let broker = MemoryBroker::new();
        let producer = broker.producer();

        let err = producer
            .send("nowhere", Bytes::from_static(b"x"))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Rejected { .. }));
    }

    #[tokio::test]
    async fn closed_topic_ends_the_subscription() {
        let broker = MemoryBroker::new();
        let mut subscription = broker.subscribe("orders");
        broker.publish("orders", 0, Bytes::from_static(b"last")).unwrap();
        broker.close("orders");

        // Buffered delivery drains first, then the end-of-subscription marker
        assert!(subscription.pull().await.unwrap().is_some());
        assert!(subscription.pull().await.unwrap().is_none());
    }
}
