//! # Reply Bridge Service
//!
//! ## Purpose
//! Consumes request envelopes from a pub/sub topic, derives the correlated
//! reply for each one, republishes it to the return topic carried inside
//! the request, and mirrors every correlated pair onto a push channel for
//! live observers.
//!
//! ## Architecture Role
//! ```text
//! Subscription → Listener → CorrelationEngine → Publisher → Broker
//!      ↓             ↓              ↓               ↓
//!   Raw bytes     codec::decode  reply + dest   codec::encode
//!                     ↓
//!                 Notifier → observers (fire-and-forget)
//! ```
//!
//! ## Message Flow
//! 1. The listener pulls a delivery and decodes it; empty deliveries and
//!    malformed payloads are contained right there.
//! 2. The engine shallow-copies the request into a reply, links it with
//!    `correlation_id`, gives it a fresh `id`, and swaps in the reply
//!    payload.
//! 3. The notifier mirrors the pair to observers.
//! 4. The publisher sends the reply to the request's return topic, or the
//!    configured undeliverable policy decides its fate.
//!
//! Per-shard ordering is preserved throughout: a shard's deliveries are
//! processed one at a time, in arrival order.

pub mod correlate;
pub mod listener;
pub mod metrics;
pub mod notify;
pub mod publish;
pub mod transport;

pub use correlate::{CorrelatedReply, CorrelationEngine, MarkerPayload, ReplyPayload};
pub use listener::Listener;
pub use metrics::BridgeMetrics;
pub use notify::{ChannelSink, CorrelationUpdate, NoopSink, NotificationSink, Notifier};
pub use publish::{PublishError, Publisher};
pub use transport::{
    Delivery, MemoryBroker, MemoryProducer, MemorySubscription, Producer, ShardId, Subscription,
    TransportError,
};
