//! # Notification Sink - Observer Push Channel
//!
//! After each correlation the listener mirrors the inbound and outbound
//! envelope, in wire-string form, onto a push channel for live observers.
//! The channel is fire-and-forget: a failed push is logged and counted but
//! never aborts message processing.

use async_trait::async_trait;
use codec::encode_string;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::warn;
use types::Envelope;

/// The two-field message observers receive after each correlation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrelationUpdate {
    /// Wire-string form of the inbound envelope
    pub incoming: String,
    /// Wire-string form of the outbound envelope
    pub outgoing: String,
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification channel closed")]
    Closed,
}

/// A destination for correlation updates.
#[async_trait]
pub trait NotificationSink: Send + Sync + Debug {
    async fn push(&self, update: CorrelationUpdate) -> Result<(), NotifyError>;
}

/// Channel-backed sink: observers hold the receiving end.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: mpsc::UnboundedSender<CorrelationUpdate>,
}

impl ChannelSink {
    /// Create a sink and the receiving end observers read from.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<CorrelationUpdate>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl NotificationSink for ChannelSink {
    async fn push(&self, update: CorrelationUpdate) -> Result<(), NotifyError> {
        self.sender.send(update).map_err(|_| NotifyError::Closed)
    }
}

/// Sink for deployments without observers.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

#[async_trait]
impl NotificationSink for NoopSink {
    async fn push(&self, _update: CorrelationUpdate) -> Result<(), NotifyError> {
        Ok(())
    }
}

/// Wraps a sink with the fire-and-forget contract.
#[derive(Debug, Clone)]
pub struct Notifier {
    channel: String,
    sink: Arc<dyn NotificationSink>,
}

impl Notifier {
    pub fn new(channel: impl Into<String>, sink: Arc<dyn NotificationSink>) -> Self {
        Self {
            channel: channel.into(),
            sink,
        }
    }

    /// Mirror a correlated pair to observers. Returns whether the push
    /// succeeded so the caller can count failures; it never propagates one.
    pub async fn notify(&self, incoming: &Envelope, outgoing: &Envelope) -> bool {
        let update = match (encode_string(incoming), encode_string(outgoing)) {
            (Ok(incoming), Ok(outgoing)) => CorrelationUpdate { incoming, outgoing },
            (Err(e), _) | (_, Err(e)) => {
                warn!(channel = %self.channel, error = %e, "could not render notification");
                return false;
            }
        };

        if let Err(e) = self.sink.push(update).await {
            warn!(channel = %self.channel, error = %e, "notification push failed");
            return false;
        }
        true
    }
}
