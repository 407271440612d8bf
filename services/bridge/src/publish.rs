//! # Publisher - Outbound Envelope Delivery
//!
//! Serializes an envelope with the wire codec and hands the bytes to the
//! injected transport producer. Failures are reported to the caller, never
//! retried here - retry policy belongs to the transport collaborator.

use crate::transport::{Producer, TransportError};
use bytes::Bytes;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;
use types::Envelope;

/// Why a publish did not reach the transport.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("failed to encode envelope: {0}")]
    Encode(#[from] codec::CodecError),

    #[error("delivery failed: {0}")]
    Transport(#[from] TransportError),
}

/// Sends envelopes to named destinations through the broker client.
#[derive(Clone)]
pub struct Publisher {
    producer: Arc<dyn Producer>,
    default_topic: String,
}

impl Publisher {
    pub fn new(producer: Arc<dyn Producer>, default_topic: impl Into<String>) -> Self {
        Self {
            producer,
            default_topic: default_topic.into(),
        }
    }

    /// Publish to an explicit destination.
    pub async fn publish(
        &self,
        envelope: &Envelope,
        destination: &str,
    ) -> Result<(), PublishError> {
        let payload = codec::encode(envelope)?;
        debug!(
            destination,
            envelope_id = envelope.id(),
            bytes = payload.len(),
            "publishing envelope"
        );
        self.producer.send(destination, Bytes::from(payload)).await?;
        Ok(())
    }

    /// Publish to the statically configured default destination.
    pub async fn publish_default(&self, envelope: &Envelope) -> Result<(), PublishError> {
        let destination = self.default_topic.clone();
        self.publish(envelope, &destination).await
    }
}
