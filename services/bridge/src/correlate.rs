//! # Correlation Engine - Request/Reply Transform
//!
//! ## Purpose
//! The one transform applied to every inbound envelope: derive the reply
//! that answers it and name the destination it must be published to.
//!
//! ## Algorithm
//! Given an inbound envelope `request`:
//! 1. Capture `request.return_topic` as the destination (`None` when the
//!    request named none - the listener applies the undeliverable policy).
//! 2. Shallow-copy the request, so extension and routing metadata carry
//!    over to the reply.
//! 3. Set `correlation_id` to the request's `id`.
//! 4. Regenerate `id`, giving request and reply distinct identities.
//! 5. Replace `data` with the reply payload - replaced, never merged.
//!
//! The transform is pure, synchronous, and single-pass: no retries, no
//! branching beyond the presence check on the return topic. Publishing and
//! observer mirroring are the listener's job.
//!
//! Payload generation is a pluggable capability behind [`ReplyPayload`];
//! the default [`MarkerPayload`] stamps a fixed marker object.

use serde_json::{json, Value};
use std::fmt;
use std::sync::Arc;
use types::Envelope;

/// Produces the business payload carried by a reply.
pub trait ReplyPayload: Send + Sync {
    fn produce(&self, request: &Envelope) -> Value;
}

/// Fixed marker payload: `{"service": "processed"}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkerPayload;

impl ReplyPayload for MarkerPayload {
    fn produce(&self, _request: &Envelope) -> Value {
        json!({"service": "processed"})
    }
}

/// A correlated reply and where it must go. `destination` is `None` when
/// the request named no return topic - an undeliverable reply the caller
/// must handle per its configured policy, never silently swallowed.
#[derive(Debug)]
pub struct CorrelatedReply {
    pub reply: Envelope,
    pub destination: Option<String>,
}

/// The request/reply transform, applied once per inbound envelope.
#[derive(Clone)]
pub struct CorrelationEngine {
    payload: Arc<dyn ReplyPayload>,
}

impl CorrelationEngine {
    /// Engine with the default marker payload.
    pub fn new() -> Self {
        Self::with_payload(MarkerPayload)
    }

    /// Engine with a custom reply payload generator.
    pub fn with_payload(payload: impl ReplyPayload + 'static) -> Self {
        Self {
            payload: Arc::new(payload),
        }
    }

    /// Derive the reply to `request` and the destination it belongs on.
    pub fn correlate(&self, request: &Envelope) -> CorrelatedReply {
        let destination = request.return_topic().map(str::to_owned);

        let mut reply = request.clone();
        reply.set_correlation_id(request.id());
        reply.regenerate_id();
        reply.set_data(self.payload.produce(request));

        CorrelatedReply { reply, destination }
    }
}

impl Default for CorrelationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CorrelationEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CorrelationEngine").finish_non_exhaustive()
    }
}
