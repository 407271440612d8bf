//! Bridge processing metrics for monitoring and the periodic report line.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::SystemTime;

/// Counters for every outcome a delivery can have.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeMetrics {
    /// Envelopes decoded and handed to the correlation engine
    pub envelopes_received: u64,

    /// Replies successfully handed to the transport
    pub replies_published: u64,

    /// Deliveries that decoded to "no message"
    pub empty_deliveries: u64,

    /// Deliveries skipped because the payload failed to decode
    pub malformed_envelopes: u64,

    /// Replies the transport rejected
    pub delivery_failures: u64,

    /// Replies whose request named no return topic
    pub undeliverable_replies: u64,

    /// Observer pushes that failed (processing continued regardless)
    pub notifications_failed: u64,

    /// Service startup timestamp
    pub started_at: SystemTime,
}

impl BridgeMetrics {
    pub fn new() -> Self {
        Self {
            envelopes_received: 0,
            replies_published: 0,
            empty_deliveries: 0,
            malformed_envelopes: 0,
            delivery_failures: 0,
            undeliverable_replies: 0,
            notifications_failed: 0,
            started_at: SystemTime::now(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        SystemTime::now()
            .duration_since(self.started_at)
            .unwrap_or_default()
            .as_secs()
    }

    /// Share of received envelopes whose reply reached the transport.
    pub fn delivery_success_rate(&self) -> f64 {
        if self.envelopes_received == 0 {
            0.0
        } else {
            self.replies_published as f64 / self.envelopes_received as f64
        }
    }
}

impl Default for BridgeMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BridgeMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "BridgeMetrics {{ replies: {}/{} ({}%), malformed: {}, undeliverable: {}, uptime: {}s }}",
            self.replies_published,
            self.envelopes_received,
            (self.delivery_success_rate() * 100.0) as u32,
            self.malformed_envelopes,
            self.undeliverable_replies,
            self.uptime_seconds()
        )
    }
}
