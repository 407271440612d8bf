//! Route bookkeeping carried inside an envelope.
//!
//! `RouteHistory` records hops an envelope has already taken; the routing
//! slip (a queue of steps, each step a set of alternative destinations) is
//! consumed from the front as the envelope moves through the system.

use chrono::{DateTime, Utc};
use std::collections::VecDeque;

/// One hop in an envelope's route trace.
///
/// All fields are optional at the type level, but a hop appended by the
/// bridge always carries all three.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteHistory {
    /// Kind of hop, e.g. "topic" or "service"
    pub hop_type: Option<String>,
    /// Identifier of the station the envelope passed through
    pub id: Option<String>,
    /// When the hop was recorded
    pub timestamp: Option<DateTime<Utc>>,
}

impl RouteHistory {
    /// Create a fully populated hop record.
    pub fn new(
        hop_type: impl Into<String>,
        id: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            hop_type: Some(hop_type.into()),
            id: Some(id.into()),
            timestamp: Some(timestamp),
        }
    }
}

/// Remaining routing steps for an envelope, consumed front-first.
/// Each step is a set of alternative next destinations.
pub type RoutingSlip = VecDeque<Vec<String>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hop_records_are_fully_populated() {
        let now = Utc::now();
        let hop = RouteHistory::new("topic", "orders.incoming", now);

        assert_eq!(hop.hop_type.as_deref(), Some("topic"));
        assert_eq!(hop.id.as_deref(), Some("orders.incoming"));
        assert_eq!(hop.timestamp, Some(now));
    }
}
