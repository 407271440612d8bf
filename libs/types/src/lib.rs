//! # Reply Bridge Types Library
//!
//! The envelope data model shared by every bridge component.
//!
//! ## Design Philosophy
//!
//! - **Presence-aware optionals**: every optional attribute is an `Option`,
//!   so an absent field is distinguishable from any legal value (absent
//!   `is_test_message` is not `false`)
//! - **Shallow-copy derivation**: `Clone` copies scalars and shares the
//!   container fields, matching how derived envelopes inherit their
//!   request's extension bag and route trace
//! - **No wire knowledge**: serialization rules live in the `codec` crate;
//!   this crate only models the entity
//!
//! ## Quick Start
//!
//! ```rust
//! use types::Envelope;
//! use serde_json::json;
//!
//! let mut request = Envelope::new("A1", "svc://orders", "order.created");
//! request.set_return_topic("replies.orders").set_data(json!({"n": 1}));
//!
//! let mut reply = request.clone();
//! reply.set_correlation_id(request.id().to_string());
//! reply.regenerate_id();
//! assert_ne!(reply.id(), request.id());
//! ```

pub mod envelope;
pub mod route;

pub use envelope::{Envelope, ExtensionMap, SPEC_VERSION};
pub use route::{RouteHistory, RoutingSlip};
