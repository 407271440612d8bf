//! # Reply Bridge Codec - Envelope Wire Rules
//!
//! ## Purpose
//!
//! This crate contains the "rules" layer of the bridge: the symmetric
//! encoding/decoding contract between [`types::Envelope`] and its flat JSON
//! wire form.
//!
//! ## Integration Points
//!
//! - **Parsing**: [`decode`] turns raw subscription payloads into envelopes
//! - **Construction**: [`encode`] / [`encode_string`] produce the bytes the
//!   publisher hands to the transport and the string form mirrored to
//!   observers
//! - **Field registry**: [`constants`] is the single list of wire names
//!   shared by both directions
//!
//! ## Architecture Role
//!
//! ```text
//! libs/types → [codec] → services/bridge
//!     ↑           ↓            ↓
//! Pure Data   Wire Rules   Listener/Publisher
//! Envelope    JSON shape   Transport I/O
//! ```
//!
//! ## What This Crate Does NOT Contain
//! - Transport logic (belongs in the bridge service's transport seam)
//! - Envelope semantics such as correlation (belongs in the bridge service)

pub mod builder;
pub mod constants;
pub mod error;
pub mod parser;

pub use builder::{encode, encode_string};
pub use error::{CodecError, CodecResult};
pub use parser::decode;
