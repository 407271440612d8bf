//! # Envelope - Structured Event Record
//!
//! ## Purpose
//! The central entity exchanged over the messaging system: a structured event
//! with four mandatory identity fields, a set of optional metadata fields
//! where absence is semantically distinct from any zero value, and an
//! open-ended extension bag for protocol extensions that are not modeled as
//! first-class fields.
//!
//! ## Copy Semantics
//! `Clone` is the copy constructor for derived envelopes: scalar fields are
//! copied, while the container fields (`extensions`, `route`, `routing_slip`)
//! stay shared with the source until explicitly replaced. Mutating a shared
//! container through one copy is observable through the other; replacing it
//! with [`Envelope::replace_extensions`] / [`Envelope::set_route`] /
//! [`Envelope::set_routing_slip`] detaches the copy.
//!
//! ## Lifecycle
//! An envelope is constructed either by decoding inbound bytes (see the
//! `codec` crate) or by cloning an existing envelope and rewriting fields.
//! Once handed to a publisher it is never mutated again.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::route::{RouteHistory, RoutingSlip};

/// Protocol version tag stamped on every envelope this service creates.
pub const SPEC_VERSION: &str = "0.2";

/// Extension bag: unrecognized top-level wire keys, preserved verbatim.
pub type ExtensionMap = HashMap<String, Value>;

type Shared<T> = Arc<RwLock<T>>;

fn shared<T>(value: T) -> Shared<T> {
    Arc::new(RwLock::new(value))
}

fn shared_eq<T: PartialEq>(a: &Shared<T>, b: &Shared<T>) -> bool {
    Arc::ptr_eq(a, b) || *a.read() == *b.read()
}

fn opt_shared_eq<T: PartialEq>(a: &Option<Shared<T>>, b: &Option<Shared<T>>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => shared_eq(a, b),
        _ => false,
    }
}

/// One structured event in flight.
#[derive(Debug, Clone)]
pub struct Envelope {
    // Mandatory identity fields
    id: String,
    source: String,
    event_type: String,
    spec_version: String,

    // Standard optional metadata
    time: Option<DateTime<Utc>>,
    schema_url: Option<String>,
    content_type: Option<String>,
    data: Option<Value>,
    subject: Option<String>,

    // Shared with clones until explicitly replaced
    extensions: Shared<ExtensionMap>,
    route: Option<Shared<Vec<RouteHistory>>>,
    routing_slip: Option<Shared<RoutingSlip>>,

    // Correlation and routing metadata
    correlation_id: Option<String>,
    created_from: Option<String>,
    is_test_message: Option<bool>,
    is_error_message: Option<bool>,
    filter_out_before_topic: Option<String>,
    error_message: Option<String>,
    error_trace: Option<String>,
    expiry_date: Option<DateTime<Utc>>,
    sequence_id: Option<String>,
    sequence_number: Option<i32>,
    sequence_size: Option<i32>,
    return_topic: Option<String>,
    data_ref: Option<String>,
}

impl Envelope {
    /// Create an envelope with the mandatory fields set and everything else
    /// absent. The spec version defaults to [`SPEC_VERSION`].
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        event_type: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            event_type: event_type.into(),
            spec_version: SPEC_VERSION.to_string(),
            time: None,
            schema_url: None,
            content_type: None,
            data: None,
            subject: None,
            extensions: shared(ExtensionMap::new()),
            route: None,
            routing_slip: None,
            correlation_id: None,
            created_from: None,
            is_test_message: None,
            is_error_message: None,
            filter_out_before_topic: None,
            error_message: None,
            error_trace: None,
            expiry_date: None,
            sequence_id: None,
            sequence_number: None,
            sequence_size: None,
            return_topic: None,
            data_ref: None,
        }
    }

    // --- mandatory fields ---

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn set_id(&mut self, id: impl Into<String>) -> &mut Self {
        self.id = id.into();
        self
    }

    /// Assign a freshly generated, globally unique identifier, replacing any
    /// previous value.
    pub fn regenerate_id(&mut self) -> &mut Self {
        self.id = Uuid::new_v4().to_string();
        self
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn set_source(&mut self, source: impl Into<String>) -> &mut Self {
        self.source = source.into();
        self
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn set_event_type(&mut self, event_type: impl Into<String>) -> &mut Self {
        self.event_type = event_type.into();
        self
    }

    pub fn spec_version(&self) -> &str {
        &self.spec_version
    }

    pub fn set_spec_version(&mut self, spec_version: impl Into<String>) -> &mut Self {
        self.spec_version = spec_version.into();
        self
    }

    // --- standard optional metadata ---

    pub fn time(&self) -> Option<DateTime<Utc>> {
        self.time
    }

    pub fn set_time(&mut self, time: DateTime<Utc>) -> &mut Self {
        self.time = Some(time);
        self
    }

    pub fn schema_url(&self) -> Option<&str> {
        self.schema_url.as_deref()
    }

    pub fn set_schema_url(&mut self, schema_url: impl Into<String>) -> &mut Self {
        self.schema_url = Some(schema_url.into());
        self
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn set_content_type(&mut self, content_type: impl Into<String>) -> &mut Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    /// Replace the payload. The previous payload, if any, is discarded.
    pub fn set_data(&mut self, data: Value) -> &mut Self {
        self.data = Some(data);
        self
    }

    pub fn clear_data(&mut self) -> &mut Self {
        self.data = None;
        self
    }

    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    pub fn set_subject(&mut self, subject: impl Into<String>) -> &mut Self {
        self.subject = Some(subject.into());
        self
    }

    // --- extension bag ---

    /// Snapshot of the extension bag. Mutations made through a sharing clone
    /// after this call are not reflected in the returned map.
    pub fn extensions(&self) -> ExtensionMap {
        self.extensions.read().clone()
    }

    /// Insert a single extension entry. Visible through every clone that
    /// still shares this envelope's extension bag.
    pub fn set_extension(&self, key: impl Into<String>, value: Value) -> &Self {
        self.extensions.write().insert(key.into(), value);
        self
    }

    /// Replace the extension bag wholesale, detaching it from any clones
    /// that shared the previous one.
    pub fn replace_extensions(&mut self, extensions: ExtensionMap) -> &mut Self {
        self.extensions = shared(extensions);
        self
    }

    // --- route trace ---

    pub fn route(&self) -> Option<Vec<RouteHistory>> {
        self.route.as_ref().map(|r| r.read().clone())
    }

    pub fn set_route(&mut self, route: Vec<RouteHistory>) -> &mut Self {
        self.route = Some(shared(route));
        self
    }

    /// Append one hop to the route trace, creating the trace when absent.
    /// Appends are visible through clones sharing the trace.
    pub fn append_route_hop(&mut self, hop: RouteHistory) -> &mut Self {
        match &self.route {
            Some(route) => route.write().push(hop),
            None => self.route = Some(shared(vec![hop])),
        }
        self
    }

    // --- routing slip ---

    pub fn routing_slip(&self) -> Option<RoutingSlip> {
        self.routing_slip.as_ref().map(|s| s.read().clone())
    }

    pub fn set_routing_slip(&mut self, slip: RoutingSlip) -> &mut Self {
        self.routing_slip = Some(shared(slip));
        self
    }

    /// Consume the next routing step from the front of the slip.
    /// Returns `None` when the slip is absent or exhausted.
    pub fn pop_routing_step(&mut self) -> Option<Vec<String>> {
        self.routing_slip.as_ref()?.write().pop_front()
    }

    // --- correlation and routing metadata ---

    pub fn correlation_id(&self) -> Option<&str> {
        self.correlation_id.as_deref()
    }

    pub fn set_correlation_id(&mut self, correlation_id: impl Into<String>) -> &mut Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }

    pub fn created_from(&self) -> Option<&str> {
        self.created_from.as_deref()
    }

    pub fn set_created_from(&mut self, created_from: impl Into<String>) -> &mut Self {
        self.created_from = Some(created_from.into());
        self
    }

    pub fn is_test_message(&self) -> Option<bool> {
        self.is_test_message
    }

    pub fn set_is_test_message(&mut self, is_test_message: bool) -> &mut Self {
        self.is_test_message = Some(is_test_message);
        self
    }

    pub fn is_error_message(&self) -> Option<bool> {
        self.is_error_message
    }

    pub fn set_is_error_message(&mut self, is_error_message: bool) -> &mut Self {
        self.is_error_message = Some(is_error_message);
        self
    }

    pub fn filter_out_before_topic(&self) -> Option<&str> {
        self.filter_out_before_topic.as_deref()
    }

    pub fn set_filter_out_before_topic(&mut self, topic: impl Into<String>) -> &mut Self {
        self.filter_out_before_topic = Some(topic.into());
        self
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn set_error_message(&mut self, error_message: impl Into<String>) -> &mut Self {
        self.error_message = Some(error_message.into());
        self
    }

    pub fn error_trace(&self) -> Option<&str> {
        self.error_trace.as_deref()
    }

    pub fn set_error_trace(&mut self, error_trace: impl Into<String>) -> &mut Self {
        self.error_trace = Some(error_trace.into());
        self
    }

    pub fn expiry_date(&self) -> Option<DateTime<Utc>> {
        self.expiry_date
    }

    pub fn set_expiry_date(&mut self, expiry_date: DateTime<Utc>) -> &mut Self {
        self.expiry_date = Some(expiry_date);
        self
    }

    /// True when an expiry date is set and lies before `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiry_date.map(|expiry| expiry < now).unwrap_or(false)
    }

    pub fn sequence_id(&self) -> Option<&str> {
        self.sequence_id.as_deref()
    }

    pub fn set_sequence_id(&mut self, sequence_id: impl Into<String>) -> &mut Self {
        self.sequence_id = Some(sequence_id.into());
        self
    }

    pub fn sequence_number(&self) -> Option<i32> {
        self.sequence_number
    }

    pub fn set_sequence_number(&mut self, sequence_number: i32) -> &mut Self {
        self.sequence_number = Some(sequence_number);
        self
    }

    pub fn sequence_size(&self) -> Option<i32> {
        self.sequence_size
    }

    pub fn set_sequence_size(&mut self, sequence_size: i32) -> &mut Self {
        self.sequence_size = Some(sequence_size);
        self
    }

    pub fn return_topic(&self) -> Option<&str> {
        self.return_topic.as_deref()
    }

    pub fn set_return_topic(&mut self, return_topic: impl Into<String>) -> &mut Self {
        self.return_topic = Some(return_topic.into());
        self
    }

    pub fn data_ref(&self) -> Option<&str> {
        self.data_ref.as_deref()
    }

    pub fn set_data_ref(&mut self, data_ref: impl Into<String>) -> &mut Self {
        self.data_ref = Some(data_ref.into());
        self
    }

    /// Overlay the mandatory and common fields of `other` onto this
    /// envelope: `id`, `spec_version`, `source`, `type`, `data`,
    /// `content_type`, `schema_url`, `time`, and the extension bag (shared
    /// by reference, not copied). Used when a derived envelope should
    /// inherit the instigating event's identity fields.
    pub fn set_base_event(&mut self, other: &Envelope) -> &mut Self {
        self.id = other.id.clone();
        self.spec_version = other.spec_version.clone();
        self.source = other.source.clone();
        self.event_type = other.event_type.clone();
        self.data = other.data.clone();
        self.content_type = other.content_type.clone();
        self.schema_url = other.schema_url.clone();
        self.extensions = Arc::clone(&other.extensions);
        self.time = other.time;
        self
    }
}

impl PartialEq for Envelope {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.source == other.source
            && self.event_type == other.event_type
            && self.spec_version == other.spec_version
            && self.time == other.time
            && self.schema_url == other.schema_url
            && self.content_type == other.content_type
            && self.data == other.data
            && self.subject == other.subject
            && self.correlation_id == other.correlation_id
            && self.created_from == other.created_from
            && self.is_test_message == other.is_test_message
            && self.is_error_message == other.is_error_message
            && self.filter_out_before_topic == other.filter_out_before_topic
            && self.error_message == other.error_message
            && self.error_trace == other.error_trace
            && self.expiry_date == other.expiry_date
            && self.sequence_id == other.sequence_id
            && self.sequence_number == other.sequence_number
            && self.sequence_size == other.sequence_size
            && self.return_topic == other.return_topic
            && self.data_ref == other.data_ref
            && shared_eq(&self.extensions, &other.extensions)
            && opt_shared_eq(&self.route, &other.route)
            && opt_shared_eq(&self.routing_slip, &other.routing_slip)
    }
}
