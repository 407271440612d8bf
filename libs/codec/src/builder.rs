//! # Envelope Builder - Wire Encoding
//!
//! ## Purpose
//! Encodes an [`Envelope`] into the flat JSON wire form, symmetric with the
//! parser: `decode(encode(e))` reproduces `e` on every field, modulo key
//! ordering and the absent/zero-value distinction (absent optionals are
//! omitted entirely, never emitted as `null`).
//!
//! Extension entries are written into the object before the first-class
//! fields, so a first-class field always wins a name collision.

use crate::constants as fields;
use crate::error::{CodecError, CodecResult};
use serde_json::{Map, Value};
use types::{Envelope, RouteHistory};

/// Encode an envelope into its wire bytes.
pub fn encode(envelope: &Envelope) -> CodecResult<Vec<u8>> {
    serde_json::to_vec(&Value::Object(to_wire(envelope)))
        .map_err(|e| CodecError::malformed(format!("serialization failed: {e}")))
}

/// Encode an envelope into its wire string form, as mirrored to observers.
pub fn encode_string(envelope: &Envelope) -> CodecResult<String> {
    serde_json::to_string(&Value::Object(to_wire(envelope)))
        .map_err(|e| CodecError::malformed(format!("serialization failed: {e}")))
}

fn to_wire(envelope: &Envelope) -> Map<String, Value> {
    let mut map = Map::new();

    // Extensions first; first-class fields below overwrite collisions.
    for (key, value) in envelope.extensions() {
        map.insert(key, value);
    }

    map.insert(fields::ID.into(), envelope.id().into());
    map.insert(fields::SOURCE.into(), envelope.source().into());
    map.insert(fields::TYPE.into(), envelope.event_type().into());
    map.insert(fields::SPEC_VERSION.into(), envelope.spec_version().into());

    if let Some(time) = envelope.time() {
        map.insert(fields::TIME.into(), time.to_rfc3339().into());
    }
    if let Some(schema_url) = envelope.schema_url() {
        map.insert(fields::SCHEMA_URL.into(), schema_url.into());
    }
    if let Some(content_type) = envelope.content_type() {
        map.insert(fields::CONTENT_TYPE.into(), content_type.into());
    }
    if let Some(data) = envelope.data() {
        map.insert(fields::DATA.into(), data.clone());
    }
    if let Some(subject) = envelope.subject() {
        map.insert(fields::SUBJECT.into(), subject.into());
    }
    if let Some(correlation_id) = envelope.correlation_id() {
        map.insert(fields::CORRELATION_ID.into(), correlation_id.into());
    }
    if let Some(created_from) = envelope.created_from() {
        map.insert(fields::CREATED_FROM.into(), created_from.into());
    }
    if let Some(route) = envelope.route() {
        let hops = route.into_iter().map(hop_to_wire).collect();
        map.insert(fields::ROUTE.into(), Value::Array(hops));
    }
    if let Some(slip) = envelope.routing_slip() {
        let steps = slip
            .into_iter()
            .map(|step| Value::Array(step.into_iter().map(Value::String).collect()))
            .collect();
        map.insert(fields::ROUTING_SLIP.into(), Value::Array(steps));
    }
    if let Some(is_test_message) = envelope.is_test_message() {
        map.insert(fields::IS_TEST_MESSAGE.into(), is_test_message.into());
    }
    if let Some(topic) = envelope.filter_out_before_topic() {
        map.insert(fields::FILTER_OUT_BEFORE_TOPIC.into(), topic.into());
    }
    if let Some(is_error_message) = envelope.is_error_message() {
        map.insert(fields::IS_ERROR_MESSAGE.into(), is_error_message.into());
    }
    if let Some(error_message) = envelope.error_message() {
        map.insert(fields::ERROR_MESSAGE.into(), error_message.into());
    }
    if let Some(error_trace) = envelope.error_trace() {
        map.insert(fields::ERROR_TRACE.into(), error_trace.into());
    }
    if let Some(expiry_date) = envelope.expiry_date() {
        map.insert(fields::EXPIRY_DATE.into(), expiry_date.to_rfc3339().into());
    }
    if let Some(sequence_id) = envelope.sequence_id() {
        map.insert(fields::SEQUENCE_ID.into(), sequence_id.into());
    }
    if let Some(sequence_number) = envelope.sequence_number() {
        map.insert(fields::SEQUENCE_NUMBER.into(), sequence_number.into());
    }
    if let Some(sequence_size) = envelope.sequence_size() {
        map.insert(fields::SEQUENCE_SIZE.into(), sequence_size.into());
    }
    if let Some(return_topic) = envelope.return_topic() {
        map.insert(fields::RETURN_TOPIC.into(), return_topic.into());
    }
    if let Some(data_ref) = envelope.data_ref() {
        map.insert(fields::DATA_REF.into(), data_ref.into());
    }

    map
}

fn hop_to_wire(hop: RouteHistory) -> Value {
    let mut map = Map::new();
    if let Some(hop_type) = hop.hop_type {
        map.insert(fields::HOP_TYPE.into(), hop_type.into());
    }
    if let Some(id) = hop.id {
        map.insert(fields::HOP_ID.into(), id.into());
    }
    if let Some(timestamp) = hop.timestamp {
        map.insert(fields::HOP_TIMESTAMP.into(), timestamp.to_rfc3339().into());
    }
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::decode;
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use types::RoutingSlip;

    fn full_envelope() -> Envelope {
        let mut envelope = Envelope::new("A1", "svc://orders", "order.created");
        envelope
            .set_time(Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap())
            .set_schema_url("https://schemas.example/order.json")
            .set_content_type("application/json")
            .set_data(json!({"n": 1, "items": ["a", "b"]}))
            .set_subject("order-77")
            .set_correlation_id("req-9")
            .set_created_from("orders.incoming")
            .set_route(vec![RouteHistory::new(
                "topic",
                "orders.incoming",
                Utc.with_ymd_and_hms(2024, 5, 1, 9, 59, 0).unwrap(),
            )])
            .set_routing_slip(RoutingSlip::from(vec![vec!["replies.a".to_string()]]))
            .set_is_test_message(false)
            .set_filter_out_before_topic("audit.orders")
            .set_is_error_message(true)
            .set_error_message("boom")
            .set_error_trace("at orders:12")
            .set_expiry_date(Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 0).unwrap())
            .set_sequence_id("batch-3")
            .set_sequence_number(2)
            .set_sequence_size(10)
            .set_return_topic("replies.orders")
            .set_data_ref("blob://payloads/77");
        envelope.set_extension("traceparent", json!("00-abc-def-01"));
        envelope
    }

    #[test]
    fn round_trip_reproduces_every_field() {
        let envelope = full_envelope();
        let decoded = decode(&encode(&envelope).unwrap()).unwrap().unwrap();
        assert_eq!(decoded, envelope);
    }

    #[test]
    fn round_trip_of_minimal_envelope() {
        let envelope = Envelope::new("A1", "svc://x", "req");
        let decoded = decode(&encode(&envelope).unwrap()).unwrap().unwrap();
        assert_eq!(decoded, envelope);
    }

    #[test]
    fn absent_fields_are_omitted_not_null() {
        let envelope = Envelope::new("A1", "svc://x", "req");
        let wire: Value = serde_json::from_slice(&encode(&envelope).unwrap()).unwrap();
        let object = wire.as_object().unwrap();

        assert_eq!(object.len(), 4);
        assert!(!object.contains_key("istestmessage"));
        assert!(!object.contains_key("data"));
        assert!(!object.values().any(|v| v.is_null()));
    }

    #[test]
    fn extensions_are_flattened_into_the_top_level() {
        let envelope = Envelope::new("A1", "svc://x", "req");
        envelope.set_extension("retrycount", json!(3));

        let wire: Value = serde_json::from_slice(&encode(&envelope).unwrap()).unwrap();
        assert_eq!(wire["retrycount"], json!(3));
        assert!(wire.get("extensions").is_none());
    }

    #[test]
    fn first_class_fields_win_extension_collisions() {
        let envelope = Envelope::new("A1", "svc://x", "req");
        // A hostile or buggy producer could have smuggled a first-class name
        // into the bag; the real field must win on the wire.
        envelope.set_extension("id", json!("forged"));

        let wire: Value = serde_json::from_slice(&encode(&envelope).unwrap()).unwrap();
        assert_eq!(wire["id"], json!("A1"));
    }

    #[test]
    fn present_false_survives_the_round_trip() {
        let mut envelope = Envelope::new("A1", "svc://x", "req");
        envelope.set_is_test_message(false);

        let decoded = decode(&encode(&envelope).unwrap()).unwrap().unwrap();
        assert_eq!(decoded.is_test_message(), Some(false));
    }

    #[test]
    fn encode_string_matches_encoded_bytes() {
        let envelope = full_envelope();
        assert_eq!(
            encode_string(&envelope).unwrap().as_bytes(),
            encode(&envelope).unwrap().as_slice()
        );
    }
}
