//! # Envelope Parser - Wire Decoding
//!
//! ## Purpose
//! Decodes a raw payload pulled from the subscription into an [`Envelope`].
//! The wire form is a flat JSON object: first-class fields under their
//! all-lowercase names, protocol extensions flattened into the same object.
//!
//! ## Decoding Rules
//! - Empty input decodes to "no message" (`Ok(None)`), never an error; the
//!   consuming side must treat it as a no-op.
//! - Keys are lower-cased before matching, for interoperability with
//!   producers that capitalize differently.
//! - JSON `null` counts as absent. A missing or null mandatory field
//!   (`id`, `source`, `type`, `specversion`) fails the decode.
//! - Any unrecognized top-level key is collected into the envelope's
//!   extension bag rather than failing the decode.
//! - No cross-field validation: a `returntopic` naming an unreachable
//!   destination still decodes; delivery concerns live downstream.
//!
//! Decoding is pure and side-effect-free.

use crate::constants as fields;
use crate::error::{CodecError, CodecResult};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use types::{Envelope, RouteHistory, RoutingSlip};

/// Decode a raw subscription payload into an envelope.
///
/// Returns `Ok(None)` for empty input ("no message"), `Ok(Some(_))` for a
/// well-formed envelope, and [`CodecError`] for anything structurally
/// invalid or missing a mandatory field.
pub fn decode(bytes: &[u8]) -> CodecResult<Option<Envelope>> {
    if bytes.is_empty() {
        return Ok(None);
    }

    let value: Value = serde_json::from_slice(bytes)
        .map_err(|e| CodecError::malformed(format!("invalid JSON: {e}")))?;
    let raw = match value {
        Value::Object(raw) => raw,
        other => {
            return Err(CodecError::malformed(format!(
                "top-level value must be an object, got {}",
                kind(&other)
            )))
        }
    };

    // Case-normalize keys. If two keys collide after normalization one
    // occurrence wins deterministically; producers must not emit both.
    let mut map = Map::new();
    for (key, value) in raw {
        map.entry(key.to_ascii_lowercase()).or_insert(value);
    }

    let mut envelope = Envelope::new(
        require_string(&mut map, fields::ID)?,
        require_string(&mut map, fields::SOURCE)?,
        require_string(&mut map, fields::TYPE)?,
    );
    envelope.set_spec_version(require_string(&mut map, fields::SPEC_VERSION)?);

    if let Some(time) = take_timestamp(&mut map, fields::TIME)? {
        envelope.set_time(time);
    }
    if let Some(schema_url) = take_string(&mut map, fields::SCHEMA_URL)? {
        envelope.set_schema_url(schema_url);
    }
    if let Some(content_type) = take_string(&mut map, fields::CONTENT_TYPE)? {
        envelope.set_content_type(content_type);
    }
    if let Some(data) = take_data(&mut map) {
        envelope.set_data(data);
    }
    if let Some(subject) = take_string(&mut map, fields::SUBJECT)? {
        envelope.set_subject(subject);
    }
    if let Some(correlation_id) = take_string(&mut map, fields::CORRELATION_ID)? {
        envelope.set_correlation_id(correlation_id);
    }
    if let Some(created_from) = take_string(&mut map, fields::CREATED_FROM)? {
        envelope.set_created_from(created_from);
    }
    if let Some(route) = take_route(&mut map)? {
        envelope.set_route(route);
    }
    if let Some(slip) = take_routing_slip(&mut map)? {
        envelope.set_routing_slip(slip);
    }
    if let Some(is_test) = take_bool(&mut map, fields::IS_TEST_MESSAGE)? {
        envelope.set_is_test_message(is_test);
    }
    if let Some(topic) = take_string(&mut map, fields::FILTER_OUT_BEFORE_TOPIC)? {
        envelope.set_filter_out_before_topic(topic);
    }
    if let Some(is_error) = take_bool(&mut map, fields::IS_ERROR_MESSAGE)? {
        envelope.set_is_error_message(is_error);
    }
    if let Some(error_message) = take_string(&mut map, fields::ERROR_MESSAGE)? {
        envelope.set_error_message(error_message);
    }
    if let Some(error_trace) = take_string(&mut map, fields::ERROR_TRACE)? {
        envelope.set_error_trace(error_trace);
    }
    if let Some(expiry_date) = take_timestamp(&mut map, fields::EXPIRY_DATE)? {
        envelope.set_expiry_date(expiry_date);
    }
    if let Some(sequence_id) = take_string(&mut map, fields::SEQUENCE_ID)? {
        envelope.set_sequence_id(sequence_id);
    }
    if let Some(sequence_number) = take_i32(&mut map, fields::SEQUENCE_NUMBER)? {
        envelope.set_sequence_number(sequence_number);
    }
    if let Some(sequence_size) = take_i32(&mut map, fields::SEQUENCE_SIZE)? {
        envelope.set_sequence_size(sequence_size);
    }
    if let Some(return_topic) = take_string(&mut map, fields::RETURN_TOPIC)? {
        envelope.set_return_topic(return_topic);
    }
    if let Some(data_ref) = take_string(&mut map, fields::DATA_REF)? {
        envelope.set_data_ref(data_ref);
    }

    // Everything left over is a protocol extension. First-class fields were
    // removed above, so they always win a name collision.
    for (key, value) in map {
        envelope.set_extension(key, value);
    }

    Ok(Some(envelope))
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn take_string(map: &mut Map<String, Value>, field: &'static str) -> CodecResult<Option<String>> {
    match map.remove(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(other) => Err(CodecError::wrong_type(field, "a string", &other)),
    }
}

fn require_string(map: &mut Map<String, Value>, field: &'static str) -> CodecResult<String> {
    take_string(map, field)?.ok_or(CodecError::MissingField { field })
}

fn take_bool(map: &mut Map<String, Value>, field: &'static str) -> CodecResult<Option<bool>> {
    match map.remove(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(b)),
        Some(other) => Err(CodecError::wrong_type(field, "a boolean", &other)),
    }
}

fn take_i32(map: &mut Map<String, Value>, field: &'static str) -> CodecResult<Option<i32>> {
    match map.remove(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => {
            let n = n
                .as_i64()
                .and_then(|n| i32::try_from(n).ok())
                .ok_or_else(|| {
                    CodecError::malformed(format!("field '{field}' is not a 32-bit integer"))
                })?;
            Ok(Some(n))
        }
        Some(other) => Err(CodecError::wrong_type(field, "an integer", &other)),
    }
}

fn take_timestamp(
    map: &mut Map<String, Value>,
    field: &'static str,
) -> CodecResult<Option<DateTime<Utc>>> {
    match take_string(map, field)? {
        None => Ok(None),
        Some(raw) => {
            let parsed = DateTime::parse_from_rfc3339(&raw).map_err(|e| {
                CodecError::malformed(format!("field '{field}' is not an RFC 3339 timestamp: {e}"))
            })?;
            Ok(Some(parsed.with_timezone(&Utc)))
        }
    }
}

fn take_data(map: &mut Map<String, Value>) -> Option<Value> {
    // Data is entirely optional and opaque; only explicit null is absence.
    match map.remove(fields::DATA) {
        None | Some(Value::Null) => None,
        Some(value) => Some(value),
    }
}

fn take_route(map: &mut Map<String, Value>) -> CodecResult<Option<Vec<RouteHistory>>> {
    let entries = match map.remove(fields::ROUTE) {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Array(entries)) => entries,
        Some(other) => return Err(CodecError::wrong_type(fields::ROUTE, "an array", &other)),
    };

    let mut route = Vec::with_capacity(entries.len());
    for entry in entries {
        let raw = match entry {
            Value::Object(raw) => raw,
            other => {
                return Err(CodecError::wrong_type(
                    fields::ROUTE,
                    "an array of objects",
                    &other,
                ))
            }
        };
        let mut hop = Map::new();
        for (key, value) in raw {
            hop.entry(key.to_ascii_lowercase()).or_insert(value);
        }
        route.push(RouteHistory {
            hop_type: take_string(&mut hop, fields::HOP_TYPE)?,
            id: take_string(&mut hop, fields::HOP_ID)?,
            timestamp: take_timestamp(&mut hop, fields::HOP_TIMESTAMP)?,
        });
    }
    Ok(Some(route))
}

fn take_routing_slip(map: &mut Map<String, Value>) -> CodecResult<Option<RoutingSlip>> {
    let steps = match map.remove(fields::ROUTING_SLIP) {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Array(steps)) => steps,
        Some(other) => {
            return Err(CodecError::wrong_type(
                fields::ROUTING_SLIP,
                "an array",
                &other,
            ))
        }
    };

    let mut slip = RoutingSlip::with_capacity(steps.len());
    for step in steps {
        let alternatives = match step {
            Value::Array(alternatives) => alternatives,
            other => {
                return Err(CodecError::wrong_type(
                    fields::ROUTING_SLIP,
                    "an array of arrays",
                    &other,
                ))
            }
        };
        let mut resolved = Vec::with_capacity(alternatives.len());
        for alternative in alternatives {
            match alternative {
                Value::String(s) => resolved.push(s),
                other => {
                    return Err(CodecError::wrong_type(
                        fields::ROUTING_SLIP,
                        "arrays of strings",
                        &other,
                    ))
                }
            }
        }
        slip.push_back(resolved);
    }
    Ok(Some(slip))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode_value(value: Value) -> CodecResult<Option<Envelope>> {
        decode(value.to_string().as_bytes())
    }

    #[test]
    fn empty_input_is_no_message_not_an_error() {
        assert_eq!(decode(b"").unwrap(), None);
    }

    #[test]
    fn minimal_envelope_decodes() {
        let envelope = decode_value(json!({
            "id": "A1",
            "source": "svc://x",
            "type": "req",
            "specversion": "0.2",
        }))
        .unwrap()
        .unwrap();

        assert_eq!(envelope.id(), "A1");
        assert_eq!(envelope.source(), "svc://x");
        assert_eq!(envelope.event_type(), "req");
        assert_eq!(envelope.spec_version(), "0.2");
        assert_eq!(envelope.data(), None);
    }

    #[test]
    fn invalid_json_is_malformed() {
        let err = decode(b"{not json").unwrap_err();
        assert!(matches!(err, CodecError::Malformed { .. }));
    }

    #[test]
    fn non_object_top_level_is_malformed() {
        let err = decode_value(json!(["id", "A1"])).unwrap_err();
        assert!(matches!(err, CodecError::Malformed { .. }));
    }

    #[test]
    fn missing_mandatory_field_is_reported_by_name() {
        let err = decode_value(json!({
            "id": "A1",
            "source": "svc://x",
            "specversion": "0.2",
        }))
        .unwrap_err();

        assert_eq!(err, CodecError::MissingField { field: "type" });
    }

    #[test]
    fn null_mandatory_field_counts_as_missing() {
        let err = decode_value(json!({
            "id": null,
            "source": "svc://x",
            "type": "req",
            "specversion": "0.2",
        }))
        .unwrap_err();

        assert_eq!(err, CodecError::MissingField { field: "id" });
    }

    #[test]
    fn key_matching_is_case_normalized() {
        let envelope = decode_value(json!({
            "ID": "A1",
            "Source": "svc://x",
            "TYPE": "req",
            "SpecVersion": "0.2",
            "ReturnTopic": "replies.svc",
        }))
        .unwrap()
        .unwrap();

        assert_eq!(envelope.id(), "A1");
        assert_eq!(envelope.return_topic(), Some("replies.svc"));
        assert!(envelope.extensions().is_empty());
    }

    #[test]
    fn absent_flag_is_not_false() {
        let absent = decode_value(json!({
            "id": "A1",
            "source": "svc://x",
            "type": "req",
            "specversion": "0.2",
        }))
        .unwrap()
        .unwrap();
        assert_eq!(absent.is_test_message(), None);

        let explicit = decode_value(json!({
            "id": "A1",
            "source": "svc://x",
            "type": "req",
            "specversion": "0.2",
            "istestmessage": false,
        }))
        .unwrap()
        .unwrap();
        assert_eq!(explicit.is_test_message(), Some(false));
    }

    #[test]
    fn unrecognized_keys_land_in_extensions() {
        let envelope = decode_value(json!({
            "id": "A1",
            "source": "svc://x",
            "type": "req",
            "specversion": "0.2",
            "comexampleextension": "value",
            "retrycount": 3,
        }))
        .unwrap()
        .unwrap();

        let extensions = envelope.extensions();
        assert_eq!(extensions.get("comexampleextension"), Some(&json!("value")));
        assert_eq!(extensions.get("retrycount"), Some(&json!(3)));
        assert_eq!(extensions.len(), 2);
    }

    #[test]
    fn wrong_field_type_is_malformed() {
        let err = decode_value(json!({
            "id": "A1",
            "source": "svc://x",
            "type": "req",
            "specversion": "0.2",
            "istestmessage": "yes",
        }))
        .unwrap_err();

        assert!(matches!(err, CodecError::Malformed { .. }));
    }

    #[test]
    fn route_and_routing_slip_decode() {
        let envelope = decode_value(json!({
            "id": "A1",
            "source": "svc://x",
            "type": "req",
            "specversion": "0.2",
            "route": [
                {"type": "topic", "id": "orders.incoming", "timestamp": "2024-05-01T10:00:00Z"},
                {"type": "service", "id": "bridge"},
            ],
            "routingslip": [["replies.a", "replies.b"], ["archive"]],
        }))
        .unwrap()
        .unwrap();

        let route = envelope.route().unwrap();
        assert_eq!(route.len(), 2);
        assert_eq!(route[0].hop_type.as_deref(), Some("topic"));
        assert!(route[0].timestamp.is_some());
        assert_eq!(route[1].timestamp, None);

        let slip = envelope.routing_slip().unwrap();
        assert_eq!(slip.len(), 2);
        assert_eq!(slip[0], vec!["replies.a", "replies.b"]);
    }

    #[test]
    fn timestamps_keep_their_instant() {
        let envelope = decode_value(json!({
            "id": "A1",
            "source": "svc://x",
            "type": "req",
            "specversion": "0.2",
            "time": "2024-05-01T12:30:00+02:00",
        }))
        .unwrap()
        .unwrap();

        let time = envelope.time().unwrap();
        assert_eq!(time.to_rfc3339(), "2024-05-01T10:30:00+00:00");
    }

    #[test]
    fn sequence_fields_must_fit_32_bits() {
        let err = decode_value(json!({
            "id": "A1",
            "source": "svc://x",
            "type": "req",
            "specversion": "0.2",
            "sequencenumber": 4_294_967_296_i64,
        }))
        .unwrap_err();

        assert!(matches!(err, CodecError::Malformed { .. }));
    }
}
