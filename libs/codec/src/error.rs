//! Codec-level errors for envelope decoding and encoding.
//!
//! Each variant carries enough context to say what was wrong with the wire
//! payload without echoing the payload itself into logs.

use thiserror::Error;

/// Envelope codec errors.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CodecError {
    /// Input was not well-formed structured text, or a recognized field
    /// carried a value of the wrong shape.
    #[error("malformed envelope: {reason}")]
    Malformed { reason: String },

    /// A mandatory field (`id`, `source`, `type`, `specversion`) was missing
    /// or null.
    #[error("malformed envelope: mandatory field '{field}' is missing")]
    MissingField { field: &'static str },
}

impl CodecError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        CodecError::Malformed {
            reason: reason.into(),
        }
    }

    /// Wrong-type diagnostic for a recognized wire field.
    pub fn wrong_type(field: &str, expected: &str, got: &serde_json::Value) -> Self {
        CodecError::Malformed {
            reason: format!(
                "field '{}' must be {}, got {}",
                field,
                expected,
                json_kind(got)
            ),
        }
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

/// Result type for codec operations.
pub type CodecResult<T> = std::result::Result<T, CodecError>;
