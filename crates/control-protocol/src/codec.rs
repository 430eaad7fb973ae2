//! Codec for encoding and decoding control messages.
//!
//! Decoding is defensive: every way a payload can be wrong maps to a
//! [`CodecError`] variant, and nothing in here panics on peer input.

use crate::message::{ControlMessage, MessageKind};
use bytes::Bytes;
use serde_json::Value;

/// Error type for codec operations
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Payload bytes are not UTF-8
    #[error("Payload is not valid UTF-8")]
    InvalidUtf8,

    /// Payload is not parseable JSON
    #[error("Payload is not valid JSON: {0}")]
    InvalidJson(String),

    /// Payload is JSON but not an object
    #[error("Payload is not a JSON object")]
    NotAnObject,

    /// Object has no string `type` field
    #[error("Missing message type")]
    MissingType,

    /// `type` is a string this protocol version does not know
    #[error("Unrecognized message type: {0}")]
    UnknownType(String),

    /// Known `type` but the payload does not match its shape
    #[error("Invalid {kind} payload: {reason}")]
    InvalidPayload { kind: MessageKind, reason: String },

    /// Serialization failed
    #[error("Failed to encode message: {0}")]
    Encode(String),
}

impl CodecError {
    /// The type tag of a well-formed message this client does not know.
    ///
    /// Such messages are ignored for forward compatibility, while every other
    /// decode error means the payload itself is broken.
    #[must_use]
    pub fn unrecognized_tag(&self) -> Option<&str> {
        match self {
            CodecError::UnknownType(tag) => Some(tag),
            _ => None,
        }
    }
}

/// Encode a control message to wire bytes
///
/// # Errors
///
/// Returns `CodecError::Encode` if serialization fails
pub fn encode_message(message: &ControlMessage) -> Result<Bytes, CodecError> {
    serde_json::to_vec(message)
        .map(Bytes::from)
        .map_err(|e| CodecError::Encode(e.to_string()))
}

/// Decode a control message from wire bytes
///
/// Extra fields on a known message are tolerated.
///
/// # Errors
///
/// Returns an error if the payload is malformed or of an unknown type
pub fn decode_message(data: &[u8]) -> Result<ControlMessage, CodecError> {
    let text = std::str::from_utf8(data).map_err(|_| CodecError::InvalidUtf8)?;

    let value: Value =
        serde_json::from_str(text).map_err(|e| CodecError::InvalidJson(e.to_string()))?;

    let Value::Object(object) = value else {
        return Err(CodecError::NotAnObject);
    };

    let tag = object
        .get("type")
        .and_then(Value::as_str)
        .ok_or(CodecError::MissingType)?;

    let kind =
        MessageKind::from_tag(tag).ok_or_else(|| CodecError::UnknownType(tag.to_string()))?;

    serde_json::from_value(Value::Object(object)).map_err(|e| CodecError::InvalidPayload {
        kind,
        reason: e.to_string(),
    })
}
