//! Encoding helpers for values produced by retry campaigns.
//!
//! [`Codec`] is implemented for every serde type. The free functions below
//! are thin wrappers for call sites that prefer a function to a method.

mod pipeline;

pub use pipeline::Codec;

use crate::error_boundary;
use serde::Serialize;
use thiserror::Error;

/// Errors raised while encoding or decoding a value.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Serialization or deserialization failed.
    #[error("JSON codec error: {0}")]
    Json(#[source] serde_json::Error),

    /// Text was not valid base64.
    #[error("base64 decode error: {0}")]
    Base64(#[source] base64::DecodeError),
}

error_boundary!(serde_json::Error => CodecError, |e| CodecError::Json(e));
error_boundary!(base64::DecodeError => CodecError, |e| CodecError::Base64(e));

/// Encode `value` to its binary form.
pub fn encode_to_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, CodecError> {
    Ok(serde_json::to_vec(value)?)
}

/// Encode `value` to base64 text.
pub fn encode_to_string<T: Serialize>(value: &T) -> Result<String, CodecError> {
    use base64::Engine as _;
    Ok(base64::engine::general_purpose::STANDARD.encode(encode_to_bytes(value)?))
}

/// Decode a value from its binary form.
pub fn decode_bytes<T: Codec>(bytes: &[u8]) -> Result<T, CodecError> {
    T::from_bytes(bytes)
}

/// Decode a value from base64 text.
pub fn decode_string<T: Codec>(encoded: &str) -> Result<T, CodecError> {
    T::from_base64_string(encoded)
}

/// Encode `value` to compact JSON text.
pub fn encode_to_json_string<T: Serialize>(value: &T) -> Result<String, CodecError> {
    Ok(serde_json::to_string(value)?)
}

/// Decode a value from JSON text.
pub fn decode_json_string<T: Codec>(encoded: &str) -> Result<T, CodecError> {
    T::from_json_string(encoded)
}
