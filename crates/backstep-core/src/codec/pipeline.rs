use super::CodecError;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// A value that can be encoded to bytes, base64 text or JSON text and back.
///
/// Used by callers to persist or transmit the result of a retry campaign.
/// The backoff core itself never serializes anything.
///
/// # Blanket Implementation
///
/// Every `T: Serialize + DeserializeOwned` implements this trait, so deriving
/// the serde traits is enough:
///
/// ```
/// use serde::{Serialize, Deserialize};
/// use backstep_core::codec::Codec;
///
/// #[derive(Serialize, Deserialize, PartialEq, Debug)]
/// struct Checkpoint {
///     block: u64,
///     hash: String,
/// }
///
/// let checkpoint = Checkpoint { block: 42, hash: "0xabc".to_string() };
///
/// let text = checkpoint.to_base64_string().unwrap();
/// assert_eq!(Checkpoint::from_base64_string(&text).unwrap(), checkpoint);
///
/// let json = checkpoint.to_json_string().unwrap();
/// assert_eq!(json, r#"{"block":42,"hash":"0xabc"}"#);
/// ```
///
/// # Binary form
///
/// The byte encoding is compact JSON. It is self-describing, so decoding
/// into a type with extra optional fields keeps working, and the base64 form
/// is that byte encoding under the standard alphabet with padding.
pub trait Codec: Serialize + DeserializeOwned {
    /// Encode to the binary form.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Json`] if serialization fails (e.g., for maps
    /// with non-string keys).
    fn to_bytes(&self) -> Result<Vec<u8>, CodecError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decode from the binary form.
    fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Encode to base64 text.
    fn to_base64_string(&self) -> Result<String, CodecError> {
        Ok(STANDARD.encode(self.to_bytes()?))
    }

    /// Decode from base64 text.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Base64`] if the text is not valid base64, or
    /// [`CodecError::Json`] if the decoded bytes do not match `Self`.
    fn from_base64_string(encoded: &str) -> Result<Self, CodecError> {
        let bytes = STANDARD.decode(encoded)?;
        Self::from_bytes(&bytes)
    }

    /// Encode to compact JSON text.
    fn to_json_string(&self) -> Result<String, CodecError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode from JSON text.
    fn from_json_string(encoded: &str) -> Result<Self, CodecError> {
        Ok(serde_json::from_str(encoded)?)
    }

    /// Encode to indented JSON text, for logs and human-edited files.
    fn to_json_string_pretty(&self) -> Result<String, CodecError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl<T> Codec for T where T: Serialize + DeserializeOwned {}
