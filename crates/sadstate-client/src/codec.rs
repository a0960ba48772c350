//! Body codec.

use crate::ClientError;
use serde_json::{Map, Value};

/// Converts response bodies to generic values and back.
pub trait Codec: Send + Sync {
    /// Decodes a response body.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Decode`] when the bytes are not a valid document.
    fn decode(&self, bytes: &[u8]) -> Result<Value, ClientError>;

    /// Encodes a value for a request body or form field.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Encode`] when the value cannot be serialized.
    fn encode(&self, value: &Value) -> Result<Vec<u8>, ClientError>;

    /// Decodes a body that must be a key/value mapping.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Decode`] if the document is not an object.
    fn decode_object(&self, bytes: &[u8]) -> Result<Map<String, Value>, ClientError> {
        match self.decode(bytes)? {
            Value::Object(map) => Ok(map),
            other => Err(ClientError::Decode(format!(
                "expected JSON object, got {}",
                kind_of(&other)
            ))),
        }
    }
}

/// JSON codec via `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn decode(&self, bytes: &[u8]) -> Result<Value, ClientError> {
        serde_json::from_slice(bytes).map_err(|e| ClientError::Decode(e.to_string()))
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>, ClientError> {
        serde_json::to_vec(value).map_err(|e| ClientError::Encode(e.to_string()))
    }
}

pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decode_object_rejects_arrays() {
        let err = JsonCodec.decode_object(b"[1,2]").expect_err("array is not an object");
        assert!(matches!(err, ClientError::Decode(ref m) if m.contains("array")));
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(matches!(
            JsonCodec.decode(b"<html>"),
            Err(ClientError::Decode(_))
        ));
    }

    #[test]
    fn encode_is_compact_json() {
        let bytes = JsonCodec.encode(&json!({"a": 1})).expect("encode");
        assert_eq!(bytes, br#"{"a":1}"#);
    }
}
