//! Inbound envelope decoding.
//!
//! Every pushed frame is a JSON object whose `data` member holds the configuration
//! document, either inline or as a JSON string containing the serialized document.

use serde::Deserialize;
use serde_json::Value;

use crate::error::DecodeError;

/// One pushed message.
#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    #[serde(default, alias = "Data")]
    data: Option<Value>,
}

impl Message {
    /// Parse the envelope of a text or binary frame.
    pub fn decode(frame: &[u8]) -> Result<Self, DecodeError> {
        serde_json::from_slice(frame).map_err(DecodeError::Envelope)
    }

    /// Extract the carried document.
    pub fn into_document(self) -> Result<Value, DecodeError> {
        match self.data {
            None | Some(Value::Null) => Err(DecodeError::MissingData),
            Some(Value::String(text)) => serde_json::from_str(&text).map_err(DecodeError::Document),
            Some(document) => Ok(document),
        }
    }
}
