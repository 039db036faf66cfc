//! Body codecs.
//!
//! # Data Flow
//! ```text
//! raw request bytes + Content-Type
//!     → Decoders::get(media type)
//!     → Decoder (JSON / text / form) → serde_json::Value
//!
//! handler Response body (Value)
//!     → Encoder → bytes written to the client
//! ```
//!
//! # Design Decisions
//! - Decoded bodies are `serde_json::Value`, a tagged value type handlers
//!   extract from explicitly
//! - Codecs are plain `Arc<dyn Fn>` values so controllers can swap them
//!   without implementing a trait

pub mod media_type;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use axum::body::Bytes;
use serde_json::{Map, Value};
use thiserror::Error;

pub use media_type::{MediaType, MediaTypeError};

/// Boxed error used by codecs and handlers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Turns raw body bytes into a structured value.
pub type Decoder = Arc<dyn Fn(&[u8]) -> Result<Value, DecodeError> + Send + Sync>;

/// Turns a response body into bytes.
pub type Encoder = Arc<dyn Fn(&Value) -> Result<Bytes, BoxError> + Send + Sync>;

/// Errors raised while decoding a request body.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed JSON body: {0}")]
    Json(#[from] serde_json::Error),

    #[error("body is not valid UTF-8")]
    Utf8(#[from] std::str::Utf8Error),
}

/// Decoders keyed by media type.
#[derive(Clone)]
pub struct Decoders {
    by_type: HashMap<MediaType, Decoder>,
}

impl Decoders {
    /// An empty decoder table.
    pub fn empty() -> Self {
        Self {
            by_type: HashMap::new(),
        }
    }

    /// Register (or replace) the decoder for a media type.
    pub fn insert(&mut self, media_type: MediaType, decoder: Decoder) {
        self.by_type.insert(media_type, decoder);
    }

    /// Look up the decoder for a media type.
    pub fn get(&self, media_type: &MediaType) -> Option<&Decoder> {
        self.by_type.get(media_type)
    }
}

impl Default for Decoders {
    fn default() -> Self {
        let mut decoders = Self::empty();
        decoders.insert(MediaType::json(), Arc::new(decode_json));
        decoders.insert(MediaType::text(), Arc::new(decode_text));
        decoders.insert(MediaType::form(), Arc::new(decode_form));
        decoders
    }
}

impl fmt::Debug for Decoders {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.by_type.keys()).finish()
    }
}

pub fn decode_json(raw: &[u8]) -> Result<Value, DecodeError> {
    Ok(serde_json::from_slice(raw)?)
}

pub fn decode_text(raw: &[u8]) -> Result<Value, DecodeError> {
    Ok(Value::String(std::str::from_utf8(raw)?.to_owned()))
}

/// Decodes `a=1&b=2` into `{"a": "1", "b": "2"}`. Repeated keys keep the last value.
pub fn decode_form(raw: &[u8]) -> Result<Value, DecodeError> {
    let map: Map<String, Value> = url::form_urlencoded::parse(raw)
        .map(|(k, v)| (k.into_owned(), Value::String(v.into_owned())))
        .collect();
    Ok(Value::Object(map))
}

/// Default response encoder: compact JSON.
pub fn encode_json(value: &Value) -> Result<Bytes, BoxError> {
    Ok(Bytes::from(serde_json::to_vec(value)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_table_covers_json_text_form() {
        let decoders = Decoders::default();
        assert!(decoders.get(&MediaType::json()).is_some());
        assert!(decoders.get(&MediaType::text()).is_some());
        assert!(decoders.get(&MediaType::form()).is_some());
        assert!(decoders.get(&"image/png".parse().unwrap()).is_none());
    }

    #[test]
    fn json_decode_and_encode() {
        let value = decode_json(br#"{"a":1}"#).unwrap();
        assert_eq!(value, json!({"a": 1}));
        assert_eq!(&encode_json(&value).unwrap()[..], br#"{"a":1}"#);
        assert!(matches!(decode_json(b"{nope"), Err(DecodeError::Json(_))));
    }

    #[test]
    fn form_decode() {
        let value = decode_form(b"name=widget&note=a%20b&name=gadget").unwrap();
        assert_eq!(value, json!({"name": "gadget", "note": "a b"}));
    }

    #[test]
    fn text_decode_rejects_invalid_utf8() {
        assert_eq!(decode_text(b"hi").unwrap(), json!("hi"));
        assert!(matches!(decode_text(&[0xff, 0xfe]), Err(DecodeError::Utf8(_))));
    }
}
