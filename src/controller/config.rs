//! Per-controller configuration.
//!
//! Set once when a dispatcher is built and read-only afterwards. A
//! dispatcher never observes changes made to a config after construction.

use std::fmt;
use std::sync::Arc;

use axum::body::Bytes;
use axum::http::HeaderValue;
use futures_util::future::BoxFuture;
use serde_json::Value;

use crate::codec::{self, BoxError, DecodeError, Decoders, Encoder, MediaType, MediaTypeError};
use crate::config::ControllerSettings;
use crate::dispatch::exception::{self, ExceptionHandler};
use crate::dispatch::Unhandled;
use crate::http::RequestContext;

/// What a controller accepts, how it answers, and how it fails.
#[derive(Clone)]
pub struct ControllerConfig {
    accepted: Vec<MediaType>,
    response_content_type: HeaderValue,
    encoder: Encoder,
    decoders: Decoders,
    exception_handler: ExceptionHandler,
}

impl ControllerConfig {
    /// Build a config from the service's `[controller]` settings.
    pub fn from_settings(settings: &ControllerSettings) -> Result<Self, MediaTypeError> {
        let accepted = settings
            .accepted_content_types
            .iter()
            .map(|s| s.parse())
            .collect::<Result<Vec<MediaType>, _>>()?;
        let response_content_type = HeaderValue::from_str(&settings.response_content_type)
            .map_err(|_| MediaTypeError(settings.response_content_type.clone()))?;
        settings.response_content_type.parse::<MediaType>()?;

        Ok(Self {
            accepted,
            response_content_type,
            ..Self::default()
        })
    }

    /// Replace the accepted request content types.
    pub fn accept(mut self, accepted: impl IntoIterator<Item = MediaType>) -> Self {
        self.accepted = accepted.into_iter().collect();
        self
    }

    pub fn with_response_content_type(mut self, value: HeaderValue) -> Self {
        self.response_content_type = value;
        self
    }

    /// Replace the response body encoder.
    pub fn with_encoder<F>(mut self, encoder: F) -> Self
    where
        F: Fn(&Value) -> Result<Bytes, BoxError> + Send + Sync + 'static,
    {
        self.encoder = Arc::new(encoder);
        self
    }

    /// Register or replace the decoder for a media type.
    pub fn with_decoder<F>(mut self, media_type: MediaType, decoder: F) -> Self
    where
        F: Fn(&[u8]) -> Result<Value, DecodeError> + Send + Sync + 'static,
    {
        self.decoders.insert(media_type, Arc::new(decoder));
        self
    }

    /// Replace the handler for unhandled failures.
    pub fn with_exception_handler<F>(mut self, handler: F) -> Self
    where
        F: for<'a> Fn(&'a mut RequestContext, Unhandled) -> BoxFuture<'a, ()> + Send + Sync + 'static,
    {
        self.exception_handler = Arc::new(handler);
        self
    }

    pub fn accepted(&self) -> &[MediaType] {
        &self.accepted
    }

    /// Returns true if `media_type` is in the accepted list.
    pub fn accepts(&self, media_type: &MediaType) -> bool {
        self.accepted.iter().any(|a| a.matches(media_type))
    }

    pub fn response_content_type(&self) -> &HeaderValue {
        &self.response_content_type
    }

    pub fn encoder(&self) -> &Encoder {
        &self.encoder
    }

    pub fn decoders(&self) -> &Decoders {
        &self.decoders
    }

    pub fn exception_handler(&self) -> &ExceptionHandler {
        &self.exception_handler
    }
}

impl Default for ControllerConfig {
    /// JSON in, JSON out, default exception handler.
    fn default() -> Self {
        Self {
            accepted: vec![MediaType::json()],
            response_content_type: HeaderValue::from_static("application/json"),
            encoder: Arc::new(codec::encode_json),
            decoders: Decoders::default(),
            exception_handler: exception::default_handler(),
        }
    }
}

impl fmt::Debug for ControllerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerConfig")
            .field("accepted", &self.accepted)
            .field("response_content_type", &self.response_content_type)
            .field("decoders", &self.decoders)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_json() {
        let config = ControllerConfig::default();
        assert_eq!(config.accepted(), [MediaType::json()]);
        assert_eq!(config.response_content_type(), "application/json");
        assert!(config.accepts(&"application/json".parse().unwrap()));
        assert!(!config.accepts(&MediaType::text()));
    }

    #[test]
    fn from_settings() {
        let settings = ControllerSettings {
            accepted_content_types: vec!["application/json".into(), "text/plain".into()],
            response_content_type: "application/json; charset=utf-8".into(),
        };
        let config = ControllerConfig::from_settings(&settings).unwrap();
        assert!(config.accepts(&MediaType::text()));
        assert_eq!(
            config.response_content_type(),
            "application/json; charset=utf-8"
        );

        let bad = ControllerSettings {
            accepted_content_types: vec!["json".into()],
            ..settings
        };
        assert!(ControllerConfig::from_settings(&bad).is_err());
    }
}
