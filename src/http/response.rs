//! Response values and the per-request response writer.
//!
//! # Responsibilities
//! - `Response`: what a handler returns (status, multi-valued headers,
//!   structured body)
//! - `ResponseWriter`: accumulates the final status, headers and bytes and
//!   delivers them to the sink exactly once
//!
//! # Design Decisions
//! - Body stays a `serde_json::Value` until the pipeline encodes it
//! - `close` is idempotent: the sink is taken on first close, later calls
//!   are logged no-ops
//! - Writes after close are dropped, never delivered

use std::fmt;

use axum::body::Bytes;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use serde_json::{json, Value};

use super::sink::{ResponseSink, SinkError};

/// A handler's result before encoding.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Option<Value>,
}

impl Response {
    /// An empty response with the given status.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// 200 with a body.
    pub fn ok(body: Value) -> Self {
        Self::new(StatusCode::OK).with_body(body)
    }

    /// 201 with a body.
    pub fn created(body: Value) -> Self {
        Self::new(StatusCode::CREATED).with_body(body)
    }

    /// 204, no body.
    pub fn no_content() -> Self {
        Self::new(StatusCode::NO_CONTENT)
    }

    /// An application-level error with an `{"error": message}` body.
    pub fn error(status: StatusCode, message: impl fmt::Display) -> Self {
        Self::new(status).with_body(json!({ "error": message.to_string() }))
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Appends a header value, keeping earlier values of the same name.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    pub fn into_parts(self) -> (StatusCode, HeaderMap, Option<Value>) {
        (self.status, self.headers, self.body)
    }
}

/// Builds the outgoing response and hands it to the sink.
pub struct ResponseWriter {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
    sink: Option<Box<dyn ResponseSink>>,
}

impl ResponseWriter {
    pub fn new(sink: Box<dyn ResponseSink>) -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Vec::new(),
            sink: Some(sink),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Appends every value of `headers`.
    pub fn append_headers(&mut self, headers: HeaderMap) {
        let mut last = None;
        for (name, value) in headers {
            // `None` means "same name as the previous entry".
            if let Some(name) = name {
                last = Some(name);
            }
            if let Some(name) = &last {
                self.headers.append(name.clone(), value);
            }
        }
    }

    /// Appends raw bytes to the body.
    pub fn write(&mut self, bytes: &[u8]) {
        if self.is_closed() {
            tracing::warn!(len = bytes.len(), "Write after close dropped");
            return;
        }
        self.body.extend_from_slice(bytes);
    }

    /// Writes a `text/plain` message line.
    pub fn write_line(&mut self, line: &str) {
        if !self.headers.contains_key(CONTENT_TYPE) {
            self.headers.insert(
                CONTENT_TYPE,
                HeaderValue::from_static("text/plain; charset=utf-8"),
            );
        }
        self.write(line.as_bytes());
        self.write(b"\n");
    }

    pub fn is_closed(&self) -> bool {
        self.sink.is_none()
    }

    /// Delivers the response and finalizes the exchange.
    pub async fn close(&mut self) -> Result<(), SinkError> {
        let Some(sink) = self.sink.take() else {
            tracing::debug!(status = %self.status, "Response already closed");
            return Ok(());
        };

        let mut response = axum::http::Response::new(Bytes::from(std::mem::take(&mut self.body)));
        *response.status_mut() = self.status;
        *response.headers_mut() = std::mem::take(&mut self.headers);
        sink.deliver(response).await
    }
}

impl fmt::Debug for ResponseWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseWriter")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("body_len", &self.body.len())
            .field("closed", &self.is_closed())
            .finish()
    }
}
