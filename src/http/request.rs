//! Request handling and per-request state.
//!
//! # Responsibilities
//! - Attach a unique request ID to every request (UUID v4)
//! - Hold the per-request state the pipeline works on: method, path
//!   parameters, headers, raw and decoded body, response writer
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing, and echoed back
//! - Declared content length wins over the buffered body length
//! - An unparseable `Content-Type` is kept as raw text so it can be
//!   reported, but never matches an accepted type

use axum::body::Bytes;
use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method};
use serde_json::Value;
use tower::Layer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestId, SetRequestId};
use uuid::Uuid;

use super::response::ResponseWriter;
use super::sink::ResponseSink;
use crate::codec::MediaType;
use crate::routing::PathParams;

/// Header carrying the request ID.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Layer that assigns an `X-Request-ID` to requests lacking one and copies
/// it onto the response.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestIdLayer;

impl<S> Layer<S> for RequestIdLayer {
    type Service = SetRequestId<PropagateRequestId<S>, MakeRequestUuid>;

    fn layer(&self, inner: S) -> Self::Service {
        SetRequestId::new(
            PropagateRequestId::new(inner, X_REQUEST_ID),
            X_REQUEST_ID,
            MakeRequestUuid,
        )
    }
}

/// Per-request state, owned by one pipeline invocation.
#[derive(Debug)]
pub struct RequestContext {
    request_id: String,
    method: Method,
    path: String,
    path_params: Option<PathParams>,
    headers: HeaderMap,
    content_length: u64,
    content_type: Option<Result<MediaType, String>>,
    raw_body: Bytes,
    body: Option<Value>,
    response: ResponseWriter,
}

impl RequestContext {
    /// Start building a context for `method path`.
    pub fn builder(method: Method, path: impl Into<String>) -> RequestContextBuilder {
        RequestContextBuilder {
            method,
            path: path.into(),
            path_params: None,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// Build a context from a buffered HTTP request.
    pub fn from_parts(
        parts: axum::http::request::Parts,
        body: Bytes,
        path_params: Option<PathParams>,
        sink: Box<dyn ResponseSink>,
    ) -> Self {
        let mut builder = Self::builder(parts.method, parts.uri.path());
        builder.headers = parts.headers;
        builder.path_params = path_params;
        builder.body = body;
        builder.build(sink)
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Path parameters, if the upstream router produced any.
    pub fn path_params(&self) -> Option<&PathParams> {
        self.path_params.as_ref()
    }

    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params.as_ref()?.get(name).map(String::as_str)
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn content_length(&self) -> u64 {
        self.content_length
    }

    /// True if the request declares a non-empty body.
    pub fn has_body(&self) -> bool {
        self.content_length > 0
    }

    /// The parsed content type, if present and well-formed.
    pub fn content_type(&self) -> Option<&MediaType> {
        self.content_type.as_ref()?.as_ref().ok()
    }

    /// The content type as sent, for error reporting.
    pub fn content_type_raw(&self) -> Option<String> {
        match self.content_type.as_ref()? {
            Ok(media_type) => Some(media_type.to_string()),
            Err(raw) => Some(raw.clone()),
        }
    }

    pub fn raw_body(&self) -> &Bytes {
        &self.raw_body
    }

    /// The decoded body, once the pipeline has decoded it.
    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    pub fn set_body(&mut self, body: Value) {
        self.body = Some(body);
    }

    pub fn take_body(&mut self) -> Option<Value> {
        self.body.take()
    }

    pub fn response(&self) -> &ResponseWriter {
        &self.response
    }

    pub fn response_mut(&mut self) -> &mut ResponseWriter {
        &mut self.response
    }
}

/// Builder for [`RequestContext`].
#[derive(Debug)]
pub struct RequestContextBuilder {
    method: Method,
    path: String,
    path_params: Option<PathParams>,
    headers: HeaderMap,
    body: Bytes,
}

impl RequestContextBuilder {
    pub fn path_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path_params
            .get_or_insert_with(PathParams::new)
            .insert(name.into(), value.into());
        self
    }

    pub fn path_params(mut self, params: PathParams) -> Self {
        self.path_params = Some(params);
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Sets the body and its content type.
    pub fn body(mut self, content_type: &str, body: impl Into<Bytes>) -> Self {
        if let Ok(value) = HeaderValue::from_str(content_type) {
            self.headers.insert(CONTENT_TYPE, value);
        }
        self.body = body.into();
        self
    }

    pub fn build(self, sink: Box<dyn ResponseSink>) -> RequestContext {
        let request_id = self
            .headers
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let content_length = self
            .headers
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(self.body.len() as u64);

        let content_type = self.headers.get(CONTENT_TYPE).map(|value| {
            let raw = String::from_utf8_lossy(value.as_bytes()).into_owned();
            raw.parse::<MediaType>().map_err(|_| raw)
        });

        RequestContext {
            request_id,
            method: self.method,
            path: self.path,
            path_params: self.path_params,
            headers: self.headers,
            content_length,
            content_type,
            raw_body: self.body,
            body: None,
            response: ResponseWriter::new(sink),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use tokio::sync::oneshot;

    fn sink() -> Box<dyn ResponseSink> {
        let (tx, _rx) = oneshot::channel();
        Box::new(tx)
    }

    #[test]
    fn builder_derives_body_metadata() {
        let ctx = RequestContext::builder(Method::POST, "/items")
            .body("application/json; charset=utf-8", r#"{"a":1}"#)
            .build(sink());

        assert_eq!(ctx.content_length(), 7);
        assert!(ctx.has_body());
        assert_eq!(ctx.content_type(), Some(&MediaType::json()));
        assert!(ctx.path_params().is_none());
        assert!(ctx.body().is_none());
        assert!(Uuid::parse_str(ctx.request_id()).is_ok());
    }

    #[test]
    fn declared_length_and_request_id_win() {
        let ctx = RequestContext::builder(Method::GET, "/items/5")
            .path_param("id", "5")
            .header(CONTENT_LENGTH, HeaderValue::from_static("0"))
            .header(X_REQUEST_ID, HeaderValue::from_static("req-1"))
            .build(sink());

        assert!(!ctx.has_body());
        assert_eq!(ctx.request_id(), "req-1");
        assert_eq!(ctx.path_param("id"), Some("5"));
    }

    #[test]
    fn malformed_content_type_is_kept_raw() {
        let ctx = RequestContext::builder(Method::POST, "/")
            .body("garbage", "x")
            .build(sink());
        assert!(ctx.content_type().is_none());
        assert_eq!(ctx.content_type_raw().as_deref(), Some("garbage"));
    }

    #[test]
    fn from_parts_keeps_method_and_path() {
        let (parts, ()) = Request::builder()
            .method("PUT")
            .uri("http://example.com/items/9?x=1")
            .body(())
            .unwrap()
            .into_parts();
        let mut params = PathParams::new();
        params.insert("id".into(), "9".into());

        let ctx = RequestContext::from_parts(parts, Bytes::new(), Some(params), sink());
        assert_eq!(ctx.method(), Method::PUT);
        assert_eq!(ctx.path(), "/items/9");
        assert_eq!(ctx.path_param("id"), Some("9"));
    }
}
