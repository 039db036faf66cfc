//! Pipeline failure types.

use std::backtrace::Backtrace;
use std::fmt;

use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use thiserror::Error;

use crate::codec::{BoxError, DecodeError, MediaType};

/// Failures the pipeline resolves itself, before any handler code runs.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// No registered handler matches method + parameter shape.
    #[error("no handler for {method} with path parameters {params:?}")]
    NotFound { method: String, params: Vec<String> },

    /// A body was sent with a content type the controller does not accept.
    #[error("unsupported media type {}", .content_type.as_deref().unwrap_or("(none)"))]
    UnsupportedMediaType {
        method: Method,
        content_type: Option<String>,
        accepted: Vec<MediaType>,
    },

    /// The body claimed an accepted media type but could not be decoded.
    #[error("bad request body: {0}")]
    BadRequest(#[source] DecodeError),
}

impl PipelineError {
    pub fn status(&self) -> StatusCode {
        match self {
            PipelineError::NotFound { .. } => StatusCode::NOT_FOUND,
            PipelineError::UnsupportedMediaType { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            PipelineError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Message line written to the client, if any.
    pub fn message(&self) -> Option<String> {
        match self {
            PipelineError::NotFound { .. } => None,
            PipelineError::UnsupportedMediaType { accepted, .. } => {
                let accepted: Vec<String> = accepted.iter().map(ToString::to_string).collect();
                Some(format!("{}; expected one of: {}", self, accepted.join(", ")))
            }
            PipelineError::BadRequest(_) => Some(self.to_string()),
        }
    }

    /// Extra headers carried by the error.
    ///
    /// A 415 answer to PATCH advertises `Accept-Patch` (RFC 5789), one to
    /// POST advertises `Accept-Post`.
    pub fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let PipelineError::UnsupportedMediaType { method, accepted, .. } = self {
            let name = if method == Method::PATCH {
                Some(HeaderName::from_static("accept-patch"))
            } else if method == Method::POST {
                Some(HeaderName::from_static("accept-post"))
            } else {
                None
            };
            let list: Vec<String> = accepted.iter().map(ToString::to_string).collect();
            if let (Some(name), Ok(value)) = (name, HeaderValue::from_str(&list.join(", "))) {
                headers.insert(name, value);
            }
        }
        headers
    }
}

/// Where an unhandled failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Binding path parameters to handler arguments.
    Bind,
    /// Inside the handler itself.
    Invoke,
    /// Encoding the handler's response body.
    Encode,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Bind => "bind",
            Stage::Invoke => "invoke",
            Stage::Encode => "encode",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Any failure that is not a [`PipelineError`], with the trace captured
/// where the pipeline caught it.
pub struct Unhandled {
    stage: Stage,
    cause: BoxError,
    trace: Backtrace,
}

impl Unhandled {
    pub fn new(stage: Stage, cause: impl Into<BoxError>) -> Self {
        Self {
            stage,
            cause: cause.into(),
            trace: Backtrace::capture(),
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// The original error.
    pub fn cause(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        self.cause.as_ref()
    }

    pub fn trace(&self) -> &Backtrace {
        &self.trace
    }

    pub fn into_cause(self) -> BoxError {
        self.cause
    }
}

impl fmt::Debug for Unhandled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unhandled")
            .field("stage", &self.stage)
            .field("cause", &self.cause)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Unhandled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.stage, self.cause)
    }
}

impl std::error::Error for Unhandled {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.cause.as_ref())
    }
}

/// A handler panicked; carries the panic message.
#[derive(Debug, Error)]
#[error("handler panicked: {0}")]
pub struct HandlerPanic(pub String);

impl HandlerPanic {
    pub(crate) fn from_payload(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Self(message)
    }
}
