//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum setup, path-parameter extraction, body limit)
//!     → request.rs (request ID, RequestContext)
//!     → [dispatch pipeline]
//!     → response.rs (ResponseWriter) → sink.rs (oneshot back to axum)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;
pub mod sink;

pub use request::{RequestContext, RequestContextBuilder, RequestIdLayer, X_REQUEST_ID};
pub use response::{Response, ResponseWriter};
pub use server::HttpServer;
pub use sink::{ResponseSink, SinkError};
