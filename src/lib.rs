//! Controller method dispatch for HTTP services.
//!
//! A [`Controller`] declares its handlers in a [`HandlerRegistry`], each
//! keyed by HTTP method and the exact set of path parameters it needs. A
//! [`Dispatcher`] owns one controller instance and runs every request
//! through a fixed pipeline: lookup, body admission, decode, bind, invoke,
//! encode, write. Routine rejections become 404/415/400 responses; every
//! other failure goes to the controller's exception handler.
//!
//! [`HttpServer`] mounts dispatchers on axum path templates.

pub mod codec;
pub mod config;
pub mod controller;
pub mod dispatch;
pub mod http;
pub mod items;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use config::ServiceConfig;
pub use controller::{Call, Controller, ControllerConfig};
pub use dispatch::Dispatcher;
pub use http::{HttpServer, RequestContext, Response};
pub use lifecycle::Shutdown;
pub use routing::HandlerRegistry;
