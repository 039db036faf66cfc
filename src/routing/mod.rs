//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request (method, path parameters)
//!     → registry.rs (scan bindings in declaration order)
//!     → descriptor.rs (evaluate method + parameter set)
//!     → Return: matched HandlerBinding or NotFound
//!
//! Registry construction (at startup):
//!     Controller::routes()
//!     → RouteDescriptor per handler
//!     → Freeze as immutable HandlerRegistry
//! ```
//!
//! # Design Decisions
//! - Tables built at startup, immutable at runtime
//! - Deterministic: same input always matches same handler
//! - First match wins (declaration order)

pub mod descriptor;
pub mod registry;

pub use descriptor::{PathParams, RouteDescriptor};
pub use registry::{HandlerBinding, HandlerFuture, HandlerRegistry};
