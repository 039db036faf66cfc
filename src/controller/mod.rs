//! Controllers and their handler tables.
//!
//! # Data Flow
//! ```text
//! Controller::routes()  (once, at startup)
//!     → HandlerRegistry<Self> (ordered bindings)
//!     → shared via Arc by the Dispatcher
//!
//! Per request:
//!     Dispatcher picks a binding
//!     → Call (positional string args + decoded body)
//!     → handler → Response
//! ```
//!
//! # Design Decisions
//! - Registration is an explicit table, not discovery
//! - Handlers receive `Arc<Self>`; any mutable state is the controller's
//!   own (atomics, concurrent maps)
//! - Configuration is per instance and read-only once dispatching starts

pub mod call;
pub mod config;

pub use call::{BindError, Call};
pub use config::ControllerConfig;

use crate::routing::HandlerRegistry;

/// A group of request handlers sharing one configuration.
pub trait Controller: Send + Sync + Sized + 'static {
    /// The handler table, in declaration order.
    fn routes() -> HandlerRegistry<Self>;

    /// Content types, codecs and exception handler for this instance.
    fn config(&self) -> ControllerConfig {
        ControllerConfig::default()
    }
}
