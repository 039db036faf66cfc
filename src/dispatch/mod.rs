//! Dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! RequestContext
//!     → pipeline.rs (lookup, admit, decode, bind, invoke, encode, write)
//!     → on PipelineError: exception.rs writes status/headers/message
//!     → on Unhandled: controller's exception handler (default: log + 500)
//!     → exactly one response to the sink
//! ```
//!
//! # Design Decisions
//! - Failures are values threaded through each stage, translated once at
//!   the end
//! - Routine outcomes (404, 415, 400) never reach the exception handler
//! - Handler panics are caught and treated as unhandled errors

pub mod error;
pub mod exception;
pub mod pipeline;

pub use error::{HandlerPanic, PipelineError, Stage, Unhandled};
pub use exception::{install_default_exception_handler, ExceptionHandler};
pub use pipeline::Dispatcher;
