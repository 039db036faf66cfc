//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → wait_for_signal resolves
//!
//! Shutdown (shutdown.rs):
//!     trigger() → every subscribed server stops accepting
//!     → in-flight requests finish → run() returns
//! ```
//!
//! # Design Decisions
//! - One broadcast coordinator; servers subscribe before they start
//! - Graceful only: in-flight dispatches are never cut mid-pipeline

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::wait_for_signal;
