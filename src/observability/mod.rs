//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Dispatcher, server, lifecycle produce:
//!     → logging.rs (structured log events, per-request `dispatch` span)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout (fmt subscriber)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through the dispatch span into every event
//! - Metrics are cheap (atomic increments); recording without an
//!   installed exporter is a no-op

pub mod logging;
pub mod metrics;
