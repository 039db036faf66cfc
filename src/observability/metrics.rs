//! Metrics collection and exposition.
//!
//! # Metrics
//! - `dispatch_requests_total` (counter): requests by controller, method, status
//! - `dispatch_request_duration_seconds` (histogram): latency per controller
//! - `dispatch_handler_errors_total` (counter): unhandled failures by
//!   controller and pipeline stage

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::dispatch::Stage;

/// Install the Prometheus recorder and its scrape endpoint on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// Record one dispatched request.
pub fn record_request(controller: &'static str, method: &str, status: u16, start_time: Instant) {
    counter!(
        "dispatch_requests_total",
        "controller" => controller,
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!("dispatch_request_duration_seconds", "controller" => controller)
        .record(start_time.elapsed().as_secs_f64());
}

/// Record a failure routed to the exception handler.
pub fn record_unhandled(controller: &'static str, stage: Stage) {
    counter!(
        "dispatch_handler_errors_total",
        "controller" => controller,
        "stage" => stage.as_str()
    )
    .increment(1);
}
