//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): forwarded requests by method, status
//! - `gateway_request_duration_seconds` (histogram): forward latency
//! - `gateway_rejections_total` (counter): policy rejections by reason
//!
//! # Design Decisions
//! - The Prometheus exporter runs on its own listener, outside the policed
//!   surface
//! - Recording is fire-and-forget; without an installed exporter the
//!   macros are no-ops, so tests need no metrics setup

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter started"),
        Err(e) => tracing::error!(error = %e, "Failed to start metrics exporter"),
    }
}

/// Record one forwarded request.
pub fn record_request(method: &str, status: u16, start: Instant) {
    counter!(
        "gateway_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("gateway_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

/// Record a request rejected by a policy stage.
pub fn record_rejected(reason: &'static str) {
    counter!("gateway_rejections_total", "reason" => reason).increment(1);
}
