//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by route, status
//! - `gateway_request_duration_seconds` (histogram): latency by route
//! - `gateway_upstream_failures_total` (counter): failed backend calls by route, kind
//!
//! # Design Decisions
//! - Macros are no-ops until an exporter is installed
//! - The Prometheus exporter only starts when an address is configured

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Route label for requests served from the asset bundle.
pub const STATIC_ROUTE: &str = "static";

/// Start the Prometheus scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to start metrics exporter"),
    }
}

/// Record one handled request.
pub fn record_request(route: &'static str, status: u16, start: Instant) {
    metrics::counter!(
        "gateway_requests_total",
        "route" => route,
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("gateway_request_duration_seconds", "route" => route)
        .record(start.elapsed().as_secs_f64());
}

/// Record a backend call that produced a gateway-failure response.
pub fn record_upstream_failure(route: &'static str, kind: &'static str) {
    metrics::counter!(
        "gateway_upstream_failures_total",
        "route" => route,
        "kind" => kind
    )
    .increment(1);
}
