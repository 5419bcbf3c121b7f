//! Prometheus metrics for request counts and upstream latency.
//!
//! This module provides metrics for:
//! - Requests per route
//! - Outbound call latency and failures
//! - Rejected and accepted `/process` payloads

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use tracing::debug;

// === Metric Name Constants ===

/// Requests handled, labelled by route.
pub const METRIC_HTTP_REQUESTS: &str = "http_requests_total";
/// Upstream fetch latency metric name.
pub const METRIC_UPSTREAM_LATENCY: &str = "upstream_fetch_latency_ms";
/// Upstream fetch failures counter metric name.
pub const METRIC_UPSTREAM_FAILURES: &str = "upstream_fetch_failures_total";
/// Rejected `/process` payloads counter metric name.
pub const METRIC_PROCESS_REJECTED: &str = "process_rejected_total";
/// Canonical size of accepted `/process` payloads.
pub const METRIC_PROCESS_INPUT_BYTES: &str = "process_input_bytes";

/// Initialize all metric descriptions.
/// Call this once at startup to register metrics with descriptions.
pub fn init_metrics() {
    describe_counter!(
        METRIC_HTTP_REQUESTS,
        "Total number of HTTP requests handled, by route"
    );
    describe_histogram!(
        METRIC_UPSTREAM_LATENCY,
        "Upstream fetch latency in milliseconds"
    );
    describe_counter!(
        METRIC_UPSTREAM_FAILURES,
        "Total number of failed upstream fetches"
    );
    describe_counter!(
        METRIC_PROCESS_REJECTED,
        "Total number of /process requests without usable JSON"
    );
    describe_histogram!(
        METRIC_PROCESS_INPUT_BYTES,
        "Canonical JSON size of accepted /process payloads in bytes"
    );

    debug!("Metrics initialized");
}

/// Install the Prometheus exporter on its own listener.
///
/// Must be called from within a Tokio runtime.
pub fn install_exporter(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()
}

/// Count a request for a route.
pub fn record_request(route: &'static str) {
    counter!(METRIC_HTTP_REQUESTS, "route" => route).increment(1);
}

/// Record upstream fetch latency.
pub fn record_upstream_latency(start: Instant) {
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    histogram!(METRIC_UPSTREAM_LATENCY).record(latency_ms);
}

/// Count a failed upstream fetch.
pub fn record_upstream_failure() {
    counter!(METRIC_UPSTREAM_FAILURES).increment(1);
}

/// Count a rejected `/process` payload.
pub fn record_process_rejected() {
    counter!(METRIC_PROCESS_REJECTED).increment(1);
}

/// Record the canonical size of an accepted payload.
pub fn record_process_input(bytes: usize) {
    histogram!(METRIC_PROCESS_INPUT_BYTES).record(bytes as f64);
}
