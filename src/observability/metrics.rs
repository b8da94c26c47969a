//! Metrics collection and exposition.
//!
//! # Metrics
//! - `frontend_requests_total` (counter): requests by method, status
//! - `frontend_request_duration_seconds` (histogram): latency distribution
//! - `frontend_rate_limited_total` (counter): requests rejected with 429
//! - `frontend_upstream_failures_total` (counter): failed upstream calls by operation
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) -> anyhow::Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow::anyhow!("failed to install Prometheus exporter on {addr}: {e}"))?;

    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("status", status.to_string()),
    ];
    metrics::counter!("frontend_requests_total", &labels).increment(1);
    metrics::histogram!("frontend_request_duration_seconds", &labels)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_rate_limited() {
    metrics::counter!("frontend_rate_limited_total").increment(1);
}

pub fn record_upstream_failure(operation: &'static str) {
    metrics::counter!("frontend_upstream_failures_total", "operation" => operation).increment(1);
}
