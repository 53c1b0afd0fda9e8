//! Metrics collection and exposition.
//!
//! # Metrics
//! - `vhost_operations_total` (counter): engine operations by `operation`, `outcome`
//! - `vhost_reloads_total` (counter): reload attempts by `outcome`
//!   (`applied`, `invalid`, `failed`)

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Count one engine operation. `outcome` is `ok` or a stable error code.
pub fn record_operation(operation: &'static str, outcome: &'static str) {
    metrics::counter!(
        "vhost_operations_total",
        "operation" => operation,
        "outcome" => outcome
    )
    .increment(1);
}

/// Count one reload attempt.
pub fn record_reload(outcome: &'static str) {
    metrics::counter!("vhost_reloads_total", "outcome" => outcome).increment(1);
}

/// Install the Prometheus exporter on `addr`. Must run inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}
