//! Metrics collection and exposition.
//!
//! # Metrics
//! - `rpc_requests_total` (counter): RPC attempts by method, outcome
//! - `rpc_retries_total` (counter): retries of idempotent reads by method
//! - `tx_submissions_total` (counter): submissions by outcome
//! - `tx_confirmations_total` (counter): confirmation waits by outcome

use std::net::SocketAddr;

use metrics::counter;
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with an HTTP scrape listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_rpc_attempt(method: &'static str, outcome: &'static str) {
    counter!("rpc_requests_total", "method" => method, "outcome" => outcome).increment(1);
}

pub fn record_rpc_retry(method: &'static str) {
    counter!("rpc_retries_total", "method" => method).increment(1);
}

pub fn record_submission(outcome: &'static str) {
    counter!("tx_submissions_total", "outcome" => outcome).increment(1);
}

pub fn record_confirmation(outcome: &'static str) {
    counter!("tx_confirmations_total", "outcome" => outcome).increment(1);
}
