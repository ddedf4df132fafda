//! Metrics collection and exposition.
//!
//! # Metrics
//! - `dynamic_config_requests_total` (counter): polls by result (hit, miss, error)
//! - `dynamic_config_request_duration_seconds` (histogram): poll latency
//! - `dynamic_config_reloads_total` (counter): schedule file reloads by outcome
//! - `dynamic_config_upstream_requests_total` (counter): upstream round trips by outcome

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_request(result: &'static str, start: Instant) {
    metrics::counter!("dynamic_config_requests_total", "result" => result).increment(1);
    metrics::histogram!("dynamic_config_request_duration_seconds")
        .record(start.elapsed().as_secs_f64());
}

pub fn record_reload(success: bool) {
    let outcome = if success { "success" } else { "failure" };
    metrics::counter!("dynamic_config_reloads_total", "outcome" => outcome).increment(1);
}

pub fn record_upstream(success: bool) {
    let outcome = if success { "success" } else { "failure" };
    metrics::counter!("dynamic_config_upstream_requests_total", "outcome" => outcome)
        .increment(1);
}
