//! Metrics collection and exposition.
//!
//! # Metrics
//! - `pathcheck_results_total` (counter): completed checks by path, state
//! - `pathcheck_path_state` (gauge): last state code per path
//! - `pathcheck_timeouts_total` (counter): async probes that missed their deadline
//! - `pathcheck_abandoned_contexts_total` (counter): contexts left to a stray worker
//! - `pathcheck_sync_fallbacks_total` (counter): cycles probed inline after a spawn failure
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder every call is a no-op, so library users pay nothing
//! - The Prometheus exporter is only installed by the daemon

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

use crate::checker::PathState;

/// Install the Prometheus recorder and its HTTP listener.
///
/// Must be called from inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_check_result(path: &str, state: PathState) {
    metrics::counter!(
        "pathcheck_results_total",
        "path" => path.to_string(),
        "state" => state.as_str()
    )
    .increment(1);
    metrics::gauge!("pathcheck_path_state", "path" => path.to_string()).set(f64::from(state.code()));
}

pub fn record_timeout(device: &str) {
    metrics::counter!("pathcheck_timeouts_total", "device" => device.to_string()).increment(1);
}

pub fn record_abandoned_context(device: &str) {
    metrics::counter!("pathcheck_abandoned_contexts_total", "device" => device.to_string()).increment(1);
}

pub fn record_sync_fallback(device: &str) {
    metrics::counter!("pathcheck_sync_fallbacks_total", "device" => device.to_string()).increment(1);
}
