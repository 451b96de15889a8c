//! Metrics collection and exposition.
//!
//! # Metrics
//! - `jail_connections_total` (counter): finished connections by outcome
//! - `jail_open_connections` (gauge): currently admitted connections
//! - `jail_pow_verify_duration_seconds` (histogram): solution check time
//! - `jail_accept_errors_total` (counter): failed accepts
//!
//! Recording is a no-op until `init_metrics` installs the exporter.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_connection(outcome: &'static str) {
    counter!("jail_connections_total", "outcome" => outcome).increment(1);
}

pub fn record_open_connections(open: u32) {
    gauge!("jail_open_connections").set(f64::from(open));
}

pub fn record_verify(started: Instant) {
    histogram!("jail_pow_verify_duration_seconds").record(started.elapsed().as_secs_f64());
}

pub fn record_accept_error() {
    counter!("jail_accept_errors_total").increment(1);
}
