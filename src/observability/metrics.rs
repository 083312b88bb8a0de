//! Metrics collection and exposition.
//!
//! # Metrics
//! - `bank_commands_total` (counter): commands by name and outcome
//! - `bank_active_connections` (gauge): live connection handlers
//! - `bank_active_sessions` (gauge): accounts bound to a connection
//! - `bank_snapshots_total` (counter): periodic snapshots taken
//! - `bank_snapshot_accounts` (gauge): accounts in the last snapshot
//! - `bank_accept_errors_total` (counter): failed accepts

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Install the Prometheus exporter with an HTTP listener on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_command(command: &'static str, outcome: &'static str) {
    counter!("bank_commands_total", "command" => command, "outcome" => outcome).increment(1);
}

pub fn set_active_connections(count: u64) {
    gauge!("bank_active_connections").set(count as f64);
}

pub fn record_session_started() {
    gauge!("bank_active_sessions").increment(1.0);
}

pub fn record_session_ended() {
    gauge!("bank_active_sessions").decrement(1.0);
}

pub fn record_snapshot(accounts: usize) {
    counter!("bank_snapshots_total").increment(1);
    gauge!("bank_snapshot_accounts").set(accounts as f64);
}

pub fn record_accept_error() {
    counter!("bank_accept_errors_total").increment(1);
}
