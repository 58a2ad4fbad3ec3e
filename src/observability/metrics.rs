//! Metrics collection and exposition.
//!
//! # Metrics
//! - `wirefault_behaviors_total` (counter): served behaviors by name
//! - `wirefault_raw_outcomes_total` (counter): raw frames by behavior and
//!   final writer state
//! - `wirefault_connections_total` (counter): connections by dispatch mode
//! - `wirefault_websocket_sessions_active` (gauge): open echo sessions
//! - `wirefault_rotation_value` (gauge): last value served by the rotation
//!   counter
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its HTTP scrape listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_behavior(behavior: &'static str) {
    counter!("wirefault_behaviors_total", "behavior" => behavior).increment(1);
}

pub fn record_raw_outcome(behavior: &'static str, state: &'static str) {
    counter!("wirefault_raw_outcomes_total", "behavior" => behavior, "state" => state).increment(1);
}

pub fn record_connection(mode: &'static str) {
    counter!("wirefault_connections_total", "mode" => mode).increment(1);
}

pub fn websocket_session_opened() {
    gauge!("wirefault_websocket_sessions_active").increment(1.0);
}

pub fn websocket_session_closed() {
    gauge!("wirefault_websocket_sessions_active").decrement(1.0);
}

pub fn record_rotation(value: u64) {
    gauge!("wirefault_rotation_value").set(value as f64);
}
