//! Metrics collection and exposition.
//!
//! # Metrics
//! - `coma_connect_attempts_total` (counter): handshake attempts by outcome
//! - `coma_reconnects_total` (counter): in-place reconnections after stream end
//! - `coma_frames_received_total` (counter): payload frames merged into a target
//! - `coma_decode_failures_total` (counter): frames that failed to decode
//! - `coma_observer_running` (gauge): 1 while an observer loop is alive
//!
//! Without an installed recorder these calls are no-ops.

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus exporter with an HTTP scrape listener on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_connect_attempt(outcome: &'static str) {
    counter!("coma_connect_attempts_total", "outcome" => outcome).increment(1);
}

pub fn record_reconnect() {
    counter!("coma_reconnects_total").increment(1);
}

pub fn record_frame_received() {
    counter!("coma_frames_received_total").increment(1);
}

pub fn record_decode_failure() {
    counter!("coma_decode_failures_total").increment(1);
}

pub fn set_observer_running(running: bool) {
    gauge!("coma_observer_running").set(if running { 1.0 } else { 0.0 });
}
