//! Metrics collection and exposition.
//!
//! # Metrics
//! - `randomness_requests_total` (counter): requests by mode, kind, outcome
//! - `randomness_request_duration_seconds` (histogram): end-to-end latency by mode
//! - `wallet_session_handshakes_total` (counter): handshakes by outcome
//! - `wallet_network_switches_total` (counter): switch attempts by outcome
//! - `randomness_confirmation_polls_total` (counter): receipt polls
//!
//! Recording is a no-op until a recorder is installed.

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Duration;

/// Install the Prometheus exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a finished randomness request.
pub fn record_request(mode: &'static str, kind: &'static str, outcome: &'static str, elapsed: Duration) {
    metrics::counter!(
        "randomness_requests_total",
        "mode" => mode,
        "kind" => kind,
        "outcome" => outcome
    )
    .increment(1);
    metrics::histogram!("randomness_request_duration_seconds", "mode" => mode)
        .record(elapsed.as_secs_f64());
}

/// Record a wallet session handshake.
pub fn record_handshake(outcome: &'static str) {
    metrics::counter!("wallet_session_handshakes_total", "outcome" => outcome).increment(1);
}

/// Record a network switch attempt.
pub fn record_network_switch(outcome: &'static str) {
    metrics::counter!("wallet_network_switches_total", "outcome" => outcome).increment(1);
}

/// Record one receipt poll.
pub fn record_confirmation_poll() {
    metrics::counter!("randomness_confirmation_polls_total").increment(1);
}
