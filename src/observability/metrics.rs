//! Metrics collection and exposition.
//!
//! # Metrics
//! - `relay_requests_total` (counter): relay requests by outcome
//! - `relay_upstream_duration_seconds` (histogram): upstream call latency
//! - `relay_tracked_callers` (gauge): distinct callers per limit window
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade and is a no-op until an
//!   exporter is installed
//! - Prometheus exporter runs its own listener, separate from the relay

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::security::LevelUsage;

/// Install the Prometheus exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_outcome(outcome: &'static str) {
    counter!("relay_requests_total", "outcome" => outcome).increment(1);
}

pub fn record_upstream(start: Instant) {
    histogram!("relay_upstream_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_usage(usage: &[LevelUsage]) {
    for level in usage {
        gauge!("relay_tracked_callers", "window_secs" => level.window_secs.to_string())
            .set(level.total_callers as f64);
    }
}
