//! Metrics collection and exposition.
//!
//! # Metrics
//! - `lookup_requests_total` (counter): lookups by source and outcome
//! - `lookup_request_duration_seconds` (histogram): lookup latency
//! - `lookup_write_back_total` (counter): store fills by outcome
//! - `lookup_breaker_state` (gauge): 0=closed, 1=open, 2=half-open
//! - `lookup_breaker_transitions_total` (counter): breaker transitions
//! - `lookup_breaker_rejections_total` (counter): calls shed by a breaker

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record a finished lookup.
pub fn record_lookup(source: &'static str, outcome: &'static str, start: Instant) {
    counter!("lookup_requests_total", "source" => source, "outcome" => outcome).increment(1);
    histogram!("lookup_request_duration_seconds", "source" => source)
        .record(start.elapsed().as_secs_f64());
}

/// Record the outcome of a detached write-back.
pub fn record_write_back(outcome: &'static str) {
    counter!("lookup_write_back_total", "outcome" => outcome).increment(1);
}
