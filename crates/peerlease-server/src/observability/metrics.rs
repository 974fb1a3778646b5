//! Prometheus Metrics
//!
//! Defines and initializes all Prometheus metrics for the broker.
//!
//! Metrics tracked:
//! - `peerlease_lease_requests_total` - counter of lease requests by result
//! - `peerlease_lease_attempts_total` - counter of node attempts by outcome
//! - `peerlease_fanout_duration_seconds` - histogram of candidate fan-out time
//! - `peerlease_candidates_per_request` - histogram of candidate list sizes
//! - `peerlease_region_cache_lookups_total` - counter of region cache hits and misses

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// State containing the Prometheus handle for metrics export
#[derive(Clone)]
pub struct MetricsState {
    pub prometheus_handle: PrometheusHandle,
}

/// Initialize Prometheus metrics and return the handle for exporting.
pub fn init_metrics() -> Result<MetricsState, Box<dyn std::error::Error + Send + Sync>> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    register_metric_descriptions();

    Ok(MetricsState {
        prometheus_handle: handle,
    })
}

fn register_metric_descriptions() {
    describe_counter!(
        "peerlease_lease_requests_total",
        "Total number of lease requests by result"
    );
    describe_counter!(
        "peerlease_lease_attempts_total",
        "Total number of node lease attempts by outcome"
    );
    describe_histogram!(
        "peerlease_fanout_duration_seconds",
        "Time spent trying candidates for one request in seconds"
    );
    describe_histogram!(
        "peerlease_candidates_per_request",
        "Number of candidates returned by the directory per request"
    );
    describe_counter!(
        "peerlease_region_cache_lookups_total",
        "Region list lookups by cache result"
    );
}

/// Record the final result of a lease request
pub fn record_request(result: &'static str) {
    counter!("peerlease_lease_requests_total", "result" => result).increment(1);
}

/// Record one node attempt
pub fn record_attempt(outcome: &'static str) {
    counter!("peerlease_lease_attempts_total", "outcome" => outcome).increment(1);
}

/// Record a completed fan-out
pub fn record_fanout(candidates: usize, duration: Duration) {
    histogram!("peerlease_candidates_per_request").record(candidates as f64);
    histogram!("peerlease_fanout_duration_seconds").record(duration.as_secs_f64());
}

/// Record a region cache lookup
pub fn record_region_cache_lookup(hit: bool) {
    let result = if hit { "hit" } else { "miss" };
    counter!("peerlease_region_cache_lookups_total", "result" => result).increment(1);
}
