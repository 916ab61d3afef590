//! Prometheus metrics for the scanner.
//!
//! Counters and histograms for cache behavior, rate-gate waits, upstream
//! fetches, and delivery failures.

use metrics::{counter, histogram};

/// Record a cache hit.
pub fn record_cache_hit() {
    counter!("cache_hits_total").increment(1);
}

/// Record a cache miss.
pub fn record_cache_miss() {
    counter!("cache_misses_total").increment(1);
}

/// Record time spent waiting on the rate gate.
pub fn record_rate_wait(seconds: f64) {
    counter!("rate_gate_waits_total").increment(1);
    histogram!("rate_gate_wait_seconds").record(seconds);
}

/// Record the outcome of one fetch attempt.
pub fn record_fetch_attempt(outcome: &str) {
    counter!("fetch_attempts_total", "outcome" => outcome.to_string()).increment(1);
}

/// Record a completed scan.
pub fn record_scan(found: bool, duration_ms: u64) {
    counter!("scans_total", "found" => found.to_string()).increment(1);
    histogram!("scan_duration_ms").record(duration_ms as f64);
}

/// Record a failed chunk delivery.
pub fn record_delivery_failure() {
    counter!("delivery_failures_total").increment(1);
}

/// Install the Prometheus metrics exporter and return the recorder handle.
pub fn install_prometheus_recorder() -> metrics_exporter_prometheus::PrometheusHandle {
    let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    builder
        .install_recorder()
        .expect("failed to install Prometheus recorder")
}
