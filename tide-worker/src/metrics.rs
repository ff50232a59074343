//! Prometheus metrics collection for the worker

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the Prometheus recorder; idempotent per process
pub fn init_prometheus() -> Result<(), BuildError> {
    if HANDLE.get().is_some() {
        return Ok(());
    }
    let handle = PrometheusBuilder::new().install_recorder()?;
    let _ = HANDLE.set(handle);
    Ok(())
}

/// Initialize all metric descriptions
pub fn init_metrics() {
    describe_counter!("tide_reason_calls_total", "Total number of reason calls");
    describe_counter!(
        "tide_reason_failures_total",
        "Total number of failed reason calls"
    );
    describe_counter!(
        "tide_mutations_total",
        "Total number of fact/rule mutations accepted"
    );

    describe_histogram!(
        "tide_reason_latency_seconds",
        "Local reasoning latency in seconds"
    );
    describe_histogram!(
        "tide_derived_facts",
        "Derived facts reported per reason call"
    );

    describe_gauge!("tide_loaded_rules_count", "Number of loaded rules");
    describe_gauge!("tide_loaded_facts_count", "Number of loaded base facts");
}

/// Record a reason call
pub fn record_reason(success: bool, latency_seconds: f64, derived: usize) {
    counter!("tide_reason_calls_total", 1);
    if !success {
        counter!("tide_reason_failures_total", 1);
    }
    histogram!("tide_reason_latency_seconds", latency_seconds);
    histogram!("tide_derived_facts", derived as f64);
}

/// Record an accepted mutation
pub fn record_mutation(kind: &str, count: usize) {
    counter!("tide_mutations_total", count as u64, "kind" => kind.to_string());
}

/// Update gauges from worker counters
pub fn update_worker_metrics(rules: usize, facts: usize) {
    gauge!("tide_loaded_rules_count", rules as f64);
    gauge!("tide_loaded_facts_count", facts as f64);
}

/// Render the current metrics in Prometheus exposition format
pub fn get_prometheus_metrics() -> String {
    HANDLE.get().map(|h| h.render()).unwrap_or_default()
}
