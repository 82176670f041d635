//! Metrics and observability utilities
//!
//! Prometheus metrics under a shared prefix. Recording is a no-op until the
//! gateway installs a recorder.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use std::time::Instant;

/// Metrics prefix for all MathForge metrics
pub const METRICS_PREFIX: &str = "mathforge";

/// Histogram buckets for HTTP request latency (in seconds)
pub const LATENCY_BUCKETS: &[f64] = &[
    0.001, // 1ms
    0.005, // 5ms
    0.010, // 10ms
    0.025, // 25ms
    0.050, // 50ms
    0.100, // 100ms
    0.250, // 250ms
    0.500, // 500ms
    1.000, // 1s
    2.500, // 2.5s
    5.000, // 5s
    10.00, // 10s
    30.00, // 30s
];

/// Buckets for explanation latency (model inference is slow)
pub const EXPLANATION_BUCKETS: &[f64] = &[
    0.050, // 50ms
    0.250, // 250ms
    0.500, // 500ms
    1.000, // 1s
    2.000, // 2s
    5.000, // 5s
    10.00, // 10s
    20.00, // 20s
    30.00, // 30s
    60.00, // 60s
];

/// Register all metric descriptions
pub fn register_metrics() {
    // Request metrics
    describe_counter!(
        format!("{}_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of HTTP requests"
    );

    describe_histogram!(
        format!("{}_request_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "HTTP request latency in seconds"
    );

    // Pipeline metrics
    describe_counter!(
        format!("{}_questions_total", METRICS_PREFIX),
        Unit::Count,
        "Questions handled, by problem category"
    );

    describe_counter!(
        format!("{}_solver_diagnostics_total", METRICS_PREFIX),
        Unit::Count,
        "Questions answered with a diagnostic instead of a result"
    );

    // Explanation metrics
    describe_histogram!(
        format!("{}_explanation_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Explanation generation latency in seconds"
    );

    describe_counter!(
        format!("{}_explanation_failures_total", METRICS_PREFIX),
        Unit::Count,
        "Explanation calls that failed or timed out"
    );

    tracing::info!("Metrics registered");
}

/// Helper to record request metrics
pub struct RequestMetrics {
    start: Instant,
    endpoint: String,
    method: String,
}

impl RequestMetrics {
    /// Start tracking a request
    pub fn start(method: &str, endpoint: &str) -> Self {
        Self {
            start: Instant::now(),
            endpoint: endpoint.to_string(),
            method: method.to_string(),
        }
    }

    /// Record request completion
    pub fn finish(self, status: u16) {
        let duration = self.start.elapsed().as_secs_f64();

        counter!(
            format!("{}_requests_total", METRICS_PREFIX),
            "method" => self.method.clone(),
            "endpoint" => self.endpoint.clone(),
            "status" => status.to_string()
        )
        .increment(1);

        histogram!(
            format!("{}_request_duration_seconds", METRICS_PREFIX),
            "method" => self.method,
            "endpoint" => self.endpoint
        )
        .record(duration);
    }
}

/// Record one classified question and whether it ended in a diagnostic
pub fn record_question(category: &str, diagnostic: bool) {
    counter!(
        format!("{}_questions_total", METRICS_PREFIX),
        "category" => category.to_string()
    )
    .increment(1);

    if diagnostic {
        counter!(
            format!("{}_solver_diagnostics_total", METRICS_PREFIX),
            "category" => category.to_string()
        )
        .increment(1);
    }
}

/// Record one explanation call; `failure` carries the reason label
pub fn record_explanation(duration_secs: f64, provider: &str, failure: Option<&str>) {
    let status = if failure.is_none() { "success" } else { "error" };

    histogram!(
        format!("{}_explanation_duration_seconds", METRICS_PREFIX),
        "provider" => provider.to_string(),
        "status" => status
    )
    .record(duration_secs);

    if let Some(reason) = failure {
        counter!(
            format!("{}_explanation_failures_total", METRICS_PREFIX),
            "provider" => provider.to_string(),
            "reason" => reason.to_string()
        )
        .increment(1);
    }
}
