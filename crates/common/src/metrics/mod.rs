//! Metrics and observability utilities
//!
//! Prometheus metrics with standardized naming. The API installs the
//! Prometheus recorder; tasks record into whatever recorder is active.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use std::time::Instant;

/// Metrics prefix for all Athena metrics
pub const METRICS_PREFIX: &str = "athena";

/// Histogram buckets for request latency (in seconds)
pub const LATENCY_BUCKETS: &[f64] = &[
    0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.000, 2.500, 5.000, 10.00,
];

/// Buckets for LLM latency (much slower than plain requests)
pub const LLM_BUCKETS: &[f64] = &[0.5, 1.0, 2.0, 5.0, 10.0, 20.0, 30.0, 60.0, 120.0];

/// Histogram buckets for whole job runs (seconds)
pub const JOB_BUCKETS: &[f64] = &[1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1800.0];

/// Register all metric descriptions
pub fn register_metrics() {
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

    describe_counter!(
        format!("{}_job_runs_total", METRICS_PREFIX),
        Unit::Count,
        "Scheduled job executions by outcome"
    );

    describe_histogram!(
        format!("{}_job_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Scheduled job duration in seconds"
    );

    describe_counter!(
        format!("{}_llm_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total Claude API requests"
    );

    describe_histogram!(
        format!("{}_llm_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Claude API latency in seconds"
    );

    describe_counter!(
        format!("{}_notifications_total", METRICS_PREFIX),
        Unit::Count,
        "Notifications sent by channel and outcome"
    );

    describe_counter!(
        format!("{}_opportunities_imported_total", METRICS_PREFIX),
        Unit::Count,
        "SAM.gov opportunities imported"
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

/// Record a scheduled job execution
pub fn record_job_run(job: &str, outcome: &str, duration_secs: f64) {
    counter!(
        format!("{}_job_runs_total", METRICS_PREFIX),
        "job" => job.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);

    histogram!(
        format!("{}_job_duration_seconds", METRICS_PREFIX),
        "job" => job.to_string()
    )
    .record(duration_secs);
}

/// Record a Claude API call
pub fn record_llm_request(model: &str, duration_secs: f64, success: bool) {
    let status = if success { "success" } else { "error" };

    counter!(
        format!("{}_llm_requests_total", METRICS_PREFIX),
        "model" => model.to_string(),
        "status" => status
    )
    .increment(1);

    if success {
        histogram!(
            format!("{}_llm_duration_seconds", METRICS_PREFIX),
            "model" => model.to_string()
        )
        .record(duration_secs);
    }
}

/// Record a Teams or email notification
pub fn record_notification(channel: &str, delivered: bool) {
    counter!(
        format!("{}_notifications_total", METRICS_PREFIX),
        "channel" => channel.to_string(),
        "delivered" => delivered.to_string()
    )
    .increment(1);
}

/// Record SAM.gov import results
pub fn record_import(loaded: usize) {
    counter!(format!("{}_opportunities_imported_total", METRICS_PREFIX)).increment(loaded as u64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buckets_sorted() {
        for buckets in [LATENCY_BUCKETS, LLM_BUCKETS] {
            let mut prev = 0.0;
            for &bucket in buckets {
                assert!(bucket > prev);
                prev = bucket;
            }
        }
    }

    #[test]
    fn test_recorders_without_exporter() {
        // No global recorder installed: calls must be no-ops
        let metrics = RequestMetrics::start("GET", "/api/opportunities");
        metrics.finish(200);
        record_job_run("weekly-digest", "success", 1.2);
        record_llm_request("claude-3-5-sonnet-20241022", 3.4, true);
        record_notification("teams", false);
        record_import(12);
    }
}
