//! Metrics: Prometheus exposition and in-process exchange counters
//!
//! Prometheus series:
//!
//! - `http_requests_total` (counter): labels `status`, `method`
//! - `http_request_duration_seconds` (histogram): label `status`
//! - `token_exchanges_total` (counter): label `outcome` (`success`, `rejected`, `error`)
//! - `admin_auth_failures_total` (counter)

use std::sync::Arc;
use std::sync::atomic::AtomicU64;

use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};

const DURATION_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

fn builder() -> Result<PrometheusBuilder, BuildError> {
    PrometheusBuilder::new().set_buckets_for_metric(
        Matcher::Full("http_request_duration_seconds".to_string()),
        DURATION_BUCKETS,
    )
}

/// Install the global Prometheus recorder and return a handle for `/metrics`.
///
/// Request durations render as a histogram (`_bucket` lines) rather than the
/// exporter's default summary.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    builder()?.install_recorder()
}

/// Record a completed inbound request.
pub fn record_request(status: u16, method: &str, duration_secs: f64) {
    let status_str = status.to_string();
    metrics::counter!("http_requests_total", "status" => status_str.clone(), "method" => method.to_string())
        .increment(1);
    metrics::histogram!("http_request_duration_seconds", "status" => status_str)
        .record(duration_secs);
}

/// Record the end of a background token exchange.
pub fn record_exchange(outcome: &'static str) {
    metrics::counter!("token_exchanges_total", "outcome" => outcome).increment(1);
}

/// Record a rejected Basic-auth attempt on the admin path.
pub fn record_auth_failure() {
    metrics::counter!("admin_auth_failures_total").increment(1);
}

/// Counters for background token exchanges.
///
/// `started` is bumped when a task is spawned; exactly one of `completed`
/// (any HTTP response) or `failed` (no response) is bumped when it ends.
#[derive(Debug, Clone, Default)]
pub struct ExchangeMetrics {
    pub started: Arc<AtomicU64>,
    pub completed: Arc<AtomicU64>,
    pub failed: Arc<AtomicU64>,
}

impl ExchangeMetrics {
    pub fn new() -> Self {
        Self::default()
    }
}
