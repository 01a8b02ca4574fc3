//! Metrics recording implementation using Prometheus.

use prometheus::{
    CounterVec, Encoder, Gauge, HistogramVec, Opts, Registry, TextEncoder,
    register_counter_vec_with_registry, register_gauge_with_registry,
    register_histogram_vec_with_registry,
};
use std::sync::Arc;

/// Trait for recording load test metrics.
pub trait MetricsRecorder: Clone + Send + Sync + 'static {
    /// Records one HTTP exchange with the identity provider.
    fn record_request(&self, step: &str, status: &str, duration_secs: f64);

    /// Records the outcome of a named status check (e.g. "token exchange status == 200").
    fn record_check(&self, check: &str, passed: bool);

    /// Records one scenario iteration; `success == false` feeds the error rate.
    fn record_iteration(&self, scenario: &str, success: bool);

    /// Records an intermediate step of the refresh -> re-login escalation.
    fn record_escalation(&self, kind: &str, stage: &str, success: bool);
}

/// Prometheus metrics collector.
#[derive(Clone)]
pub struct Metrics {
    registry: Arc<Registry>,

    // Protocol metrics
    requests_total: CounterVec,
    request_duration_seconds: HistogramVec,
    checks_total: CounterVec,

    // Scenario metrics
    iterations_total: CounterVec,
    escalations_total: CounterVec,
    iteration_error_rate: Gauge,
}

fn result_label(success: bool) -> &'static str {
    if success {
        "success"
    } else {
        "failure"
    }
}

impl Metrics {
    /// Creates a new metrics instance with its own Prometheus registry.
    pub fn new() -> Self {
        let registry = Arc::new(Registry::new());

        let requests_total = register_counter_vec_with_registry!(
            Opts::new(
                "oidc_requests_total",
                "Total number of requests sent to the identity provider"
            ),
            &["step", "status"],
            registry.clone()
        )
        .expect("Failed to register oidc_requests_total");

        let request_duration_seconds = register_histogram_vec_with_registry!(
            "oidc_request_duration_seconds",
            "Identity provider response time in seconds",
            &["step"],
            vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0],
            registry.clone()
        )
        .expect("Failed to register oidc_request_duration_seconds");

        let checks_total = register_counter_vec_with_registry!(
            Opts::new("oidc_checks_total", "Status checks per check name and result"),
            &["check", "result"],
            registry.clone()
        )
        .expect("Failed to register oidc_checks_total");

        let iterations_total = register_counter_vec_with_registry!(
            Opts::new("oidc_iterations_total", "Scenario iterations per result"),
            &["scenario", "result"],
            registry.clone()
        )
        .expect("Failed to register oidc_iterations_total");

        let escalations_total = register_counter_vec_with_registry!(
            Opts::new(
                "oidc_escalations_total",
                "Refresh and re-login attempts triggered by rejected probes"
            ),
            &["kind", "stage", "result"],
            registry.clone()
        )
        .expect("Failed to register oidc_escalations_total");

        let iteration_error_rate = register_gauge_with_registry!(
            Opts::new(
                "oidc_iteration_error_rate",
                "Failed iterations over all iterations, published at the end of a run"
            ),
            registry.clone()
        )
        .expect("Failed to register oidc_iteration_error_rate");

        Metrics {
            registry,
            requests_total,
            request_duration_seconds,
            checks_total,
            iterations_total,
            escalations_total,
            iteration_error_rate,
        }
    }

    /// Number of iterations recorded for `scenario` with the given result.
    pub fn iterations(&self, scenario: &str, success: bool) -> u64 {
        self.iterations_total
            .with_label_values(&[scenario, result_label(success)])
            .get() as u64
    }

    /// Number of checks recorded under `check` with the given result.
    pub fn checks(&self, check: &str, passed: bool) -> u64 {
        self.checks_total
            .with_label_values(&[check, result_label(passed)])
            .get() as u64
    }

    /// Fraction of failed iterations over all scenarios, 0.0 when nothing ran.
    pub fn error_rate(&self) -> f64 {
        let mut total = 0.0;
        let mut failed = 0.0;
        for family in self.registry.gather() {
            if family.get_name() != "oidc_iterations_total" {
                continue;
            }
            for metric in family.get_metric() {
                let value = metric.get_counter().get_value();
                total += value;
                if metric
                    .get_label()
                    .iter()
                    .any(|l| l.get_name() == "result" && l.get_value() == "failure")
                {
                    failed += value;
                }
            }
        }
        if total == 0.0 {
            0.0
        } else {
            failed / total
        }
    }

    /// Sets `oidc_iteration_error_rate` from the iteration counters and returns it.
    pub fn publish_error_rate(&self) -> f64 {
        let rate = self.error_rate();
        self.iteration_error_rate.set(rate);
        rate
    }

    /// Renders all metrics in Prometheus text format.
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .expect("Failed to encode metrics");
        String::from_utf8(buffer).expect("Metrics encoding produced invalid UTF-8")
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsRecorder for Metrics {
    fn record_request(&self, step: &str, status: &str, duration_secs: f64) {
        self.requests_total.with_label_values(&[step, status]).inc();
        self.request_duration_seconds
            .with_label_values(&[step])
            .observe(duration_secs);
    }

    fn record_check(&self, check: &str, passed: bool) {
        self.checks_total
            .with_label_values(&[check, result_label(passed)])
            .inc();
    }

    fn record_iteration(&self, scenario: &str, success: bool) {
        self.iterations_total
            .with_label_values(&[scenario, result_label(success)])
            .inc();
    }

    fn record_escalation(&self, kind: &str, stage: &str, success: bool) {
        self.escalations_total
            .with_label_values(&[kind, stage, result_label(success)])
            .inc();
    }
}
