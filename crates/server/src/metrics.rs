//! Application metrics for Prometheus monitoring.
//!
//! This module provides:
//! - Prometheus metrics recorder initialization
//! - Metric definitions (counters, histograms, gauges)
//! - Helper functions for recording job and recognition metrics
//!
//! Recording before `init_metrics` (e.g. in tests) is a no-op.

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::Duration;

/// Global Prometheus handle for rendering metrics.
static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize the Prometheus metrics recorder.
///
/// Call once at startup, before any metrics are recorded.
/// Returns `true` if initialization succeeded, `false` if already initialized.
pub fn init_metrics() -> bool {
    if PROMETHEUS_HANDLE.get().is_some() {
        return false;
    }

    let recorder = PrometheusBuilder::new().build_recorder();
    let handle = recorder.handle();

    if metrics::set_global_recorder(recorder).is_err() {
        tracing::warn!("Failed to set global metrics recorder (already set)");
        return false;
    }

    if PROMETHEUS_HANDLE.set(handle).is_err() {
        tracing::warn!("Failed to store Prometheus handle (already set)");
    }

    describe_metrics();

    tracing::info!("Prometheus metrics initialized");
    true
}

fn describe_metrics() {
    describe_counter!("ocr_jobs_submitted_total", "Recognition jobs accepted by the registry");
    describe_counter!(
        "ocr_jobs_finished_total",
        "Recognition jobs that reached a terminal state, by status"
    );
    describe_histogram!(
        "ocr_recognition_duration_seconds",
        "Wall time from job start to terminal state, or of a synchronous recognition"
    );
    describe_gauge!("ocr_jobs_active", "Jobs currently pending or running");
    describe_counter!(
        "ocr_legacy_submissions_total",
        "Uploads to the single-slot /infer endpoint"
    );
}

/// Render current metrics in Prometheus text format.
///
/// Returns `None` if metrics are not initialized.
pub fn render_metrics() -> Option<String> {
    PROMETHEUS_HANDLE.get().map(|h| h.render())
}

/// Record a job entering the registry.
pub fn record_job_submitted() {
    counter!("ocr_jobs_submitted_total").increment(1);
    gauge!("ocr_jobs_active").increment(1.0);
}

/// Record a job reaching a terminal state.
///
/// # Arguments
/// * `status` - Terminal status ("completed", "failed", "cancelled")
/// * `duration` - Time from job start to the terminal transition
pub fn record_job_finished(status: &str, duration: Duration) {
    counter!("ocr_jobs_finished_total", "status" => status.to_string()).increment(1);
    gauge!("ocr_jobs_active").decrement(1.0);
    histogram!("ocr_recognition_duration_seconds", "mode" => "job").record(duration.as_secs_f64());
}

/// Record a synchronous `/api/recognize` call.
pub fn record_sync_recognition(ok: bool, duration: Duration) {
    let outcome = if ok { "ok" } else { "error" };
    histogram!("ocr_recognition_duration_seconds", "mode" => "sync", "outcome" => outcome)
        .record(duration.as_secs_f64());
}

/// Record an upload to the legacy single-slot endpoint.
pub fn record_legacy_submission() {
    counter!("ocr_legacy_submissions_total").increment(1);
}
