//! Metrics collection and Prometheus export.
//!
//! Installs the Prometheus recorder and renders its text for `/metrics`.
//! Recording helpers are no-ops until [`init_metrics`] has run, which keeps
//! tests free of global recorder setup.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use service_core::error::AppError;
use std::sync::OnceLock;
use std::time::Duration;

/// Global handle to the Prometheus recorder.
pub static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the Prometheus recorder. Calling it again is a no-op.
pub fn init_metrics() -> Result<(), AppError> {
    if METRICS_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new().install_recorder().map_err(|e| {
        AppError::InternalError(anyhow::anyhow!("failed to install Prometheus recorder: {}", e))
    })?;

    let _ = METRICS_HANDLE.set(handle);
    Ok(())
}

/// Get the current metrics in Prometheus text format.
pub fn get_metrics() -> String {
    METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized\n".to_string())
}

/// Count a finished `/chat` dispatch.
pub fn record_chat_request(bot: &'static str, outcome: &'static str) {
    counter!("chat_requests_total", "bot" => bot, "outcome" => outcome).increment(1);
}

/// Count a local-to-cloud fallback.
pub fn record_fallback(from: &'static str, to: &'static str) {
    counter!("chat_fallbacks_total", "from" => from, "to" => to).increment(1);
}

/// Record latency and outcome of a single backend call.
pub fn record_backend_call(backend: &'static str, outcome: &'static str, elapsed: Duration) {
    counter!("backend_requests_total", "backend" => backend, "outcome" => outcome).increment(1);
    histogram!("backend_request_duration_seconds", "backend" => backend)
        .record(elapsed.as_secs_f64());
}
