//! Prometheus metrics
//!
//! The recorder is installed at most once per process; `/metrics` renders
//! from the stored handle and returns 404 when metrics are disabled.

use axum::{http::StatusCode, response::IntoResponse};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

static HANDLE: OnceCell<Option<PrometheusHandle>> = OnceCell::new();

/// Install the Prometheus recorder
///
/// Returns `None` if another recorder was installed first.
pub fn init_metrics() -> Option<PrometheusHandle> {
    HANDLE
        .get_or_init(|| match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => Some(handle),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install Prometheus recorder");
                None
            }
        })
        .clone()
}

pub fn record_request(endpoint: &'static str) {
    metrics::counter!("pastport_requests_total", "endpoint" => endpoint).increment(1);
}

pub fn record_error(kind: &'static str) {
    metrics::counter!("pastport_errors_total", "kind" => kind).increment(1);
}

pub async fn metrics_handler() -> impl IntoResponse {
    match HANDLE.get().and_then(Option::as_ref) {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (StatusCode::NOT_FOUND, "metrics disabled".to_string()),
    }
}
