//! Prometheus Metrics Definitions
//!
//! Exposes a /metrics endpoint for Prometheus scraping.

use axum::{http::StatusCode, response::IntoResponse};
use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, Encoder, HistogramVec, TextEncoder,
};

use crate::error::{ApiError, ApiResult};

/// HTTP request latency buckets (seconds)
const HTTP_LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0, 2.5, 5.0, 10.0,
];

/// Global metrics instance - initialized on first use
pub static METRICS: Lazy<ApiResult<EstateMetrics>> = Lazy::new(EstateMetrics::new);

/// Container for all EstateHub metrics.
#[derive(Clone)]
pub struct EstateMetrics {
    /// labels: method, path, status
    pub http_requests_total: CounterVec,

    /// labels: method, path
    pub http_request_duration_seconds: HistogramVec,

    /// labels: from, to
    pub deal_stage_transitions_total: CounterVec,

    /// labels: kind (photo/document), outcome (stored/rejected)
    pub uploads_total: CounterVec,
}

fn registration_error(name: &str, err: prometheus::Error) -> ApiError {
    ApiError::internal_error(format!("Failed to register {}: {}", name, err))
}

impl EstateMetrics {
    /// Create and register all metrics with the default Prometheus registry.
    pub fn new() -> ApiResult<Self> {
        Ok(Self {
            http_requests_total: register_counter_vec!(
                "estatehub_http_requests_total",
                "Total number of HTTP requests",
                &["method", "path", "status"]
            )
            .map_err(|e| registration_error("http_requests_total", e))?,

            http_request_duration_seconds: register_histogram_vec!(
                "estatehub_http_request_duration_seconds",
                "HTTP request duration in seconds",
                &["method", "path"],
                HTTP_LATENCY_BUCKETS.to_vec()
            )
            .map_err(|e| registration_error("http_request_duration_seconds", e))?,

            deal_stage_transitions_total: register_counter_vec!(
                "estatehub_deal_stage_transitions_total",
                "Committed deal stage transitions",
                &["from", "to"]
            )
            .map_err(|e| registration_error("deal_stage_transitions_total", e))?,

            uploads_total: register_counter_vec!(
                "estatehub_uploads_total",
                "Multipart uploads by kind and outcome",
                &["kind", "outcome"]
            )
            .map_err(|e| registration_error("uploads_total", e))?,
        })
    }

    pub fn record_http_request(&self, method: &str, path: &str, status: u16, duration_secs: f64) {
        let status_str = status.to_string();
        self.http_requests_total
            .with_label_values(&[method, path, status_str.as_str()])
            .inc();
        self.http_request_duration_seconds
            .with_label_values(&[method, path])
            .observe(duration_secs);
    }

    pub fn record_stage_transition(&self, from: &str, to: &str) {
        self.deal_stage_transitions_total
            .with_label_values(&[from, to])
            .inc();
    }

    pub fn record_upload(&self, kind: &str, stored: bool) {
        let outcome = if stored { "stored" } else { "rejected" };
        self.uploads_total.with_label_values(&[kind, outcome]).inc();
    }
}

/// Run `f` against the global metrics, if they registered.
pub fn with_metrics(f: impl FnOnce(&EstateMetrics)) {
    if let Ok(metrics) = METRICS.as_ref() {
        f(metrics);
    }
}

/// Handler for GET /metrics.
#[utoipa::path(
    get,
    path = "/metrics",
    tag = "Observability",
    responses(
        (status = 200, description = "Prometheus metrics in text format", content_type = "text/plain"),
        (status = 500, description = "Failed to encode metrics"),
    ),
)]
pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    match encoder.encode(&metric_families, &mut buffer) {
        Ok(_) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            buffer,
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [("content-type", "text/plain")],
                format!("Failed to encode metrics: {}", e).into_bytes(),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::core::Collector;

    fn metrics() -> Result<&'static EstateMetrics, String> {
        METRICS
            .as_ref()
            .map_err(|e| format!("Metrics init failed: {}", e.message))
    }

    #[test]
    fn test_metrics_creation() -> Result<(), String> {
        assert!(!metrics()?.http_requests_total.desc().is_empty());
        Ok(())
    }

    #[test]
    fn test_record_http_request() -> Result<(), String> {
        let metrics = metrics()?;
        metrics.record_http_request("GET", "/api/deals/{id}", 200, 0.015);
        let count = metrics
            .http_requests_total
            .with_label_values(&["GET", "/api/deals/{id}", "200"])
            .get();
        assert!(count >= 1.0);
        Ok(())
    }

    #[test]
    fn test_record_stage_transition() -> Result<(), String> {
        let metrics = metrics()?;
        metrics.record_stage_transition("negotiation", "closed_won");
        let count = metrics
            .deal_stage_transitions_total
            .with_label_values(&["negotiation", "closed_won"])
            .get();
        assert!(count >= 1.0);
        Ok(())
    }

    #[test]
    fn test_record_upload() -> Result<(), String> {
        let metrics = metrics()?;
        metrics.record_upload("photo", false);
        let count = metrics
            .uploads_total
            .with_label_values(&["photo", "rejected"])
            .get();
        assert!(count >= 1.0);
        Ok(())
    }
}
