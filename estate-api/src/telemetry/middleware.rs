//! Axum Middleware for HTTP Request Tracing and Metrics
//!
//! Wraps every request in a `tracing` span and records its latency and
//! status in Prometheus.

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;
use tracing::{info_span, Instrument};

use super::metrics::with_metrics;

const UPLOADS_PREFIX: &str = "/uploads/";

/// Replace numeric ids and uploaded file names with placeholders so metric
/// labels stay low-cardinality.
pub fn normalize_path(path: &str) -> String {
    if let Some(rest) = path.strip_prefix(UPLOADS_PREFIX) {
        return match rest.split_once('/') {
            Some((dir, _)) => format!("{}{}/{{file}}", UPLOADS_PREFIX, dir),
            None => format!("{}{{file}}", UPLOADS_PREFIX),
        };
    }

    path.split('/')
        .map(|segment| {
            if !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()) {
                "{id}"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Observability middleware for Axum.
pub async fn observability_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();

    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let normalized_path = normalize_path(&path);

    let span = info_span!(
        "http_request",
        http.method = %method,
        http.target = %path,
        http.route = %normalized_path,
    );

    let response = next.run(request).instrument(span).await;

    let duration = start.elapsed();
    let status = response.status();

    with_metrics(|m| {
        m.record_http_request(
            method.as_str(),
            &normalized_path,
            status.as_u16(),
            duration.as_secs_f64(),
        )
    });

    if status.is_server_error() {
        tracing::warn!(
            method = %method,
            path = %path,
            status = status.as_u16(),
            duration_ms = duration.as_millis() as u64,
            "Request failed"
        );
    } else {
        tracing::info!(
            method = %method,
            path = %path,
            status = status.as_u16(),
            duration_ms = duration.as_millis() as u64,
            "Request completed"
        );
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_numeric_id() {
        assert_eq!(normalize_path("/api/deals/12345"), "/api/deals/{id}");
    }

    #[test]
    fn test_normalize_path_nested_ids() {
        assert_eq!(
            normalize_path("/api/properties/7/photos/31"),
            "/api/properties/{id}/photos/{id}"
        );
    }

    #[test]
    fn test_normalize_path_keeps_named_segments() {
        assert_eq!(normalize_path("/api/tasks/my-tasks"), "/api/tasks/my-tasks");
        assert_eq!(normalize_path("/api/showings/agent/4/schedule"), "/api/showings/agent/{id}/schedule");
        assert_eq!(normalize_path("/api/health"), "/api/health");
    }

    #[test]
    fn test_normalize_path_uploads() {
        assert_eq!(
            normalize_path("/uploads/photos/photo-1718000000000-123456789.jpg"),
            "/uploads/photos/{file}"
        );
        assert_eq!(normalize_path("/uploads/readme.txt"), "/uploads/{file}");
    }
}
