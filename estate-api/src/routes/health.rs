//! Health Check Endpoint
//!
//! `GET /api/health` runs `SELECT 1` through the pool. No authentication.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use estate_core::Timestamp;
use serde::{Deserialize, Serialize};

use crate::db::DbClient;

// ============================================================================
// TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum HealthStatus {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "ERROR")]
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum DatabaseStatus {
    Connected,
    Disconnected,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub database: DatabaseStatus,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub timestamp: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HealthResponse {
    fn from_check(result: Result<u64, String>, timestamp: Timestamp) -> (StatusCode, Self) {
        match result {
            Ok(latency) => (
                StatusCode::OK,
                Self {
                    status: HealthStatus::Ok,
                    database: DatabaseStatus::Connected,
                    timestamp,
                    latency_ms: Some(latency),
                    error: None,
                },
            ),
            Err(e) => (
                StatusCode::SERVICE_UNAVAILABLE,
                Self {
                    status: HealthStatus::Error,
                    database: DatabaseStatus::Disconnected,
                    timestamp,
                    latency_ms: None,
                    error: Some(e),
                },
            ),
        }
    }
}

// ============================================================================
// HANDLERS
// ============================================================================

/// GET /api/health - Database connectivity check
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/health",
    tag = "Observability",
    responses(
        (status = 200, description = "Database reachable", body = HealthResponse),
        (status = 503, description = "Database unreachable", body = HealthResponse),
    ),
))]
pub async fn health(State(db): State<DbClient>) -> impl IntoResponse {
    let (status, body) = HealthResponse::from_check(check_database(&db).await, Utc::now());
    (status, Json(body))
}

async fn check_database(db: &DbClient) -> Result<u64, String> {
    let start = std::time::Instant::now();
    match db.health_check().await {
        Ok(()) => Ok(start.elapsed().as_millis() as u64),
        Err(e) => {
            tracing::warn!(error = %e, "Health check failed");
            Err(e.message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_healthy_response() -> Result<(), serde_json::Error> {
        let (status, body) = HealthResponse::from_check(Ok(3), Utc::now());
        assert_eq!(status, StatusCode::OK);
        let json = serde_json::to_value(&body)?;
        assert_eq!(json["status"], "OK");
        assert_eq!(json["database"], "connected");
        assert!(json.get("error").is_none());
        Ok(())
    }

    #[test]
    fn test_unhealthy_response() -> Result<(), serde_json::Error> {
        let (status, body) =
            HealthResponse::from_check(Err("pool closed".to_string()), Utc::now());
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        let json = serde_json::to_value(&body)?;
        assert_eq!(json["status"], "ERROR");
        assert_eq!(json["database"], "disconnected");
        assert_eq!(json["error"], "pool closed");
        Ok(())
    }
}
