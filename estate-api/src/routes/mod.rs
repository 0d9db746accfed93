//! REST API Routes Module
//!
//! One module per resource, each exposing `create_router()`. Everything is
//! served under `/api`:
//! - `/api/auth`, `/api/properties` mix public and authenticated routes
//! - `/api/users`, `/api/agents` add role guards on top of authentication
//! - clients, deals, showings, communications, tasks and the dashboard need
//!   an authenticated caller
//! - `/api/health`, `/api/openapi.json` and the `/api` index are public
//!
//! `/metrics`, the static `/uploads` tree and Swagger UI sit at the root.

pub mod agent;
pub mod auth;
pub mod client;
pub mod communication;
pub mod dashboard;
pub mod deal;
pub mod health;
pub mod property;
pub mod showing;
pub mod task;
pub mod user;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{DefaultBodyLimit, FromRef},
    http::{header, request::Parts, HeaderValue, Method, Uri},
    middleware::{from_fn, from_fn_with_state},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, CorsLayer},
    services::ServeDir,
};
#[cfg(feature = "openapi")]
use utoipa::OpenApi;

use crate::config::{ApiConfig, MAX_BODY_BYTES};
use crate::error::ApiError;
use crate::middleware::{auth_middleware, AuthMiddlewareState};
#[cfg(feature = "openapi")]
use crate::openapi::ApiDoc;
use crate::state::AppState;
use crate::telemetry::{metrics_handler, observability_middleware};

// ============================================================================
// SERVICE ENDPOINTS
// ============================================================================

/// GET /api - Endpoint index
async fn api_index() -> impl IntoResponse {
    Json(serde_json::json!({
        "message": "EstateHub CRM API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "auth": "/api/auth",
            "users": "/api/users",
            "agents": "/api/agents",
            "properties": "/api/properties",
            "clients": "/api/clients",
            "deals": "/api/deals",
            "showings": "/api/showings",
            "communications": "/api/communications",
            "tasks": "/api/tasks",
            "dashboard": "/api/dashboard",
            "health": "/api/health",
            "openapi": "/api/openapi.json",
        }
    }))
}

/// GET /api/openapi.json
#[cfg(feature = "openapi")]
async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

async fn not_found(uri: Uri) -> ApiError {
    ApiError::route_not_found(uri.path())
}

// ============================================================================
// CORS LAYER
// ============================================================================

/// Any `http://localhost:<port>` origin plus `CLIENT_URL`, with credentials.
fn build_cors_layer(config: Arc<ApiConfig>) -> CorsLayer {
    let allow_credentials = config.cors_allow_credentials;
    let max_age = Duration::from_secs(config.cors_max_age_secs);

    let origins = AllowOrigin::predicate(move |origin: &HeaderValue, _parts: &Parts| {
        origin
            .to_str()
            .map(|origin| config.is_origin_allowed(origin))
            .unwrap_or(false)
    });

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(allow_credentials)
        .max_age(max_age)
}

// ============================================================================
// ROUTER
// ============================================================================

/// Build the full application router.
///
/// Layers, outermost first: CORS, observability, compression, body limit.
pub fn create_api_router(state: AppState) -> Router {
    let auth_state = AuthMiddlewareState::from_ref(&state);

    let protected = Router::new()
        .nest("/users", user::create_router())
        .nest("/agents", agent::create_router())
        .nest("/clients", client::create_router())
        .nest("/deals", deal::create_router())
        .nest("/showings", showing::create_router())
        .nest("/communications", communication::create_router())
        .nest("/tasks", task::create_router())
        .nest("/dashboard", dashboard::create_router())
        .route_layer(from_fn_with_state(auth_state.clone(), auth_middleware));

    let api = Router::new()
        .route("/", get(api_index))
        .route("/health", get(health::health))
        .nest("/auth", auth::create_router(auth_state.clone()))
        .nest("/properties", property::create_router(auth_state))
        .merge(protected);

    #[cfg(feature = "openapi")]
    let api = api.route("/openapi.json", get(openapi_json));

    #[allow(unused_mut)]
    let mut router = Router::new()
        .nest("/api", api)
        .route("/metrics", get(metrics_handler))
        .nest_service("/uploads", ServeDir::new(&state.config.upload_dir));

    #[cfg(feature = "swagger-ui")]
    {
        use utoipa_swagger_ui::SwaggerUi;
        router = router.merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));
    }

    let cors = build_cors_layer(state.config.clone());

    router
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CompressionLayer::new())
        .layer(from_fn(observability_middleware))
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_index_lists_resources() {
        let body = api_index().await.into_response().into_body();
        let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["endpoints"]["deals"], "/api/deals");
        assert_eq!(json["endpoints"]["health"], "/api/health");
        assert!(json["version"].is_string());
    }

    #[tokio::test]
    async fn test_fallback_names_the_path() {
        let err = not_found(Uri::from_static("/api/nowhere")).await;
        assert_eq!(err.message, "Route /api/nowhere not found");
    }
}
