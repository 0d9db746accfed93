//! Router contract tests that never reach PostgreSQL
//!
//! Authentication failures, request validation, CORS and the fallback are all
//! decided before a handler touches the pool, so these run without a database.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use estate_api::auth::{generate_jwt_token, FixedClock};
use estate_core::UserRole;
use estate_test_utils::{assertions::*, fixtures::*};
use serde_json::json;

#[path = "support/app.rs"]
mod test_app_support;
#[path = "support/auth.rs"]
mod test_auth_support;
#[path = "support/db.rs"]
mod test_db_support;
use test_app_support::{json_request, send, test_app};
use test_auth_support::test_auth_config;
use test_db_support::test_db_client;

fn app() -> Router {
    test_app(test_db_client(), test_auth_config())
}

// ============================================================================
// AUTHENTICATION
// ============================================================================

#[tokio::test]
async fn protected_routes_require_a_token() {
    let app = app();
    for uri in [
        "/api/users",
        "/api/agents",
        "/api/clients",
        "/api/deals",
        "/api/deals/pipeline",
        "/api/showings/upcoming",
        "/api/communications/summary",
        "/api/tasks/my-tasks",
        "/api/dashboard/overview",
        "/api/auth/me",
    ] {
        let (status, body) = send(&app, json_request(Method::GET, uri, None, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", uri);
        assert_error_message(&body, "Access denied. No token provided.");
    }
}

#[tokio::test]
async fn writes_on_properties_require_a_token() {
    let app = app();
    let (status, body) = send(
        &app,
        json_request(Method::POST, "/api/properties", None, Some(&property_body(None))),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_error_message(&body, "Access denied. No token provided.");
}

#[tokio::test]
async fn non_bearer_authorization_is_treated_as_missing() {
    let app = app();
    let request = Request::builder()
        .uri("/api/deals")
        .header(header::AUTHORIZATION, "Basic dXNlcjpwYXNz")
        .body(Body::empty())
        .expect("request");
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_error_message(&body, "Access denied. No token provided.");
}

#[tokio::test]
async fn garbage_token_is_invalid() {
    let app = app();
    let (status, body) = send(
        &app,
        json_request(Method::GET, "/api/clients", Some("not.a.jwt"), None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_error_message(&body, "Invalid token.");
}

#[tokio::test]
async fn token_signed_with_another_secret_is_invalid() {
    let app = app();
    let foreign = estate_api::AuthConfig {
        jwt_secret: estate_api::auth::JwtSecret::new(
            "some_other_deployment_secret_of_decent_length".to_string(),
        )
        .expect("secret"),
        ..test_auth_config()
    };
    let token = generate_jwt_token(&foreign, 1, UserRole::Admin).expect("token");

    let (status, body) = send(&app, json_request(Method::GET, "/api/users", Some(&token), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_error_message(&body, "Invalid token.");
}

#[tokio::test]
async fn expired_token_is_rejected() {
    let app = app();
    let issued_long_ago = estate_api::AuthConfig {
        clock: Arc::new(FixedClock(1_000_000)),
        ..test_auth_config()
    };
    let token = generate_jwt_token(&issued_long_ago, 1, UserRole::Agent).expect("token");

    let (status, body) = send(&app, json_request(Method::GET, "/api/tasks", Some(&token), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_error_message(&body, "Token expired.");
}

// ============================================================================
// REQUEST VALIDATION
// ============================================================================

#[tokio::test]
async fn register_reports_every_missing_field() {
    let app = app();
    let (status, body) = send(
        &app,
        json_request(Method::POST, "/api/auth/register", None, Some(&json!({}))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error_message(&body, "Missing required fields: email, password");
}

#[tokio::test]
async fn register_rejects_weak_password() {
    let app = app();
    let request_body = register_body(&unique_email("weak"), "password", None);
    let (status, body) = send(
        &app,
        json_request(Method::POST, "/api/auth/register", None, Some(&request_body)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error_message(
        &body,
        "Password must be at least 8 characters with uppercase, lowercase, and number",
    );
}

#[tokio::test]
async fn register_rejects_malformed_email() {
    let app = app();
    let request_body = register_body("not-an-email", TEST_PASSWORD, None);
    let (status, body) = send(
        &app,
        json_request(Method::POST, "/api/auth/register", None, Some(&request_body)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error_message(&body, "Invalid email format");
}

#[tokio::test]
async fn register_rejects_unknown_role() {
    let app = app();
    let mut request_body = register_body(&unique_email("role"), TEST_PASSWORD, None);
    request_body["role"] = json!("superuser");
    let (status, body) = send(
        &app,
        json_request(Method::POST, "/api/auth/register", None, Some(&request_body)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error_mentions(&body, "Allowed values");
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let app = app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"email\":"))
        .expect("request");
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

// ============================================================================
// SERVICE ENDPOINTS
// ============================================================================

#[tokio::test]
async fn unknown_route_names_the_path() {
    let app = app();
    let (status, body) = send(&app, json_request(Method::GET, "/api/nowhere", None, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_error_message(&body, "Route /api/nowhere not found");
}

#[tokio::test]
async fn index_lists_resources() {
    let app = app();
    let (status, body) = send(&app, json_request(Method::GET, "/api", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "EstateHub CRM API");
    assert_eq!(body["endpoints"]["properties"], "/api/properties");
}

#[cfg(feature = "openapi")]
#[tokio::test]
async fn openapi_document_is_served() {
    let app = app();
    let (status, body) = send(&app, json_request(Method::GET, "/api/openapi.json", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["info"]["title"], "EstateHub API");
    assert!(body["paths"]["/api/deals/{id}/stage"].is_object());
}

#[tokio::test]
async fn metrics_are_exposed_as_text() {
    let app = app();
    // Generate at least one observed request first.
    send(&app, json_request(Method::GET, "/api", None, None)).await;

    let response = tower::ServiceExt::oneshot(
        app,
        Request::builder().uri("/metrics").body(Body::empty()).expect("request"),
    )
    .await
    .expect("infallible");
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let text = String::from_utf8_lossy(&bytes);
    assert!(text.contains("http_requests_total"));
}

// ============================================================================
// CORS
// ============================================================================

fn preflight(origin: &str) -> Request<Body> {
    Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/deals")
        .header(header::ORIGIN, origin)
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
        .body(Body::empty())
        .expect("request")
}

#[tokio::test]
async fn cors_allows_any_localhost_port() {
    let response = tower::ServiceExt::oneshot(app(), preflight("http://localhost:5173"))
        .await
        .expect("infallible");
    assert_eq!(
        response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN),
        Some(&header::HeaderValue::from_static("http://localhost:5173"))
    );
    assert_eq!(
        response.headers().get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS),
        Some(&header::HeaderValue::from_static("true"))
    );
}

#[tokio::test]
async fn cors_ignores_foreign_origins() {
    let response = tower::ServiceExt::oneshot(app(), preflight("https://evil.example"))
        .await
        .expect("infallible");
    assert!(response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());
}
