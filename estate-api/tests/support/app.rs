#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use estate_api::{create_api_router, ApiConfig, AppState, AuthConfig, DbClient};
use estate_core::UserRole;
use estate_test_utils::{assertions::assert_success, fixtures::*};
use serde_json::Value;
use tower::ServiceExt;

/// Full application router over `db`, uploading into a per-process temp dir.
pub fn test_app(db: DbClient, auth: AuthConfig) -> Router {
    let config = ApiConfig {
        environment: "test".to_string(),
        upload_dir: std::env::temp_dir().join(format!("estatehub-uploads-{}", std::process::id())),
        ..ApiConfig::default()
    };
    create_api_router(AppState::new(db, auth, config))
}

pub fn json_request(method: Method, uri: &str, token: Option<&str>, body: Option<&Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    builder.body(body).expect("Failed to build request")
}

/// Send one request and decode the JSON body (`Value::Null` when empty or not JSON).
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("Router is infallible");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

pub struct Session {
    pub token: String,
    pub user_id: i64,
    pub agent_id: Option<i64>,
}

/// Register through the API, then log in to pick up the agent profile.
pub async fn register(app: &Router, role: UserRole) -> Session {
    let email = unique_email(role.as_db_str());
    let (status, body) = send(
        app,
        json_request(
            Method::POST,
            "/api/auth/register",
            None,
            Some(&register_body(&email, TEST_PASSWORD, Some(role))),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register: {}", body);
    assert_eq!(body["message"], "User registered successfully");

    let (status, body) = send(
        app,
        json_request(Method::POST, "/api/auth/login", None, Some(&login_body(&email, TEST_PASSWORD))),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login: {}", body);
    let data = assert_success(&body);

    Session {
        token: data["token"].as_str().expect("token").to_string(),
        user_id: data["user"]["id"].as_i64().expect("user id"),
        agent_id: data["agent"]["id"].as_i64(),
    }
}

pub async fn create(app: &Router, token: &str, uri: &str, payload: &Value) -> Value {
    let (status, body) = send(app, json_request(Method::POST, uri, Some(token), Some(payload))).await;
    assert_eq!(status, StatusCode::CREATED, "POST {}: {}", uri, body);
    assert_success(&body).clone()
}
