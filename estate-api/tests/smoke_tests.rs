//! End-to-end smoke tests for the EstateHub API
//!
//! Drive the full router against a real PostgreSQL (`DB_*` variables) with
//! the schema applied. Run with `--features db-tests`.

#![cfg(feature = "db-tests")]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use estate_core::{ClientType, DealStage, DealType, UserRole};
use estate_test_utils::{assertions::*, fixtures::*};
use serde_json::json;

#[path = "support/app.rs"]
mod test_app_support;
#[path = "support/auth.rs"]
mod test_auth_support;
#[path = "support/db.rs"]
mod test_db_support;
use test_app_support::{create, json_request, register, send, test_app};
use test_auth_support::{test_auth_config, test_token};
use test_db_support::test_db_client;

async fn app() -> Router {
    let db = test_db_client();
    db.migrate().await.expect("Failed to apply schema");
    test_app(db, test_auth_config())
}

#[tokio::test]
async fn smoke_test_deal_closes_and_sells_property() {
    let app = app().await;
    let agent = register(&app, UserRole::Agent).await;
    let agent_id = agent.agent_id.expect("agent registration creates a profile");

    let property = create(&app, &agent.token, "/api/properties", &property_body(Some(agent_id))).await;
    let property_id = property["id"].as_i64().expect("property id");
    assert_eq!(property["status"], "available");

    let client = create(&app, &agent.token, "/api/clients", &client_body(ClientType::Buyer)).await;
    let client_id = client["id"].as_i64().expect("client id");

    let deal = create(
        &app,
        &agent.token,
        "/api/deals",
        &deal_body(Some(property_id), client_id, agent_id, DealType::Sale),
    )
    .await;
    let deal_id = deal["id"].as_i64().expect("deal id");
    assert_eq!(deal["stage"], "lead");

    let (status, body) = send(
        &app,
        json_request(
            Method::PUT,
            &format!("/api/deals/{}/stage", deal_id),
            Some(&agent.token),
            Some(&stage_body(DealStage::ClosedWon, None)),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "stage: {}", body);
    assert_eq!(body["message"], "Deal stage updated to closed_won");
    let closed = assert_success(&body);
    assert_eq!(closed["stage"], "closed_won");
    assert!(closed["actual_close_date"].is_string());

    let (_, body) = send(
        &app,
        json_request(Method::GET, &format!("/api/properties/{}", property_id), None, None),
    )
    .await;
    let sold = assert_success(&body);
    assert_eq!(sold["status"], "sold");
    assert!(sold["sold_date"].is_string());

    let (status, body) = send(
        &app,
        json_request(
            Method::GET,
            &format!("/api/deals/{}/activities?limit=5", deal_id),
            Some(&agent.token),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_pagination(&body, 1, 5);
    let activities = body["data"].as_array().expect("activities");
    assert_eq!(activities.len(), 2);
    let change = activities
        .iter()
        .find(|a| a["new_stage"] == "closed_won")
        .expect("stage change recorded");
    assert_eq!(change["activity_type"], "stage_change");
    assert_eq!(change["previous_stage"], "lead");
    assert_eq!(change["description"], "Stage changed from lead to closed_won");
    assert_eq!(change["performed_by"], agent.user_id);
}

#[tokio::test]
async fn smoke_test_rental_close_takes_property_off_market() {
    let app = app().await;
    let agent = register(&app, UserRole::Agent).await;
    let agent_id = agent.agent_id.expect("agent profile");

    let property = create(&app, &agent.token, "/api/properties", &property_body(Some(agent_id))).await;
    let property_id = property["id"].as_i64().expect("property id");
    let client = create(&app, &agent.token, "/api/clients", &client_body(ClientType::Renter)).await;
    let deal = create(
        &app,
        &agent.token,
        "/api/deals",
        &deal_body(
            Some(property_id),
            client["id"].as_i64().expect("client id"),
            agent_id,
            DealType::Rental,
        ),
    )
    .await;

    let (status, body) = send(
        &app,
        json_request(
            Method::PUT,
            &format!("/api/deals/{}/stage", deal["id"]),
            Some(&agent.token),
            Some(&stage_body(DealStage::ClosedWon, Some("Lease signed"))),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "stage: {}", body);

    let (_, body) = send(
        &app,
        json_request(Method::GET, &format!("/api/properties/{}", property_id), None, None),
    )
    .await;
    assert_eq!(assert_success(&body)["status"], "off_market");
}

#[tokio::test]
async fn smoke_test_user_admin_requires_admin_role() {
    let app = app().await;
    let agent = register(&app, UserRole::Agent).await;

    let (status, body) = send(&app, json_request(Method::GET, "/api/users", Some(&agent.token), None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_error_message(&body, "Access denied. Insufficient permissions.");

    let admin = register(&app, UserRole::Admin).await;
    let (status, body) = send(
        &app,
        json_request(Method::GET, "/api/users?page=1&limit=3", Some(&admin.token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "users: {}", body);
    assert_pagination(&body, 1, 3);
}

#[tokio::test]
async fn smoke_test_token_for_deleted_user_is_rejected() {
    let app = app().await;
    let token = test_token(i64::MAX, UserRole::Admin);

    let (status, body) = send(&app, json_request(Method::GET, "/api/auth/me", Some(&token), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_error_message(&body, "Invalid token. User not found.");
}

#[tokio::test]
async fn smoke_test_duplicate_registration_is_rejected() {
    let app = app().await;
    let email = unique_email("dup");
    let payload = register_body(&email, TEST_PASSWORD, None);

    let (status, _) = send(&app, json_request(Method::POST, "/api/auth/register", None, Some(&payload))).await;
    assert_eq!(status, StatusCode::CREATED);

    let mut shouted = payload.clone();
    shouted["email"] = json!(email.to_uppercase());
    let (status, body) = send(&app, json_request(Method::POST, "/api/auth/register", None, Some(&shouted))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error_message(&body, "User with this email already exists");
}

#[tokio::test]
async fn smoke_test_client_validation_and_lead_score() {
    let app = app().await;
    let agent = register(&app, UserRole::Agent).await;

    let mut bad = client_body(ClientType::Buyer);
    bad["client_type"] = json!("tenant");
    let (status, body) = send(&app, json_request(Method::POST, "/api/clients", Some(&agent.token), Some(&bad))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error_mentions(&body, "Invalid client_type");

    let client = create(&app, &agent.token, "/api/clients", &client_body(ClientType::Seller)).await;
    let uri = format!("/api/clients/{}/lead-score", client["id"]);

    let (status, body) = send(
        &app,
        json_request(Method::PUT, &uri, Some(&agent.token), Some(&json!({ "lead_score": 101 }))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error_message(&body, "Lead score must be between 0 and 100");

    let (status, body) = send(
        &app,
        json_request(Method::PUT, &uri, Some(&agent.token), Some(&json!({ "lead_score": 85 }))),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "lead score: {}", body);
    assert_eq!(assert_success(&body)["lead_score"], 85);
}

#[tokio::test]
async fn smoke_test_missing_deal_is_not_found() {
    let app = app().await;
    let agent = register(&app, UserRole::Agent).await;

    let (status, body) = send(
        &app,
        json_request(
            Method::PUT,
            "/api/deals/999999999/stage",
            Some(&agent.token),
            Some(&stage_body(DealStage::Viewing, None)),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_error_message(&body, "Deal not found");
}

#[tokio::test]
async fn smoke_test_photo_upload_is_served() {
    let app = app().await;
    let agent = register(&app, UserRole::Agent).await;
    let property = create(&app, &agent.token, "/api/properties", &property_body(agent.agent_id)).await;

    let boundary = "estatehub-boundary";
    let multipart = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"caption\"\r\n\r\nFront yard\r\n\
         --{b}\r\nContent-Disposition: form-data; name=\"photo\"; filename=\"front.png\"\r\n\
         Content-Type: image/png\r\n\r\nPNGDATA\r\n--{b}--\r\n",
        b = boundary
    );
    let request = Request::builder()
        .method(Method::POST)
        .uri(format!("/api/properties/{}/photos", property["id"]))
        .header(header::AUTHORIZATION, format!("Bearer {}", agent.token))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(multipart))
        .expect("request");

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::CREATED, "upload: {}", body);
    assert_eq!(body["message"], "Photo added successfully");
    let photo = assert_success(&body);
    assert_eq!(photo["caption"], "Front yard");
    let url = photo["url"].as_str().expect("url").to_string();
    assert!(url.starts_with("/uploads/photos/photo-"));

    let served = tower::ServiceExt::oneshot(
        app,
        Request::builder().uri(url).body(Body::empty()).expect("request"),
    )
    .await
    .expect("infallible");
    assert_eq!(served.status(), StatusCode::OK);
}
