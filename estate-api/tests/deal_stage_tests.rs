//! Database tests for the deal pipeline, task completion and list paging
//!
//! Requires PostgreSQL (`DB_*` variables). Run with `--features db-tests`.

#![cfg(feature = "db-tests")]

use axum::{
    http::{Method, StatusCode},
    Router,
};
use estate_api::db::execute_stage_transition;
use estate_api::{ApiResult, DbClient};
use estate_core::{ClientType, DealStage, DealType, StageTransition, UserRole};
use estate_test_utils::{assertions::*, fixtures::*};
use serde_json::json;

#[path = "support/app.rs"]
mod test_app_support;
#[path = "support/auth.rs"]
mod test_auth_support;
#[path = "support/db.rs"]
mod test_db_support;
use test_app_support::{create, json_request, register, send, test_app, Session};
use test_auth_support::test_auth_config;
use test_db_support::test_db_client;

async fn setup() -> (DbClient, Router) {
    let db = test_db_client();
    db.migrate().await.expect("Failed to apply schema");
    let app = test_app(db.clone(), test_auth_config());
    (db, app)
}

/// A fresh agent with one listing, one client and a `lead` sale deal.
async fn seeded_deal(app: &Router) -> (Session, i64, i64) {
    let agent = register(app, UserRole::Agent).await;
    let agent_id = agent.agent_id.expect("agent profile");
    let property = create(app, &agent.token, "/api/properties", &property_body(Some(agent_id))).await;
    let client = create(app, &agent.token, "/api/clients", &client_body(ClientType::Buyer)).await;
    let deal = create(
        app,
        &agent.token,
        "/api/deals",
        &deal_body(
            property["id"].as_i64(),
            client["id"].as_i64().expect("client id"),
            agent_id,
            DealType::Sale,
        ),
    )
    .await;
    let property_id = property["id"].as_i64().expect("property id");
    let deal_id = deal["id"].as_i64().expect("deal id");
    (agent, property_id, deal_id)
}

#[tokio::test]
async fn failed_transition_leaves_deal_untouched() -> ApiResult<()> {
    let (db, app) = setup().await;
    let (agent, property_id, deal_id) = seeded_deal(&app).await;

    let plan = StageTransition::plan(
        DealStage::Lead,
        DealStage::ClosedWon,
        DealType::Sale,
        Some(property_id),
        None,
    );

    {
        let mut conn = db.get_conn().await?;
        let tx = conn.transaction().await?;
        // No such user: the activity insert violates its foreign key after the deal UPDATE.
        let result = execute_stage_transition(&*tx, deal_id, &plan, Some(i64::MAX)).await;
        assert!(result.is_err());
    }

    let (_, body) = send(
        &app,
        json_request(Method::GET, &format!("/api/deals/{}", deal_id), Some(&agent.token), None),
    )
    .await;
    let deal = assert_success(&body);
    assert_eq!(deal["stage"], "lead");
    assert!(deal["actual_close_date"].is_null());

    let (_, body) = send(
        &app,
        json_request(Method::GET, &format!("/api/properties/{}", property_id), None, None),
    )
    .await;
    assert_eq!(assert_success(&body)["status"], "available");
    Ok(())
}

#[tokio::test]
async fn moving_backwards_is_logged_without_closing() -> ApiResult<()> {
    let (db, app) = setup().await;
    let (agent, _, deal_id) = seeded_deal(&app).await;

    for stage in [DealStage::Negotiation, DealStage::Viewing] {
        let (deal, plan) = db
            .deal_update_stage(deal_id, stage, None, Some(agent.user_id))
            .await?
            .expect("deal exists");
        assert_eq!(deal.deal.stage, stage);
        assert!(deal.deal.actual_close_date.is_none());
        assert!(!plan.stamps_close_date);
    }

    let activities = db
        .deal_activities(deal_id, &estate_api::pagination::Pagination::default())
        .await?;
    // created, lead -> negotiation, negotiation -> viewing
    assert_eq!(activities.pagination.total_items, 3);
    let latest = &activities.data[0];
    assert_eq!(latest.previous_stage, Some(DealStage::Negotiation));
    assert_eq!(latest.new_stage, Some(DealStage::Viewing));
    Ok(())
}

#[tokio::test]
async fn completing_a_task_twice_is_not_found() {
    let (_, app) = setup().await;
    let agent = register(&app, UserRole::Agent).await;

    let task = create(
        &app,
        &agent.token,
        "/api/tasks",
        &json!({
            "title": "Call back about the inspection",
            "assigned_to": agent.agent_id,
            "priority": "high",
        }),
    )
    .await;
    assert_eq!(task["status"], "pending");
    let uri = format!("/api/tasks/{}/complete", task["id"]);

    let (status, body) = send(&app, json_request(Method::PUT, &uri, Some(&agent.token), None)).await;
    assert_eq!(status, StatusCode::OK, "complete: {}", body);
    let done = assert_success(&body);
    assert_eq!(done["status"], "completed");
    assert!(done["completed_at"].is_string());

    let (status, body) = send(&app, json_request(Method::PUT, &uri, Some(&agent.token), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_error_message(&body, "Task not found or already completed");
}

#[tokio::test]
async fn second_page_holds_items_eleven_to_twenty() {
    let (_, app) = setup().await;
    let agent = register(&app, UserRole::Agent).await;
    let agent_id = agent.agent_id.expect("agent profile");
    let client = create(&app, &agent.token, "/api/clients", &client_body(ClientType::Buyer)).await;
    let client_id = client["id"].as_i64().expect("client id");

    for _ in 0..25 {
        create(
            &app,
            &agent.token,
            "/api/deals",
            &deal_body(None, client_id, agent_id, DealType::Purchase),
        )
        .await;
    }

    let page_uri = |page: i64| format!("/api/deals?agent_id={}&page={}&limit=10", agent_id, page);

    let (status, first) = send(&app, json_request(Method::GET, &page_uri(1), Some(&agent.token), None)).await;
    assert_eq!(status, StatusCode::OK);
    let (status, second) = send(&app, json_request(Method::GET, &page_uri(2), Some(&agent.token), None)).await;
    assert_eq!(status, StatusCode::OK);
    let (_, third) = send(&app, json_request(Method::GET, &page_uri(3), Some(&agent.token), None)).await;

    assert_pagination(&second, 2, 10);
    assert_eq!(second["pagination"]["totalItems"], 25);
    assert_eq!(second["pagination"]["totalPages"], 3);
    assert_eq!(second["data"].as_array().map(Vec::len), Some(10));
    assert_eq!(third["data"].as_array().map(Vec::len), Some(5));

    let ids = |body: &serde_json::Value| -> Vec<i64> {
        body["data"]
            .as_array()
            .map(|rows| rows.iter().filter_map(|r| r["id"].as_i64()).collect())
            .unwrap_or_default()
    };
    let first_ids = ids(&first);
    assert!(ids(&second).iter().all(|id| !first_ids.contains(id)));
}
