//! Deal REST API Routes
//!
//! Stage changes go through `PUT /:id/stage`, which runs the transition as
//! one transaction and records a `stage_change` activity.

use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, put},
    Router,
};

use crate::{
    db::DbClient,
    error::{ApiError, ApiResult, ErrorResponse},
    extractors::{ApiJson, ApiQuery, PathId},
    middleware::AuthExtractor,
    pagination::{PageQuery, Pagination},
    response::{created, ApiResponse},
    state::AppState,
    telemetry::metrics::with_metrics,
    types::{
        AgentScope, CreateActivityRequest, CreateDealRequest, DealActivity, DealDetail,
        DealFilter, DealListItem, DealRow, DealWithProperty, PipelineStage, UpdateDealRequest,
        UpdateStageRequest,
    },
};

fn deal_not_found() -> ApiError {
    ApiError::not_found("Deal not found")
}

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// GET /api/deals - List deals
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/deals",
    tag = "Deals",
    params(DealFilter),
    responses(
        (status = 200, description = "Paginated deals", body = Vec<DealListItem>),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
    ),
    security(("bearer_auth" = []))
))]
pub async fn list_deals(
    State(db): State<DbClient>,
    ApiQuery(filter): ApiQuery<DealFilter>,
) -> ApiResult<impl IntoResponse> {
    let page = Pagination::from_query(filter.page.as_deref(), filter.limit.as_deref());
    db.deal_list(&filter, &page).await
}

/// GET /api/deals/pipeline - Deal counts and value per stage
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/deals/pipeline",
    tag = "Deals",
    params(AgentScope),
    responses(
        (status = 200, description = "Stages in pipeline order", body = Vec<PipelineStage>),
    ),
    security(("bearer_auth" = []))
))]
pub async fn get_pipeline(
    State(db): State<DbClient>,
    ApiQuery(scope): ApiQuery<AgentScope>,
) -> ApiResult<impl IntoResponse> {
    let stages = db.deal_pipeline(scope.agent_id).await?;
    Ok(ApiResponse::data(stages))
}

/// GET /api/deals/:id - Deal with parties and activity history
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/deals/{id}",
    tag = "Deals",
    params(("id" = i64, Path, description = "Deal id")),
    responses(
        (status = 200, description = "Deal found", body = DealDetail),
        (status = 404, description = "Deal not found", body = ErrorResponse),
    ),
    security(("bearer_auth" = []))
))]
pub async fn get_deal(
    State(db): State<DbClient>,
    PathId(id): PathId,
) -> ApiResult<impl IntoResponse> {
    let deal = db.deal_detail(id).await?.ok_or_else(deal_not_found)?;
    Ok(ApiResponse::data(deal))
}

/// POST /api/deals - Open a deal
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/api/deals",
    tag = "Deals",
    request_body = CreateDealRequest,
    responses(
        (status = 201, description = "Deal created successfully", body = DealRow),
        (status = 400, description = "Invalid request or unknown client/agent/property", body = ErrorResponse),
    ),
    security(("bearer_auth" = []))
))]
pub async fn create_deal(
    State(db): State<DbClient>,
    auth: AuthExtractor,
    ApiJson(req): ApiJson<CreateDealRequest>,
) -> ApiResult<impl IntoResponse> {
    req.validate()?;
    let deal = db.deal_create(&req, auth.user_id).await?;
    Ok(created(deal, "Deal created successfully"))
}

/// PUT /api/deals/:id - Update deal terms
#[cfg_attr(feature = "openapi", utoipa::path(
    put,
    path = "/api/deals/{id}",
    tag = "Deals",
    params(("id" = i64, Path, description = "Deal id")),
    request_body = UpdateDealRequest,
    responses(
        (status = 200, description = "Deal updated successfully", body = DealRow),
        (status = 404, description = "Deal not found", body = ErrorResponse),
    ),
    security(("bearer_auth" = []))
))]
pub async fn update_deal(
    State(db): State<DbClient>,
    PathId(id): PathId,
    ApiJson(req): ApiJson<UpdateDealRequest>,
) -> ApiResult<impl IntoResponse> {
    req.validate()?;
    let deal = db.deal_update(id, &req).await?.ok_or_else(deal_not_found)?;
    Ok(ApiResponse::data(deal).with_message("Deal updated successfully"))
}

/// PUT /api/deals/:id/stage - Move a deal to another stage
#[cfg_attr(feature = "openapi", utoipa::path(
    put,
    path = "/api/deals/{id}/stage",
    tag = "Deals",
    params(("id" = i64, Path, description = "Deal id")),
    request_body = UpdateStageRequest,
    responses(
        (status = 200, description = "Deal stage updated", body = DealWithProperty),
        (status = 400, description = "Missing or invalid stage", body = ErrorResponse),
        (status = 404, description = "Deal not found", body = ErrorResponse),
        (status = 500, description = "Transition rolled back", body = ErrorResponse),
    ),
    security(("bearer_auth" = []))
))]
pub async fn update_stage(
    State(db): State<DbClient>,
    auth: AuthExtractor,
    PathId(id): PathId,
    ApiJson(req): ApiJson<UpdateStageRequest>,
) -> ApiResult<impl IntoResponse> {
    let stage = req.target()?;
    let (deal, plan) = db
        .deal_update_stage(id, stage, req.notes.as_deref(), Some(auth.user_id))
        .await?
        .ok_or_else(deal_not_found)?;

    with_metrics(|m| m.record_stage_transition(plan.previous.as_db_str(), plan.next.as_db_str()));
    tracing::info!(
        deal_id = id,
        from = %plan.previous,
        to = %plan.next,
        user_id = auth.user_id,
        "Deal stage changed"
    );

    Ok(ApiResponse::data(deal).with_message(plan.message()))
}

/// DELETE /api/deals/:id
#[cfg_attr(feature = "openapi", utoipa::path(
    delete,
    path = "/api/deals/{id}",
    tag = "Deals",
    params(("id" = i64, Path, description = "Deal id")),
    responses(
        (status = 200, description = "Deal deleted successfully"),
        (status = 404, description = "Deal not found", body = ErrorResponse),
    ),
    security(("bearer_auth" = []))
))]
pub async fn delete_deal(
    State(db): State<DbClient>,
    PathId(id): PathId,
) -> ApiResult<impl IntoResponse> {
    if !db.deal_delete(id).await? {
        return Err(deal_not_found());
    }
    Ok(ApiResponse::message("Deal deleted successfully"))
}

/// GET /api/deals/:id/activities - Activity history, newest first
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/deals/{id}/activities",
    tag = "Deals",
    params(("id" = i64, Path, description = "Deal id"), PageQuery),
    responses(
        (status = 200, description = "Paginated activities", body = Vec<DealActivity>),
        (status = 404, description = "Deal not found", body = ErrorResponse),
    ),
    security(("bearer_auth" = []))
))]
pub async fn list_activities(
    State(db): State<DbClient>,
    PathId(id): PathId,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> ApiResult<impl IntoResponse> {
    if !db.deal_exists(id).await? {
        return Err(deal_not_found());
    }
    db.deal_activities(id, &query.pagination()).await
}

/// POST /api/deals/:id/activities - Log an activity against a deal
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/api/deals/{id}/activities",
    tag = "Deals",
    params(("id" = i64, Path, description = "Deal id")),
    request_body = CreateActivityRequest,
    responses(
        (status = 201, description = "Activity added successfully", body = DealActivity),
        (status = 400, description = "Missing or invalid activity type", body = ErrorResponse),
        (status = 404, description = "Deal not found", body = ErrorResponse),
    ),
    security(("bearer_auth" = []))
))]
pub async fn add_activity(
    State(db): State<DbClient>,
    auth: AuthExtractor,
    PathId(id): PathId,
    ApiJson(req): ApiJson<CreateActivityRequest>,
) -> ApiResult<impl IntoResponse> {
    let activity_type = req.activity_type()?;
    if !db.deal_exists(id).await? {
        return Err(deal_not_found());
    }
    let activity = db
        .deal_add_activity(id, activity_type, req.description.as_deref(), auth.user_id)
        .await?;
    Ok(created(activity, "Activity added successfully"))
}

// ============================================================================
// ROUTER
// ============================================================================

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_deals).post(create_deal))
        .route("/pipeline", get(get_pipeline))
        .route("/:id", get(get_deal).put(update_deal).delete(delete_deal))
        .route("/:id/stage", put(update_stage))
        .route("/:id/activities", get(list_activities).post(add_activity))
}
