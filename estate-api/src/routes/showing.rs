//! Showing REST API Routes

use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, put},
    Router,
};
use chrono::Utc;

use crate::{
    db::DbClient,
    error::{ApiError, ApiResult, ErrorResponse},
    extractors::{ApiJson, ApiQuery, PathId},
    pagination::Pagination,
    response::{created, ApiResponse},
    state::AppState,
    types::{
        AgentSchedule, CreateShowingRequest, ScheduleQuery, ShowingDetail,
        ShowingFeedbackRequest, ShowingFilter, ShowingListItem, ShowingRow, UpcomingQuery,
        UpdateShowingRequest,
    },
};

fn showing_not_found() -> ApiError {
    ApiError::not_found("Showing not found")
}

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// GET /api/showings - List showings, soonest first
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/showings",
    tag = "Showings",
    params(ShowingFilter),
    responses(
        (status = 200, description = "Paginated showings", body = Vec<ShowingListItem>),
    ),
    security(("bearer_auth" = []))
))]
pub async fn list_showings(
    State(db): State<DbClient>,
    ApiQuery(filter): ApiQuery<ShowingFilter>,
) -> ApiResult<impl IntoResponse> {
    let page = Pagination::from_query(filter.page.as_deref(), filter.limit.as_deref());
    db.showing_list(&filter, &page).await
}

/// GET /api/showings/upcoming - Next scheduled showings
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/showings/upcoming",
    tag = "Showings",
    params(UpcomingQuery),
    responses(
        (status = 200, description = "Scheduled showings from now on", body = Vec<ShowingListItem>),
    ),
    security(("bearer_auth" = []))
))]
pub async fn upcoming_showings(
    State(db): State<DbClient>,
    ApiQuery(query): ApiQuery<UpcomingQuery>,
) -> ApiResult<impl IntoResponse> {
    let showings = db.showing_upcoming(query.limit()).await?;
    Ok(ApiResponse::data(showings))
}

/// GET /api/showings/agent/:agentId/schedule - One agent's calendar
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/showings/agent/{agentId}/schedule",
    tag = "Showings",
    params(("agentId" = i64, Path, description = "Agent id"), ScheduleQuery),
    responses(
        (status = 200, description = "Showings inside the window", body = AgentSchedule),
    ),
    security(("bearer_auth" = []))
))]
pub async fn agent_schedule(
    State(db): State<DbClient>,
    PathId(agent_id): PathId,
    ApiQuery(query): ApiQuery<ScheduleQuery>,
) -> ApiResult<impl IntoResponse> {
    let schedule = db
        .showing_agent_schedule(agent_id, query.window(Utc::now()))
        .await?;
    Ok(ApiResponse::data(schedule))
}

/// GET /api/showings/:id
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/showings/{id}",
    tag = "Showings",
    params(("id" = i64, Path, description = "Showing id")),
    responses(
        (status = 200, description = "Showing found", body = ShowingDetail),
        (status = 404, description = "Showing not found", body = ErrorResponse),
    ),
    security(("bearer_auth" = []))
))]
pub async fn get_showing(
    State(db): State<DbClient>,
    PathId(id): PathId,
) -> ApiResult<impl IntoResponse> {
    let showing = db.showing_detail(id).await?.ok_or_else(showing_not_found)?;
    Ok(ApiResponse::data(showing))
}

/// POST /api/showings - Schedule a showing
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/api/showings",
    tag = "Showings",
    request_body = CreateShowingRequest,
    responses(
        (status = 201, description = "Showing scheduled successfully", body = ShowingRow),
        (status = 400, description = "Invalid request or unknown property/agent/client", body = ErrorResponse),
    ),
    security(("bearer_auth" = []))
))]
pub async fn create_showing(
    State(db): State<DbClient>,
    ApiJson(req): ApiJson<CreateShowingRequest>,
) -> ApiResult<impl IntoResponse> {
    req.validate()?;
    let showing = db.showing_create(&req).await?;
    Ok(created(showing, "Showing scheduled successfully"))
}

/// PUT /api/showings/:id - Reschedule or edit a showing
#[cfg_attr(feature = "openapi", utoipa::path(
    put,
    path = "/api/showings/{id}",
    tag = "Showings",
    params(("id" = i64, Path, description = "Showing id")),
    request_body = UpdateShowingRequest,
    responses(
        (status = 200, description = "Showing updated successfully", body = ShowingRow),
        (status = 404, description = "Showing not found", body = ErrorResponse),
    ),
    security(("bearer_auth" = []))
))]
pub async fn update_showing(
    State(db): State<DbClient>,
    PathId(id): PathId,
    ApiJson(req): ApiJson<UpdateShowingRequest>,
) -> ApiResult<impl IntoResponse> {
    req.validate()?;
    let showing = db
        .showing_update(id, &req)
        .await?
        .ok_or_else(showing_not_found)?;
    Ok(ApiResponse::data(showing).with_message("Showing updated successfully"))
}

/// PUT /api/showings/:id/cancel - Cancel a scheduled showing
#[cfg_attr(feature = "openapi", utoipa::path(
    put,
    path = "/api/showings/{id}/cancel",
    tag = "Showings",
    params(("id" = i64, Path, description = "Showing id")),
    responses(
        (status = 200, description = "Showing cancelled successfully", body = ShowingRow),
        (status = 404, description = "Showing not found or already completed/cancelled", body = ErrorResponse),
    ),
    security(("bearer_auth" = []))
))]
pub async fn cancel_showing(
    State(db): State<DbClient>,
    PathId(id): PathId,
) -> ApiResult<impl IntoResponse> {
    let showing = db.showing_cancel(id).await?.ok_or_else(|| {
        ApiError::not_found("Showing not found or already completed/cancelled")
    })?;
    Ok(ApiResponse::data(showing).with_message("Showing cancelled successfully"))
}

/// PUT /api/showings/:id/feedback - Record feedback and complete the showing
#[cfg_attr(feature = "openapi", utoipa::path(
    put,
    path = "/api/showings/{id}/feedback",
    tag = "Showings",
    params(("id" = i64, Path, description = "Showing id")),
    request_body = ShowingFeedbackRequest,
    responses(
        (status = 200, description = "Feedback added successfully", body = ShowingRow),
        (status = 400, description = "Invalid interest level", body = ErrorResponse),
        (status = 404, description = "Showing not found", body = ErrorResponse),
    ),
    security(("bearer_auth" = []))
))]
pub async fn add_feedback(
    State(db): State<DbClient>,
    PathId(id): PathId,
    ApiJson(req): ApiJson<ShowingFeedbackRequest>,
) -> ApiResult<impl IntoResponse> {
    let interest_level = req.interest_level()?;
    let showing = db
        .showing_feedback(
            id,
            req.feedback.as_deref(),
            interest_level.map(|level| level.as_db_str()),
        )
        .await?
        .ok_or_else(showing_not_found)?;
    Ok(ApiResponse::data(showing).with_message("Feedback added successfully"))
}

// ============================================================================
// ROUTER
// ============================================================================

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_showings).post(create_showing))
        .route("/upcoming", get(upcoming_showings))
        .route("/agent/:agentId/schedule", get(agent_schedule))
        .route("/:id", get(get_showing).put(update_showing))
        .route("/:id/cancel", put(cancel_showing))
        .route("/:id/feedback", put(add_feedback))
}
