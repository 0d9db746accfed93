//! Agent REST API Routes
//!
//! Reads are open to any authenticated user. Creating and updating a
//! profile needs admin or manager; deleting one needs admin.

use axum::{
    extract::State,
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::{get, post, put},
    Router,
};

use crate::{
    db::DbClient,
    error::{ApiError, ApiResult, ErrorResponse},
    extractors::{ApiJson, ApiQuery, PathId},
    middleware::{require_roles, RoleGuard},
    pagination::Pagination,
    response::{created, ApiResponse},
    state::AppState,
    types::{
        AgentDetail, AgentFilter, AgentListItem, AgentRow, AgentStats, CreateAgentRequest,
        PeriodQuery, UpdateAgentRequest,
    },
};

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// GET /api/agents - List agents
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/agents",
    tag = "Agents",
    params(AgentFilter),
    responses(
        (status = 200, description = "Paginated agents", body = Vec<AgentListItem>),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
    ),
    security(("bearer_auth" = []))
))]
pub async fn list_agents(
    State(db): State<DbClient>,
    ApiQuery(filter): ApiQuery<AgentFilter>,
) -> ApiResult<impl IntoResponse> {
    let page = Pagination::from_query(filter.page.as_deref(), filter.limit.as_deref());
    db.agent_list(&filter, &page).await
}

/// GET /api/agents/:id - Agent with totals and recent deals
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/agents/{id}",
    tag = "Agents",
    params(("id" = i64, Path, description = "Agent id")),
    responses(
        (status = 200, description = "Agent found", body = AgentDetail),
        (status = 404, description = "Agent not found", body = ErrorResponse),
    ),
    security(("bearer_auth" = []))
))]
pub async fn get_agent(
    State(db): State<DbClient>,
    PathId(id): PathId,
) -> ApiResult<impl IntoResponse> {
    let agent = db
        .agent_detail(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Agent not found"))?;
    Ok(ApiResponse::data(agent))
}

/// GET /api/agents/:id/stats - Performance aggregates
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/agents/{id}/stats",
    tag = "Agents",
    params(("id" = i64, Path, description = "Agent id"), PeriodQuery),
    responses(
        (status = 200, description = "Agent statistics", body = AgentStats),
        (status = 404, description = "Agent not found", body = ErrorResponse),
    ),
    security(("bearer_auth" = []))
))]
pub async fn get_agent_stats(
    State(db): State<DbClient>,
    PathId(id): PathId,
    ApiQuery(query): ApiQuery<PeriodQuery>,
) -> ApiResult<impl IntoResponse> {
    let stats = db
        .agent_stats(id, query.period())
        .await?
        .ok_or_else(|| ApiError::not_found("Agent not found"))?;
    Ok(ApiResponse::data(stats))
}

/// POST /api/agents - Create an agent profile
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/api/agents",
    tag = "Agents",
    request_body = CreateAgentRequest,
    responses(
        (status = 201, description = "Agent created successfully", body = AgentRow),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 403, description = "Admin or manager role required", body = ErrorResponse),
    ),
    security(("bearer_auth" = []))
))]
pub async fn create_agent(
    State(db): State<DbClient>,
    ApiJson(req): ApiJson<CreateAgentRequest>,
) -> ApiResult<impl IntoResponse> {
    req.validate()?;
    let agent = db.agent_create(&req).await?;
    Ok(created(agent, "Agent created successfully"))
}

/// PUT /api/agents/:id - Update an agent profile
#[cfg_attr(feature = "openapi", utoipa::path(
    put,
    path = "/api/agents/{id}",
    tag = "Agents",
    params(("id" = i64, Path, description = "Agent id")),
    request_body = UpdateAgentRequest,
    responses(
        (status = 200, description = "Agent updated successfully", body = AgentRow),
        (status = 403, description = "Admin or manager role required", body = ErrorResponse),
        (status = 404, description = "Agent not found", body = ErrorResponse),
    ),
    security(("bearer_auth" = []))
))]
pub async fn update_agent(
    State(db): State<DbClient>,
    PathId(id): PathId,
    ApiJson(req): ApiJson<UpdateAgentRequest>,
) -> ApiResult<impl IntoResponse> {
    req.validate()?;
    let agent = db
        .agent_update(id, &req)
        .await?
        .ok_or_else(|| ApiError::not_found("Agent not found"))?;
    Ok(ApiResponse::data(agent).with_message("Agent updated successfully"))
}

/// DELETE /api/agents/:id - Remove an agent profile
#[cfg_attr(feature = "openapi", utoipa::path(
    delete,
    path = "/api/agents/{id}",
    tag = "Agents",
    params(("id" = i64, Path, description = "Agent id")),
    responses(
        (status = 200, description = "Agent deleted successfully"),
        (status = 403, description = "Admin role required", body = ErrorResponse),
        (status = 404, description = "Agent not found", body = ErrorResponse),
    ),
    security(("bearer_auth" = []))
))]
pub async fn delete_agent(
    State(db): State<DbClient>,
    PathId(id): PathId,
) -> ApiResult<impl IntoResponse> {
    if !db.agent_delete(id).await? {
        return Err(ApiError::not_found("Agent not found"));
    }
    Ok(ApiResponse::message("Agent deleted successfully"))
}

// ============================================================================
// ROUTER
// ============================================================================

pub fn create_router() -> Router<AppState> {
    let managed = Router::new()
        .route("/", post(create_agent))
        .route("/:id", put(update_agent))
        .route_layer(from_fn_with_state(RoleGuard::ADMIN_OR_MANAGER, require_roles));

    let admin = Router::new()
        .route("/:id", axum::routing::delete(delete_agent))
        .route_layer(from_fn_with_state(RoleGuard::ADMIN, require_roles));

    Router::new()
        .route("/", get(list_agents))
        .route("/:id", get(get_agent))
        .route("/:id/stats", get(get_agent_stats))
        .merge(managed)
        .merge(admin)
}
