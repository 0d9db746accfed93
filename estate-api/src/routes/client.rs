//! Client REST API Routes

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
    pagination::Pagination,
    response::{created, ApiResponse},
    state::AppState,
    types::{
        AssignAgentRequest, ClientDetail, ClientFilter, ClientListItem, ClientRow,
        CreateClientRequest, LeadScoreRequest, UpdateClientRequest,
    },
};

fn client_not_found() -> ApiError {
    ApiError::not_found("Client not found")
}

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// GET /api/clients - List clients, best leads first
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/clients",
    tag = "Clients",
    params(ClientFilter),
    responses(
        (status = 200, description = "Paginated clients", body = Vec<ClientListItem>),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
    ),
    security(("bearer_auth" = []))
))]
pub async fn list_clients(
    State(db): State<DbClient>,
    ApiQuery(filter): ApiQuery<ClientFilter>,
) -> ApiResult<impl IntoResponse> {
    let page = Pagination::from_query(filter.page.as_deref(), filter.limit.as_deref());
    db.client_list(&filter, &page).await
}

/// GET /api/clients/:id - Client with deals, communications and showings
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/clients/{id}",
    tag = "Clients",
    params(("id" = i64, Path, description = "Client id")),
    responses(
        (status = 200, description = "Client found", body = ClientDetail),
        (status = 404, description = "Client not found", body = ErrorResponse),
    ),
    security(("bearer_auth" = []))
))]
pub async fn get_client(
    State(db): State<DbClient>,
    PathId(id): PathId,
) -> ApiResult<impl IntoResponse> {
    let client = db.client_detail(id).await?.ok_or_else(client_not_found)?;
    Ok(ApiResponse::data(client))
}

/// POST /api/clients - Create a client
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/api/clients",
    tag = "Clients",
    request_body = CreateClientRequest,
    responses(
        (status = 201, description = "Client created successfully", body = ClientRow),
        (status = 400, description = "Invalid request", body = ErrorResponse),
    ),
    security(("bearer_auth" = []))
))]
pub async fn create_client(
    State(db): State<DbClient>,
    ApiJson(req): ApiJson<CreateClientRequest>,
) -> ApiResult<impl IntoResponse> {
    req.validate()?;
    let client = db.client_create(&req).await?;
    Ok(created(client, "Client created successfully"))
}

/// PUT /api/clients/:id - Update a client
#[cfg_attr(feature = "openapi", utoipa::path(
    put,
    path = "/api/clients/{id}",
    tag = "Clients",
    params(("id" = i64, Path, description = "Client id")),
    request_body = UpdateClientRequest,
    responses(
        (status = 200, description = "Client updated successfully", body = ClientRow),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Client not found", body = ErrorResponse),
    ),
    security(("bearer_auth" = []))
))]
pub async fn update_client(
    State(db): State<DbClient>,
    PathId(id): PathId,
    ApiJson(req): ApiJson<UpdateClientRequest>,
) -> ApiResult<impl IntoResponse> {
    req.validate()?;
    let client = db.client_update(id, &req).await?.ok_or_else(client_not_found)?;
    Ok(ApiResponse::data(client).with_message("Client updated successfully"))
}

/// DELETE /api/clients/:id
#[cfg_attr(feature = "openapi", utoipa::path(
    delete,
    path = "/api/clients/{id}",
    tag = "Clients",
    params(("id" = i64, Path, description = "Client id")),
    responses(
        (status = 200, description = "Client deleted successfully"),
        (status = 404, description = "Client not found", body = ErrorResponse),
    ),
    security(("bearer_auth" = []))
))]
pub async fn delete_client(
    State(db): State<DbClient>,
    PathId(id): PathId,
) -> ApiResult<impl IntoResponse> {
    if !db.client_delete(id).await? {
        return Err(client_not_found());
    }
    Ok(ApiResponse::message("Client deleted successfully"))
}

/// PUT /api/clients/:id/assign-agent - Assign or unassign the client's agent
#[cfg_attr(feature = "openapi", utoipa::path(
    put,
    path = "/api/clients/{id}/assign-agent",
    tag = "Clients",
    params(("id" = i64, Path, description = "Client id")),
    request_body = AssignAgentRequest,
    responses(
        (status = 200, description = "Agent assigned or unassigned", body = ClientRow),
        (status = 400, description = "Agent not found", body = ErrorResponse),
        (status = 404, description = "Client not found", body = ErrorResponse),
    ),
    security(("bearer_auth" = []))
))]
pub async fn assign_agent(
    State(db): State<DbClient>,
    PathId(id): PathId,
    ApiJson(req): ApiJson<AssignAgentRequest>,
) -> ApiResult<impl IntoResponse> {
    if !db.client_exists(id).await? {
        return Err(client_not_found());
    }
    if let Some(agent_id) = req.agent_id {
        if !db.agent_exists(agent_id).await? {
            return Err(ApiError::invalid_input("Agent not found"));
        }
    }

    let client = db
        .client_assign_agent(id, req.agent_id)
        .await?
        .ok_or_else(client_not_found)?;
    let message = if req.agent_id.is_some() {
        "Agent assigned successfully"
    } else {
        "Agent unassigned successfully"
    };
    Ok(ApiResponse::data(client).with_message(message))
}

/// PUT /api/clients/:id/lead-score - Set the lead score (0-100)
#[cfg_attr(feature = "openapi", utoipa::path(
    put,
    path = "/api/clients/{id}/lead-score",
    tag = "Clients",
    params(("id" = i64, Path, description = "Client id")),
    request_body = LeadScoreRequest,
    responses(
        (status = 200, description = "Lead score updated successfully", body = ClientRow),
        (status = 400, description = "Lead score out of range", body = ErrorResponse),
        (status = 404, description = "Client not found", body = ErrorResponse),
    ),
    security(("bearer_auth" = []))
))]
pub async fn update_lead_score(
    State(db): State<DbClient>,
    PathId(id): PathId,
    ApiJson(req): ApiJson<LeadScoreRequest>,
) -> ApiResult<impl IntoResponse> {
    let score = req.validate()?;
    let client = db
        .client_set_lead_score(id, score)
        .await?
        .ok_or_else(client_not_found)?;
    Ok(ApiResponse::data(client).with_message("Lead score updated successfully"))
}

// ============================================================================
// ROUTER
// ============================================================================

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_clients).post(create_client))
        .route(
            "/:id",
            get(get_client).put(update_client).delete(delete_client),
        )
        .route("/:id/assign-agent", put(assign_agent))
        .route("/:id/lead-score", put(update_lead_score))
}
