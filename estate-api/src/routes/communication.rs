//! Communication REST API Routes
//!
//! Calls, emails, meetings and messages logged against clients.

use axum::{
    extract::State,
    response::IntoResponse,
    routing::get,
    Router,
};

use crate::{
    db::DbClient,
    error::{ApiError, ApiResult, ErrorResponse},
    extractors::{ApiJson, ApiQuery, PathId},
    pagination::{PageQuery, Pagination},
    response::{created, ApiResponse},
    state::AppState,
    types::{
        ClientCommunications, CommunicationDetail, CommunicationFilter, CommunicationListItem,
        CommunicationRow, CommunicationSummary, CreateCommunicationRequest, SummaryFilter,
        UpdateCommunicationRequest,
    },
};

fn communication_not_found() -> ApiError {
    ApiError::not_found("Communication not found")
}

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// GET /api/communications - List communications, newest first
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/communications",
    tag = "Communications",
    params(CommunicationFilter),
    responses(
        (status = 200, description = "Paginated communications", body = Vec<CommunicationListItem>),
    ),
    security(("bearer_auth" = []))
))]
pub async fn list_communications(
    State(db): State<DbClient>,
    ApiQuery(filter): ApiQuery<CommunicationFilter>,
) -> ApiResult<impl IntoResponse> {
    let page = Pagination::from_query(filter.page.as_deref(), filter.limit.as_deref());
    db.communication_list(&filter, &page).await
}

/// GET /api/communications/summary - Totals per type
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/communications/summary",
    tag = "Communications",
    params(SummaryFilter),
    responses(
        (status = 200, description = "Counts per communication type", body = Vec<CommunicationSummary>),
    ),
    security(("bearer_auth" = []))
))]
pub async fn communication_summary(
    State(db): State<DbClient>,
    ApiQuery(filter): ApiQuery<SummaryFilter>,
) -> ApiResult<impl IntoResponse> {
    let summary = db.communication_summary(&filter).await?;
    Ok(ApiResponse::data(summary))
}

/// GET /api/communications/client/:clientId - One client's history
///
/// The paginated envelope also carries the client.
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/communications/client/{clientId}",
    tag = "Communications",
    params(("clientId" = i64, Path, description = "Client id"), PageQuery),
    responses(
        (status = 200, description = "Paginated history with the client", body = Vec<CommunicationListItem>),
        (status = 404, description = "Client not found", body = ErrorResponse),
    ),
    security(("bearer_auth" = []))
))]
pub async fn client_communications(
    State(db): State<DbClient>,
    PathId(client_id): PathId,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> ApiResult<impl IntoResponse> {
    let client = db
        .client_ref(client_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Client not found"))?;

    let page = query.pagination();
    let history = db.communication_list_for_client(client_id, &page).await?;
    Ok(ClientCommunications::new(
        client,
        history.data,
        &page,
        history.pagination.total_items,
    ))
}

/// GET /api/communications/:id
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/communications/{id}",
    tag = "Communications",
    params(("id" = i64, Path, description = "Communication id")),
    responses(
        (status = 200, description = "Communication found", body = CommunicationDetail),
        (status = 404, description = "Communication not found", body = ErrorResponse),
    ),
    security(("bearer_auth" = []))
))]
pub async fn get_communication(
    State(db): State<DbClient>,
    PathId(id): PathId,
) -> ApiResult<impl IntoResponse> {
    let communication = db
        .communication_detail(id)
        .await?
        .ok_or_else(communication_not_found)?;
    Ok(ApiResponse::data(communication))
}

/// POST /api/communications - Log a communication
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/api/communications",
    tag = "Communications",
    request_body = CreateCommunicationRequest,
    responses(
        (status = 201, description = "Communication logged successfully", body = CommunicationRow),
        (status = 400, description = "Invalid request or unknown client/agent", body = ErrorResponse),
    ),
    security(("bearer_auth" = []))
))]
pub async fn create_communication(
    State(db): State<DbClient>,
    ApiJson(req): ApiJson<CreateCommunicationRequest>,
) -> ApiResult<impl IntoResponse> {
    req.validate()?;
    let communication = db.communication_create(&req).await?;
    Ok(created(communication, "Communication logged successfully"))
}

/// PUT /api/communications/:id
#[cfg_attr(feature = "openapi", utoipa::path(
    put,
    path = "/api/communications/{id}",
    tag = "Communications",
    params(("id" = i64, Path, description = "Communication id")),
    request_body = UpdateCommunicationRequest,
    responses(
        (status = 200, description = "Communication updated successfully", body = CommunicationRow),
        (status = 404, description = "Communication not found", body = ErrorResponse),
    ),
    security(("bearer_auth" = []))
))]
pub async fn update_communication(
    State(db): State<DbClient>,
    PathId(id): PathId,
    ApiJson(req): ApiJson<UpdateCommunicationRequest>,
) -> ApiResult<impl IntoResponse> {
    req.validate()?;
    let communication = db
        .communication_update(id, &req)
        .await?
        .ok_or_else(communication_not_found)?;
    Ok(ApiResponse::data(communication).with_message("Communication updated successfully"))
}

/// DELETE /api/communications/:id
#[cfg_attr(feature = "openapi", utoipa::path(
    delete,
    path = "/api/communications/{id}",
    tag = "Communications",
    params(("id" = i64, Path, description = "Communication id")),
    responses(
        (status = 200, description = "Communication deleted successfully"),
        (status = 404, description = "Communication not found", body = ErrorResponse),
    ),
    security(("bearer_auth" = []))
))]
pub async fn delete_communication(
    State(db): State<DbClient>,
    PathId(id): PathId,
) -> ApiResult<impl IntoResponse> {
    if !db.communication_delete(id).await? {
        return Err(communication_not_found());
    }
    Ok(ApiResponse::message("Communication deleted successfully"))
}

// ============================================================================
// ROUTER
// ============================================================================

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_communications).post(create_communication))
        .route("/summary", get(communication_summary))
        .route("/client/:clientId", get(client_communications))
        .route(
            "/:id",
            get(get_communication)
                .put(update_communication)
                .delete(delete_communication),
        )
}
