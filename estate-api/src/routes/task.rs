//! Task REST API Routes

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
    response::{created, ApiResponse, Counted, Paginated},
    state::AppState,
    types::{
        CreateTaskRequest, OverdueFilter, TaskFilter, TaskListItem, TaskRow, UpdateTaskRequest,
    },
};

fn task_not_found() -> ApiError {
    ApiError::not_found("Task not found")
}

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// GET /api/tasks - List tasks, most urgent first
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/tasks",
    tag = "Tasks",
    params(TaskFilter),
    responses(
        (status = 200, description = "Paginated tasks", body = Vec<TaskListItem>),
    ),
    security(("bearer_auth" = []))
))]
pub async fn list_tasks(
    State(db): State<DbClient>,
    ApiQuery(filter): ApiQuery<TaskFilter>,
) -> ApiResult<impl IntoResponse> {
    let page = Pagination::from_query(filter.page.as_deref(), filter.limit.as_deref());
    db.task_list(&filter, &page).await
}

/// GET /api/tasks/my-tasks - Tasks assigned to the caller's agent profile
///
/// A caller without an agent profile gets an empty page.
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/tasks/my-tasks",
    tag = "Tasks",
    params(PageQuery),
    responses(
        (status = 200, description = "Paginated tasks of the caller", body = Vec<TaskListItem>),
    ),
    security(("bearer_auth" = []))
))]
pub async fn my_tasks(
    State(db): State<DbClient>,
    auth: AuthExtractor,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> ApiResult<impl IntoResponse> {
    let page = query.pagination();
    match auth.agent_id {
        Some(agent_id) => db.task_list_for_agent(agent_id, &page).await,
        None => Ok(Paginated::empty(&page)),
    }
}

/// GET /api/tasks/overdue - Pending tasks past their due date
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/tasks/overdue",
    tag = "Tasks",
    params(OverdueFilter),
    responses(
        (status = 200, description = "Overdue tasks with their count", body = Vec<TaskListItem>),
    ),
    security(("bearer_auth" = []))
))]
pub async fn overdue_tasks(
    State(db): State<DbClient>,
    ApiQuery(filter): ApiQuery<OverdueFilter>,
) -> ApiResult<impl IntoResponse> {
    let tasks = db.task_overdue(&filter).await?;
    Ok(Counted::new(tasks))
}

/// GET /api/tasks/:id
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/tasks/{id}",
    tag = "Tasks",
    params(("id" = i64, Path, description = "Task id")),
    responses(
        (status = 200, description = "Task found", body = TaskListItem),
        (status = 404, description = "Task not found", body = ErrorResponse),
    ),
    security(("bearer_auth" = []))
))]
pub async fn get_task(
    State(db): State<DbClient>,
    PathId(id): PathId,
) -> ApiResult<impl IntoResponse> {
    let task = db.task_detail(id).await?.ok_or_else(task_not_found)?;
    Ok(ApiResponse::data(task))
}

/// POST /api/tasks
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/api/tasks",
    tag = "Tasks",
    request_body = CreateTaskRequest,
    responses(
        (status = 201, description = "Task created successfully", body = TaskRow),
        (status = 400, description = "Invalid request", body = ErrorResponse),
    ),
    security(("bearer_auth" = []))
))]
pub async fn create_task(
    State(db): State<DbClient>,
    ApiJson(req): ApiJson<CreateTaskRequest>,
) -> ApiResult<impl IntoResponse> {
    req.validate()?;
    let task = db.task_create(&req).await?;
    Ok(created(task, "Task created successfully"))
}

/// PUT /api/tasks/:id
#[cfg_attr(feature = "openapi", utoipa::path(
    put,
    path = "/api/tasks/{id}",
    tag = "Tasks",
    params(("id" = i64, Path, description = "Task id")),
    request_body = UpdateTaskRequest,
    responses(
        (status = 200, description = "Task updated successfully", body = TaskRow),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Task not found", body = ErrorResponse),
    ),
    security(("bearer_auth" = []))
))]
pub async fn update_task(
    State(db): State<DbClient>,
    PathId(id): PathId,
    ApiJson(req): ApiJson<UpdateTaskRequest>,
) -> ApiResult<impl IntoResponse> {
    req.validate()?;
    let task = db.task_update(id, &req).await?.ok_or_else(task_not_found)?;
    Ok(ApiResponse::data(task).with_message("Task updated successfully"))
}

/// PUT /api/tasks/:id/complete - Complete a pending task
#[cfg_attr(feature = "openapi", utoipa::path(
    put,
    path = "/api/tasks/{id}/complete",
    tag = "Tasks",
    params(("id" = i64, Path, description = "Task id")),
    responses(
        (status = 200, description = "Task completed successfully", body = TaskRow),
        (status = 404, description = "Task not found or already completed", body = ErrorResponse),
    ),
    security(("bearer_auth" = []))
))]
pub async fn complete_task(
    State(db): State<DbClient>,
    PathId(id): PathId,
) -> ApiResult<impl IntoResponse> {
    let task = db
        .task_complete(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Task not found or already completed"))?;
    Ok(ApiResponse::data(task).with_message("Task completed successfully"))
}

/// DELETE /api/tasks/:id
#[cfg_attr(feature = "openapi", utoipa::path(
    delete,
    path = "/api/tasks/{id}",
    tag = "Tasks",
    params(("id" = i64, Path, description = "Task id")),
    responses(
        (status = 200, description = "Task deleted successfully"),
        (status = 404, description = "Task not found", body = ErrorResponse),
    ),
    security(("bearer_auth" = []))
))]
pub async fn delete_task(
    State(db): State<DbClient>,
    PathId(id): PathId,
) -> ApiResult<impl IntoResponse> {
    if !db.task_delete(id).await? {
        return Err(task_not_found());
    }
    Ok(ApiResponse::message("Task deleted successfully"))
}

// ============================================================================
// ROUTER
// ============================================================================

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_tasks).post(create_task))
        .route("/my-tasks", get(my_tasks))
        .route("/overdue", get(overdue_tasks))
        .route("/:id", get(get_task).put(update_task).delete(delete_task))
        .route("/:id/complete", put(complete_task))
}
