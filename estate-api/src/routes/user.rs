//! User administration routes. Every route requires the admin role.

use axum::{
    extract::State,
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::get,
    Router,
};
use estate_core::UserRole;

use crate::{
    auth::hash_password,
    db::DbClient,
    error::{ApiError, ApiResult, ErrorResponse},
    extractors::{ApiJson, ApiQuery, PathId},
    middleware::{require_roles, AuthExtractor, RoleGuard},
    pagination::Pagination,
    response::ApiResponse,
    state::AppState,
    types::{normalize_email, UpdateUserRequest, UserDetail, UserFilter, UserListItem, UserRow},
    validation::{self, parse_enum},
};

/// GET /api/users - List users
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/users",
    tag = "Users",
    params(UserFilter),
    responses(
        (status = 200, description = "Paginated users", body = Vec<UserListItem>),
        (status = 403, description = "Admin role required", body = ErrorResponse),
    ),
    security(("bearer_auth" = []))
))]
pub async fn list_users(
    State(db): State<DbClient>,
    ApiQuery(filter): ApiQuery<UserFilter>,
) -> ApiResult<impl IntoResponse> {
    let page = Pagination::from_query(filter.page.as_deref(), filter.limit.as_deref());
    db.user_list(&filter, &page).await
}

/// GET /api/users/:id - User with agent profile
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/users/{id}",
    tag = "Users",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "User found", body = UserDetail),
        (status = 404, description = "User not found", body = ErrorResponse),
    ),
    security(("bearer_auth" = []))
))]
pub async fn get_user(
    State(db): State<DbClient>,
    PathId(id): PathId,
) -> ApiResult<impl IntoResponse> {
    let user = db
        .user_detail(id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(ApiResponse::data(user))
}

/// PUT /api/users/:id - Update email, role or password
#[cfg_attr(feature = "openapi", utoipa::path(
    put,
    path = "/api/users/{id}",
    tag = "Users",
    params(("id" = i64, Path, description = "User id")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated successfully", body = UserRow),
        (status = 400, description = "No fields to update", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
    ),
    security(("bearer_auth" = []))
))]
pub async fn update_user(
    State(db): State<DbClient>,
    PathId(id): PathId,
    ApiJson(req): ApiJson<UpdateUserRequest>,
) -> ApiResult<impl IntoResponse> {
    req.validate()?;

    let email = validation::non_blank(req.email.as_deref()).map(normalize_email);
    let role = parse_enum::<UserRole>(req.role.as_deref())?;
    let password_hash = match validation::non_blank(req.password.as_deref()) {
        Some(password) => Some(hash_password(password.to_string()).await?),
        None => None,
    };

    let user = db
        .user_update(id, email.as_deref(), role, password_hash.as_deref())
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(ApiResponse::data(user).with_message("User updated successfully"))
}

/// DELETE /api/users/:id - Delete another user
#[cfg_attr(feature = "openapi", utoipa::path(
    delete,
    path = "/api/users/{id}",
    tag = "Users",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "User deleted successfully"),
        (status = 400, description = "Cannot delete your own account", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
    ),
    security(("bearer_auth" = []))
))]
pub async fn delete_user(
    State(db): State<DbClient>,
    auth: AuthExtractor,
    PathId(id): PathId,
) -> ApiResult<impl IntoResponse> {
    if id == auth.user_id {
        return Err(ApiError::invalid_input("Cannot delete your own account"));
    }

    if !db.user_delete(id).await? {
        return Err(ApiError::not_found("User not found"));
    }

    tracing::info!(user_id = id, deleted_by = auth.user_id, "User deleted");
    Ok(ApiResponse::message("User deleted successfully"))
}

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users))
        .route("/:id", get(get_user).put(update_user).delete(delete_user))
        .route_layer(from_fn_with_state(RoleGuard::ADMIN, require_roles))
}
