//! Authentication REST API Routes
//!
//! `register` and `login` are public; `me` and `change-password` sit behind
//! `auth_middleware`.

use axum::{
    extract::State,
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::{get, post, put},
    Router,
};
use estate_core::UserRole;
use std::sync::Arc;

use crate::{
    auth::{generate_jwt_token, hash_password, verify_password, AuthConfig},
    db::{DbClient, NewAgentProfile},
    error::{ApiError, ApiResult, ErrorResponse},
    extractors::ApiJson,
    middleware::{auth_middleware, AuthExtractor, AuthMiddlewareState},
    response::{created, ApiResponse},
    state::AppState,
    types::{
        normalize_email, ChangePasswordRequest, LoginRequest, LoginResponse, MeResponse,
        RegisterRequest, RegisterResponse, UserSummary,
    },
    validation::{self, RequiredFields},
};

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// POST /api/auth/register - Create an account
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered successfully", body = RegisterResponse),
        (status = 400, description = "Invalid request or email taken", body = ErrorResponse),
    ),
))]
pub async fn register(
    State(db): State<DbClient>,
    State(auth): State<Arc<AuthConfig>>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    req.validate()?;

    let email = req.normalized_email();
    if db.user_email_taken(&email).await? {
        return Err(ApiError::invalid_input("User with this email already exists"));
    }

    let password = req.password.clone().unwrap_or_default();
    let password_hash = hash_password(password).await?;
    let role = req.role();

    let profile = if req.wants_agent_profile() {
        Some(NewAgentProfile {
            first_name: req.first_name.as_deref().unwrap_or_default().trim(),
            last_name: req.last_name.as_deref().unwrap_or_default().trim(),
        })
    } else {
        None
    };

    let user = db.user_register(&email, &password_hash, role, profile).await?;
    let token = generate_jwt_token(&auth, user.id, user.role)?;

    Ok(created(
        RegisterResponse { user, token },
        "User registered successfully",
    ))
}

/// POST /api/auth/login - Exchange credentials for a token
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Missing email or password", body = ErrorResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
    ),
))]
pub async fn login(
    State(db): State<DbClient>,
    State(auth): State<Arc<AuthConfig>>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let (Some(email), Some(password)) = (
        validation::non_blank(req.email.as_deref()),
        req.password.as_deref().filter(|p| !p.is_empty()),
    ) else {
        return Err(ApiError::invalid_input("Please provide email and password"));
    };

    let credentials = db
        .user_credentials(&normalize_email(email))
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid credentials"))?;

    if !verify_password(password.to_string(), credentials.password_hash.clone()).await? {
        tracing::debug!(user_id = credentials.id, "Login rejected");
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    let agent = if credentials.role == UserRole::Agent {
        db.agent_summary_by_user(credentials.id).await?
    } else {
        None
    };
    let token = generate_jwt_token(&auth, credentials.id, credentials.role)?;

    Ok(ApiResponse::data(LoginResponse {
        user: UserSummary {
            id: credentials.id,
            email: credentials.email,
            role: credentials.role,
        },
        agent,
        token,
    })
    .with_message("Login successful"))
}

/// GET /api/auth/me - The caller and their agent profile
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "Auth",
    responses(
        (status = 200, description = "Current user", body = MeResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
    ),
    security(("bearer_auth" = []))
))]
pub async fn me(
    State(db): State<DbClient>,
    auth: AuthExtractor,
) -> ApiResult<impl IntoResponse> {
    let detail = db
        .user_detail(auth.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(ApiResponse::data(MeResponse {
        user: detail.user,
        agent: detail.agent,
    }))
}

/// PUT /api/auth/change-password - Replace the caller's password
#[cfg_attr(feature = "openapi", utoipa::path(
    put,
    path = "/api/auth/change-password",
    tag = "Auth",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed successfully"),
        (status = 400, description = "Missing or weak password", body = ErrorResponse),
        (status = 401, description = "Current password is incorrect", body = ErrorResponse),
    ),
    security(("bearer_auth" = []))
))]
pub async fn change_password(
    State(db): State<DbClient>,
    auth: AuthExtractor,
    ApiJson(req): ApiJson<ChangePasswordRequest>,
) -> ApiResult<impl IntoResponse> {
    RequiredFields::new()
        .check("currentPassword", &req.current_password)
        .check("newPassword", &req.new_password)
        .finish()?;
    let current = req.current_password.unwrap_or_default();
    let new_password = req.new_password.unwrap_or_default();
    validation::validate_password(&new_password)?;

    let credentials = db
        .user_credentials_by_id(auth.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    if !verify_password(current, credentials.password_hash).await? {
        return Err(ApiError::unauthorized("Current password is incorrect"));
    }

    let password_hash = hash_password(new_password).await?;
    db.user_set_password(auth.user_id, &password_hash).await?;
    tracing::info!(user_id = auth.user_id, "Password changed");

    Ok(ApiResponse::message("Password changed successfully"))
}

// ============================================================================
// ROUTER
// ============================================================================

pub fn create_router(auth_state: AuthMiddlewareState) -> Router<AppState> {
    let protected = Router::new()
        .route("/me", get(me))
        .route("/change-password", put(change_password))
        .route_layer(from_fn_with_state(auth_state, auth_middleware));

    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .merge(protected)
}
