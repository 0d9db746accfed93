//! Axum Middleware for Authentication and Authorization
//!
//! - `auth_middleware` requires a valid bearer token whose user still exists
//! - `optional_auth_middleware` attaches the caller when a good token is present
//! - `require_roles` rejects callers outside a fixed role set
//!
//! The resolved [`AuthContext`] is injected into request extensions and read
//! back by the [`AuthExtractor`] / [`OptionalAuth`] extractors.

use crate::auth::{extract_bearer_token, validate_jwt_token, AuthConfig, AuthContext};
use crate::db::DbClient;
use crate::error::{ApiError, ErrorCode};
use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use estate_core::UserRole;
use std::sync::Arc;

// ============================================================================
// MIDDLEWARE STATE
// ============================================================================

/// Shared state for the authentication middleware.
#[derive(Clone)]
pub struct AuthMiddlewareState {
    pub auth_config: Arc<AuthConfig>,
    pub db: DbClient,
}

impl AuthMiddlewareState {
    pub fn new(auth_config: Arc<AuthConfig>, db: DbClient) -> Self {
        Self { auth_config, db }
    }

    /// Decode the bearer token and load the caller from the `users` table.
    async fn authenticate(&self, token: Option<&str>) -> Result<AuthContext, ApiError> {
        let token = token.ok_or_else(ApiError::no_token)?;
        let claims = validate_jwt_token(&self.auth_config, token)?;
        let user_id = claims.user_id()?;

        self.db
            .user_auth_context(user_id)
            .await?
            .ok_or_else(|| ApiError::invalid_token("Invalid token. User not found."))
    }
}

/// Owned copy of the bearer token so no borrow of the request is held across awaits.
fn bearer_token(request: &Request) -> Option<String> {
    request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(extract_bearer_token)
        .map(str::to_owned)
}

// ============================================================================
// MIDDLEWARE FUNCTIONS
// ============================================================================

/// Require authentication.
///
/// ```ignore
/// let app = Router::new()
///     .route("/api/deals", get(list_deals))
///     .layer(middleware::from_fn_with_state(auth_state, auth_middleware));
/// ```
pub async fn auth_middleware(
    State(state): State<AuthMiddlewareState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthMiddlewareError> {
    let token = bearer_token(&request);
    let auth_context = state
        .authenticate(token.as_deref())
        .await
        .map_err(AuthMiddlewareError)?;

    request.extensions_mut().insert(auth_context);
    Ok(next.run(request).await)
}

/// Attach the caller when the token checks out; otherwise continue anonymously.
pub async fn optional_auth_middleware(
    State(state): State<AuthMiddlewareState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = bearer_token(&request);
    match state.authenticate(token.as_deref()).await {
        Ok(auth_context) => {
            request.extensions_mut().insert(auth_context);
        }
        Err(e) => {
            if e.code.status_code().is_server_error() {
                tracing::warn!(error = %e, "Optional authentication failed");
            }
        }
    }
    next.run(request).await
}

/// Roles allowed through [`require_roles`].
#[derive(Debug, Clone, Copy)]
pub struct RoleGuard(pub &'static [UserRole]);

impl RoleGuard {
    pub const ADMIN: RoleGuard = RoleGuard(&[UserRole::Admin]);
    pub const ADMIN_OR_MANAGER: RoleGuard = RoleGuard(&[UserRole::Admin, UserRole::Manager]);
}

/// Must run after `auth_middleware`.
///
/// ```ignore
/// let users = Router::new()
///     .route("/", get(list_users))
///     .route_layer(middleware::from_fn_with_state(RoleGuard::ADMIN, require_roles));
/// ```
pub async fn require_roles(
    State(guard): State<RoleGuard>,
    request: Request,
    next: Next,
) -> Result<Response, AuthMiddlewareError> {
    let auth_context = request
        .extensions()
        .get::<AuthContext>()
        .ok_or_else(|| AuthMiddlewareError(ApiError::unauthorized("Not authenticated.")))?;

    if !auth_context.has_any_role(guard.0) {
        tracing::debug!(
            user_id = auth_context.user_id,
            role = %auth_context.role,
            "Role check failed"
        );
        return Err(AuthMiddlewareError(ApiError::forbidden()));
    }

    Ok(next.run(request).await)
}

// ============================================================================
// ERROR HANDLING
// ============================================================================

/// Middleware rejection, rendered through the regular error envelope.
#[derive(Debug)]
pub struct AuthMiddlewareError(pub ApiError);

impl IntoResponse for AuthMiddlewareError {
    fn into_response(self) -> Response {
        self.0.into_response()
    }
}

impl From<AuthMiddlewareError> for ApiError {
    fn from(err: AuthMiddlewareError) -> Self {
        err.0
    }
}

// ============================================================================
// TYPED EXTRACTORS
// ============================================================================

/// Authenticated caller. Routes using it must sit behind `auth_middleware`;
/// without it the extractor fails with 500.
#[derive(Debug, Clone)]
pub struct AuthExtractor(pub AuthContext);

#[async_trait]
impl<S> FromRequestParts<S> for AuthExtractor
where
    S: Send + Sync,
{
    type Rejection = AuthMiddlewareError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .map(AuthExtractor)
            .ok_or_else(|| {
                AuthMiddlewareError(ApiError::new(
                    ErrorCode::InternalError,
                    "AuthContext not found in request extensions. \
                     Ensure auth_middleware is applied to this route.",
                ))
            })
    }
}

impl std::ops::Deref for AuthExtractor {
    type Target = AuthContext;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Caller on routes behind `optional_auth_middleware`.
#[derive(Debug, Clone, Default)]
pub struct OptionalAuth(pub Option<AuthContext>);

#[async_trait]
impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(OptionalAuth(parts.extensions.get::<AuthContext>().cloned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbConfig;
    use axum::{
        body::Body,
        http::{Request as HttpRequest, StatusCode},
        middleware,
        routing::get,
        Extension, Router,
    };
    use tower::ServiceExt;

    fn agent_context() -> AuthContext {
        AuthContext {
            user_id: 7,
            email: "agent@estatehub.io".to_string(),
            role: UserRole::Agent,
            agent_id: Some(3),
        }
    }

    fn guarded_app(guard: RoleGuard, ctx: Option<AuthContext>) -> Router {
        let router = Router::new()
            .route("/guarded", get(|| async { "ok" }))
            .route_layer(middleware::from_fn_with_state(guard, require_roles));
        match ctx {
            Some(ctx) => router.layer(Extension(ctx)),
            None => router,
        }
    }

    fn request(uri: &str) -> HttpRequest<Body> {
        HttpRequest::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("valid request")
    }

    fn auth_state() -> AuthMiddlewareState {
        let db = DbClient::from_config(&DbConfig::default()).expect("lazy pool");
        AuthMiddlewareState::new(Arc::new(AuthConfig::default()), db)
    }

    #[tokio::test]
    async fn test_role_guard_allows_listed_role() {
        let mut ctx = agent_context();
        ctx.role = UserRole::Manager;
        let response = guarded_app(RoleGuard::ADMIN_OR_MANAGER, Some(ctx))
            .oneshot(request("/guarded"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_role_guard_rejects_other_roles() {
        let response = guarded_app(RoleGuard::ADMIN, Some(agent_context()))
            .oneshot(request("/guarded"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_role_guard_without_context_is_unauthorized() {
        let response = guarded_app(RoleGuard::ADMIN, None)
            .oneshot(request("/guarded"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_missing_token_is_rejected_before_db() {
        let app = Router::new()
            .route("/protected", get(|| async { "ok" }))
            .layer(middleware::from_fn_with_state(auth_state(), auth_middleware));

        let response = app.oneshot(request("/protected")).await.expect("response");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let json: serde_json::Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(json["message"], "Access denied. No token provided.");
    }

    #[tokio::test]
    async fn test_malformed_token_is_rejected_before_db() {
        let app = Router::new()
            .route("/protected", get(|| async { "ok" }))
            .layer(middleware::from_fn_with_state(auth_state(), auth_middleware));

        let req = HttpRequest::builder()
            .uri("/protected")
            .header("authorization", "Bearer not.a.jwt")
            .body(Body::empty())
            .expect("valid request");
        let response = app.oneshot(req).await.expect("response");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_optional_auth_passes_anonymous_requests() {
        async fn handler(OptionalAuth(ctx): OptionalAuth) -> String {
            ctx.map(|c| c.email).unwrap_or_else(|| "anonymous".to_string())
        }

        let app = Router::new()
            .route("/public", get(handler))
            .layer(middleware::from_fn_with_state(
                auth_state(),
                optional_auth_middleware,
            ));

        let response = app.oneshot(request("/public")).await.expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        assert_eq!(&body[..], b"anonymous");
    }

    #[tokio::test]
    async fn test_auth_extractor_deref() {
        async fn handler(auth: AuthExtractor) -> String {
            format!("{}:{}", auth.user_id, auth.has_role(UserRole::Agent))
        }

        let app = Router::new()
            .route("/me", get(handler))
            .layer(Extension(agent_context()));
        let response = app.oneshot(request("/me")).await.expect("response");
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        assert_eq!(&body[..], b"7:true");
    }

    #[tokio::test]
    async fn test_auth_extractor_without_middleware() {
        async fn handler(AuthExtractor(_auth): AuthExtractor) -> &'static str {
            "unreachable"
        }

        let app = Router::new().route("/unprotected", get(handler));
        let response = app.oneshot(request("/unprotected")).await.expect("response");
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
