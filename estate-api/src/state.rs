//! Shared application state for Axum routers.

use std::sync::Arc;

use crate::auth::AuthConfig;
use crate::config::ApiConfig;
use crate::db::DbClient;
use crate::middleware::AuthMiddlewareState;

/// Application-wide state shared across all routes.
#[derive(Clone)]
pub struct AppState {
    pub db: DbClient,
    pub auth: Arc<AuthConfig>,
    pub config: Arc<ApiConfig>,
    pub start_time: std::time::Instant,
}

impl AppState {
    pub fn new(db: DbClient, auth: AuthConfig, config: ApiConfig) -> Self {
        Self {
            db,
            auth: Arc::new(auth),
            config: Arc::new(config),
            start_time: std::time::Instant::now(),
        }
    }
}

crate::impl_from_ref!(DbClient, db);
crate::impl_from_ref!(Arc<AuthConfig>, auth);
crate::impl_from_ref!(Arc<ApiConfig>, config);
crate::impl_from_ref!(std::time::Instant, start_time);

impl axum::extract::FromRef<AppState> for AuthMiddlewareState {
    fn from_ref(state: &AppState) -> Self {
        AuthMiddlewareState::new(state.auth.clone(), state.db.clone())
    }
}
