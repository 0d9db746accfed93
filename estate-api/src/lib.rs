//! EstateHub API - REST layer of the real-estate CRM
//!
//! Axum handlers over a PostgreSQL schema of users, agents, properties,
//! clients, deals, showings, communications and tasks. Domain vocabulary
//! (enums, ids, the deal-stage transition plan) lives in `estate-core`.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod macros;
pub mod middleware;
#[cfg(feature = "openapi")]
pub mod openapi;
pub mod pagination;
pub mod response;
pub mod routes;
pub mod state;
pub mod telemetry;
pub mod types;
pub mod uploads;
pub mod validation;

// Re-export commonly used types
pub use auth::{
    generate_jwt_token, hash_password, validate_jwt_token, verify_password, AuthConfig,
    AuthContext, Claims,
};
pub use config::ApiConfig;
pub use db::{DbClient, DbConfig};
pub use error::{ApiError, ApiResult, ErrorCode, ErrorResponse};
pub use middleware::{auth_middleware, AuthMiddlewareState};
#[cfg(feature = "openapi")]
pub use openapi::ApiDoc;
pub use routes::create_api_router;
pub use state::AppState;
