//! Error Types for EstateHub API
//!
//! This module defines error handling for the API layer, including:
//! - ApiError struct carried through every handler
//! - ErrorCode enum for categorizing errors
//! - IntoResponse implementation producing the `{success: false, ...}` envelope
//! - Conversions from PostgreSQL, pool, extractor, and domain errors
//!
//! Database detail text is only attached to responses when the server runs
//! in development (see [`set_expose_details`]).

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use estate_core::{EnumParseError, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio_postgres::error::SqlState;

/// Whether `details` are serialized into error responses.
static EXPOSE_DETAILS: AtomicBool = AtomicBool::new(false);

/// Toggle inclusion of error details in responses. Called once at startup.
pub fn set_expose_details(expose: bool) {
    EXPOSE_DETAILS.store(expose, Ordering::Relaxed);
}

fn expose_details() -> bool {
    EXPOSE_DETAILS.load(Ordering::Relaxed)
}

// ============================================================================
// ERROR CODE ENUM
// ============================================================================

/// Error codes for API responses.
///
/// Each error code maps to a specific HTTP status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // ========================================================================
    // Authentication Errors (401, 403)
    // ========================================================================
    /// Request lacks valid authentication credentials
    Unauthorized,

    /// Request is authenticated but the role is not allowed
    Forbidden,

    /// Authentication token is invalid or malformed
    InvalidToken,

    /// Authentication token has expired
    TokenExpired,

    // ========================================================================
    // Validation Errors (400)
    // ========================================================================
    /// Request validation failed
    ValidationFailed,

    /// Request contains invalid input data
    InvalidInput,

    /// Required field is missing from request
    MissingField,

    /// Field value is out of valid range
    InvalidRange,

    /// Field format is incorrect
    InvalidFormat,

    /// Unique constraint violated
    DuplicateEntry,

    /// Foreign key points at a missing row
    InvalidReference,

    /// CHECK constraint violated
    ConstraintViolation,

    /// Upload rejected (size, field name, or file type)
    UploadRejected,

    // ========================================================================
    // Not Found Errors (404)
    // ========================================================================
    /// Requested entity does not exist
    EntityNotFound,

    /// No route matches the request path
    RouteNotFound,

    // ========================================================================
    // Server Errors (500, 503)
    // ========================================================================
    /// Internal server error
    InternalError,

    /// Database operation failed
    DatabaseError,

    /// Service is temporarily unavailable
    ServiceUnavailable,

    /// Database connection pool exhausted
    ConnectionPoolExhausted,
}

impl ErrorCode {
    /// Get the HTTP status code for this error code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::Unauthorized | ErrorCode::InvalidToken | ErrorCode::TokenExpired => {
                StatusCode::UNAUTHORIZED
            }

            ErrorCode::Forbidden => StatusCode::FORBIDDEN,

            ErrorCode::ValidationFailed
            | ErrorCode::InvalidInput
            | ErrorCode::MissingField
            | ErrorCode::InvalidRange
            | ErrorCode::InvalidFormat
            | ErrorCode::DuplicateEntry
            | ErrorCode::InvalidReference
            | ErrorCode::ConstraintViolation
            | ErrorCode::UploadRejected => StatusCode::BAD_REQUEST,

            ErrorCode::EntityNotFound | ErrorCode::RouteNotFound => StatusCode::NOT_FOUND,

            ErrorCode::ServiceUnavailable | ErrorCode::ConnectionPoolExhausted => {
                StatusCode::SERVICE_UNAVAILABLE
            }

            ErrorCode::InternalError | ErrorCode::DatabaseError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get a default message for this error code.
    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorCode::Unauthorized => "Access denied. No token provided.",
            ErrorCode::Forbidden => "Access denied. Insufficient permissions.",
            ErrorCode::InvalidToken => "Invalid token.",
            ErrorCode::TokenExpired => "Token expired.",

            ErrorCode::ValidationFailed => "Request validation failed",
            ErrorCode::InvalidInput => "Invalid input data",
            ErrorCode::MissingField => "Required field is missing",
            ErrorCode::InvalidRange => "Value is out of valid range",
            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::DuplicateEntry => "Duplicate entry. This record already exists.",
            ErrorCode::InvalidReference => {
                "Invalid reference. The related record does not exist."
            }
            ErrorCode::ConstraintViolation => "Invalid value. Check constraint violation.",
            ErrorCode::UploadRejected => "Upload rejected",

            ErrorCode::EntityNotFound => "Resource not found",
            ErrorCode::RouteNotFound => "Route not found",

            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database operation failed",
            ErrorCode::ServiceUnavailable => "Service temporarily unavailable",
            ErrorCode::ConnectionPoolExhausted => "Connection pool exhausted",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ============================================================================
// API ERROR STRUCT
// ============================================================================

/// Structured error for API operations.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    /// Error code categorizing the error
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,

    /// Diagnostic detail, only serialized in development
    pub details: Option<serde_json::Value>,
}

/// Wire shape of every error response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ErrorResponse {
    pub success: bool,
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Object>))]
    pub error: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Create a new API error with the given code, using the default message.
    pub fn from_code(code: ErrorCode) -> Self {
        Self::new(code, code.default_message())
    }

    /// Add additional details to the error.
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        self.code.status_code()
    }

    /// Build the wire body, honoring the details toggle.
    pub fn to_response_body(&self, include_details: bool) -> ErrorResponse {
        ErrorResponse {
            success: false,
            code: self.code,
            message: self.message.clone(),
            error: if include_details {
                self.details.clone()
            } else {
                None
            },
        }
    }

    // ========================================================================
    // Convenience constructors for common errors
    // ========================================================================

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    pub fn no_token() -> Self {
        Self::from_code(ErrorCode::Unauthorized)
    }

    pub fn forbidden() -> Self {
        Self::from_code(ErrorCode::Forbidden)
    }

    pub fn invalid_token(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidToken, message)
    }

    pub fn token_expired() -> Self {
        Self::from_code(ErrorCode::TokenExpired)
    }

    pub fn validation_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationFailed, message)
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Required field(s) missing; the message names them the way clients display it.
    pub fn missing_field(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::MissingField, message)
    }

    pub fn invalid_range(field: &str, min: impl fmt::Display, max: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::InvalidRange,
            format!("{} must be between {} and {}", field, min, max),
        )
    }

    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidFormat, message)
    }

    pub fn upload_rejected(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::UploadRejected, message)
    }

    /// Create a not found error with custom message ("Deal not found").
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::EntityNotFound, message)
    }

    pub fn route_not_found(path: &str) -> Self {
        Self::new(ErrorCode::RouteNotFound, format!("Route {} not found", path))
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    pub fn database_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ServiceUnavailable, message)
    }

    pub fn connection_pool_exhausted() -> Self {
        Self::from_code(ErrorCode::ConnectionPoolExhausted)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

// ============================================================================
// AXUM INTEGRATION
// ============================================================================

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = %self.code, message = %self.message, details = ?self.details, "Request failed");
        }
        let body = Json(self.to_response_body(expose_details()));
        (status, body).into_response()
    }
}

// ============================================================================
// CONVERSIONS FROM STANDARD ERRORS
// ============================================================================

/// Map PostgreSQL errors, translating integrity violations into client errors.
impl From<tokio_postgres::Error> for ApiError {
    fn from(err: tokio_postgres::Error) -> Self {
        let detail = err
            .as_db_error()
            .map(|db| db.message().to_string())
            .unwrap_or_else(|| err.to_string());

        let code = match err.code() {
            Some(state) if *state == SqlState::UNIQUE_VIOLATION => ErrorCode::DuplicateEntry,
            Some(state) if *state == SqlState::FOREIGN_KEY_VIOLATION => {
                ErrorCode::InvalidReference
            }
            Some(state) if *state == SqlState::CHECK_VIOLATION => ErrorCode::ConstraintViolation,
            _ => {
                tracing::error!("Database error: {:?}", err);
                ErrorCode::DatabaseError
            }
        };

        ApiError::from_code(code).with_details(serde_json::Value::String(detail))
    }
}

/// Convert from deadpool_postgres::PoolError to ApiError.
impl From<deadpool_postgres::PoolError> for ApiError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        tracing::error!("Connection pool error: {:?}", err);

        match err {
            deadpool_postgres::PoolError::Timeout(_) => ApiError::connection_pool_exhausted(),
            deadpool_postgres::PoolError::Closed => {
                ApiError::service_unavailable("Database connection pool is closed")
            }
            deadpool_postgres::PoolError::Backend(e) => ApiError::from(e),
            other => ApiError::database_error("Failed to acquire database connection")
                .with_details(serde_json::Value::String(other.to_string())),
        }
    }
}

/// Row decoding failures are server-side: the query shape and the type disagree.
impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        tracing::error!("JSON decoding error: {:?}", err);
        ApiError::internal_error("Failed to decode record")
            .with_details(serde_json::Value::String(err.to_string()))
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::Required(message) => ApiError::missing_field(message),
            ValidationError::OutOfRange { .. } => {
                ApiError::new(ErrorCode::InvalidRange, err.to_string())
            }
            ValidationError::InvalidEmail => {
                ApiError::invalid_format(err.to_string())
            }
            other => ApiError::validation_failed(other.to_string()),
        }
    }
}

impl From<EnumParseError> for ApiError {
    fn from(err: EnumParseError) -> Self {
        ApiError::validation_failed(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::invalid_input(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::invalid_input(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::invalid_format("Invalid id parameter")
            .with_details(serde_json::Value::String(rejection.body_text()))
    }
}

impl From<bcrypt::BcryptError> for ApiError {
    fn from(err: bcrypt::BcryptError) -> Self {
        ApiError::internal_error("Password hashing failed")
            .with_details(serde_json::Value::String(err.to_string()))
    }
}

// ============================================================================
// RESULT TYPE ALIAS
// ============================================================================

/// Result type alias for API operations.
pub type ApiResult<T> = Result<T, ApiError>;
