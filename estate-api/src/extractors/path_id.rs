//! Path extractors for numeric entity ids.
//!
//! `PathId` rejects non-numeric segments with the standard error envelope
//! instead of axum's plain-text rejection.

use axum::{
    async_trait,
    extract::{FromRequestParts, Path},
    http::request::Parts,
};
use estate_core::EntityId;

use crate::error::ApiError;

/// Extractor for a single `:id` path parameter.
///
/// ```rust,ignore
/// async fn get_deal(PathId(deal_id): PathId) -> ApiResult<impl IntoResponse> { ... }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathId(pub EntityId);

/// Extractor for two ids, e.g. `/properties/:id/photos/:photoId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathIds(pub EntityId, pub EntityId);

fn invalid_path(parts: &Parts, reason: String) -> ApiError {
    ApiError::invalid_format("Invalid id parameter").with_details(serde_json::json!({
        "path": parts.uri.path(),
        "reason": reason,
    }))
}

#[async_trait]
impl<S> FromRequestParts<S> for PathId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id): Path<EntityId> = Path::from_request_parts(parts, state)
            .await
            .map_err(|e| invalid_path(parts, e.body_text()))?;

        Ok(PathId(id))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for PathIds
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path((first, second)): Path<(EntityId, EntityId)> =
            Path::from_request_parts(parts, state)
                .await
                .map_err(|e| invalid_path(parts, e.body_text()))?;

        Ok(PathIds(first, second))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use axum::{body::Body, http::Request, routing::get, Router};
    use tower::ServiceExt;

    async fn echo(PathId(id): PathId) -> String {
        id.to_string()
    }

    async fn echo_pair(PathIds(a, b): PathIds) -> String {
        format!("{}:{}", a, b)
    }

    fn app() -> Router {
        Router::new()
            .route("/deals/:id", get(echo))
            .route("/properties/:id/photos/:photo_id", get(echo_pair))
    }

    #[tokio::test]
    async fn test_numeric_id_extracted() -> Result<(), Box<dyn std::error::Error>> {
        let response = app()
            .oneshot(Request::builder().uri("/deals/42").body(Body::empty())?)
            .await?;
        assert_eq!(response.status(), 200);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        assert_eq!(&body[..], b"42");
        Ok(())
    }

    #[tokio::test]
    async fn test_pair_extracted() -> Result<(), Box<dyn std::error::Error>> {
        let response = app()
            .oneshot(Request::builder().uri("/properties/3/photos/9").body(Body::empty())?)
            .await?;
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        assert_eq!(&body[..], b"3:9");
        Ok(())
    }

    #[tokio::test]
    async fn test_non_numeric_id_is_bad_request() -> Result<(), Box<dyn std::error::Error>> {
        let response = app()
            .oneshot(Request::builder().uri("/deals/abc").body(Body::empty())?)
            .await?;
        assert_eq!(response.status(), 400);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        let json: serde_json::Value = serde_json::from_slice(&body)?;
        assert_eq!(json["success"], false);
        assert_eq!(json["code"], serde_json::to_value(ErrorCode::InvalidFormat)?);
        assert_eq!(json["message"], "Invalid id parameter");
        Ok(())
    }
}
