//! Success envelopes shared by every endpoint.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::pagination::{Pagination, PaginationMeta};

/// `{success: true, message?, data?}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn data(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl ApiResponse<()> {
    /// Message-only response, e.g. after a delete.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: None,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// 201 with a data envelope.
pub fn created<T: Serialize>(data: T, message: impl Into<String>) -> (StatusCode, ApiResponse<T>) {
    (StatusCode::CREATED, ApiResponse::data(data).with_message(message))
}

/// `{success: true, data: [...], pagination: {...}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub success: bool,
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, page: &Pagination, total_items: i64) -> Self {
        Self {
            success: true,
            data,
            pagination: page.meta(total_items),
        }
    }

    pub fn empty(page: &Pagination) -> Self {
        Self::new(Vec::new(), page, 0)
    }
}

impl<T: Serialize> IntoResponse for Paginated<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// `{success: true, data: [...], count: n}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Counted<T> {
    pub success: bool,
    pub data: Vec<T>,
    pub count: usize,
}

impl<T> Counted<T> {
    pub fn new(data: Vec<T>) -> Self {
        Self {
            success: true,
            count: data.len(),
            data,
        }
    }
}

impl<T: Serialize> IntoResponse for Counted<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_only_omits_data() -> Result<(), serde_json::Error> {
        let json = serde_json::to_value(ApiResponse::message("Deal deleted successfully"))?;
        assert_eq!(json, serde_json::json!({"success": true, "message": "Deal deleted successfully"}));
        Ok(())
    }

    #[test]
    fn test_data_envelope() -> Result<(), serde_json::Error> {
        let json = serde_json::to_value(ApiResponse::data(vec![1, 2]).with_message("ok"))?;
        assert_eq!(json["success"], true);
        assert_eq!(json["message"], "ok");
        assert_eq!(json["data"], serde_json::json!([1, 2]));
        Ok(())
    }

    #[test]
    fn test_counted_and_paginated() -> Result<(), serde_json::Error> {
        let json = serde_json::to_value(Counted::new(vec!["a", "b", "c"]))?;
        assert_eq!(json["count"], 3);

        let page = Pagination::new(2, 2);
        let json = serde_json::to_value(Paginated::new(vec!["c", "d"], &page, 5))?;
        assert_eq!(json["pagination"]["totalPages"], 3);
        assert_eq!(json["pagination"]["currentPage"], 2);
        Ok(())
    }
}
