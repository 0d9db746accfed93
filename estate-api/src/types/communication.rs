//! Communication log types

use axum::response::{IntoResponse, Response};
use axum::Json;
use estate_core::{AgentId, ClientId, CommunicationId, CommunicationType, Direction, Timestamp};
use serde::{Deserialize, Serialize};

use super::{lenient_i64, lenient_timestamp, ClientRef};
use crate::error::ApiResult;
use crate::pagination::{Pagination, PaginationMeta};
use crate::validation::{self, RequiredFields};

/// A `communications` row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CommunicationRow {
    pub id: CommunicationId,
    pub client_id: ClientId,
    pub agent_id: Option<AgentId>,
    pub communication_type: CommunicationType,
    pub subject: Option<String>,
    pub content: Option<String>,
    pub direction: Direction,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub communication_date: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CommunicationListItem {
    #[serde(flatten)]
    pub communication: CommunicationRow,
    #[serde(default)]
    pub client_first_name: Option<String>,
    #[serde(default)]
    pub client_last_name: Option<String>,
    pub agent_first_name: Option<String>,
    pub agent_last_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CommunicationDetail {
    #[serde(flatten)]
    pub communication: CommunicationRow,
    pub client_first_name: Option<String>,
    pub client_last_name: Option<String>,
    pub client_email: Option<String>,
    pub client_phone: Option<String>,
    pub agent_first_name: Option<String>,
    pub agent_last_name: Option<String>,
}

/// Per-type totals for `GET /communications/summary`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CommunicationSummary {
    pub communication_type: CommunicationType,
    pub count: i64,
    pub inbound_count: i64,
    pub outbound_count: i64,
}

/// Paginated envelope for one client's history, carrying the client itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientCommunications {
    pub success: bool,
    pub client: ClientRef,
    pub data: Vec<CommunicationListItem>,
    pub pagination: PaginationMeta,
}

impl ClientCommunications {
    pub fn new(
        client: ClientRef,
        data: Vec<CommunicationListItem>,
        page: &Pagination,
        total_items: i64,
    ) -> Self {
        Self {
            success: true,
            client,
            data,
            pagination: page.meta(total_items),
        }
    }
}

impl IntoResponse for ClientCommunications {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

// ============================================================================
// REQUESTS
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateCommunicationRequest {
    #[serde(default, deserialize_with = "lenient_i64")]
    pub client_id: Option<ClientId>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub agent_id: Option<AgentId>,
    pub communication_type: Option<String>,
    pub subject: Option<String>,
    pub content: Option<String>,
    /// Defaults to outbound.
    pub direction: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date-time"))]
    pub communication_date: Option<Timestamp>,
}

impl CreateCommunicationRequest {
    pub fn validate(&self) -> ApiResult<()> {
        RequiredFields::new()
            .check("client_id", &self.client_id)
            .check("communication_type", &self.communication_type)
            .finish()?;
        validate_kinds(self.communication_type.as_deref(), self.direction.as_deref())
    }

    pub fn direction(&self) -> Direction {
        validation::parse_enum::<Direction>(self.direction.as_deref())
            .ok()
            .flatten()
            .unwrap_or(Direction::Outbound)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UpdateCommunicationRequest {
    pub communication_type: Option<String>,
    pub subject: Option<String>,
    pub content: Option<String>,
    pub direction: Option<String>,
}

impl UpdateCommunicationRequest {
    pub fn validate(&self) -> ApiResult<()> {
        validate_kinds(self.communication_type.as_deref(), self.direction.as_deref())
    }
}

fn validate_kinds(communication_type: Option<&str>, direction: Option<&str>) -> ApiResult<()> {
    validation::parse_enum::<CommunicationType>(communication_type)?;
    validation::parse_enum::<Direction>(direction)?;
    Ok(())
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct CommunicationFilter {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub communication_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub client_id: Option<ClientId>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub agent_id: Option<AgentId>,
    pub direction: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    #[cfg_attr(feature = "openapi", param(value_type = Option<String>, format = "date-time"))]
    pub date_from: Option<Timestamp>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    #[cfg_attr(feature = "openapi", param(value_type = Option<String>, format = "date-time"))]
    pub date_to: Option<Timestamp>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct SummaryFilter {
    #[serde(default, deserialize_with = "lenient_i64")]
    pub client_id: Option<ClientId>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub agent_id: Option<AgentId>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    #[cfg_attr(feature = "openapi", param(value_type = Option<String>, format = "date-time"))]
    pub date_from: Option<Timestamp>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    #[cfg_attr(feature = "openapi", param(value_type = Option<String>, format = "date-time"))]
    pub date_to: Option<Timestamp>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_create_requires_client_and_type() {
        let err = CreateCommunicationRequest::default().validate().unwrap_err();
        assert_eq!(err.code, ErrorCode::MissingField);
        assert_eq!(
            err.message,
            "Missing required fields: client_id, communication_type"
        );
    }

    #[test]
    fn test_direction_defaults_to_outbound() -> Result<(), serde_json::Error> {
        let req: CreateCommunicationRequest =
            serde_json::from_str(r#"{"client_id": 5, "communication_type": "call"}"#)?;
        assert!(req.validate().is_ok());
        assert_eq!(req.direction(), Direction::Outbound);
        Ok(())
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let req = CreateCommunicationRequest {
            client_id: Some(5),
            communication_type: Some("fax".into()),
            ..Default::default()
        };
        let err = req.validate().unwrap_err();
        assert_eq!(
            err.message,
            "Invalid communication_type. Allowed values: email, call, sms, meeting, note"
        );
    }

    #[test]
    fn test_update_checks_direction() {
        let req = UpdateCommunicationRequest {
            direction: Some("sideways".into()),
            ..Default::default()
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_client_envelope_shape() -> Result<(), serde_json::Error> {
        let client = ClientRef {
            id: 3,
            first_name: "Mina".into(),
            last_name: "Okafor".into(),
        };
        let page = Pagination::new(1, 10);
        let body = serde_json::to_value(ClientCommunications::new(client, Vec::new(), &page, 0))?;
        assert_eq!(body["success"], true);
        assert_eq!(body["client"]["first_name"], "Mina");
        assert_eq!(body["pagination"]["totalItems"], 0);
        Ok(())
    }
}
