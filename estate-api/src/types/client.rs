//! Client-related API types

use estate_core::{
    AgentId, ClientId, ClientStatus, ClientType, CommunicationId, CommunicationType, Direction,
    Timestamp,
};
use serde::{Deserialize, Serialize};

use super::{lenient_f64, lenient_i32, lenient_i64, DealRow, ShowingRow};
use crate::error::ApiResult;
use crate::validation::{self, RequiredFields, ValidateRange};
use estate_core::ValidationError;

pub const LEAD_SCORE_MIN: i64 = 0;
pub const LEAD_SCORE_MAX: i64 = 100;

/// A `clients` row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ClientRow {
    pub id: ClientId,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub secondary_phone: Option<String>,
    pub client_type: ClientType,
    pub status: ClientStatus,
    pub lead_source: Option<String>,
    pub lead_score: i32,
    pub budget_min: Option<f64>,
    pub budget_max: Option<f64>,
    pub preferred_locations: Option<Vec<String>>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Object>))]
    pub requirements: Option<serde_json::Value>,
    pub assigned_agent_id: Option<AgentId>,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ClientListItem {
    #[serde(flatten)]
    pub client: ClientRow,
    pub agent_first_name: Option<String>,
    pub agent_last_name: Option<String>,
    pub deal_count: i64,
    /// Date of the latest logged communication.
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date-time"))]
    pub last_contact: Option<Timestamp>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ClientDetail {
    #[serde(flatten)]
    pub client: ClientRow,
    pub agent_first_name: Option<String>,
    pub agent_last_name: Option<String>,
    pub agent_phone: Option<String>,
    pub deal_count: i64,
    #[serde(default)]
    pub deals: Vec<ClientDeal>,
    #[serde(default)]
    pub communications: Vec<ClientCommunication>,
    #[serde(default)]
    pub showings: Vec<ClientShowing>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ClientDeal {
    #[serde(flatten)]
    pub deal: DealRow,
    pub property_address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ClientCommunication {
    pub id: CommunicationId,
    pub communication_type: CommunicationType,
    pub subject: Option<String>,
    pub direction: Direction,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub communication_date: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ClientShowing {
    #[serde(flatten)]
    pub showing: ShowingRow,
    pub property_address: Option<String>,
}

/// Identity block attached to per-client listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ClientRef {
    pub id: ClientId,
    pub first_name: String,
    pub last_name: String,
}

// ============================================================================
// REQUESTS
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ClientFields {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub secondary_phone: Option<String>,
    pub client_type: Option<String>,
    pub status: Option<String>,
    pub lead_source: Option<String>,
    #[serde(default, deserialize_with = "lenient_i32")]
    pub lead_score: Option<i32>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub budget_min: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub budget_max: Option<f64>,
    pub preferred_locations: Option<Vec<String>>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Object>))]
    pub requirements: Option<serde_json::Value>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub assigned_agent_id: Option<AgentId>,
}

impl ClientFields {
    fn validate_values(&self) -> ApiResult<()> {
        validation::parse_enum::<ClientType>(self.client_type.as_deref())?;
        validation::parse_enum::<ClientStatus>(self.status.as_deref())?;
        if let Some(email) = validation::non_blank(self.email.as_deref()) {
            validation::validate_email(email)?;
        }
        self.lead_score
            .validate_range("lead_score", LEAD_SCORE_MIN, LEAD_SCORE_MAX)?;
        Ok(())
    }

    pub fn requirements(&self) -> Option<serde_json::Value> {
        self.requirements.clone().filter(|v| !v.is_null())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateClientRequest {
    #[serde(flatten)]
    pub fields: ClientFields,
}

impl CreateClientRequest {
    pub fn validate(&self) -> ApiResult<()> {
        RequiredFields::new()
            .check("first_name", &self.fields.first_name)
            .check("last_name", &self.fields.last_name)
            .check("client_type", &self.fields.client_type)
            .finish()?;
        self.fields.validate_values()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UpdateClientRequest {
    #[serde(flatten)]
    pub fields: ClientFields,
}

impl UpdateClientRequest {
    pub fn validate(&self) -> ApiResult<()> {
        self.fields.validate_values()
    }
}

/// `null` or a missing `agent_id` unassigns the client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AssignAgentRequest {
    #[serde(default, deserialize_with = "lenient_i64")]
    pub agent_id: Option<AgentId>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct LeadScoreRequest {
    #[serde(default, deserialize_with = "lenient_i32")]
    pub lead_score: Option<i32>,
}

impl LeadScoreRequest {
    pub fn validate(&self) -> ApiResult<i32> {
        match self.lead_score {
            Some(score) if (LEAD_SCORE_MIN..=LEAD_SCORE_MAX).contains(&i64::from(score)) => Ok(score),
            _ => Err(ValidationError::invalid("Lead score must be between 0 and 100").into()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct ClientFilter {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub status: Option<String>,
    pub client_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub assigned_agent_id: Option<AgentId>,
    #[serde(default, deserialize_with = "lenient_i32")]
    pub min_score: Option<i32>,
    #[serde(default, deserialize_with = "lenient_i32")]
    pub max_score: Option<i32>,
    /// Matches first name, last name, email or phone.
    pub search: Option<String>,
}
