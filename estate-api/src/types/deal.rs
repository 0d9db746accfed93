//! Deal-related API types

use estate_core::{
    ActivityType, AgentId, ClientId, Date, DealId, DealStage, DealType, PropertyId, Timestamp,
    UserId,
};
use serde::{Deserialize, Serialize};

use super::{lenient_date, lenient_f64, lenient_i64};
use crate::error::ApiResult;
use crate::validation::{self, RequiredFields};

/// A `deals` row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DealRow {
    pub id: DealId,
    pub property_id: Option<PropertyId>,
    pub client_id: ClientId,
    pub agent_id: Option<AgentId>,
    pub deal_type: DealType,
    pub stage: DealStage,
    pub offer_amount: Option<f64>,
    pub final_amount: Option<f64>,
    pub commission_amount: Option<f64>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date"))]
    pub expected_close_date: Option<Date>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date"))]
    pub actual_close_date: Option<Date>,
    pub notes: Option<String>,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DealListItem {
    #[serde(flatten)]
    pub deal: DealRow,
    pub property_address: Option<String>,
    pub property_city: Option<String>,
    pub property_price: Option<f64>,
    pub client_first_name: Option<String>,
    pub client_last_name: Option<String>,
    pub client_name: Option<String>,
    pub agent_first_name: Option<String>,
    pub agent_last_name: Option<String>,
    pub agent_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DealDetail {
    #[serde(flatten)]
    pub deal: DealRow,
    pub property_address: Option<String>,
    pub property_city: Option<String>,
    pub property_price: Option<f64>,
    pub mls_number: Option<String>,
    pub client_first_name: Option<String>,
    pub client_last_name: Option<String>,
    pub client_email: Option<String>,
    pub client_phone: Option<String>,
    pub agent_first_name: Option<String>,
    pub agent_last_name: Option<String>,
    pub agent_phone: Option<String>,
    #[serde(default)]
    pub activities: Vec<DealActivity>,
}

/// Deal returned after a stage change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DealWithProperty {
    #[serde(flatten)]
    pub deal: DealRow,
    pub property_address: Option<String>,
}

/// A `deal_activities` row plus the performer's email.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DealActivity {
    pub id: i64,
    pub deal_id: DealId,
    pub activity_type: ActivityType,
    pub description: Option<String>,
    pub previous_stage: Option<DealStage>,
    pub new_stage: Option<DealStage>,
    pub performed_by: Option<UserId>,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub activity_date: Timestamp,
    #[serde(default)]
    pub performed_by_email: Option<String>,
}

/// One bucket of the stage pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PipelineStage {
    pub stage: DealStage,
    pub count: i64,
    /// Sum of offer amounts.
    pub total_value: f64,
}

// ============================================================================
// REQUESTS
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateDealRequest {
    #[serde(default, deserialize_with = "lenient_i64")]
    pub property_id: Option<PropertyId>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub client_id: Option<ClientId>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub agent_id: Option<AgentId>,
    pub deal_type: Option<String>,
    pub stage: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub offer_amount: Option<f64>,
    #[serde(default, deserialize_with = "lenient_date")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date"))]
    pub expected_close_date: Option<Date>,
    pub notes: Option<String>,
}

impl CreateDealRequest {
    pub fn validate(&self) -> ApiResult<()> {
        RequiredFields::new()
            .check("client_id", &self.client_id)
            .check("agent_id", &self.agent_id)
            .check("deal_type", &self.deal_type)
            .finish()?;
        validation::parse_enum::<DealType>(self.deal_type.as_deref())?;
        validation::parse_enum::<DealStage>(self.stage.as_deref())?;
        Ok(())
    }

    pub fn stage(&self) -> DealStage {
        validation::parse_enum::<DealStage>(self.stage.as_deref())
            .ok()
            .flatten()
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UpdateDealRequest {
    #[serde(default, deserialize_with = "lenient_i64")]
    pub property_id: Option<PropertyId>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub client_id: Option<ClientId>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub agent_id: Option<AgentId>,
    pub deal_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub offer_amount: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub final_amount: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub commission_amount: Option<f64>,
    #[serde(default, deserialize_with = "lenient_date")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date"))]
    pub expected_close_date: Option<Date>,
    #[serde(default, deserialize_with = "lenient_date")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date"))]
    pub actual_close_date: Option<Date>,
    pub notes: Option<String>,
}

impl UpdateDealRequest {
    pub fn validate(&self) -> ApiResult<()> {
        validation::parse_enum::<DealType>(self.deal_type.as_deref())?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UpdateStageRequest {
    pub stage: Option<String>,
    /// Replaces the generated activity description.
    pub notes: Option<String>,
}

impl UpdateStageRequest {
    /// The target stage; absent or unknown values are rejected.
    pub fn target(&self) -> ApiResult<DealStage> {
        RequiredFields::new().check("stage", &self.stage).finish()?;
        let stage = validation::parse_enum::<DealStage>(self.stage.as_deref())?;
        Ok(stage.unwrap_or_default())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateActivityRequest {
    pub activity_type: Option<String>,
    pub description: Option<String>,
}

impl CreateActivityRequest {
    pub fn activity_type(&self) -> ApiResult<ActivityType> {
        RequiredFields::new()
            .check("activity_type", &self.activity_type)
            .finish()?;
        let activity = validation::parse_enum::<ActivityType>(self.activity_type.as_deref())?;
        Ok(activity.unwrap_or(ActivityType::Note))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct DealFilter {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub stage: Option<String>,
    pub deal_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub agent_id: Option<AgentId>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub client_id: Option<ClientId>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub property_id: Option<PropertyId>,
}

/// Optional agent scope for pipeline and overview aggregates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct AgentScope {
    #[serde(default, deserialize_with = "lenient_i64")]
    pub agent_id: Option<AgentId>,
}
