//! Agent-related API types

use estate_core::{AgentId, AgentStatus, Date, StatsPeriod, Timestamp, UserId, UserRole};
use serde::{Deserialize, Serialize};

use super::{lenient_date, lenient_f64, lenient_i64, DealRow};
use crate::error::ApiResult;
use crate::validation::{self, RequiredFields, ValidateRange};

/// An `agents` row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AgentRow {
    pub id: AgentId,
    pub user_id: Option<UserId>,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub license_number: Option<String>,
    /// Percentage, e.g. `3.5`.
    pub commission_rate: Option<f64>,
    pub territory: Option<String>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date"))]
    pub hire_date: Option<Date>,
    pub status: AgentStatus,
    pub photo_url: Option<String>,
    pub bio: Option<String>,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub updated_at: Timestamp,
}

/// Name and photo, as embedded in the login response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AgentSummary {
    pub id: AgentId,
    pub first_name: String,
    pub last_name: String,
    pub photo_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AgentListItem {
    #[serde(flatten)]
    pub agent: AgentRow,
    pub email: Option<String>,
    pub property_count: i64,
    pub client_count: i64,
    pub closed_deals: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AgentDetail {
    #[serde(flatten)]
    pub agent: AgentRow,
    pub email: Option<String>,
    pub role: Option<UserRole>,
    pub property_count: i64,
    pub client_count: i64,
    pub total_deals: i64,
    pub closed_deals: i64,
    /// Commission earned on `closed_won` deals.
    pub total_commission: f64,
    #[serde(default)]
    pub recent_deals: Vec<AgentRecentDeal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AgentRecentDeal {
    #[serde(flatten)]
    pub deal: DealRow,
    pub address: Option<String>,
    pub client_first_name: Option<String>,
    pub client_last_name: Option<String>,
}

// ============================================================================
// REQUESTS
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateAgentRequest {
    /// Existing user to link. Must not already have a profile.
    #[serde(default, deserialize_with = "lenient_i64")]
    pub user_id: Option<UserId>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub license_number: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub commission_rate: Option<f64>,
    pub territory: Option<String>,
    #[serde(default, deserialize_with = "lenient_date")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date"))]
    pub hire_date: Option<Date>,
    pub status: Option<String>,
    pub photo_url: Option<String>,
    pub bio: Option<String>,
}

impl CreateAgentRequest {
    pub fn validate(&self) -> ApiResult<()> {
        RequiredFields::new()
            .check("first_name", &self.first_name)
            .check("last_name", &self.last_name)
            .finish()?;
        validate_profile(self.commission_rate, self.status.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UpdateAgentRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub license_number: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub commission_rate: Option<f64>,
    pub territory: Option<String>,
    #[serde(default, deserialize_with = "lenient_date")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date"))]
    pub hire_date: Option<Date>,
    pub status: Option<String>,
    pub photo_url: Option<String>,
    pub bio: Option<String>,
}

impl UpdateAgentRequest {
    pub fn validate(&self) -> ApiResult<()> {
        validate_profile(self.commission_rate, self.status.as_deref())
    }
}

fn validate_profile(commission_rate: Option<f64>, status: Option<&str>) -> ApiResult<()> {
    commission_rate.validate_range("commission_rate", 0, 100)?;
    validation::parse_enum::<AgentStatus>(status)?;
    Ok(())
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct AgentFilter {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub status: Option<String>,
    /// Partial, case-insensitive match.
    pub territory: Option<String>,
    /// Matches first name, last name, email or license number.
    pub search: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct PeriodQuery {
    /// month, quarter or year. Anything else means all time.
    pub period: Option<String>,
}

impl PeriodQuery {
    pub fn period(&self) -> Option<StatsPeriod> {
        validation::parse_enum::<StatsPeriod>(self.period.as_deref())
            .ok()
            .flatten()
    }
}

// ============================================================================
// STATISTICS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AgentName {
    pub id: AgentId,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AgentDealStats {
    pub total_deals: i64,
    pub won_deals: i64,
    pub lost_deals: i64,
    pub active_deals: i64,
    pub total_commission: f64,
    pub avg_deal_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AgentShowingStats {
    pub total_showings: i64,
    pub completed_showings: i64,
    pub high_interest_showings: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AgentClientStats {
    pub total_clients: i64,
    pub active_clients: i64,
    pub avg_lead_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AgentListingStats {
    pub total_listings: i64,
    pub active_listings: i64,
    pub sold_listings: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AgentStats {
    pub agent: AgentName,
    /// The requested period, or `all_time`.
    pub period: String,
    pub deals: AgentDealStats,
    pub showings: AgentShowingStats,
    pub clients: AgentClientStats,
    pub properties: AgentListingStats,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_create_requires_names() {
        let err = CreateAgentRequest::default().validate().unwrap_err();
        assert_eq!(err.message, "Missing required fields: first_name, last_name");
    }

    #[test]
    fn test_create_validates_status() {
        let req = CreateAgentRequest {
            first_name: Some("Rita".into()),
            last_name: Some("Moreno".into()),
            status: Some("retired".into()),
            ..Default::default()
        };
        let err = req.validate().unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
        assert_eq!(err.message, "Invalid status. Allowed values: active, inactive");
    }

    #[test]
    fn test_form_values_are_coerced() -> Result<(), serde_json::Error> {
        let req: CreateAgentRequest = serde_json::from_str(
            r#"{"first_name": "Rita", "last_name": "Moreno", "user_id": "12",
                "commission_rate": "2.75", "hire_date": "2023-09-01", "phone": ""}"#,
        )?;
        assert_eq!(req.user_id, Some(12));
        assert_eq!(req.commission_rate, Some(2.75));
        assert_eq!(req.hire_date, chrono::NaiveDate::from_ymd_opt(2023, 9, 1));
        assert!(req.validate().is_ok());
        Ok(())
    }

    #[test]
    fn test_phone_is_stored_as_given() {
        let req = CreateAgentRequest {
            first_name: Some("Rita".into()),
            last_name: Some("Moreno".into()),
            phone: Some("555-1234".into()),
            ..Default::default()
        };
        assert!(req.validate().is_ok());
        let update = UpdateAgentRequest {
            phone: Some("+44 20 7946 0958".into()),
            ..Default::default()
        };
        assert!(update.validate().is_ok());
    }

    #[test]
    fn test_update_rejects_commission_out_of_range() {
        let req = UpdateAgentRequest {
            commission_rate: Some(120.0),
            ..Default::default()
        };
        assert_eq!(req.validate().unwrap_err().code, ErrorCode::InvalidRange);
    }

    #[test]
    fn test_unknown_period_means_all_time() {
        let q = PeriodQuery { period: Some("decade".into()) };
        assert_eq!(q.period(), None);
        let q = PeriodQuery { period: Some("quarter".into()) };
        assert_eq!(q.period(), Some(StatsPeriod::Quarter));
    }
}
