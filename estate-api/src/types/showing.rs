//! Showing-related API types

use estate_core::{
    AgentId, ClientId, InterestLevel, PropertyId, ShowingId, ShowingStatus, ShowingType,
    Timestamp,
};
use serde::{Deserialize, Serialize};

use super::{lenient_i32, lenient_i64, lenient_timestamp};
use crate::error::ApiResult;
use crate::pagination::parse_positive;
use crate::validation::{self, RequiredFields, ValidateRange};

pub const DEFAULT_DURATION_MINUTES: i32 = 30;
pub const DEFAULT_UPCOMING_LIMIT: i64 = 10;
/// Length of the agent schedule window when no end is given.
pub const SCHEDULE_WINDOW_DAYS: i64 = 7;

/// A `showings` row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ShowingRow {
    pub id: ShowingId,
    pub property_id: PropertyId,
    pub client_id: Option<ClientId>,
    pub agent_id: Option<AgentId>,
    pub showing_type: ShowingType,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub scheduled_date: Timestamp,
    pub duration_minutes: i32,
    pub status: ShowingStatus,
    pub feedback: Option<String>,
    pub interest_level: Option<InterestLevel>,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ShowingListItem {
    #[serde(flatten)]
    pub showing: ShowingRow,
    pub property_address: Option<String>,
    pub property_city: Option<String>,
    pub client_first_name: Option<String>,
    pub client_last_name: Option<String>,
    pub agent_first_name: Option<String>,
    pub agent_last_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ShowingDetail {
    #[serde(flatten)]
    pub showing: ShowingRow,
    pub property_address: Option<String>,
    pub property_city: Option<String>,
    pub property_price: Option<f64>,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<f64>,
    pub square_feet: Option<i32>,
    pub client_first_name: Option<String>,
    pub client_last_name: Option<String>,
    pub client_email: Option<String>,
    pub client_phone: Option<String>,
    pub agent_first_name: Option<String>,
    pub agent_last_name: Option<String>,
    pub agent_phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DateRange {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub from: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub to: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AgentSchedule {
    pub agent_id: AgentId,
    pub date_range: DateRange,
    pub showings: Vec<ShowingListItem>,
}

// ============================================================================
// REQUESTS
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ShowingFields {
    #[serde(default, deserialize_with = "lenient_i64")]
    pub property_id: Option<PropertyId>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub client_id: Option<ClientId>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub agent_id: Option<AgentId>,
    pub showing_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date-time"))]
    pub scheduled_date: Option<Timestamp>,
    #[serde(default, deserialize_with = "lenient_i32")]
    pub duration_minutes: Option<i32>,
    pub status: Option<String>,
}

impl ShowingFields {
    fn validate_values(&self) -> ApiResult<()> {
        validation::parse_enum::<ShowingType>(self.showing_type.as_deref())?;
        validation::parse_enum::<ShowingStatus>(self.status.as_deref())?;
        self.duration_minutes.validate_positive("duration_minutes")?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateShowingRequest {
    #[serde(flatten)]
    pub fields: ShowingFields,
}

impl CreateShowingRequest {
    pub fn validate(&self) -> ApiResult<()> {
        RequiredFields::new()
            .check("property_id", &self.fields.property_id)
            .check("agent_id", &self.fields.agent_id)
            .check("scheduled_date", &self.fields.scheduled_date)
            .finish()?;
        Ok(())
    }

    /// Enum and duration checks, run after the linked rows are confirmed.
    pub fn validate_values(&self) -> ApiResult<()> {
        self.fields.validate_values()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UpdateShowingRequest {
    #[serde(flatten)]
    pub fields: ShowingFields,
}

impl UpdateShowingRequest {
    pub fn validate(&self) -> ApiResult<()> {
        self.fields.validate_values()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ShowingFeedbackRequest {
    pub feedback: Option<String>,
    pub interest_level: Option<String>,
}

impl ShowingFeedbackRequest {
    pub fn interest_level(&self) -> ApiResult<Option<InterestLevel>> {
        Ok(validation::parse_enum::<InterestLevel>(
            self.interest_level.as_deref(),
        )?)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct ShowingFilter {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub agent_id: Option<AgentId>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub property_id: Option<PropertyId>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub client_id: Option<ClientId>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    #[cfg_attr(feature = "openapi", param(value_type = Option<String>, format = "date-time"))]
    pub date_from: Option<Timestamp>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    #[cfg_attr(feature = "openapi", param(value_type = Option<String>, format = "date-time"))]
    pub date_to: Option<Timestamp>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct ScheduleQuery {
    #[serde(default, alias = "start_date", deserialize_with = "lenient_timestamp")]
    #[cfg_attr(feature = "openapi", param(value_type = Option<String>, format = "date-time"))]
    pub date_from: Option<Timestamp>,
    #[serde(default, alias = "end_date", deserialize_with = "lenient_timestamp")]
    #[cfg_attr(feature = "openapi", param(value_type = Option<String>, format = "date-time"))]
    pub date_to: Option<Timestamp>,
}

impl ScheduleQuery {
    /// The requested window, defaulting to the next seven days from `now`.
    pub fn window(&self, now: Timestamp) -> DateRange {
        let from = self.date_from.unwrap_or(now);
        let to = self
            .date_to
            .unwrap_or_else(|| now + chrono::Duration::days(SCHEDULE_WINDOW_DAYS));
        DateRange { from, to }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct UpcomingQuery {
    pub limit: Option<String>,
}

impl UpcomingQuery {
    pub fn limit(&self) -> i64 {
        parse_positive(self.limit.as_deref(), DEFAULT_UPCOMING_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_create_requires_property_agent_and_date() {
        let err = CreateShowingRequest::default().validate().unwrap_err();
        assert_eq!(
            err.message,
            "Missing required fields: property_id, agent_id, scheduled_date"
        );
    }

    #[test]
    fn test_create_parses_local_datetime() -> Result<(), serde_json::Error> {
        let req: CreateShowingRequest = serde_json::from_str(
            r#"{"property_id": 4, "agent_id": "2", "scheduled_date": "2024-06-01T14:30"}"#,
        )?;
        assert!(req.validate().is_ok());
        assert_eq!(
            req.fields.scheduled_date,
            Utc.with_ymd_and_hms(2024, 6, 1, 14, 30, 0).single()
        );
        Ok(())
    }

    #[test]
    fn test_showing_type_is_checked() {
        let req = UpdateShowingRequest {
            fields: ShowingFields {
                showing_type: Some("virtual".into()),
                ..Default::default()
            },
        };
        assert_eq!(req.validate().unwrap_err().code, ErrorCode::ValidationFailed);
    }

    #[test]
    fn test_feedback_interest_level() {
        let req = ShowingFeedbackRequest {
            feedback: Some("Loved the kitchen".into()),
            interest_level: Some("high".into()),
        };
        assert_eq!(req.interest_level().ok(), Some(Some(InterestLevel::High)));

        let req = ShowingFeedbackRequest {
            feedback: None,
            interest_level: Some("extreme".into()),
        };
        assert!(req.interest_level().is_err());
    }

    #[test]
    fn test_schedule_window_defaults_to_a_week() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).single().unwrap_or_default();
        let window = ScheduleQuery::default().window(now);
        assert_eq!(window.from, now);
        assert_eq!(window.to - window.from, chrono::Duration::days(7));
    }

    #[test]
    fn test_schedule_accepts_start_end_aliases() -> Result<(), serde_json::Error> {
        let q: ScheduleQuery = serde_json::from_str(
            r#"{"start_date": "2024-06-01", "end_date": "2024-06-03"}"#,
        )?;
        assert!(q.date_from.is_some());
        assert!(q.date_to.is_some());
        Ok(())
    }

    #[test]
    fn test_upcoming_limit() {
        assert_eq!(UpcomingQuery::default().limit(), 10);
        assert_eq!(UpcomingQuery { limit: Some("3".into()) }.limit(), 3);
        assert_eq!(UpcomingQuery { limit: Some("x".into()) }.limit(), 10);
    }
}
