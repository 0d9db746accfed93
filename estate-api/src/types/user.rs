//! User and authentication types

use estate_core::{AgentId, Timestamp, UserId, UserRole};
use serde::{Deserialize, Serialize};

use super::{AgentRow, AgentSummary};
use crate::error::ApiResult;
use crate::validation::{self, HasUpdates, RequiredFields};

/// Public view of a `users` row. The password hash is never read into it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UserRow {
    pub id: UserId,
    pub email: String,
    pub role: UserRole,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub updated_at: Timestamp,
}

/// Login lookup result. Internal only.
#[derive(Debug, Clone, Deserialize)]
pub struct UserCredentials {
    pub id: UserId,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UserSummary {
    pub id: UserId,
    pub email: String,
    pub role: UserRole,
}

/// User listing row with the linked agent's name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UserListItem {
    #[serde(flatten)]
    pub user: UserRow,
    pub agent_id: Option<AgentId>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UserDetail {
    #[serde(flatten)]
    pub user: UserRow,
    pub agent: Option<AgentRow>,
}

// ============================================================================
// AUTH REQUESTS
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    /// admin, agent or manager. Defaults to agent.
    pub role: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl RegisterRequest {
    pub fn validate(&self) -> ApiResult<()> {
        RequiredFields::new()
            .check("email", &self.email)
            .check("password", &self.password)
            .finish()?;
        validation::validate_email(self.email.as_deref().unwrap_or_default().trim())?;
        validation::validate_password(self.password.as_deref().unwrap_or_default())?;
        validation::parse_enum::<UserRole>(self.role.as_deref())?;
        Ok(())
    }

    pub fn role(&self) -> UserRole {
        validation::parse_enum::<UserRole>(self.role.as_deref())
            .ok()
            .flatten()
            .unwrap_or_default()
    }

    /// Stored form of the email: trimmed and lower-cased.
    pub fn normalized_email(&self) -> String {
        normalize_email(self.email.as_deref().unwrap_or_default())
    }

    /// An agent profile is created when an agent registers with a full name.
    pub fn wants_agent_profile(&self) -> bool {
        self.role() == UserRole::Agent
            && validation::non_blank(self.first_name.as_deref()).is_some()
            && validation::non_blank(self.last_name.as_deref()).is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ChangePasswordRequest {
    #[serde(rename = "currentPassword", alias = "current_password")]
    pub current_password: Option<String>,
    #[serde(rename = "newPassword", alias = "new_password")]
    pub new_password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RegisterResponse {
    pub user: UserRow,
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct LoginResponse {
    pub user: UserSummary,
    pub agent: Option<AgentSummary>,
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct MeResponse {
    pub user: UserRow,
    pub agent: Option<AgentRow>,
}

// ============================================================================
// USER ADMINISTRATION
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub role: Option<String>,
    pub password: Option<String>,
}

impl UpdateUserRequest {
    pub fn validate(&self) -> ApiResult<()> {
        if let Some(email) = validation::non_blank(self.email.as_deref()) {
            validation::validate_email(email)?;
        }
        validation::parse_enum::<UserRole>(self.role.as_deref())?;
        if let Some(password) = validation::non_blank(self.password.as_deref()) {
            validation::validate_password(password)?;
        }
        self.validate_has_updates()?;
        Ok(())
    }
}

impl HasUpdates for UpdateUserRequest {
    fn has_any_updates(&self) -> bool {
        validation::non_blank(self.email.as_deref()).is_some()
            || validation::non_blank(self.role.as_deref()).is_some()
            || validation::non_blank(self.password.as_deref()).is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct UserFilter {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub role: Option<String>,
    /// Matches the email (case-insensitive).
    pub search: Option<String>,
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn register(email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            email: Some(email.to_string()),
            password: Some(password.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_register_requires_email_and_password() {
        let err = RegisterRequest::default().validate().unwrap_err();
        assert_eq!(err.code, ErrorCode::MissingField);
        assert_eq!(err.message, "Missing required fields: email, password");
    }

    #[test]
    fn test_register_rejects_weak_password() {
        let err = register("ana@estatehub.io", "password").validate().unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }

    #[test]
    fn test_register_rejects_bad_role() {
        let mut req = register("ana@estatehub.io", "Secret123");
        req.role = Some("owner".to_string());
        let err = req.validate().unwrap_err();
        assert!(err.message.starts_with("Invalid role."));
    }

    #[test]
    fn test_register_defaults() {
        let mut req = register("  Ana@EstateHub.io ", "Secret123");
        assert!(req.validate().is_ok());
        assert_eq!(req.role(), UserRole::Agent);
        assert_eq!(req.normalized_email(), "ana@estatehub.io");
        assert!(!req.wants_agent_profile());

        req.first_name = Some("Ana".into());
        req.last_name = Some("Silva".into());
        assert!(req.wants_agent_profile());

        req.role = Some("manager".into());
        assert!(!req.wants_agent_profile());
    }

    #[test]
    fn test_change_password_accepts_camel_case() -> Result<(), serde_json::Error> {
        let req: ChangePasswordRequest =
            serde_json::from_str(r#"{"currentPassword": "a", "newPassword": "b"}"#)?;
        assert_eq!(req.current_password.as_deref(), Some("a"));
        assert_eq!(req.new_password.as_deref(), Some("b"));
        Ok(())
    }

    #[test]
    fn test_update_user_needs_a_field() {
        let err = UpdateUserRequest::default().validate().unwrap_err();
        assert_eq!(err.message, "No fields to update");

        let req = UpdateUserRequest {
            email: Some("not-an-email".into()),
            ..Default::default()
        };
        assert_eq!(req.validate().unwrap_err().code, ErrorCode::InvalidFormat);
    }
}
