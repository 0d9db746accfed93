//! Domain error types.

use thiserror::Error;

/// A string did not name a member of one of the closed value sets.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid {field}. Allowed values: {}", allowed.join(", "))]
pub struct EnumParseError {
    pub field: &'static str,
    pub value: String,
    pub allowed: Vec<&'static str>,
}

impl EnumParseError {
    pub fn new(field: &'static str, value: impl Into<String>, allowed: Vec<&'static str>) -> Self {
        Self {
            field,
            value: value.into(),
            allowed,
        }
    }
}

/// Request-level validation failures raised before any SQL is issued.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{0}")]
    Required(String),

    #[error(transparent)]
    InvalidEnum(#[from] EnumParseError),

    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: &'static str, min: i64, max: i64 },

    #[error("{field} must be greater than 0")]
    NotPositive { field: &'static str },

    #[error("Invalid email format")]
    InvalidEmail,

    #[error("Password must be at least 8 characters with uppercase, lowercase, and number")]
    WeakPassword,

    #[error("No fields to update")]
    NoUpdates,

    #[error("{0}")]
    Invalid(String),
}

impl ValidationError {
    pub fn required(message: impl Into<String>) -> Self {
        Self::Required(message.into())
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }
}

pub type ValidationResult<T = ()> = Result<T, ValidationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_parse_error_message_lists_allowed_values() {
        let err = EnumParseError::new("stage", "won", vec!["lead", "viewing"]);
        assert_eq!(err.to_string(), "Invalid stage. Allowed values: lead, viewing");
    }

    #[test]
    fn test_validation_error_messages() {
        assert_eq!(
            ValidationError::OutOfRange { field: "lead_score", min: 0, max: 100 }.to_string(),
            "lead_score must be between 0 and 100"
        );
        assert_eq!(
            ValidationError::NotPositive { field: "price" }.to_string(),
            "price must be greater than 0"
        );
        assert_eq!(ValidationError::NoUpdates.to_string(), "No fields to update");
    }

    #[test]
    fn test_enum_error_converts_transparently() {
        let err: ValidationError =
            EnumParseError::new("status", "gone", vec!["active", "inactive"]).into();
        assert_eq!(err.to_string(), "Invalid status. Allowed values: active, inactive");
    }
}
