//! Validation Traits and Rules
//!
//! Field-level checks shared by the request types. Everything here returns
//! [`ValidationResult`] from `estate-core`; handlers convert with `?`.

use estate_core::{EnumParseError, ValidationError, ValidationResult};
use once_cell::sync::Lazy;
use regex::Regex;
use std::str::FromStr;

static EMAIL_RE: Lazy<Result<Regex, regex::Error>> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$"));

// ============================================================================
// FORMAT RULES
// ============================================================================

pub fn is_valid_email(email: &str) -> bool {
    match EMAIL_RE.as_ref() {
        Ok(re) => re.is_match(email),
        Err(_) => false,
    }
}

/// At least 8 characters with an uppercase letter, a lowercase letter, and a digit.
pub fn is_strong_password(password: &str) -> bool {
    password.chars().count() >= 8
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_digit())
}

pub fn validate_email(email: &str) -> ValidationResult {
    if is_valid_email(email) {
        Ok(())
    } else {
        Err(ValidationError::InvalidEmail)
    }
}

pub fn validate_password(password: &str) -> ValidationResult {
    if is_strong_password(password) {
        Ok(())
    } else {
        Err(ValidationError::WeakPassword)
    }
}

// ============================================================================
// REQUIRED FIELDS
// ============================================================================

/// Collects missing fields so the error names all of them at once.
#[derive(Debug, Default)]
pub struct RequiredFields {
    missing: Vec<&'static str>,
}

impl RequiredFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check<T: IsPresent + ?Sized>(mut self, field: &'static str, value: &T) -> Self {
        if !value.is_present() {
            self.missing.push(field);
        }
        self
    }

    /// "Missing required fields: a, b"
    pub fn finish(self) -> ValidationResult {
        if self.missing.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::required(format!(
                "Missing required fields: {}",
                self.missing.join(", ")
            )))
        }
    }
}

/// Whether a request field counts as supplied. Blank strings do not.
pub trait IsPresent {
    fn is_present(&self) -> bool;
}

impl IsPresent for str {
    fn is_present(&self) -> bool {
        !self.trim().is_empty()
    }
}

impl IsPresent for String {
    fn is_present(&self) -> bool {
        self.as_str().is_present()
    }
}

impl<T: IsPresent> IsPresent for Option<T> {
    fn is_present(&self) -> bool {
        self.as_ref().map(IsPresent::is_present).unwrap_or(false)
    }
}

macro_rules! impl_is_present {
    ($($t:ty),*) => {
        $(
            impl IsPresent for $t {
                fn is_present(&self) -> bool {
                    true
                }
            }
        )*
    };
}

impl_is_present!(i32, i64, f64, bool, chrono::NaiveDate, chrono::DateTime<chrono::Utc>);

// ============================================================================
// ENUMS
// ============================================================================

/// Parse an optional enum field. Absent and blank values pass as `None`.
pub fn parse_enum<E>(value: Option<&str>) -> Result<Option<E>, EnumParseError>
where
    E: FromStr<Err = EnumParseError>,
{
    match value.map(str::trim) {
        Some(raw) if !raw.is_empty() => raw.parse().map(Some),
        _ => Ok(None),
    }
}

/// Trim and drop blank strings before binding.
pub fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

// ============================================================================
// RANGES
// ============================================================================

/// Trait for validating numeric ranges.
pub trait ValidateRange {
    /// Validate that the value is positive (> 0).
    fn validate_positive(&self, field_name: &'static str) -> ValidationResult;

    /// Validate that the value is within an inclusive range.
    fn validate_range(&self, field_name: &'static str, min: i64, max: i64) -> ValidationResult;
}

macro_rules! impl_validate_range {
    ($($t:ty),*) => {
        $(
            impl ValidateRange for $t {
                fn validate_positive(&self, field_name: &'static str) -> ValidationResult {
                    if *self <= 0 as $t {
                        return Err(ValidationError::NotPositive { field: field_name });
                    }
                    Ok(())
                }

                fn validate_range(&self, field_name: &'static str, min: i64, max: i64) -> ValidationResult {
                    if *self < min as $t || *self > max as $t {
                        return Err(ValidationError::OutOfRange { field: field_name, min, max });
                    }
                    Ok(())
                }
            }
        )*
    };
}

impl_validate_range!(i32, i64, f64);

impl<T: ValidateRange> ValidateRange for Option<T> {
    fn validate_positive(&self, field_name: &'static str) -> ValidationResult {
        match self {
            Some(value) => value.validate_positive(field_name),
            None => Ok(()),
        }
    }

    fn validate_range(&self, field_name: &'static str, min: i64, max: i64) -> ValidationResult {
        match self {
            Some(value) => value.validate_range(field_name, min, max),
            None => Ok(()),
        }
    }
}

// ============================================================================
// UPDATES
// ============================================================================

/// Implemented by update requests that must carry at least one field.
pub trait HasUpdates {
    fn has_any_updates(&self) -> bool;

    fn validate_has_updates(&self) -> ValidationResult {
        if !self.has_any_updates() {
            return Err(ValidationError::NoUpdates);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use estate_core::{ClientType, DealStage};

    #[test]
    fn test_email_format() {
        assert!(is_valid_email("jane@estatehub.io"));
        assert!(!is_valid_email("jane@estatehub"));
        assert!(!is_valid_email("jane smith@estatehub.io"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn test_password_strength() {
        assert!(is_strong_password("Secret123"));
        assert!(!is_strong_password("secret123"));
        assert!(!is_strong_password("SECRET123"));
        assert!(!is_strong_password("SecretPass"));
        assert!(!is_strong_password("Sh0rt"));
    }

    #[test]
    fn test_required_fields_lists_all_missing() {
        let err = RequiredFields::new()
            .check("first_name", &Some("Ada".to_string()))
            .check("last_name", &Some("  ".to_string()))
            .check("client_type", &None::<String>)
            .finish()
            .unwrap_err();
        assert_eq!(err.to_string(), "Missing required fields: last_name, client_type");

        assert!(RequiredFields::new().check("price", &Some(1.0)).finish().is_ok());
    }

    #[test]
    fn test_parse_enum() {
        assert_eq!(parse_enum::<ClientType>(Some("buyer")), Ok(Some(ClientType::Buyer)));
        assert_eq!(parse_enum::<ClientType>(Some("")), Ok(None));
        assert_eq!(parse_enum::<ClientType>(None), Ok(None));
        assert!(parse_enum::<DealStage>(Some("won")).is_err());
    }

    #[test]
    fn test_validate_range() {
        assert!(50i32.validate_range("lead_score", 0, 100).is_ok());
        assert!(0i32.validate_range("lead_score", 0, 100).is_ok());
        assert!(100i32.validate_range("lead_score", 0, 100).is_ok());
        assert!(101i32.validate_range("lead_score", 0, 100).is_err());
        assert!((-1i32).validate_range("lead_score", 0, 100).is_err());
        assert!(None::<i32>.validate_range("lead_score", 0, 100).is_ok());
    }

    #[test]
    fn test_validate_positive() {
        assert!(1.0f64.validate_positive("price").is_ok());
        assert_eq!(
            0.0f64.validate_positive("price"),
            Err(ValidationError::NotPositive { field: "price" })
        );
        assert!((-5.0f64).validate_positive("price").is_err());
    }

    struct Patch {
        email: Option<String>,
    }

    impl HasUpdates for Patch {
        fn has_any_updates(&self) -> bool {
            self.email.is_some()
        }
    }

    #[test]
    fn test_has_updates() {
        assert_eq!(
            Patch { email: None }.validate_has_updates(),
            Err(ValidationError::NoUpdates)
        );
        assert!(Patch { email: Some("a@b.co".into()) }.validate_has_updates().is_ok());
    }
}
