//! Property-Based Tests for Input Validation
//!
//! Password strength, email format and enum parsing accept exactly the
//! values the API documents and reject the rest with a 400-class error.

use estate_api::error::ErrorCode;
use estate_api::validation::{self, is_strong_password, is_valid_email};
use estate_api::ApiError;
use estate_core::{DealStage, UserRole};
use estate_test_utils::generators::*;
use proptest::prelude::*;

proptest! {
    #[test]
    fn prop_strong_passwords_accepted(password in arb_strong_password()) {
        prop_assert!(is_strong_password(&password));
        prop_assert!(validation::validate_password(&password).is_ok());
    }

    #[test]
    fn prop_weak_passwords_rejected(password in arb_weak_password()) {
        prop_assert!(!is_strong_password(&password));
        let err = ApiError::from(validation::validate_password(&password).unwrap_err());
        prop_assert_eq!(err.code, ErrorCode::ValidationFailed);
    }

    #[test]
    fn prop_generated_emails_are_valid(email in arb_email()) {
        prop_assert!(is_valid_email(&email));
    }

    #[test]
    fn prop_emails_without_at_sign_are_invalid(local in "[a-z]{1,10}", domain in "[a-z]{1,8}\\.[a-z]{2,3}") {
        let glued = format!("{}{}", local, domain);
        prop_assert!(!is_valid_email(&glued));
    }

    #[test]
    fn prop_known_stages_parse(stage in arb_deal_stage()) {
        let parsed = validation::parse_enum::<DealStage>(Some(stage.as_db_str()));
        prop_assert_eq!(parsed, Ok(Some(stage)));
    }

    #[test]
    fn prop_unknown_roles_name_the_allowed_values(value in arb_unknown_enum_value()) {
        let err = validation::parse_enum::<UserRole>(Some(&value)).unwrap_err();
        let message = err.to_string();
        prop_assert!(message.contains("Allowed values"));
        prop_assert!(message.contains("agent"));
        prop_assert_eq!(ApiError::from(err).code, ErrorCode::ValidationFailed);
    }
}

#[test]
fn blank_enum_values_are_absent() {
    assert_eq!(validation::parse_enum::<UserRole>(None), Ok(None));
    assert_eq!(validation::parse_enum::<UserRole>(Some("  ")), Ok(None));
}

