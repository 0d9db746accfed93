#![allow(dead_code)]

use estate_api::auth::{generate_jwt_token, AuthConfig, JwtSecret};
use estate_core::{UserId, UserRole};
use estate_test_utils::fixtures::TEST_JWT_SECRET;

/// Auth configuration signing with the shared test secret.
pub fn test_auth_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: JwtSecret::new(TEST_JWT_SECRET.to_string()).expect("test secret is valid"),
        ..AuthConfig::default()
    }
}

/// A well-formed token for a user that may or may not exist.
pub fn test_token(user_id: UserId, role: UserRole) -> String {
    generate_jwt_token(&test_auth_config(), user_id, role).expect("Failed to sign test token")
}
