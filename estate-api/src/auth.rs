//! Authentication Module
//!
//! JWT bearer authentication for the EstateHub API:
//! - HS256 tokens carrying `{sub, role, iat, exp}`
//! - Time validation against an injectable clock with configurable leeway
//! - bcrypt password hashing
//! - Role checks on the authenticated context

use crate::error::{ApiError, ApiResult};
use estate_core::{AgentId, UserId, UserRole};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// bcrypt work factor for stored password hashes.
pub const BCRYPT_COST: u32 = 10;

const INSECURE_DEFAULT_SECRET: &str = "INSECURE_DEFAULT_SECRET_CHANGE_IN_PRODUCTION";

// ============================================================================
// CLOCK ABSTRACTION
// ============================================================================

/// Clock abstraction for JWT time validation.
///
/// Time checks are done here rather than inside `jsonwebtoken`, so tests can
/// pin the clock and a pre-epoch system clock becomes an error instead of a panic.
pub trait JwtClock: Send + Sync {
    /// Get current time as Unix epoch seconds.
    fn now_epoch_secs(&self) -> i64;
}

/// Production clock using system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl JwtClock for SystemClock {
    fn now_epoch_secs(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

/// Fixed clock for deterministic tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl JwtClock for FixedClock {
    fn now_epoch_secs(&self) -> i64 {
        self.0
    }
}

/// Test clock helpers for common scenarios.
#[cfg(test)]
pub mod test_clocks {
    use super::FixedClock;

    /// 2024-01-01 00:00:00 UTC
    pub fn valid() -> FixedClock {
        FixedClock(1704067200)
    }

    /// 2020-01-01 00:00:00 UTC
    pub fn expired() -> FixedClock {
        FixedClock(1577836800)
    }

    /// 2030-01-01 00:00:00 UTC
    pub fn future() -> FixedClock {
        FixedClock(1893456000)
    }
}

// ============================================================================
// JWT SECRET
// ============================================================================

/// JWT signing secret that never appears in logs.
#[derive(Clone)]
pub struct JwtSecret(SecretString);

impl JwtSecret {
    /// Create a new JWT secret.
    ///
    /// # Errors
    /// Returns error if the secret is empty.
    pub fn new(secret: String) -> ApiResult<Self> {
        if secret.is_empty() {
            return Err(ApiError::missing_field("JWT secret must not be empty"));
        }
        Ok(Self(SecretString::new(secret.into())))
    }

    /// Expose the secret value (only for cryptographic operations).
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    pub fn len(&self) -> usize {
        self.0.expose_secret().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.expose_secret().is_empty()
    }

    pub fn is_insecure_default(&self) -> bool {
        self.0.expose_secret() == INSECURE_DEFAULT_SECRET
    }
}

impl std::fmt::Debug for JwtSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "JwtSecret([REDACTED, {} chars])", self.len())
    }
}

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Authentication configuration.
#[derive(Clone)]
pub struct AuthConfig {
    /// JWT secret key for signing and verification
    pub jwt_secret: JwtSecret,

    /// JWT algorithm (default: HS256)
    pub jwt_algorithm: Algorithm,

    /// JWT token lifetime in seconds (default: 7 days)
    pub jwt_expiration_secs: i64,

    /// Clock skew tolerance in seconds (default: 60)
    pub jwt_clock_skew_secs: i64,

    /// Clock for JWT time validation (injected for testing)
    pub clock: Arc<dyn JwtClock>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &self.jwt_secret)
            .field("jwt_algorithm", &self.jwt_algorithm)
            .field("jwt_expiration_secs", &self.jwt_expiration_secs)
            .field("jwt_clock_skew_secs", &self.jwt_clock_skew_secs)
            .field("clock", &"<JwtClock>")
            .finish()
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        let secret_str =
            std::env::var("JWT_SECRET").unwrap_or_else(|_| INSECURE_DEFAULT_SECRET.to_string());

        Self {
            jwt_secret: build_jwt_secret(secret_str),
            jwt_algorithm: Algorithm::HS256,
            jwt_expiration_secs: 7 * 24 * 3600,
            jwt_clock_skew_secs: 60,
            clock: Arc::new(SystemClock),
        }
    }
}

impl AuthConfig {
    /// Create authentication configuration from environment variables.
    ///
    /// # Environment Variables
    /// - `JWT_SECRET`: signing secret
    /// - `JWT_EXPIRES_IN_SECS`: token lifetime (default: 604800)
    /// - `JWT_CLOCK_SKEW_SECS`: clock skew tolerance (default: 60)
    pub fn from_env() -> Self {
        let secret_str =
            std::env::var("JWT_SECRET").unwrap_or_else(|_| INSECURE_DEFAULT_SECRET.to_string());

        Self {
            jwt_secret: build_jwt_secret(secret_str),
            jwt_algorithm: Algorithm::HS256,
            jwt_expiration_secs: std::env::var("JWT_EXPIRES_IN_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(7 * 24 * 3600),
            jwt_clock_skew_secs: std::env::var("JWT_CLOCK_SKEW_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(60),
            clock: Arc::new(SystemClock),
        }
    }

    /// Refuse insecure secrets in production; warn about them otherwise.
    pub fn validate_for_production(&self, is_production: bool) -> ApiResult<()> {
        if self.jwt_secret.is_insecure_default() {
            if is_production {
                return Err(ApiError::invalid_input(
                    "Cannot start server in production with insecure JWT secret. \
                     Set JWT_SECRET to a secure value.",
                ));
            }
            tracing::warn!(
                "Using insecure default JWT secret. Set JWT_SECRET to a random value \
                 of at least 32 characters before deploying."
            );
        }

        if self.jwt_secret.len() < 32 {
            if is_production {
                return Err(ApiError::invalid_input(format!(
                    "JWT secret is too short for production use ({} chars). \
                     It must be at least 32 characters long.",
                    self.jwt_secret.len()
                )));
            } else if !self.jwt_secret.is_insecure_default() {
                tracing::warn!(
                    chars = self.jwt_secret.len(),
                    "JWT secret is short; production requires at least 32 characters"
                );
            }
        }

        Ok(())
    }
}

fn build_jwt_secret(secret_str: String) -> JwtSecret {
    let normalized = if secret_str.trim().is_empty() {
        INSECURE_DEFAULT_SECRET.to_string()
    } else {
        secret_str
    };

    match JwtSecret::new(normalized) {
        Ok(secret) => secret,
        Err(_) => JwtSecret(SecretString::new(INSECURE_DEFAULT_SECRET.to_string().into())),
    }
}

// ============================================================================
// JWT CLAIMS
// ============================================================================

/// JWT claims: user id as subject plus the role at issue time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,

    pub role: UserRole,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    pub fn new(user_id: UserId, role: UserRole, expiration_secs: i64, clock: &dyn JwtClock) -> Self {
        let now = clock.now_epoch_secs();

        Self {
            sub: user_id.to_string(),
            role,
            iat: now,
            exp: now + expiration_secs,
        }
    }

    pub fn is_expired(&self, clock: &dyn JwtClock) -> bool {
        self.exp < clock.now_epoch_secs()
    }

    /// Parse the subject back into a user id.
    pub fn user_id(&self) -> ApiResult<UserId> {
        self.sub
            .parse()
            .map_err(|_| ApiError::invalid_token("Invalid token."))
    }
}

// ============================================================================
// AUTHENTICATION CONTEXT
// ============================================================================

/// Authenticated caller, resolved from the token and the `users` table.
///
/// Injected into request extensions by the auth middleware.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AuthContext {
    pub user_id: UserId,
    pub email: String,
    pub role: UserRole,
    /// Agent profile linked to the user, if any.
    pub agent_id: Option<AgentId>,
}

impl AuthContext {
    pub fn has_role(&self, role: UserRole) -> bool {
        self.role == role
    }

    pub fn has_any_role(&self, roles: &[UserRole]) -> bool {
        roles.iter().any(|role| self.has_role(*role))
    }

    /// Fail with 403 unless the caller holds one of `roles`.
    pub fn require_any_role(&self, roles: &[UserRole]) -> ApiResult<()> {
        if self.has_any_role(roles) {
            Ok(())
        } else {
            Err(ApiError::forbidden())
        }
    }
}

// ============================================================================
// TOKEN FUNCTIONS
// ============================================================================

fn validate_claim_times(now: i64, exp: i64, leeway_secs: i64) -> ApiResult<()> {
    if exp < now - leeway_secs {
        return Err(ApiError::token_expired());
    }
    Ok(())
}

/// Validate a JWT token and extract claims.
///
/// `jsonwebtoken` checks the signature only; expiry is checked against
/// `config.clock`.
pub fn validate_jwt_token(config: &AuthConfig, token: &str) -> ApiResult<Claims> {
    let decoding_key = DecodingKey::from_secret(config.jwt_secret.expose().as_bytes());

    let mut validation = Validation::new(config.jwt_algorithm);
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.required_spec_claims = std::collections::HashSet::from(["exp".to_string()]);

    let token_data = decode::<Claims>(token, &decoding_key, &validation).map_err(|e| {
        tracing::debug!(error = %e, "JWT rejected");
        ApiError::invalid_token("Invalid token.")
    })?;

    let claims = token_data.claims;
    let now = config.clock.now_epoch_secs();

    if now < 0 {
        tracing::error!(
            timestamp = now,
            "System clock returned pre-epoch time - server time is broken"
        );
        return Err(ApiError::internal_error(
            "Server time configuration error - please contact support",
        ));
    }

    validate_claim_times(now, claims.exp, config.jwt_clock_skew_secs)?;

    Ok(claims)
}

/// Generate a signed JWT for a user.
pub fn generate_jwt_token(config: &AuthConfig, user_id: UserId, role: UserRole) -> ApiResult<String> {
    let claims = Claims::new(user_id, role, config.jwt_expiration_secs, &*config.clock);

    let encoding_key = EncodingKey::from_secret(config.jwt_secret.expose().as_bytes());
    let header = Header::new(config.jwt_algorithm);

    encode(&header, &claims, &encoding_key)
        .map_err(|e| ApiError::internal_error(format!("Failed to generate token: {}", e)))
}

/// Extract the token from an `Authorization: Bearer <token>` header value.
pub fn extract_bearer_token(header_value: &str) -> Option<&str> {
    header_value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

// ============================================================================
// PASSWORDS
// ============================================================================

/// Hash a password with bcrypt on the blocking pool.
pub async fn hash_password(password: String) -> ApiResult<String> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, BCRYPT_COST))
        .await
        .map_err(|e| ApiError::internal_error(format!("Password hashing task failed: {}", e)))?
        .map_err(ApiError::from)
}

/// Compare a password against a stored bcrypt hash.
pub async fn verify_password(password: String, hash: String) -> ApiResult<bool> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| ApiError::internal_error(format!("Password check task failed: {}", e)))?
        .map_err(ApiError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn test_config() -> AuthConfig {
        AuthConfig {
            jwt_secret: JwtSecret::new("test_secret_that_is_long_enough_for_tests".to_string())
                .expect("Test secret should be valid"),
            jwt_algorithm: Algorithm::HS256,
            jwt_expiration_secs: 7 * 24 * 3600,
            jwt_clock_skew_secs: 60,
            clock: Arc::new(test_clocks::valid()),
        }
    }

    #[test]
    fn test_jwt_generation_and_validation() -> ApiResult<()> {
        let config = test_config();

        let token = generate_jwt_token(&config, 42, UserRole::Manager)?;
        let claims = validate_jwt_token(&config, &token)?;

        assert_eq!(claims.sub, "42");
        assert_eq!(claims.user_id()?, 42);
        assert_eq!(claims.role, UserRole::Manager);
        assert_eq!(claims.exp - claims.iat, 7 * 24 * 3600);
        assert!(!claims.is_expired(&test_clocks::valid()));
        Ok(())
    }

    #[test]
    fn test_expired_token() -> ApiResult<()> {
        let mut config = test_config();
        let token = generate_jwt_token(&config, 1, UserRole::Agent)?;

        config.clock = Arc::new(test_clocks::future());

        let result = validate_jwt_token(&config, &token);
        assert!(matches!(result, Err(ref e) if e.code == ErrorCode::TokenExpired));
        if let Err(e) = result {
            assert_eq!(e.message, "Token expired.");
        }
        Ok(())
    }

    #[test]
    fn test_token_issued_in_past_is_expired() -> ApiResult<()> {
        let mut config = test_config();
        config.clock = Arc::new(test_clocks::expired());
        let token = generate_jwt_token(&config, 1, UserRole::Agent)?;

        config.clock = Arc::new(test_clocks::valid());
        assert!(validate_jwt_token(&config, &token).is_err());
        Ok(())
    }

    #[test]
    fn test_tampered_token_rejected() -> ApiResult<()> {
        let config = test_config();
        let token = generate_jwt_token(&config, 1, UserRole::Agent)?;

        let mut other = test_config();
        other.jwt_secret = JwtSecret::new("a_completely_different_signing_secret".to_string())?;

        let result = validate_jwt_token(&other, &token);
        assert!(matches!(result, Err(ref e) if e.code == ErrorCode::InvalidToken));
        if let Err(e) = result {
            assert_eq!(e.message, "Invalid token.");
        }
        Ok(())
    }

    #[test]
    fn test_garbage_token_rejected() {
        let config = test_config();
        let result = validate_jwt_token(&config, "not.a.jwt");
        assert!(matches!(result, Err(ref e) if e.code == ErrorCode::InvalidToken));
    }

    #[test]
    fn test_clock_skew_tolerance() -> ApiResult<()> {
        let mut config = test_config();
        config.jwt_expiration_secs = 100;
        let token = generate_jwt_token(&config, 1, UserRole::Agent)?;

        config.clock = Arc::new(FixedClock(test_clocks::valid().0 + 130));
        assert!(validate_jwt_token(&config, &token).is_ok());

        config.clock = Arc::new(FixedClock(test_clocks::valid().0 + 200));
        let result = validate_jwt_token(&config, &token);
        assert!(matches!(result, Err(ref e) if e.code == ErrorCode::TokenExpired));
        Ok(())
    }

    #[test]
    fn test_pre_epoch_clock_fails_loud() -> ApiResult<()> {
        let mut config = test_config();
        let token = generate_jwt_token(&config, 1, UserRole::Agent)?;

        config.clock = Arc::new(FixedClock(-1000));

        let result = validate_jwt_token(&config, &token);
        assert!(matches!(result, Err(ref e) if e.code == ErrorCode::InternalError));
        Ok(())
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(extract_bearer_token("Bearer "), None);
        assert_eq!(extract_bearer_token("Basic dXNlcjpwYXNz"), None);
        assert_eq!(extract_bearer_token("abc.def.ghi"), None);
    }

    #[test]
    fn test_role_checks() {
        let ctx = AuthContext {
            user_id: 1,
            email: "manager@estatehub.io".to_string(),
            role: UserRole::Manager,
            agent_id: None,
        };

        assert!(ctx.has_role(UserRole::Manager));
        assert!(ctx.has_any_role(&[UserRole::Admin, UserRole::Manager]));
        assert!(ctx.require_any_role(&[UserRole::Admin, UserRole::Manager]).is_ok());

        let err = ctx.require_any_role(&[UserRole::Admin]).unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);
    }

    #[test]
    fn test_secret_debug_is_redacted() -> ApiResult<()> {
        let secret = JwtSecret::new("super-secret-value".to_string())?;
        let debug = format!("{:?}", secret);
        assert!(!debug.contains("super-secret-value"));
        assert!(JwtSecret::new(String::new()).is_err());
        Ok(())
    }

    #[test]
    fn test_production_validation() -> ApiResult<()> {
        let secure = test_config();
        assert!(secure.validate_for_production(true).is_ok());

        let short = AuthConfig {
            jwt_secret: JwtSecret::new("short".to_string())?,
            ..test_config()
        };
        assert!(short.validate_for_production(true).is_err());
        assert!(short.validate_for_production(false).is_ok());

        let insecure = AuthConfig {
            jwt_secret: build_jwt_secret(String::new()),
            ..test_config()
        };
        assert!(insecure.jwt_secret.is_insecure_default());
        assert!(insecure.validate_for_production(true).is_err());
        assert!(insecure.validate_for_production(false).is_ok());
        Ok(())
    }

    #[tokio::test]
    async fn test_password_hash_round_trip() -> ApiResult<()> {
        let hash = hash_password("Secret123".to_string()).await?;
        assert!(hash.starts_with("$2"));
        assert!(verify_password("Secret123".to_string(), hash.clone()).await?);
        assert!(!verify_password("secret123".to_string(), hash).await?);
        Ok(())
    }
}
