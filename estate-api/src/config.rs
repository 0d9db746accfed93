//! API Configuration Module
//!
//! This module provides configuration for CORS, upload storage, and the
//! deployment environment. Configuration is loaded from environment
//! variables with sensible defaults for development.

use std::path::PathBuf;

/// Maximum accepted request body for JSON routes.
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

// ============================================================================
// API CONFIGURATION
// ============================================================================

/// API configuration for CORS, uploads, and environment-dependent behaviour.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Deployment environment ("development", "production", "test").
    pub environment: String,

    // ========================================================================
    // CORS Configuration
    // ========================================================================
    /// Front-end origin allowed in addition to localhost.
    /// Example: "https://crm.estatehub.io"
    pub client_url: Option<String>,

    /// Whether to allow credentials in CORS requests.
    pub cors_allow_credentials: bool,

    /// Max age for CORS preflight cache in seconds.
    pub cors_max_age_secs: u64,

    // ========================================================================
    // Upload Configuration
    // ========================================================================
    /// Root directory for uploaded photos and documents.
    pub upload_dir: PathBuf,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            client_url: None,
            cors_allow_credentials: true,
            cors_max_age_secs: 86400,
            upload_dir: PathBuf::from("./uploads"),
        }
    }
}

impl ApiConfig {
    /// Create ApiConfig from environment variables.
    ///
    /// Environment variables:
    /// - `APP_ENV` or `NODE_ENV`: deployment environment (default: development)
    /// - `CLIENT_URL`: front-end origin allowed by CORS
    /// - `CORS_MAX_AGE_SECS`: preflight cache duration (default: 86400)
    /// - `UPLOAD_DIR`: upload root (default: ./uploads)
    pub fn from_env() -> Self {
        let environment = std::env::var("APP_ENV")
            .or_else(|_| std::env::var("NODE_ENV"))
            .map(|s| s.trim().to_lowercase())
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "development".to_string());

        let client_url = std::env::var("CLIENT_URL")
            .ok()
            .map(|s| s.trim().trim_end_matches('/').to_string())
            .filter(|s| !s.is_empty());

        let cors_max_age_secs = std::env::var("CORS_MAX_AGE_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(86400);

        let upload_dir = std::env::var("UPLOAD_DIR")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./uploads"));

        Self {
            environment,
            client_url,
            cors_allow_credentials: true,
            cors_max_age_secs,
            upload_dir,
        }
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment == "production" || self.environment == "prod"
    }

    /// Development mode exposes database detail in error responses.
    pub fn is_development(&self) -> bool {
        self.environment == "development" || self.environment == "dev"
    }

    /// Check if a given origin is allowed.
    ///
    /// Any `http://localhost:<port>` origin is accepted, plus `CLIENT_URL`.
    /// Requests without an `Origin` header never reach this check.
    pub fn is_origin_allowed(&self, origin: &str) -> bool {
        if is_localhost_origin(origin) {
            return true;
        }

        match &self.client_url {
            Some(allowed) => allowed == origin.trim_end_matches('/'),
            None => false,
        }
    }
}

fn is_localhost_origin(origin: &str) -> bool {
    match origin.strip_prefix("http://localhost") {
        Some("") => true,
        Some(rest) => rest
            .strip_prefix(':')
            .map(|port| !port.is_empty() && port.chars().all(|c| c.is_ascii_digit()))
            .unwrap_or(false),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ApiConfig::default();
        assert_eq!(config.environment, "development");
        assert!(config.client_url.is_none());
        assert!(config.cors_allow_credentials);
        assert_eq!(config.cors_max_age_secs, 86400);
        assert_eq!(config.upload_dir, PathBuf::from("./uploads"));
    }

    #[test]
    fn test_environment_flags() {
        let mut config = ApiConfig::default();
        assert!(config.is_development());
        assert!(!config.is_production());

        config.environment = "production".to_string();
        assert!(config.is_production());
        assert!(!config.is_development());

        config.environment = "test".to_string();
        assert!(!config.is_production());
        assert!(!config.is_development());
    }

    #[test]
    fn test_localhost_origins_allowed() {
        let config = ApiConfig::default();
        assert!(config.is_origin_allowed("http://localhost:3000"));
        assert!(config.is_origin_allowed("http://localhost:5173"));
        assert!(config.is_origin_allowed("http://localhost"));
    }

    #[test]
    fn test_lookalike_origins_rejected() {
        let config = ApiConfig::default();
        assert!(!config.is_origin_allowed("http://localhost.evil.com"));
        assert!(!config.is_origin_allowed("http://localhost:80x"));
        assert!(!config.is_origin_allowed("https://localhost:3000"));
        assert!(!config.is_origin_allowed("https://anything.com"));
    }

    #[test]
    fn test_client_url_allowed() {
        let config = ApiConfig {
            client_url: Some("https://crm.estatehub.io".to_string()),
            ..Default::default()
        };

        assert!(config.is_origin_allowed("https://crm.estatehub.io"));
        assert!(config.is_origin_allowed("https://crm.estatehub.io/"));
        assert!(!config.is_origin_allowed("https://evil.com"));
        assert!(config.is_origin_allowed("http://localhost:3000"));
    }
}
