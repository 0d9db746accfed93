//! Tracing Subscriber Initialization
//!
//! JSON lines in production for log shippers, human-readable output
//! everywhere else. `RUST_LOG` overrides the default filter.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::{ApiError, ApiResult};

const DEFAULT_FILTER: &str = "estate_api=debug,tower_http=debug,info";

/// Output format of the fmt layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    /// Explicit `LOG_FORMAT` wins; otherwise JSON in production only.
    pub fn resolve(raw: Option<&str>, environment: &str) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("json") => LogFormat::Json,
            Some("pretty") | Some("text") => LogFormat::Pretty,
            _ if matches!(environment, "production" | "prod") => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

/// Telemetry configuration from environment variables.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub service_name: String,
    pub service_version: String,
    /// Environment (production, development, test)
    pub environment: String,
    pub log_format: LogFormat,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "estate-api".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            environment: "development".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

impl TelemetryConfig {
    /// Reads `APP_ENV`/`NODE_ENV` and `LOG_FORMAT`.
    pub fn from_env() -> Self {
        let environment = std::env::var("APP_ENV")
            .or_else(|_| std::env::var("NODE_ENV"))
            .map(|s| s.trim().to_lowercase())
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "development".to_string());
        let log_format = LogFormat::resolve(std::env::var("LOG_FORMAT").ok().as_deref(), &environment);

        Self {
            environment,
            log_format,
            ..Default::default()
        }
    }
}

/// Install the global subscriber. Call once at startup.
pub fn init_tracer(config: &TelemetryConfig) -> ApiResult<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let (json_layer, pretty_layer) = match config.log_format {
        LogFormat::Json => (Some(tracing_subscriber::fmt::layer().json()), None),
        LogFormat::Pretty => (None, Some(tracing_subscriber::fmt::layer().pretty())),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(pretty_layer)
        .try_init()
        .map_err(|e| ApiError::internal_error(format!("Failed to init subscriber: {}", e)))?;

    tracing::info!(
        service_name = %config.service_name,
        service_version = %config.service_version,
        environment = %config.environment,
        log_format = ?config.log_format,
        "Telemetry initialized"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TelemetryConfig::default();
        assert_eq!(config.service_name, "estate-api");
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_log_format_follows_environment() {
        assert_eq!(LogFormat::resolve(None, "production"), LogFormat::Json);
        assert_eq!(LogFormat::resolve(None, "development"), LogFormat::Pretty);
        assert_eq!(LogFormat::resolve(Some(""), "test"), LogFormat::Pretty);
    }

    #[test]
    fn test_explicit_log_format_wins() {
        assert_eq!(LogFormat::resolve(Some("JSON"), "development"), LogFormat::Json);
        assert_eq!(LogFormat::resolve(Some("pretty"), "production"), LogFormat::Pretty);
    }
}
