//! EstateHub API Server Entry Point
//!
//! Reads configuration from the environment, optionally applies the schema
//! and serves the Axum router until Ctrl-C.

use std::net::SocketAddr;

use estate_api::{
    create_api_router, error, ApiConfig, ApiError, ApiResult, AppState, AuthConfig, DbClient,
    DbConfig,
};

use estate_api::telemetry::{init_tracer, TelemetryConfig};

#[tokio::main]
async fn main() -> ApiResult<()> {
    let telemetry_config = TelemetryConfig::from_env();
    init_tracer(&telemetry_config)?;

    let api_config = ApiConfig::from_env();
    let auth_config = AuthConfig::from_env();
    auth_config.validate_for_production(api_config.is_production())?;
    error::set_expose_details(api_config.is_development());

    let db_config = DbConfig::from_env();
    let db = DbClient::from_config(&db_config)?;

    if env_flag("RUN_MIGRATIONS") {
        db.migrate().await?;
        tracing::info!("Database schema applied");
    }

    match db.health_check().await {
        Ok(()) => tracing::info!(host = %db_config.host, "Database reachable"),
        Err(e) => tracing::warn!(error = %e, "Database not reachable at startup"),
    }

    let environment = api_config.environment.clone();
    let app = create_api_router(AppState::new(db, auth_config, api_config));

    let addr = resolve_bind_addr()?;
    tracing::info!(%addr, %environment, "Starting EstateHub API server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    let server = axum::serve(listener, app);
    tokio::select! {
        result = server => {
            result.map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

fn resolve_bind_addr() -> ApiResult<SocketAddr> {
    let host = std::env::var("BIND_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port_str = std::env::var("PORT").unwrap_or_else(|_| "5000".to_string());
    let port = port_str
        .parse::<u16>()
        .map_err(|_| ApiError::invalid_input(format!("Invalid port value: {}", port_str)))?;

    let addr = format!("{}:{}", host, port);
    addr.parse::<SocketAddr>()
        .map_err(|e| ApiError::invalid_input(format!("Invalid bind address {}: {}", addr, e)))
}
