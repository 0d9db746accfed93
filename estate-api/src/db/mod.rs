//! Database Connection Pool Module
//!
//! PostgreSQL connection pooling with deadpool-postgres, plus the row
//! helpers every entity module uses. Rows are read through `row_to_json`
//! and deserialized into the typed structs in [`crate::types`].
//!
//! Entity operations live in submodules, each adding an `impl DbClient`
//! block for its tables.

mod agents;
mod clients;
mod communications;
mod dashboard;
mod deals;
mod properties;
pub mod query;
mod showings;
mod tasks;
mod users;

pub use deals::execute_stage_transition;
pub use users::NewAgentProfile;
pub use query::{QueryBuilder, SortOrder, SqlParam};

use crate::error::{ApiError, ApiResult};
use crate::pagination::Pagination;
use crate::response::Paginated;
use deadpool_postgres::{Config, ManagerConfig, Pool, RecyclingMethod, Runtime};
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use std::time::Duration;
use tokio_postgres::types::ToSql;
use tokio_postgres::{GenericClient, NoTls};

const INITIAL_SCHEMA: &str = include_str!("../../migrations/0001_initial_schema.sql");

// ============================================================================
// CONNECTION POOL CONFIGURATION
// ============================================================================

/// Database connection pool configuration.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub dbname: String,
    pub user: String,
    pub password: String,
    /// Maximum pool size
    pub max_size: usize,
    /// Wait/create timeout for a pooled connection
    pub timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            dbname: "estatehub".to_string(),
            user: "postgres".to_string(),
            password: "postgres".to_string(),
            max_size: 20,
            timeout: Duration::from_secs(2),
        }
    }
}

impl DbConfig {
    /// Create a new database configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("DB_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: std::env::var("DB_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5432),
            dbname: std::env::var("DB_NAME").unwrap_or_else(|_| "estatehub".to_string()),
            user: std::env::var("DB_USER").unwrap_or_else(|_| "postgres".to_string()),
            password: std::env::var("DB_PASSWORD").unwrap_or_else(|_| "postgres".to_string()),
            max_size: std::env::var("DB_POOL_MAX")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(20),
            timeout: Duration::from_secs(
                std::env::var("DB_CONNECT_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(2),
            ),
        }
    }

    /// Create a connection pool from this configuration.
    ///
    /// No connection is opened until the first checkout.
    pub fn create_pool(&self) -> ApiResult<Pool> {
        let mut cfg = Config::new();
        cfg.host = Some(self.host.clone());
        cfg.port = Some(self.port);
        cfg.dbname = Some(self.dbname.clone());
        cfg.user = Some(self.user.clone());
        cfg.password = Some(self.password.clone());
        cfg.connect_timeout = Some(self.timeout);

        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });

        let mut pool_cfg = deadpool_postgres::PoolConfig::new(self.max_size);
        pool_cfg.timeouts.wait = Some(self.timeout);
        pool_cfg.timeouts.create = Some(self.timeout);
        cfg.pool = Some(pool_cfg);

        let pool = cfg
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| ApiError::database_error(format!("Failed to create pool: {}", e)))?;

        Ok(pool)
    }
}

// ============================================================================
// DATABASE CLIENT WRAPPER
// ============================================================================

/// Database client wrapping the connection pool.
#[derive(Clone)]
pub struct DbClient {
    pool: Pool,
}

impl DbClient {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    pub fn from_config(config: &DbConfig) -> ApiResult<Self> {
        let pool = config.create_pool()?;
        Ok(Self::new(pool))
    }

    /// Get the current pool size for observability.
    pub fn pool_size(&self) -> usize {
        self.pool.status().size
    }

    /// Check out a connection. It returns to the pool when dropped.
    pub async fn get_conn(&self) -> ApiResult<deadpool_postgres::Object> {
        self.pool.get().await.map_err(ApiError::from)
    }

    /// Health check - verifies database connectivity.
    pub async fn health_check(&self) -> ApiResult<()> {
        let conn = self.get_conn().await?;
        conn.query_one("SELECT 1", &[]).await?;
        Ok(())
    }

    /// Apply the bundled schema. Every statement is idempotent.
    pub async fn migrate(&self) -> ApiResult<()> {
        let conn = self.get_conn().await?;
        conn.batch_execute(INITIAL_SCHEMA).await?;
        tracing::info!("Database schema is up to date");
        Ok(())
    }
}

// ============================================================================
// ROW HELPERS
// ============================================================================

/// CTE form, so `INSERT/UPDATE ... RETURNING` can be wrapped as well.
fn wrap_json(sql: &str) -> String {
    format!("WITH r AS ({}) SELECT row_to_json(r) FROM r", sql)
}

fn decode_row<T: DeserializeOwned>(row: &tokio_postgres::Row) -> ApiResult<T> {
    let value: JsonValue = row.try_get(0)?;
    Ok(serde_json::from_value(value)?)
}

/// Run `sql` and decode every row into `T`.
pub(crate) async fn query_json<C, T>(
    client: &C,
    sql: &str,
    params: &[&(dyn ToSql + Sync)],
) -> ApiResult<Vec<T>>
where
    C: GenericClient + Sync,
    T: DeserializeOwned,
{
    let wrapped = wrap_json(sql);
    let rows = client.query(wrapped.as_str(), params).await?;
    rows.iter().map(decode_row).collect()
}

/// Run `sql` and decode at most one row.
pub(crate) async fn query_json_opt<C, T>(
    client: &C,
    sql: &str,
    params: &[&(dyn ToSql + Sync)],
) -> ApiResult<Option<T>>
where
    C: GenericClient + Sync,
    T: DeserializeOwned,
{
    let wrapped = wrap_json(sql);
    let row = client.query_opt(wrapped.as_str(), params).await?;
    row.as_ref().map(decode_row).transpose()
}

/// Run `sql` and decode exactly one row, failing with 500 if there is none.
pub(crate) async fn query_json_one<C, T>(
    client: &C,
    sql: &str,
    params: &[&(dyn ToSql + Sync)],
) -> ApiResult<T>
where
    C: GenericClient + Sync,
    T: DeserializeOwned,
{
    query_json_opt(client, sql, params)
        .await?
        .ok_or_else(|| ApiError::internal_error("Query returned no rows"))
}

/// Run a `SELECT COUNT(*)` style query.
pub(crate) async fn query_count<C>(
    client: &C,
    sql: &str,
    params: &[&(dyn ToSql + Sync)],
) -> ApiResult<i64>
where
    C: GenericClient + Sync,
{
    let row = client.query_one(sql, params).await?;
    Ok(row.try_get(0)?)
}

/// Count and fetch one page with the filters in `filters`.
///
/// `from` is the `FROM` clause shared by both queries; `select` is the
/// column list of the page query.
pub(crate) async fn query_page<C, T>(
    client: &C,
    filters: &QueryBuilder,
    select: &str,
    from: &str,
    order_by: &str,
    page: &Pagination,
) -> ApiResult<Paginated<T>>
where
    C: GenericClient + Sync,
    T: DeserializeOwned,
{
    let params = filters.sql_params();
    let total = query_count(client, &filters.count_sql(from), &params).await?;
    if total == 0 {
        return Ok(Paginated::empty(page));
    }
    let select_from = format!("SELECT {} FROM {}", select, from);
    let sql = filters.page_sql(&select_from, order_by, page);
    let data = query_json(client, &sql, &params).await?;
    Ok(Paginated::new(data, page, total))
}

/// Whether `SELECT 1 FROM <table> WHERE id = $1` finds a row.
pub(crate) async fn exists<C>(client: &C, table: &str, id: i64) -> ApiResult<bool>
where
    C: GenericClient + Sync,
{
    let sql = format!("SELECT 1 FROM {} WHERE id = $1::bigint", table);
    Ok(client.query_opt(sql.as_str(), &[&id]).await?.is_some())
}

/// Run `DELETE ... WHERE id = $1`, reporting whether a row went away.
pub(crate) async fn delete_by_id<C>(client: &C, table: &str, id: i64) -> ApiResult<bool>
where
    C: GenericClient + Sync,
{
    let sql = format!("DELETE FROM {} WHERE id = $1::bigint", table);
    Ok(client.execute(sql.as_str(), &[&id]).await? > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DbConfig::default();
        assert_eq!(config.dbname, "estatehub");
        assert_eq!(config.max_size, 20);
        assert_eq!(config.timeout, Duration::from_secs(2));
    }

    #[test]
    fn test_wrap_json() {
        assert_eq!(
            wrap_json("SELECT id FROM deals"),
            "WITH r AS (SELECT id FROM deals) SELECT row_to_json(r) FROM r"
        );
    }

    #[test]
    fn test_schema_is_bundled() {
        assert!(INITIAL_SCHEMA.contains("CREATE TABLE IF NOT EXISTS deals"));
        assert!(INITIAL_SCHEMA.contains("CREATE TABLE IF NOT EXISTS deal_activities"));
    }

    #[tokio::test]
    async fn test_pool_is_lazy() -> ApiResult<()> {
        let client = DbClient::from_config(&DbConfig::default())?;
        assert_eq!(client.pool_size(), 0);
        Ok(())
    }
}
