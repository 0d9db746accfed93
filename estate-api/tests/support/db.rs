use estate_api::db::{DbClient, DbConfig};

/// Client built from `DB_*` variables. The pool connects lazily.
pub fn test_db_client() -> DbClient {
    let config = DbConfig::from_env();
    DbClient::from_config(&config).expect("Failed to create database client")
}
