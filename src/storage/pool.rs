//! Connection pool construction.

use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::error::IndexerError;

/// Opens a pool against `database_url`, the one configuration knob
/// every binary needs (§1: argument parsing is out of scope, so this
/// is read from the environment by each binary's `Config::from_env`).
pub async fn connect(database_url: &str) -> Result<PgPool, IndexerError> {
    PgPoolOptions::new()
        .max_connections(8)
        .connect(database_url)
        .await
        .map_err(IndexerError::Storage)
}
