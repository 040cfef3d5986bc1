//! The `imported` watermark table (§4.3, §8 "Exactly-once import").

use sqlx::PgPool;

use crate::error::IndexerError;

/// Whether `path` has already been fully imported.
pub async fn is_imported(pool: &PgPool, path: &str) -> Result<bool, IndexerError> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM imported WHERE path = $1")
        .bind(path)
        .fetch_optional(pool)
        .await?;
    Ok(row.is_some())
}

/// Marks `path` as imported. Only called after every block in the
/// archive has committed (§4.3 order constraint).
pub async fn mark_imported(pool: &PgPool, path: &str) -> Result<(), IndexerError> {
    sqlx::query("INSERT INTO imported (path) VALUES ($1) ON CONFLICT (path) DO NOTHING")
        .bind(path)
        .execute(pool)
        .await?;
    Ok(())
}
