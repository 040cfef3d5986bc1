//! The `block_header` table (§4.3 LoadPipeline step 1).

use sqlx::{PgPool, Postgres, Transaction};

use crate::{codec::Round, error::IndexerError};

/// Inserts a block header (without its transaction list). Conflict on
/// `round` is ignored: re-importing an already-loaded round is a
/// no-op, part of exactly-once semantics (§4.3, §8).
pub async fn insert(
    exec: &mut Transaction<'_, Postgres>,
    round: Round,
    realtime_unix: i64,
    header_msgpack: &[u8],
) -> Result<(), IndexerError> {
    sqlx::query(
        "INSERT INTO block_header (round, realtime, header) \
         VALUES ($1, to_timestamp($2), $3) \
         ON CONFLICT (round) DO NOTHING",
    )
    .bind(round as i64)
    .bind(realtime_unix as f64)
    .bind(header_msgpack)
    .execute(&mut **exec)
    .await?;
    Ok(())
}

/// Fetches a previously-stored header's raw msgpack bytes, used by the
/// accounting engine to recover `txn_counter`/`fee_sink`/`rewards_pool`
/// for a round (§4.4).
pub async fn get_header_bytes(
    pool: &PgPool,
    round: Round,
) -> Result<Option<Vec<u8>>, IndexerError> {
    let row: Option<(Vec<u8>,)> = sqlx::query_as("SELECT header FROM block_header WHERE round = $1")
        .bind(round as i64)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|(b,)| b))
}

/// The highest round present in `block_header`, used to bound
/// `AccountingEngine::catch_up`.
pub async fn max_round(pool: &PgPool) -> Result<Option<Round>, IndexerError> {
    let row: Option<(Option<i64>,)> = sqlx::query_as("SELECT max(round) FROM block_header")
        .fetch_optional(pool)
        .await?;
    Ok(row.and_then(|(r,)| r).map(|r| r as u64))
}
