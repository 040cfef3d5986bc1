//! The `txn` table (§4.3 LoadPipeline step 2).

use sqlx::{Postgres, Transaction};

use crate::{
    codec::{Intra, Round},
    error::IndexerError,
};

#[allow(clippy::too_many_arguments)]
pub async fn insert(
    exec: &mut Transaction<'_, Postgres>,
    round: Round,
    intra: Intra,
    typeenum: i16,
    asset_id: u64,
    txnbytes: &[u8],
    txn_json: &serde_json::Value,
) -> Result<(), IndexerError> {
    sqlx::query(
        "INSERT INTO txn (round, intra, typeenum, asset, txnbytes, txn) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         ON CONFLICT (round, intra) DO NOTHING",
    )
    .bind(round as i64)
    .bind(intra as i64)
    .bind(typeenum)
    .bind(asset_id as i64)
    .bind(txnbytes)
    .bind(txn_json)
    .execute(&mut **exec)
    .await?;
    Ok(())
}

/// A `(round, intra, txnbytes)` row, the unit [`AccountingEngine`]
/// replays in order (§4.4).
///
/// [`AccountingEngine`]: crate::accounting::engine::AccountingEngine
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TxnRow {
    pub round: i64,
    pub intra: i64,
    pub txnbytes: Vec<u8>,
}

/// Streams every row with `round > after_round` in `(round, intra)`
/// order (§4.4 ordering guarantee, §5).
pub async fn fetch_after(
    pool: &sqlx::PgPool,
    after_round: i64,
    max_round: Option<Round>,
) -> Result<Vec<TxnRow>, IndexerError> {
    let rows: Vec<TxnRow> = match max_round {
        Some(max) => {
            sqlx::query_as(
                "SELECT round, intra, txnbytes FROM txn \
                 WHERE round > $1 AND round <= $2 ORDER BY round, intra",
            )
            .bind(after_round)
            .bind(max as i64)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as(
                "SELECT round, intra, txnbytes FROM txn \
                 WHERE round > $1 ORDER BY round, intra",
            )
            .bind(after_round)
            .fetch_all(pool)
            .await?
        }
    };
    Ok(rows)
}

/// The highest round present in `txn`, the upper bound
/// `AccountingEngine::catch_up` can advance to.
pub async fn max_round(pool: &sqlx::PgPool) -> Result<Option<Round>, IndexerError> {
    let row: Option<(Option<i64>,)> = sqlx::query_as("SELECT max(round) FROM txn")
        .fetch_optional(pool)
        .await?;
    Ok(row.and_then(|(r,)| r).map(|r| r as u64))
}
