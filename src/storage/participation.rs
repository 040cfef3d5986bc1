//! The `txn_participation` table (§4.3 LoadPipeline step 2, §8
//! "Participation completeness").

use sqlx::{Postgres, Transaction};

use crate::{
    codec::{Address, Intra, Round},
    error::IndexerError,
};

pub async fn insert(
    exec: &mut Transaction<'_, Postgres>,
    addr: &Address,
    round: Round,
    intra: Intra,
) -> Result<(), IndexerError> {
    sqlx::query(
        "INSERT INTO txn_participation (addr, round, intra) VALUES ($1, $2, $3) \
         ON CONFLICT (addr, round, intra) DO NOTHING",
    )
    .bind(addr.as_bytes().as_slice())
    .bind(round as i64)
    .bind(intra as i64)
    .execute(&mut **exec)
    .await?;
    Ok(())
}
