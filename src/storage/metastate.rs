//! The `metastate` key/value table (§3 Metastate, §6 Persisted state
//! layout).

use sqlx::{Postgres, Transaction};

use crate::error::IndexerError;

const STATE_KEY: &str = "state";

/// The distinguished `state` value. `account_round` is `null` before
/// genesis bootstrap, `-1` immediately after it, and non-decreasing
/// thereafter (§3 Metastate invariant).
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct MetaState {
    #[serde(default, rename = "account_round")]
    pub account_round: Option<i64>,
}

pub async fn get_state(
    exec: &mut Transaction<'_, Postgres>,
) -> Result<MetaState, IndexerError> {
    let row: Option<(serde_json::Value,)> =
        sqlx::query_as("SELECT v FROM metastate WHERE k = $1")
            .bind(STATE_KEY)
            .fetch_optional(&mut **exec)
            .await?;
    match row {
        Some((v,)) => Ok(serde_json::from_value(v).unwrap_or_default()),
        None => Ok(MetaState::default()),
    }
}

pub async fn set_state(
    exec: &mut Transaction<'_, Postgres>,
    state: &MetaState,
) -> Result<(), IndexerError> {
    let v = serde_json::to_value(state)
        .map_err(|e| IndexerError::MalformedRecord(format!("serializing metastate: {e}")))?;
    sqlx::query(
        "INSERT INTO metastate (k, v) VALUES ($1, $2) \
         ON CONFLICT (k) DO UPDATE SET v = EXCLUDED.v",
    )
    .bind(STATE_KEY)
    .bind(v)
    .execute(&mut **exec)
    .await?;
    Ok(())
}
