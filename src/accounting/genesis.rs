//! Genesis bootstrap (§4.4 "Genesis bootstrap", supplemented from
//! `accountreimpl.py`'s `load_genesis`).

use std::path::Path;

use serde::Deserialize;

use crate::{codec::Address, error::IndexerError, storage};

#[derive(Deserialize)]
struct GenesisFile {
    alloc: Vec<GenesisAllocation>,
}

#[derive(Deserialize)]
struct GenesisAllocation {
    addr: String,
    state: serde_json::Value,
}

/// Inserts one `account` row per genesis allocation and sets
/// `account_round = -1`, all in one transaction (§4.4). Idempotent:
/// callers only invoke this when `account_round IS NULL`.
pub async fn bootstrap(pool: &sqlx::PgPool, genesis_path: &Path) -> Result<usize, IndexerError> {
    let bytes = std::fs::read(genesis_path)?;
    let genesis: GenesisFile = serde_json::from_slice(&bytes)
        .map_err(|e| IndexerError::Config(format!("parsing genesis file: {e}")))?;

    let mut tx = pool.begin().await?;
    let mut count = 0usize;
    for alloc in &genesis.alloc {
        let addr = Address::from_string(&alloc.addr)
            .map_err(|e| IndexerError::Config(format!("genesis allocation address: {e}")))?;
        let microalgos = alloc.state.get("algo").and_then(|v| v.as_i64()).unwrap_or(0);
        storage::account::insert_genesis_account(&mut tx, &addr, microalgos, &alloc.state).await?;
        count += 1;
    }

    let mut state = storage::metastate::get_state(&mut tx).await?;
    state.account_round = Some(-1);
    storage::metastate::set_state(&mut tx, &state).await?;
    tx.commit().await?;

    tracing::info!(accounts = count, "genesis bootstrap complete");
    Ok(count)
}
