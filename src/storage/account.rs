//! The `account`, `account_asset` and `asset` tables — the ledger
//! projection (§3 AccountState, §4.4 Commit policy).
//!
//! Every function here takes the open per-round transaction so the
//! whole batch lands atomically with the metastate watermark update
//! (§5 "the round watermark must be crash-safe").

use sqlx::{Postgres, Transaction};

use crate::{codec::Address, error::IndexerError};

/// Upserts one account's algo delta (§4.4 commit step 1).
pub async fn apply_algo_delta(
    exec: &mut Transaction<'_, Postgres>,
    addr: &Address,
    delta: i64,
) -> Result<(), IndexerError> {
    sqlx::query(
        "INSERT INTO account (addr, microalgos, account_data) \
         VALUES ($1, $2, jsonb_build_object('algo', to_jsonb($2::bigint))) \
         ON CONFLICT (addr) DO UPDATE SET \
           microalgos = account.microalgos + EXCLUDED.microalgos, \
           account_data = jsonb_set( \
             account.account_data, '{algo}', \
             to_jsonb(account.microalgos + EXCLUDED.microalgos), true)",
    )
    .bind(addr.as_bytes().as_slice())
    .bind(delta)
    .execute(&mut **exec)
    .await?;
    Ok(())
}

/// Upserts an asset's creator and parameters (§4.4 commit step 2).
/// A reconfigure (`caid != 0`) only refreshes `params`, never the
/// original creator.
pub async fn upsert_asset_params(
    exec: &mut Transaction<'_, Postgres>,
    asset_id: u64,
    creator: &Address,
    params: &serde_json::Value,
) -> Result<(), IndexerError> {
    sqlx::query(
        "INSERT INTO asset (index, creator_addr, params) VALUES ($1, $2, $3) \
         ON CONFLICT (index) DO UPDATE SET params = EXCLUDED.params",
    )
    .bind(asset_id as i64)
    .bind(creator.as_bytes().as_slice())
    .bind(params)
    .execute(&mut **exec)
    .await?;
    Ok(())
}

/// Upserts a holding amount delta (§4.4 commit step 3). On first
/// insert, `frozen` is seeded from the asset's `default_frozen`.
pub async fn apply_asset_delta(
    exec: &mut Transaction<'_, Postgres>,
    addr: &Address,
    asset_id: u64,
    delta: i64,
    default_frozen: bool,
) -> Result<(), IndexerError> {
    sqlx::query(
        "INSERT INTO account_asset (addr, assetid, amount, frozen) VALUES ($1, $2, $3, $4) \
         ON CONFLICT (addr, assetid) DO UPDATE SET amount = account_asset.amount + EXCLUDED.amount",
    )
    .bind(addr.as_bytes().as_slice())
    .bind(asset_id as i64)
    .bind(delta)
    .bind(default_frozen)
    .execute(&mut **exec)
    .await?;
    Ok(())
}

/// Sets a holding's frozen flag (§4.4 commit step 4). On first
/// insert, `amount` starts at zero; on conflict only `frozen` changes.
pub async fn apply_freeze(
    exec: &mut Transaction<'_, Postgres>,
    addr: &Address,
    asset_id: u64,
    frozen: bool,
) -> Result<(), IndexerError> {
    sqlx::query(
        "INSERT INTO account_asset (addr, assetid, amount, frozen) VALUES ($1, $2, 0, $3) \
         ON CONFLICT (addr, assetid) DO UPDATE SET frozen = EXCLUDED.frozen",
    )
    .bind(addr.as_bytes().as_slice())
    .bind(asset_id as i64)
    .bind(frozen)
    .execute(&mut **exec)
    .await?;
    Ok(())
}

/// Transfers a holder's remaining balance to `close_to` and deletes
/// the holder's row (§4.4 commit step 5). Expressed as two ordered
/// statements in the same transaction — the source's single
/// multi-statement `INSERT ... SELECT` + `DELETE` combined the two,
/// which is why its `DELETE` keyed off an out-of-scope alias (§9 open
/// question); this keeps them correct and explicit instead.
pub async fn close_asset_holding(
    exec: &mut Transaction<'_, Postgres>,
    close_to: &Address,
    asset_id: u64,
    holder: &Address,
) -> Result<(), IndexerError> {
    sqlx::query(
        "INSERT INTO account_asset (addr, assetid, amount, frozen) \
         SELECT $1, $2, x.amount, false FROM account_asset x \
         WHERE x.addr = $3 AND x.assetid = $2 \
         ON CONFLICT (addr, assetid) DO UPDATE SET amount = account_asset.amount + EXCLUDED.amount",
    )
    .bind(close_to.as_bytes().as_slice())
    .bind(asset_id as i64)
    .bind(holder.as_bytes().as_slice())
    .execute(&mut **exec)
    .await?;

    sqlx::query("DELETE FROM account_asset WHERE addr = $1 AND assetid = $2")
        .bind(holder.as_bytes().as_slice())
        .bind(asset_id as i64)
        .execute(&mut **exec)
        .await?;
    Ok(())
}

/// Inserts one genesis allocation row (§4.4 Genesis bootstrap).
pub async fn insert_genesis_account(
    exec: &mut Transaction<'_, Postgres>,
    addr: &Address,
    microalgos: i64,
    account_data: &serde_json::Value,
) -> Result<(), IndexerError> {
    sqlx::query(
        "INSERT INTO account (addr, microalgos, account_data) VALUES ($1, $2, $3) \
         ON CONFLICT (addr) DO NOTHING",
    )
    .bind(addr.as_bytes().as_slice())
    .bind(microalgos)
    .bind(account_data)
    .execute(&mut **exec)
    .await?;
    Ok(())
}

/// Loads the `default_frozen` flag for every asset, seeded once at
/// engine startup (§4.4 state, grounded on `accountreimpl.py`'s
/// `get_default_frozen`).
pub async fn load_default_frozen(
    pool: &sqlx::PgPool,
) -> Result<std::collections::HashMap<u64, bool>, IndexerError> {
    let rows: Vec<(i64, serde_json::Value)> =
        sqlx::query_as("SELECT index, params FROM asset").fetch_all(pool).await?;
    Ok(rows
        .into_iter()
        .map(|(id, params)| {
            let df = params.get("df").and_then(|v| v.as_bool()).unwrap_or(false);
            (id as u64, df)
        })
        .collect())
}
