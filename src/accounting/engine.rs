//! C4 AccountingEngine (§4.4).

use std::{
    collections::{HashMap, HashSet},
    time::{Duration, Instant},
};

use sqlx::PgPool;

use crate::{
    accounting::{config::EngineConfig, genesis, state::RoundState},
    codec::{decode_header, decode_signed_txn, Address, Intra, Round, SignedTransaction, TransactionType},
    error::IndexerError,
    storage::{self, account, block_header, metastate, txn},
};

pub struct AccountingEngine {
    pool: PgPool,
    default_frozen: HashMap<u64, bool>,
    open: Option<RoundState>,
}

impl AccountingEngine {
    pub async fn connect(config: &EngineConfig) -> Result<Self, IndexerError> {
        let pool = storage::connect(&config.database_url).await?;
        Self::bootstrap_if_needed(&pool, config).await?;
        let default_frozen = account::load_default_frozen(&pool).await?;
        Ok(Self {
            pool,
            default_frozen,
            open: None,
        })
    }

    async fn bootstrap_if_needed(pool: &PgPool, config: &EngineConfig) -> Result<(), IndexerError> {
        let mut tx = pool.begin().await?;
        let state = metastate::get_state(&mut tx).await?;
        tx.commit().await?;
        if state.account_round.is_none() {
            let Some(genesis_path) = &config.genesis_path else {
                return Err(IndexerError::Config(
                    "account_round is unset and no genesis file is configured".into(),
                ));
            };
            genesis::bootstrap(pool, genesis_path).await?;
        }
        Ok(())
    }

    /// Advances the projection from its current `account_round` to
    /// `min(latest-in-txn-store, max_round)` (§4.4 Public operations).
    /// Returns the number of transactions applied.
    pub async fn catch_up(&mut self, max_round: Option<Round>) -> Result<u64, IndexerError> {
        let current = self.current_account_round().await?;
        let latest = txn::max_round(&self.pool).await?.unwrap_or(0);
        let target = max_round.map_or(latest, |m| m.min(latest));

        let rows = txn::fetch_after(&self.pool, current, Some(target)).await?;
        let mut applied = 0u64;
        let mut last_log = Instant::now();

        for row in &rows {
            let stxn = decode_signed_txn(&row.txnbytes)?;
            self.apply(&stxn, row.round as Round, row.intra as Intra).await?;
            applied += 1;
            if last_log.elapsed() > Duration::from_secs(5) {
                tracing::info!(round = row.round, txns = applied, "accounting catch-up progress");
                last_log = Instant::now();
            }
        }

        self.close().await?;
        Ok(applied)
    }

    async fn current_account_round(&self) -> Result<i64, IndexerError> {
        let mut tx = self.pool.begin().await?;
        let state = metastate::get_state(&mut tx).await?;
        tx.commit().await?;
        Ok(state.account_round.unwrap_or(-1))
    }

    /// Applies one transaction to the open round, opening/committing
    /// round boundaries as needed (§4.4 "Round boundary policy").
    pub async fn apply(
        &mut self,
        stxn: &SignedTransaction,
        round: Round,
        intra: Intra,
    ) -> Result<(), IndexerError> {
        if self.open.as_ref().map(|s| s.round) != Some(round) {
            self.commit_open_round().await?;
            self.open_round(round).await?;
        }

        let state = self.open.as_mut().expect("round was just opened");
        apply_txn(state, stxn, intra);
        Ok(())
    }

    async fn open_round(&mut self, round: Round) -> Result<(), IndexerError> {
        let header_bytes = block_header::get_header_bytes(&self.pool, round)
            .await?
            .ok_or_else(|| IndexerError::MalformedRecord(format!("no block_header for round {round}")))?;
        let header = decode_header(&header_bytes)?;

        let txn_counter = if round <= 1 {
            0
        } else {
            let prev_bytes = block_header::get_header_bytes(&self.pool, round - 1)
                .await?
                .ok_or_else(|| {
                    IndexerError::MalformedRecord(format!("no block_header for round {}", round - 1))
                })?;
            decode_header(&prev_bytes)?.txn_counter
        };

        let fee_sink = header.fee_sink.unwrap_or_default();
        let rewards_pool = header.rewards_pool.unwrap_or_default();
        self.open = Some(RoundState::new(round, txn_counter, fee_sink, rewards_pool));
        Ok(())
    }

    async fn commit_open_round(&mut self) -> Result<(), IndexerError> {
        let Some(state) = self.open.take() else {
            return Ok(());
        };
        if state.is_empty() {
            return self.advance_watermark_only(state.round).await;
        }

        let round = state.round;
        let mut tx = self.pool.begin().await?;

        for (addr, delta) in &state.algo_updates {
            account::apply_algo_delta(&mut tx, addr, *delta).await?;
        }

        for (asset_id, creator, params) in &state.acfg_updates {
            account::upsert_asset_params(&mut tx, *asset_id, creator, params).await?;
            let default_frozen = params.get("df").and_then(|v| v.as_bool()).unwrap_or(false);
            self.default_frozen.insert(*asset_id, default_frozen);
        }

        for ((addr, asset_id), delta) in &state.asset_updates {
            let default_frozen = *self.default_frozen.get(asset_id).unwrap_or(&false);
            account::apply_asset_delta(&mut tx, addr, *asset_id, *delta, default_frozen).await?;
        }

        // Freeze and close updates are mutually exclusive per
        // (addr, asset_id) within one round; close wins (§4.4
        // "Ordering within a batch matters").
        let closed: HashSet<(Address, u64)> = state
            .asset_closes
            .iter()
            .map(|(_, asset_id, holder)| (*holder, *asset_id))
            .collect();

        for ((addr, asset_id), frozen) in &state.freeze_updates {
            if closed.contains(&(*addr, *asset_id)) {
                continue;
            }
            account::apply_freeze(&mut tx, addr, *asset_id, *frozen).await?;
        }

        for (close_to, asset_id, holder) in &state.asset_closes {
            account::close_asset_holding(&mut tx, close_to, *asset_id, holder).await?;
        }

        self.write_watermark(&mut tx, round).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn advance_watermark_only(&mut self, round: Round) -> Result<(), IndexerError> {
        let mut tx = self.pool.begin().await?;
        self.write_watermark(&mut tx, round).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn write_watermark(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        round: Round,
    ) -> Result<(), IndexerError> {
        let mut state = metastate::get_state(tx).await?;
        if let Some(previous) = state.account_round {
            if round as i64 <= previous {
                return Err(IndexerError::WatermarkAdvance {
                    expected: previous + 1,
                    attempted: round as i64,
                });
            }
        }
        state.account_round = Some(round as i64);
        metastate::set_state(tx, &state).await
    }

    /// Commits the currently open round, per §4.4 `close()`.
    pub async fn close(&mut self) -> Result<(), IndexerError> {
        self.commit_open_round().await
    }
}

/// Applies the always-on fee/reward effects plus the type-specific
/// effects of one transaction to `state` (§4.4 "Per-transaction
/// semantics").
fn apply_txn(state: &mut RoundState, stxn: &SignedTransaction, intra: Intra) {
    let sender = stxn.transaction.sender;
    let fee = stxn.transaction.fee as i64;
    state.bump_algo(sender, -fee);
    state.bump_algo(state.fee_sink, fee);

    if let Some(sender_rewards) = stxn.sender_rewards.filter(|v| *v > 0) {
        state.bump_algo(state.rewards_pool, -(sender_rewards as i64));
        state.bump_algo(sender, sender_rewards as i64);
    }

    match &stxn.transaction.txn_type {
        TransactionType::Payment(p) => {
            if p.amount > 0 {
                state.bump_algo(sender, -(p.amount as i64));
                state.bump_algo(p.receiver, p.amount as i64);
            }
            let closing_amount = stxn.closing_amount.unwrap_or(0);
            if let Some(close) = p.close_remainder_to {
                if closing_amount > 0 {
                    state.bump_algo(sender, -(closing_amount as i64));
                    state.bump_algo(close, closing_amount as i64);
                }
            }
            if let Some(receiver_rewards) = stxn.receiver_rewards.filter(|v| *v > 0) {
                state.bump_algo(state.rewards_pool, -(receiver_rewards as i64));
                state.bump_algo(p.receiver, receiver_rewards as i64);
            }
            if let Some(close_rewards) = stxn.close_rewards.filter(|v| *v > 0) {
                match p.close_remainder_to {
                    Some(close) => {
                        state.bump_algo(state.rewards_pool, -(close_rewards as i64));
                        state.bump_algo(close, close_rewards as i64);
                    }
                    None => {
                        tracing::warn!(round = state.round, intra, "close-rewards without close, skipping");
                    }
                }
            }
        }
        TransactionType::KeyRegistration(_) => {}
        TransactionType::AssetConfig(c) => {
            let asset_id = if c.config_asset == 0 {
                state.txn_counter + intra + 1
            } else {
                c.config_asset
            };
            let params = c.params.clone().unwrap_or_default();
            let params_json = serde_json::to_value(&params).unwrap_or(serde_json::Value::Null);
            state.acfg_updates.push((asset_id, sender, params_json));
        }
        TransactionType::AssetTransfer(a) => {
            let effective_sender = a.asset_sender.unwrap_or(sender);
            if a.asset_amount > 0 {
                state.bump_asset(effective_sender, a.xfer_asset, -(a.asset_amount as i64));
                state.bump_asset(a.asset_receiver, a.xfer_asset, a.asset_amount as i64);
            }
            if let Some(close_to) = a.asset_close_to {
                state.asset_closes.push((close_to, a.xfer_asset, effective_sender));
            }
        }
        TransactionType::AssetFreeze(f) => {
            state.freeze_updates.insert((f.freeze_account, f.freeze_asset), f.frozen);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::transaction::Payment;
    use crate::codec::{HashDigest, Transaction};

    fn base_txn(sender: Address, txn_type: TransactionType, fee: u64) -> SignedTransaction {
        SignedTransaction {
            sig: None,
            multisig: None,
            logicsig: None,
            transaction: Transaction {
                sender,
                fee,
                first_valid: 1,
                last_valid: 1000,
                note: vec![],
                genesis_id: "test".into(),
                genesis_hash: HashDigest([0; 32]),
                group: None,
                lease: None,
                txn_type,
            },
            closing_amount: None,
            sender_rewards: None,
            receiver_rewards: None,
            close_rewards: None,
            has_genesis_id: None,
            has_genesis_hash: None,
        }
    }

    fn round_state() -> RoundState {
        RoundState::new(1, 0, Address::new([0xFE; 32]), Address::new([0xFD; 32]))
    }

    #[test]
    fn payment_conserves_total_algos() {
        let alice = Address::new([1; 32]);
        let bob = Address::new([2; 32]);
        let mut state = round_state();
        let stxn = base_txn(
            alice,
            TransactionType::Payment(Payment {
                receiver: bob,
                amount: 10_000,
                close_remainder_to: None,
            }),
            1_000,
        );
        apply_txn(&mut state, &stxn, 0);

        assert_eq!(state.algo_updates[&alice], -11_000);
        assert_eq!(state.algo_updates[&bob], 10_000);
        assert_eq!(state.algo_updates[&state.fee_sink], 1_000);
        let total: i64 = state.algo_updates.values().sum();
        assert_eq!(total, 0);
    }

    #[test]
    fn acfg_create_allocates_from_txn_counter_and_intra() {
        let alice = Address::new([1; 32]);
        let mut state = RoundState::new(1, 41, Address::new([0xFE; 32]), Address::new([0xFD; 32]));
        let stxn = base_txn(
            alice,
            TransactionType::AssetConfig(crate::codec::transaction::AssetConfig {
                config_asset: 0,
                params: Some(crate::codec::transaction::AssetParams {
                    total: 1_000_000,
                    default_frozen: false,
                    unit_name: "FOO".into(),
                    ..Default::default()
                }),
            }),
            1_000,
        );
        apply_txn(&mut state, &stxn, 3);

        assert_eq!(state.acfg_updates.len(), 1);
        assert_eq!(state.acfg_updates[0].0, 41 + 3 + 1);
        assert_eq!(state.acfg_updates[0].1, alice);
    }

    #[test]
    fn afrz_records_without_touching_amount() {
        let bob = Address::new([2; 32]);
        let mut state = round_state();
        let stxn = base_txn(
            Address::new([1; 32]),
            TransactionType::AssetFreeze(crate::codec::transaction::AssetFreeze {
                freeze_account: bob,
                freeze_asset: 7,
                frozen: true,
            }),
            0,
        );
        apply_txn(&mut state, &stxn, 0);
        assert_eq!(state.freeze_updates[&(bob, 7)], true);
        assert!(state.asset_updates.is_empty());
    }

    #[test]
    fn axfer_close_enqueues_a_close_record() {
        let bob = Address::new([2; 32]);
        let alice = Address::new([1; 32]);
        let mut state = round_state();
        let stxn = base_txn(
            bob,
            TransactionType::AssetTransfer(crate::codec::transaction::AssetTransfer {
                xfer_asset: 9,
                asset_amount: 0,
                asset_sender: None,
                asset_receiver: Address::default(),
                asset_close_to: Some(alice),
            }),
            0,
        );
        apply_txn(&mut state, &stxn, 0);
        assert_eq!(state.asset_closes, vec![(alice, 9, bob)]);
    }
}
