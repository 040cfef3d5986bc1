//! The in-memory accumulator for one open round (§4.4 "State per open
//! round").

use std::collections::HashMap;

use crate::codec::{Address, Round};

pub struct RoundState {
    pub round: Round,
    pub algo_updates: HashMap<Address, i64>,
    pub asset_updates: HashMap<(Address, u64), i64>,
    pub freeze_updates: HashMap<(Address, u64), bool>,
    pub acfg_updates: Vec<(u64, Address, serde_json::Value)>,
    /// `(close_to, asset_id, holder)`.
    pub asset_closes: Vec<(Address, u64, Address)>,
    pub txn_counter: u64,
    pub fee_sink: Address,
    pub rewards_pool: Address,
}

impl RoundState {
    pub fn new(round: Round, txn_counter: u64, fee_sink: Address, rewards_pool: Address) -> Self {
        Self {
            round,
            algo_updates: HashMap::new(),
            asset_updates: HashMap::new(),
            freeze_updates: HashMap::new(),
            acfg_updates: Vec::new(),
            asset_closes: Vec::new(),
            txn_counter,
            fee_sink,
            rewards_pool,
        }
    }

    pub fn bump_algo(&mut self, addr: Address, delta: i64) {
        *self.algo_updates.entry(addr).or_insert(0) += delta;
    }

    pub fn bump_asset(&mut self, addr: Address, asset_id: u64, delta: i64) {
        *self.asset_updates.entry((addr, asset_id)).or_insert(0) += delta;
    }

    pub fn is_empty(&self) -> bool {
        self.algo_updates.is_empty()
            && self.asset_updates.is_empty()
            && self.freeze_updates.is_empty()
            && self.acfg_updates.is_empty()
            && self.asset_closes.is_empty()
    }
}
