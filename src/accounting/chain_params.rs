//! Explicit fee-sink/rewards-pool value threaded through the engine
//! and validator (§9 Design Notes: "Global mutable reward/fee
//! addresses" replaced by an explicit `ChainParams` value).

use std::path::Path;

use serde::Deserialize;

use crate::{codec::Address, error::IndexerError};

/// Protocol-level accounts defined by the genesis file (§3 Glossary
/// "Fee sink / Rewards pool"). Block headers carry their own
/// `fees`/`rwd` per round; this is the fallback used before any block
/// has been seen and the value the validator treats as exempt.
#[derive(Debug, Clone, Copy)]
pub struct ChainParams {
    pub fee_sink: Address,
    pub rewards_pool: Address,
}

#[derive(Deserialize)]
struct GenesisFile {
    #[serde(rename = "fees")]
    fee_sink: String,
    #[serde(rename = "rwd")]
    rewards_pool: String,
}

impl ChainParams {
    pub fn from_genesis_file(path: &Path) -> Result<Self, IndexerError> {
        let bytes = std::fs::read(path)?;
        let parsed: GenesisFile = serde_json::from_slice(&bytes)
            .map_err(|e| IndexerError::Config(format!("parsing genesis file: {e}")))?;
        let fee_sink = Address::from_string(&parsed.fee_sink)
            .map_err(|e| IndexerError::Config(format!("genesis fee sink address: {e}")))?;
        let rewards_pool = Address::from_string(&parsed.rewards_pool)
            .map_err(|e| IndexerError::Config(format!("genesis rewards pool address: {e}")))?;
        Ok(Self {
            fee_sink,
            rewards_pool,
        })
    }
}
