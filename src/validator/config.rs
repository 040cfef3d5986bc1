//! AccountingValidator configuration and per-run filters (§4.5 Config).

use crate::error::IndexerError;

#[derive(Debug, Clone)]
pub struct ValidatorConfig {
    pub node_addr: String,
    pub node_token: String,
    pub indexer_addr: String,
    pub indexer_token: Option<String>,
}

impl ValidatorConfig {
    pub fn from_env() -> Result<Self, IndexerError> {
        let node_addr = std::env::var("ALGOD_ADDR")
            .map_err(|_| IndexerError::Config("ALGOD_ADDR is not set".into()))?;
        let node_token = std::env::var("ALGOD_TOKEN").unwrap_or_default();
        let indexer_addr = std::env::var("INDEXER_ADDR")
            .map_err(|_| IndexerError::Config("INDEXER_ADDR is not set".into()))?;
        let indexer_token = std::env::var("INDEXER_TOKEN").ok();

        Ok(Self {
            node_addr,
            node_token,
            indexer_addr,
            indexer_token,
        })
    }
}

/// Scopes a single validation run, equivalent to the original's
/// `--accounts`/`--shard`/`--gtaddr`/`--threads`/`--limit` flags (§4.5
/// `filters`). Read from the environment rather than parsed from argv
/// (argument parsing is explicitly out of scope, §1).
#[derive(Debug, Clone, Default)]
pub struct ValidationFilters {
    pub accounts: Option<Vec<String>>,
    pub shard: Option<(u64, u64)>,
    pub gtaddr: Option<String>,
    pub threads: usize,
    pub max_mismatches: Option<usize>,
}

const DEFAULT_THREADS: usize = 4;

impl ValidationFilters {
    pub fn from_env() -> Result<Self, IndexerError> {
        let accounts = std::env::var("VALIDATOR_ACCOUNTS")
            .ok()
            .map(|s| s.split(',').map(str::to_string).collect());
        let shard = std::env::var("VALIDATOR_SHARD")
            .ok()
            .map(|spec| parse_shard(&spec))
            .transpose()?;
        let gtaddr = std::env::var("VALIDATOR_GTADDR").ok();
        let threads = std::env::var("VALIDATOR_THREADS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_THREADS);
        let max_mismatches = std::env::var("VALIDATOR_MAX_MISMATCHES")
            .ok()
            .and_then(|v| v.parse().ok());

        if accounts.is_some() && shard.is_some() {
            return Err(IndexerError::Config(
                "VALIDATOR_ACCOUNTS and VALIDATOR_SHARD are mutually exclusive".into(),
            ));
        }

        Ok(Self {
            accounts,
            shard,
            gtaddr,
            threads,
            max_mismatches,
        })
    }
}

fn parse_shard(spec: &str) -> Result<(u64, u64), IndexerError> {
    let (a, b) = spec
        .split_once('/')
        .ok_or_else(|| IndexerError::Config(format!("invalid shard spec {spec:?}, want a/b")))?;
    let a: u64 = a
        .parse()
        .map_err(|_| IndexerError::Config(format!("invalid shard numerator {a:?}")))?;
    let b: u64 = b
        .parse()
        .map_err(|_| IndexerError::Config(format!("invalid shard denominator {b:?}")))?;
    if b == 0 {
        return Err(IndexerError::Config("shard denominator must be nonzero".into()));
    }
    Ok((a, b))
}
