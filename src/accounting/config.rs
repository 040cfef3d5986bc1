//! AccountingEngine configuration (§4.4 Config).

use std::path::PathBuf;

use crate::error::IndexerError;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub database_url: String,
    /// Required only the first time the engine runs against a fresh
    /// database (§4.4 Genesis bootstrap).
    pub genesis_path: Option<PathBuf>,
    /// Caps `catch_up` to this round; `None` means "as far as the
    /// transaction store allows".
    pub max_round: Option<u64>,
}

impl EngineConfig {
    pub fn from_env() -> Result<Self, IndexerError> {
        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| IndexerError::Config("DATABASE_URL is not set".into()))?;
        let genesis_path = std::env::var("INDEXER_GENESIS_FILE").ok().map(PathBuf::from);
        let max_round = std::env::var("INDEXER_MAX_ROUND").ok().and_then(|v| v.parse().ok());

        Ok(Self {
            database_url,
            genesis_path,
            max_round,
        })
    }
}
