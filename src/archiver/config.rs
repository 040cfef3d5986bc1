//! BlockArchiver configuration (§4.2 Config).

use std::{collections::HashMap, path::PathBuf};

use crate::error::IndexerError;

#[derive(Debug, Clone)]
pub struct ArchiverConfig {
    /// The node's REST address, e.g. `http://127.0.0.1:8080`.
    pub node_addr: String,
    pub auth_token: String,
    pub extra_headers: HashMap<String, String>,
    pub blockdir: PathBuf,
    pub tardir: PathBuf,
    /// Number of blocks per sealed archive (§6 Archive filename).
    pub archive_stride: u64,
    /// How long without a successfully-fetched block before a stall
    /// warning is logged (§4.2 step 3).
    pub stall_seconds: u64,
}

impl ArchiverConfig {
    pub const DEFAULT_STRIDE: u64 = 1000;
    pub const DEFAULT_STALL_SECONDS: u64 = 30;

    /// Builds configuration from the environment. Argument parsing is
    /// out of scope (§1); a process manager or the out-of-scope CLI
    /// layer is expected to set these.
    pub fn from_env() -> Result<Self, IndexerError> {
        let node_addr = std::env::var("ALGORAND_NODE_ADDR")
            .map_err(|_| IndexerError::Config("ALGORAND_NODE_ADDR is not set".into()))?;
        let auth_token = std::env::var("ALGORAND_NODE_TOKEN").unwrap_or_default();
        let blockdir = std::env::var("INDEXER_BLOCKDIR")
            .map_err(|_| IndexerError::Config("INDEXER_BLOCKDIR is not set".into()))?
            .into();
        let tardir = std::env::var("INDEXER_TARDIR")
            .map_err(|_| IndexerError::Config("INDEXER_TARDIR is not set".into()))?
            .into();
        let archive_stride = std::env::var("INDEXER_ARCHIVE_STRIDE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(Self::DEFAULT_STRIDE);
        let stall_seconds = std::env::var("INDEXER_STALL_SECONDS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(Self::DEFAULT_STALL_SECONDS);

        Ok(Self {
            node_addr,
            auth_token,
            extra_headers: HashMap::new(),
            blockdir,
            tardir,
            archive_stride,
            stall_seconds,
        })
    }
}
