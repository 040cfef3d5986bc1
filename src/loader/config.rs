//! LoadPipeline configuration (§4.3 Config).

use std::path::PathBuf;

use crate::error::IndexerError;

#[derive(Debug, Clone)]
pub struct LoaderConfig {
    pub database_url: String,
    /// Directory `import` globs for `*_*.tar.bz2` archives (§4.3
    /// Algorithm, §6 Archive filename).
    pub tardir: PathBuf,
}

impl LoaderConfig {
    pub fn from_env() -> Result<Self, IndexerError> {
        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| IndexerError::Config("DATABASE_URL is not set".into()))?;
        let tardir = std::env::var("INDEXER_TARDIR")
            .map_err(|_| IndexerError::Config("INDEXER_TARDIR is not set".into()))?
            .into();

        Ok(Self {
            database_url,
            tardir,
        })
    }
}
