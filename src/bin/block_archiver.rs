//! C2 BlockArchiver entry point (§6 Binaries).

use algorand_indexer_core::{archiver::{ArchiverConfig, BlockArchiver}, error::IndexerError};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();
    if let Err(err) = run().await {
        tracing::error!(error = %err, "block-archiver exiting");
        std::process::exit(err.exit_code());
    }
}

async fn run() -> Result<(), IndexerError> {
    let config = ArchiverConfig::from_env()?;
    let archiver = BlockArchiver::new(config)?;
    archiver.shutdown_handle().install();
    archiver.run().await
}
