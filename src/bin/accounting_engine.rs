//! C4 AccountingEngine entry point (§6 Binaries).

use algorand_indexer_core::{accounting::{AccountingEngine, EngineConfig}, error::IndexerError};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();
    if let Err(err) = run().await {
        tracing::error!(error = %err, "accounting-engine exiting");
        std::process::exit(err.exit_code());
    }
}

async fn run() -> Result<(), IndexerError> {
    let config = EngineConfig::from_env()?;
    let mut engine = AccountingEngine::connect(&config).await?;
    let applied = engine.catch_up(config.max_round).await?;
    tracing::info!(applied, "accounting catch-up complete");
    Ok(())
}
