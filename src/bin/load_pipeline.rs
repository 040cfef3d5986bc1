//! C3 LoadPipeline entry point (§6 Binaries).

use algorand_indexer_core::{error::IndexerError, loader::{LoaderConfig, LoadPipeline}};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();
    if let Err(err) = run().await {
        tracing::error!(error = %err, "load-pipeline exiting");
        std::process::exit(err.exit_code());
    }
}

async fn run() -> Result<(), IndexerError> {
    let config = LoaderConfig::from_env()?;
    let pipeline = LoadPipeline::connect(config).await?;
    let summary = pipeline.import(None).await?;
    tracing::info!(
        blocks = summary.blocks,
        txns = summary.txns,
        duration_secs = summary.duration.as_secs_f64(),
        "import complete"
    );
    Ok(())
}
