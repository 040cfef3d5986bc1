//! The BlockArchiver fetch-and-seal loop (C2, §4.2 Algorithm).

use std::{collections::BTreeSet, time::Instant};

use tokio::time::{sleep, Duration};

use crate::{
    archiver::{
        archive::maybe_seal,
        config::ArchiverConfig,
        rest_client::{NodeClient, RawBlockResponse},
        state::resume_last_round,
    },
    codec::{decode_block, Round},
    error::IndexerError,
    signal::ShutdownFlag,
};

const MAX_FETCH_RETRIES: u32 = 3;
const RETRY_BACKOFF: Duration = Duration::from_millis(500);

/// Errors that should end the archiver process rather than idle and
/// retry (§7: `ConfigError` is "fatal, process exit").
fn is_fatal(err: &IndexerError) -> bool {
    matches!(err, IndexerError::Config(_))
}

pub struct BlockArchiver {
    config: ArchiverConfig,
    node: NodeClient,
    shutdown: ShutdownFlag,
}

impl BlockArchiver {
    pub fn new(config: ArchiverConfig) -> Result<Self, IndexerError> {
        std::fs::create_dir_all(&config.blockdir)?;
        std::fs::create_dir_all(&config.tardir)?;
        let node = NodeClient::new(
            config.node_addr.clone(),
            config.auth_token.clone(),
            config.extra_headers.clone(),
        );
        Ok(Self {
            config,
            node,
            shutdown: ShutdownFlag::new(),
        })
    }

    /// A cloneable handle that can request a cooperative stop (§4.2
    /// `stop()`).
    pub fn shutdown_handle(&self) -> ShutdownFlag {
        self.shutdown.clone()
    }

    /// Runs until signaled. Never returns under normal operation
    /// (§4.2 `run(config)`).
    pub async fn run(&self) -> Result<(), IndexerError> {
        let mut last = resume_last_round(&self.config.blockdir, &self.config.tardir)?;
        let (_, mut stored) = crate::archiver::state::scan_blockdir(&self.config.blockdir)?;
        let mut last_ok_time = Instant::now();

        if last == 0 && stored.is_empty() {
            tracing::info!("no prior progress found, fetching round 0");
        }

        while self.shutdown.should_continue() {
            match self.fetch_and_store(last + 1, &mut stored).await {
                Ok(()) => {
                    last += 1;
                    last_ok_time = Instant::now();
                    if last % 1000 == 0 {
                        tracing::info!(round = last, "archived progress");
                    }
                    self.maybe_seal(&mut stored)?;
                }
                Err(e) if is_fatal(&e) => return Err(e),
                Err(e) => {
                    tracing::warn!(error = %e, round = last + 1, "fetch failed, idling");
                    break;
                }
            }
        }

        while self.shutdown.should_continue() {
            match self.node.wait_for_block_after(last).await {
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "wait-for-block transport error, resetting");
                }
            }

            if last_ok_time.elapsed() > Duration::from_secs(self.config.stall_seconds) {
                tracing::warn!(
                    stalled_for_secs = last_ok_time.elapsed().as_secs(),
                    "no block fetched recently"
                );
            }

            while self.shutdown.should_continue() {
                match self.fetch_and_store(last + 1, &mut stored).await {
                    Ok(()) => {
                        last += 1;
                        last_ok_time = Instant::now();
                        self.maybe_seal(&mut stored)?;
                    }
                    Err(e) if is_fatal(&e) => return Err(e),
                    Err(e) => {
                        tracing::warn!(error = %e, round = last + 1, "fetch failed, idling");
                        break;
                    }
                }
            }
        }

        Ok(())
    }

    fn maybe_seal(&self, stored: &mut BTreeSet<Round>) -> Result<(), IndexerError> {
        if let Some((lo, hi)) = maybe_seal(
            &self.config.blockdir,
            &self.config.tardir,
            stored,
            self.config.archive_stride,
        )? {
            tracing::info!(lo, hi, "sealed archive");
        }
        Ok(())
    }

    async fn fetch_and_store(
        &self,
        round: Round,
        stored: &mut BTreeSet<Round>,
    ) -> Result<(), IndexerError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.node.fetch_raw_block(round).await {
                Ok(RawBlockResponse::Raw(bytes)) => {
                    let block = decode_block(&bytes)?;
                    if block.header.round != round {
                        let err = IndexerError::UnexpectedRound {
                            requested: round,
                            got: block.header.round,
                        };
                        if attempt < MAX_FETCH_RETRIES {
                            tracing::warn!(error = %err, attempt, "retrying after unexpected round");
                            sleep(RETRY_BACKOFF).await;
                            continue;
                        }
                        return Err(err);
                    }

                    std::fs::write(self.config.blockdir.join(round.to_string()), &bytes)?;
                    stored.insert(round);
                    return Ok(());
                }
                Ok(RawBlockResponse::NotRaw) => {
                    return Err(IndexerError::Config(
                        "node does not expose raw blocks".into(),
                    ));
                }
                Err(e) if e.is_retriable() && attempt < MAX_FETCH_RETRIES => {
                    tracing::warn!(error = %e, attempt, "retrying fetch");
                    sleep(RETRY_BACKOFF).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
