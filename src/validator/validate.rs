//! The C5 AccountingValidator driver (§4.5 Algorithm, §5 concurrency
//! model).
//!
//! Grounded on `validate_accounting.py`'s `check_from_algod`: a bounded
//! queue feeds a fixed worker pool, each worker pulls one indexer
//! account, re-fetches it from the node, and records the comparison
//! into a mutex-guarded result.

use std::{
    sync::{atomic::{AtomicBool, Ordering}, Arc},
    time::Duration,
};

use serde_json::Value;
use tokio::sync::{mpsc, Mutex};

use crate::{
    accounting::ChainParams,
    codec::Address,
    error::IndexerError,
    validator::{
        client::{IndexerClient, NodeClient, DEFAULT_TRANSCRIPT_LIMIT},
        comparator::compare_accounts,
        config::{ValidationFilters, ValidatorConfig},
        report::{Mismatch, ValidationReport},
        shard::{predecessor, shard_bounds},
    },
};

const WORK_QUEUE_DEPTH: usize = 10;
const CAP_POLL_INTERVAL: Duration = Duration::from_millis(10);

pub async fn validate(
    config: &ValidatorConfig,
    filters: &ValidationFilters,
    chain_params: ChainParams,
) -> Result<ValidationReport, IndexerError> {
    let node = Arc::new(NodeClient::new(config.node_addr.clone(), config.node_token.clone()));
    let indexer = Arc::new(IndexerClient::new(config.indexer_addr.clone(), config.indexer_token.clone()));
    let report = Arc::new(Mutex::new(ValidationReport::default()));

    let (tx, rx) = mpsc::channel::<Value>(WORK_QUEUE_DEPTH);
    let rx = Arc::new(Mutex::new(rx));
    // Set once the report holds `max_mismatches` entries; workers stop
    // taking new work and the feed loop stops enumerating (§7: "C5
    // ... do not stop the scan until the mismatch cap is reached").
    let cap_reached = Arc::new(AtomicBool::new(false));

    let mut workers = Vec::with_capacity(filters.threads.max(1));
    for _ in 0..filters.threads.max(1) {
        let rx = Arc::clone(&rx);
        let node = Arc::clone(&node);
        let indexer = Arc::clone(&indexer);
        let report = Arc::clone(&report);
        let cap_reached = Arc::clone(&cap_reached);
        let max_mismatches = filters.max_mismatches;
        workers.push(tokio::spawn(async move {
            loop {
                if cap_reached.load(Ordering::Relaxed) {
                    return;
                }
                let account = rx.lock().await.recv().await;
                let Some(account) = account else { return };
                match compare_one(&node, &indexer, &chain_params, &account).await {
                    Ok(Some(mismatch)) => {
                        let mut report = report.lock().await;
                        report.record_mismatch(mismatch, max_mismatches);
                        if max_mismatches.is_some_and(|max| report.mismatches.len() >= max) {
                            cap_reached.store(true, Ordering::Relaxed);
                        }
                    }
                    Ok(None) => {
                        report.lock().await.record_match();
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "validator worker could not complete a comparison");
                    }
                }
            }
        }));
    }

    feed_accounts(&indexer, filters, tx, &report, &cap_reached).await?;

    for worker in workers {
        let _ = worker.await;
    }

    Ok(Arc::try_unwrap(report)
        .map_err(|_| ())
        .expect("all worker tasks have been joined")
        .into_inner())
}

async fn feed_accounts(
    indexer: &IndexerClient,
    filters: &ValidationFilters,
    tx: mpsc::Sender<Value>,
    report: &Arc<Mutex<ValidationReport>>,
    cap_reached: &AtomicBool,
) -> Result<(), IndexerError> {
    if let Some(accounts) = &filters.accounts {
        for addr in accounts {
            if cap_reached.load(Ordering::Relaxed) {
                break;
            }
            if let Ok(account) = indexer.account_at_round(addr, 0).await {
                if !feed_one(&tx, account, cap_reached).await {
                    break;
                }
            }
        }
        return Ok(());
    }

    let (lo, hi) = match filters.shard {
        Some((a, b)) => shard_bounds(a, b),
        None => (None, None),
    };
    let mut cursor = filters
        .gtaddr
        .clone()
        .or_else(|| lo.as_ref().and_then(predecessor).map(|a| a.encode_string()));

    let mut last_address = None;
    'pages: loop {
        if cap_reached.load(Ordering::Relaxed) {
            break;
        }
        let (accounts, next) = indexer.accounts_page(cursor.as_deref()).await?;
        if accounts.is_empty() {
            break;
        }
        for account in &accounts {
            if cap_reached.load(Ordering::Relaxed) {
                break 'pages;
            }
            let addr = account.get("address").and_then(Value::as_str);
            if let (Some(addr), Some(hi)) = (addr, &hi) {
                if let Ok(decoded) = Address::from_string(addr) {
                    if decoded > *hi {
                        break 'pages;
                    }
                }
            }
            last_address = addr.map(str::to_string);
            if !feed_one(&tx, account.clone(), cap_reached).await {
                break 'pages;
            }
        }
        cursor = next;
        if cursor.is_none() {
            break;
        }
    }

    if let Some(addr) = last_address {
        if let Ok(decoded) = Address::from_string(&addr) {
            report.lock().await.last_address = Some(decoded);
        }
    }
    Ok(())
}

/// Enqueues `account`, polling `cap_reached` instead of blocking
/// indefinitely on a full channel: once the cap trips, every worker
/// stops draining the queue, so a plain blocking `send` could hang
/// forever with no one left to receive. Returns `false` if the cap was
/// hit or the channel closed before the item was delivered.
async fn feed_one(tx: &mpsc::Sender<Value>, account: Value, cap_reached: &AtomicBool) -> bool {
    let mut account = account;
    loop {
        if cap_reached.load(Ordering::Relaxed) {
            return false;
        }
        match tx.try_send(account) {
            Ok(()) => return true,
            Err(mpsc::error::TrySendError::Closed(_)) => return false,
            Err(mpsc::error::TrySendError::Full(returned)) => {
                account = returned;
                tokio::time::sleep(CAP_POLL_INTERVAL).await;
            }
        }
    }
}

async fn compare_one(
    node: &NodeClient,
    indexer: &IndexerClient,
    chain_params: &ChainParams,
    indexer_account: &Value,
) -> Result<Option<Mismatch>, IndexerError> {
    let niceaddr = indexer_account
        .get("address")
        .and_then(Value::as_str)
        .ok_or_else(|| IndexerError::MalformedRecord("indexer account missing 'address'".into()))?;
    let address = Address::from_string(niceaddr)
        .map_err(|e| IndexerError::MalformedRecord(format!("decoding indexer address: {e}")))?;
    let exempt = address == chain_params.fee_sink || address == chain_params.rewards_pool;

    let algod_account = node.account_info(niceaddr, None).await?;

    let indexer_account = if algod_account.get("round") != indexer_account.get("round") {
        let algod_round = algod_account.get("round").and_then(Value::as_u64).unwrap_or(0);
        indexer.account_at_round(niceaddr, algod_round).await?
    } else {
        indexer_account.clone()
    };

    let fields = compare_accounts(&indexer_account, &algod_account);
    if fields.is_empty() {
        return Ok(None);
    }

    let transcript = indexer
        .recent_transactions(niceaddr, DEFAULT_TRANSCRIPT_LIMIT)
        .await
        .unwrap_or_default();

    Ok(Some(Mismatch {
        address,
        fields,
        exempt,
        transcript,
    }))
}
