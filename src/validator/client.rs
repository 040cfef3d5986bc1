//! HTTP clients for the node and indexer sides of a validation run.
//!
//! Modeled on [`crate::archiver::rest_client`]'s `NodeClient` and on
//! `validate_accounting.py`'s `indexerAccounts`/`getAccountsPage`/
//! `indexerAccountFromAddr`/`indexerAccountTxns`: thin `reqwest`
//! wrappers, one method per endpoint, pagination driven by the
//! indexer's own `next-token`.

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::error::IndexerError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const ACCOUNTS_PAGE_LIMIT: u32 = 500;

pub struct NodeClient {
    node_addr: String,
    token: String,
    http: Client,
}

impl NodeClient {
    pub fn new(node_addr: String, token: String) -> Self {
        Self {
            node_addr,
            token,
            http: Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .expect("building the HTTP client"),
        }
    }

    /// `GET /v2/accounts/<addr>` (optionally pinned to a round).
    pub async fn account_info(&self, addr: &str, round: Option<u64>) -> Result<Value, IndexerError> {
        let mut req = self
            .http
            .get(format!("{}/v2/accounts/{addr}", self.node_addr))
            .header("X-Algo-API-Token", &self.token);
        if let Some(round) = round {
            req = req.query(&[("round", round)]);
        }
        Ok(req.send().await?.error_for_status()?.json().await?)
    }

    /// `GET /v2/status`, used to learn the node's current round before
    /// a run.
    pub async fn status(&self) -> Result<Value, IndexerError> {
        Ok(self
            .http
            .get(format!("{}/v2/status", self.node_addr))
            .header("X-Algo-API-Token", &self.token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?)
    }
}

pub struct IndexerClient {
    indexer_addr: String,
    token: Option<String>,
    http: Client,
}

impl IndexerClient {
    pub fn new(indexer_addr: String, token: Option<String>) -> Self {
        Self {
            indexer_addr,
            token,
            http: Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .expect("building the HTTP client"),
        }
    }

    fn request(&self, path: &str) -> reqwest::RequestBuilder {
        let mut req = self.http.get(format!("{}{path}", self.indexer_addr));
        if let Some(token) = &self.token {
            req = req.header("X-Indexer-API-Token", token);
        }
        req
    }

    /// `GET /v2/accounts/<addr>`, returning exactly the one account
    /// the indexer holds at `round` (§4.5 Algorithm step 2's
    /// snapshot-consistent re-fetch).
    pub async fn account_at_round(&self, addr: &str, round: u64) -> Result<Value, IndexerError> {
        let body: Value = self
            .request(&format!("/v2/accounts/{addr}"))
            .query(&[("round", round)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        body.get("account")
            .cloned()
            .ok_or_else(|| IndexerError::MalformedRecord(format!("indexer account response missing 'account': {body}")))
    }

    /// One page of `GET /v2/accounts`, keyed off the indexer's
    /// `next-token` pagination cursor (§4.5 Algorithm step 1:
    /// "paginated with cursor; page size default 500").
    pub async fn accounts_page(&self, next: Option<&str>) -> Result<(Vec<Value>, Option<String>), IndexerError> {
        let mut req = self.request("/v2/accounts").query(&[("limit", ACCOUNTS_PAGE_LIMIT)]);
        if let Some(next) = next {
            req = req.query(&[("next", next)]);
        }
        let body: Value = req.send().await?.error_for_status()?.json().await?;
        let accounts = body
            .get("accounts")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let next_token = body.get("next-token").and_then(Value::as_str).map(str::to_string);
        Ok((accounts, next_token))
    }

    /// Last `limit` transactions touching `addr`, newest first (§4.5
    /// Algorithm step 6's per-mismatch transcript).
    pub async fn recent_transactions(&self, addr: &str, limit: u32) -> Result<Vec<Value>, IndexerError> {
        let body: Value = self
            .request("/v2/transactions")
            .query(&[("address", addr), ("limit", &limit.to_string())])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(body
            .get("transactions")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default())
    }
}

pub const DEFAULT_TRANSCRIPT_LIMIT: u32 = 30;
