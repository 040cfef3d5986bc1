//! Block and block header types (§3 Block, §6 Block header).

use serde::{Deserialize, Serialize};

use crate::codec::{
    primitives::{Address, HashDigest, Round},
    transaction::SignedTransaction,
};

/// The envelope algod hands back for `GET /block/<round>?raw=1`
/// (§6 Envelope: `block`, `cert`). The certificate is opaque to the
/// core (§1 Non-goals: block signature verification) and is kept only
/// so round-trip re-encoding is byte-identical.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BlockEnvelope {
    pub block: Block,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cert: Option<serde_json::Value>,
}

/// A decoded block: header plus its ordered transactions.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Block {
    #[serde(flatten)]
    pub header: BlockHeader,

    #[serde(rename = "txns", default)]
    pub transactions: Vec<SignedTransaction>,
}

/// Block header fields (§3 Block header, §6 Block header keys).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BlockHeader {
    #[serde(rename = "rnd")]
    pub round: Round,

    #[serde(rename = "prev", default, skip_serializing_if = "Option::is_none")]
    pub previous_block_hash: Option<HashDigest>,

    #[serde(rename = "seed", default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<HashDigest>,

    #[serde(rename = "txn", default, skip_serializing_if = "Option::is_none")]
    pub txn_root: Option<HashDigest>,

    /// Unix timestamp, seconds since epoch.
    #[serde(rename = "ts", default)]
    pub timestamp: i64,

    #[serde(rename = "gen", default)]
    pub genesis_id: String,

    #[serde(rename = "gh", default, skip_serializing_if = "Option::is_none")]
    pub genesis_hash: Option<HashDigest>,

    /// TxnCounter: cumulative count of transactions ever committed,
    /// used to allocate new asset ids (§3 Asset, §4.4).
    #[serde(rename = "tc", default)]
    pub txn_counter: u64,

    #[serde(rename = "fees", default, skip_serializing_if = "Option::is_none")]
    pub fee_sink: Option<Address>,

    #[serde(rename = "rwd", default, skip_serializing_if = "Option::is_none")]
    pub rewards_pool: Option<Address>,

    #[serde(default)]
    pub earn: u64,

    #[serde(default, rename = "rate")]
    pub rewards_rate: u64,

    #[serde(default, rename = "frac")]
    pub rewards_residue: u64,

    #[serde(default, rename = "rwcalr")]
    pub rewards_recalculation_round: Round,

    #[serde(default, rename = "proto")]
    pub current_protocol: String,

    #[serde(default, rename = "nextproto")]
    pub next_protocol: String,

    #[serde(default, rename = "nextyes")]
    pub next_protocol_approvals: u64,

    #[serde(default, rename = "nextbefore")]
    pub next_protocol_vote_before: Round,

    #[serde(default, rename = "nextswitch")]
    pub next_protocol_switch_on: Round,

    #[serde(default, rename = "upgradeprop")]
    pub upgrade_propose: String,

    #[serde(default, rename = "upgradedelay")]
    pub upgrade_delay: Round,

    #[serde(default, rename = "upgradeyes")]
    pub upgrade_approve: bool,
}
