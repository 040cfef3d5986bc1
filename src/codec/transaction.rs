//! Signed transactions and their type-specific fields (§3, §6).
//!
//! The wire format tags the transaction variant with a short string in
//! the `type` field; modeling it as a tagged enum means no byte-keyed
//! map survives past this module's deserializer, per Design Notes
//! "Dynamic-key msgpack maps".

use serde::{Deserialize, Serialize};

use crate::codec::primitives::{Address, HashDigest, Round};

/// A transaction wrapped with its signature and `ApplyData` (§3
/// SignedTransaction).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SignedTransaction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sig: Option<crate::codec::primitives::Ed25519Signature>,

    #[serde(rename = "msig", default, skip_serializing_if = "Option::is_none")]
    pub multisig: Option<MultisigSignature>,

    #[serde(rename = "lsig", default, skip_serializing_if = "Option::is_none")]
    pub logicsig: Option<LogicSig>,

    #[serde(rename = "txn")]
    pub transaction: Transaction,

    /// ApplyData.ClosingAmount: microalgos transferred to `close` on a
    /// payment closeout.
    #[serde(rename = "ca", default, skip_serializing_if = "Option::is_none")]
    pub closing_amount: Option<u64>,

    /// ApplyData.SenderRewards.
    #[serde(rename = "rs", default, skip_serializing_if = "Option::is_none")]
    pub sender_rewards: Option<u64>,

    /// ApplyData.ReceiverRewards.
    #[serde(rename = "rr", default, skip_serializing_if = "Option::is_none")]
    pub receiver_rewards: Option<u64>,

    /// ApplyData.CloseRewards.
    #[serde(rename = "rc", default, skip_serializing_if = "Option::is_none")]
    pub close_rewards: Option<u64>,

    #[serde(rename = "hgi", default, skip_serializing_if = "Option::is_none")]
    pub has_genesis_id: Option<bool>,

    #[serde(rename = "hgh", default, skip_serializing_if = "Option::is_none")]
    pub has_genesis_hash: Option<bool>,
}

impl SignedTransaction {
    /// The set of distinct addresses touched by this transaction
    /// (§4.3 participation rows): sender, receiver, close-remainder-to,
    /// asset-sender, asset-receiver, asset-close-to, as present.
    pub fn participants(&self) -> Vec<Address> {
        let mut out = vec![self.transaction.sender];
        match &self.transaction.txn_type {
            TransactionType::Payment(p) => {
                out.push(p.receiver);
                if let Some(close) = p.close_remainder_to {
                    out.push(close);
                }
            }
            TransactionType::KeyRegistration(_) => {}
            TransactionType::AssetConfig(_) => {}
            TransactionType::AssetTransfer(a) => {
                if let Some(asnd) = a.asset_sender {
                    out.push(asnd);
                }
                out.push(a.asset_receiver);
                if let Some(aclose) = a.asset_close_to {
                    out.push(aclose);
                }
            }
            TransactionType::AssetFreeze(f) => {
                out.push(f.freeze_account);
            }
        }
        out.sort();
        out.dedup();
        out
    }

    /// The asset id this transaction touches, per §4.3: `caid` for
    /// `acfg`, `xaid` for `axfer`, `faid` for `afrz`, else 0.
    pub fn asset_id(&self) -> u64 {
        match &self.transaction.txn_type {
            TransactionType::AssetConfig(c) => c.config_asset,
            TransactionType::AssetTransfer(a) => a.xfer_asset,
            TransactionType::AssetFreeze(f) => f.freeze_asset,
            _ => 0,
        }
    }
}

/// Common transaction header fields (§3 Header) plus the type-tagged
/// variant fields (§6 Txn header + per-type tables).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Transaction {
    #[serde(rename = "snd")]
    pub sender: Address,

    #[serde(rename = "fee")]
    pub fee: u64,

    #[serde(rename = "fv")]
    pub first_valid: Round,

    #[serde(rename = "lv")]
    pub last_valid: Round,

    #[serde(with = "serde_bytes", default)]
    pub note: Vec<u8>,

    #[serde(default, rename = "gen")]
    pub genesis_id: String,

    #[serde(rename = "gh")]
    pub genesis_hash: HashDigest,

    #[serde(rename = "grp", default, skip_serializing_if = "Option::is_none")]
    pub group: Option<HashDigest>,

    #[serde(rename = "lx", default, skip_serializing_if = "Option::is_none")]
    pub lease: Option<HashDigest>,

    #[serde(flatten)]
    pub txn_type: TransactionType,
}

/// The type-specific payload, discriminated by the wire `type` tag
/// (§6 Type-enum dimension: `pay=1, keyreg=2, acfg=3, axfer=4, afrz=5`).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type")]
pub enum TransactionType {
    #[serde(rename = "pay")]
    Payment(Payment),
    #[serde(rename = "keyreg")]
    KeyRegistration(KeyRegistration),
    #[serde(rename = "acfg")]
    AssetConfig(AssetConfig),
    #[serde(rename = "axfer")]
    AssetTransfer(AssetTransfer),
    #[serde(rename = "afrz")]
    AssetFreeze(AssetFreeze),
}

impl TransactionType {
    /// The fixed type-enum dimension value from §6.
    pub fn type_enum(&self) -> i16 {
        match self {
            TransactionType::Payment(_) => 1,
            TransactionType::KeyRegistration(_) => 2,
            TransactionType::AssetConfig(_) => 3,
            TransactionType::AssetTransfer(_) => 4,
            TransactionType::AssetFreeze(_) => 5,
        }
    }

    /// The short wire tag ("pay", "keyreg", ...).
    pub fn type_tag(&self) -> &'static str {
        match self {
            TransactionType::Payment(_) => "pay",
            TransactionType::KeyRegistration(_) => "keyreg",
            TransactionType::AssetConfig(_) => "acfg",
            TransactionType::AssetTransfer(_) => "axfer",
            TransactionType::AssetFreeze(_) => "afrz",
        }
    }
}

/// Payment transaction fields (§6 Payment).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Payment {
    #[serde(rename = "rcv")]
    pub receiver: Address,

    #[serde(default, rename = "amt")]
    pub amount: u64,

    #[serde(rename = "close", default, skip_serializing_if = "Option::is_none")]
    pub close_remainder_to: Option<Address>,
}

/// Key registration fields (§6 Keyreg). No balance effect (§4.4).
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct KeyRegistration {
    #[serde(rename = "votekey", default, skip_serializing_if = "Option::is_none")]
    pub vote_pk: Option<crate::codec::primitives::Ed25519PublicKey>,

    #[serde(rename = "selkey", default, skip_serializing_if = "Option::is_none")]
    pub selection_pk: Option<crate::codec::primitives::Ed25519PublicKey>,

    #[serde(default, rename = "votefst")]
    pub vote_first: Round,

    #[serde(default, rename = "votelst")]
    pub vote_last: Round,

    #[serde(default, rename = "votekd")]
    pub vote_key_dilution: u64,

    #[serde(default, rename = "nonpart")]
    pub nonparticipation: bool,
}

/// Asset configure fields (§6 Asset config). `config_asset == 0` means
/// "create a new asset" (§4.4).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AssetConfig {
    #[serde(default, rename = "caid")]
    pub config_asset: u64,

    #[serde(rename = "apar", default, skip_serializing_if = "Option::is_none")]
    pub params: Option<AssetParams>,
}

/// Asset parameters (§3 Asset, §6 sub-keys `t,dc,df,un,an,au,am,m,r,f,c`).
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct AssetParams {
    #[serde(default, rename = "t")]
    pub total: u64,

    #[serde(default, rename = "dc")]
    pub decimals: u32,

    #[serde(default, rename = "df")]
    pub default_frozen: bool,

    #[serde(default, rename = "un")]
    pub unit_name: String,

    #[serde(default, rename = "an")]
    pub asset_name: String,

    #[serde(default, rename = "au")]
    pub url: String,

    #[serde(rename = "am", default, skip_serializing_if = "Option::is_none")]
    pub metadata_hash: Option<HashDigest>,

    #[serde(rename = "m", default, skip_serializing_if = "Option::is_none")]
    pub manager: Option<Address>,

    #[serde(rename = "r", default, skip_serializing_if = "Option::is_none")]
    pub reserve: Option<Address>,

    #[serde(rename = "f", default, skip_serializing_if = "Option::is_none")]
    pub freeze: Option<Address>,

    #[serde(rename = "c", default, skip_serializing_if = "Option::is_none")]
    pub clawback: Option<Address>,
}

/// Asset transfer fields (§6 Asset transfer).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AssetTransfer {
    #[serde(rename = "xaid")]
    pub xfer_asset: u64,

    #[serde(default, rename = "aamt")]
    pub asset_amount: u64,

    #[serde(rename = "asnd", default, skip_serializing_if = "Option::is_none")]
    pub asset_sender: Option<Address>,

    #[serde(default, rename = "arcv")]
    pub asset_receiver: Address,

    #[serde(rename = "aclose", default, skip_serializing_if = "Option::is_none")]
    pub asset_close_to: Option<Address>,
}

/// Asset freeze fields (§6 Asset freeze).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AssetFreeze {
    #[serde(rename = "fadd")]
    pub freeze_account: Address,

    #[serde(rename = "faid")]
    pub freeze_asset: u64,

    #[serde(default, rename = "afrz")]
    pub frozen: bool,
}

/// A multisig signature envelope.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct MultisigSignature {
    #[serde(rename = "subsig", default)]
    pub subsigs: Vec<MultisigSubsig>,

    #[serde(rename = "thr", default)]
    pub threshold: u8,

    #[serde(rename = "v", default)]
    pub version: u8,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MultisigSubsig {
    #[serde(rename = "pk")]
    pub key: crate::codec::primitives::Ed25519PublicKey,

    #[serde(rename = "s", default, skip_serializing_if = "Option::is_none")]
    pub sig: Option<crate::codec::primitives::Ed25519Signature>,
}

/// A logic signature (program bytes plus optional arguments); contents
/// beyond storage are out of scope (§1 Non-goals: smart-contract
/// evaluation).
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct LogicSig {
    #[serde(rename = "l", with = "serde_bytes", default)]
    pub logic: Vec<u8>,

    #[serde(rename = "arg", default)]
    pub args: Vec<serde_bytes::ByteBuf>,
}
