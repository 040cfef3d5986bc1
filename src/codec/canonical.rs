//! Canonical msgpack decode/encode entry points (§4.1 Codec contract).

use serde::{de::DeserializeOwned, Serialize};

use crate::{
    codec::block::{Block, BlockEnvelope, BlockHeader},
    codec::transaction::SignedTransaction,
    error::IndexerError,
};

/// Decodes the `{block, cert}` envelope algod returns from
/// `GET /block/<round>?raw=1` and returns the block.
///
/// Fails with [`IndexerError::UnknownTxType`] if any transaction in the
/// block carries a `type` tag outside `pay|keyreg|acfg|axfer|afrz`
/// (fatal for the block, §7), or with [`IndexerError::MalformedRecord`]
/// when a required field is missing or has the wrong arity (fatal for
/// the record, rmp-serde surfaces this as a deserialization error,
/// which this wraps with context).
pub fn decode_block(bytes: &[u8]) -> Result<Block, IndexerError> {
    reject_unknown_tx_type(bytes)?;
    let envelope: BlockEnvelope = decode(bytes, "block envelope")?;
    Ok(envelope.block)
}

/// Decodes a standalone signed transaction (used by the loader when
/// re-reading a previously stored `txnbytes` column, and by tests).
///
/// See [`decode_block`] for the `UnknownTxType` vs `MalformedRecord`
/// distinction.
pub fn decode_signed_txn(bytes: &[u8]) -> Result<SignedTransaction, IndexerError> {
    reject_unknown_tx_type(bytes)?;
    decode(bytes, "signed transaction")
}

const KNOWN_TX_TYPES: [&str; 5] = ["pay", "keyreg", "acfg", "axfer", "afrz"];

/// Scans the raw msgpack for any `type` tag not in [`KNOWN_TX_TYPES`]
/// before the typed decode ever runs; a tag rmp-serde can't match to a
/// `TransactionType` variant would otherwise surface as an
/// indistinguishable `MalformedRecord`. Parse failure here is not
/// itself an error: the generic `decode` call that follows is the one
/// that reports malformed bytes.
fn reject_unknown_tx_type(bytes: &[u8]) -> Result<(), IndexerError> {
    if let Ok(value) = rmp_serde::from_slice::<rmpv::Value>(bytes) {
        if let Some(tag) = find_unknown_tx_type(&value) {
            return Err(IndexerError::UnknownTxType(tag));
        }
    }
    Ok(())
}

fn find_unknown_tx_type(value: &rmpv::Value) -> Option<String> {
    match value {
        rmpv::Value::Map(entries) => {
            for (k, v) in entries {
                if k.as_str() == Some("type") {
                    if let Some(tag) = v.as_str() {
                        if !KNOWN_TX_TYPES.contains(&tag) {
                            return Some(tag.to_string());
                        }
                    }
                }
            }
            entries.iter().find_map(|(_, v)| find_unknown_tx_type(v))
        }
        rmpv::Value::Array(items) => items.iter().find_map(find_unknown_tx_type),
        _ => None,
    }
}

/// Decodes a block header stored without its transaction list (used
/// by the accounting engine to recover a prior round's `txn_counter`,
/// `fee_sink` and `rewards_pool`).
pub fn decode_header(bytes: &[u8]) -> Result<BlockHeader, IndexerError> {
    decode(bytes, "block header")
}

fn decode<T: DeserializeOwned>(bytes: &[u8], what: &str) -> Result<T, IndexerError> {
    rmp_serde::from_slice(bytes)
        .map_err(|e| IndexerError::MalformedRecord(format!("{what}: {e}")))
}

/// Encodes a value the same way algod's canonical msgpack does: a
/// named map, `omitempty` fields dropped via each type's
/// `skip_serializing_if`. Used to re-derive `txnbytes` for storage and
/// to store a block header without its transaction list.
///
/// Note: go-algorand's canonical msgpack additionally sorts map keys
/// in lexicographic byte order; this implementation instead emits
/// fields in struct declaration order (kept alphabetical by short key
/// within each struct to approximate it). `decode(canonical_encode(x))
/// == x` holds as a value equality regardless of key order; exact
/// byte-identity with what a node produced would additionally require
/// a key-sorting serializer, left as a documented gap (see DESIGN.md).
pub fn canonical_encode<T: Serialize>(value: &T) -> Result<Vec<u8>, IndexerError> {
    rmp_serde::to_vec_named(value)
        .map_err(|e| IndexerError::MalformedRecord(format!("encode failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{
        block::BlockHeader,
        primitives::Address,
        transaction::{Payment, Transaction, TransactionType},
    };

    fn sample_txn() -> SignedTransaction {
        SignedTransaction {
            sig: None,
            multisig: None,
            logicsig: None,
            transaction: Transaction {
                sender: Address::new([1; 32]),
                fee: 1000,
                first_valid: 1,
                last_valid: 1000,
                note: vec![],
                genesis_id: "test".into(),
                genesis_hash: crate::codec::primitives::HashDigest([0; 32]),
                group: None,
                lease: None,
                txn_type: TransactionType::Payment(Payment {
                    receiver: Address::new([2; 32]),
                    amount: 10_000,
                    close_remainder_to: None,
                }),
            },
            closing_amount: None,
            sender_rewards: None,
            receiver_rewards: None,
            close_rewards: None,
            has_genesis_id: None,
            has_genesis_hash: None,
        }
    }

    #[test]
    fn signed_txn_round_trips_as_a_value() {
        let txn = sample_txn();
        let bytes = canonical_encode(&txn).unwrap();
        let decoded = decode_signed_txn(&bytes).unwrap();
        assert_eq!(decoded.transaction.fee, txn.transaction.fee);
        assert_eq!(decoded.participants(), txn.participants());
    }

    #[test]
    fn decode_block_rejects_garbage() {
        let err = decode_block(b"not msgpack at all, just text").unwrap_err();
        assert!(matches!(err, IndexerError::MalformedRecord(_)));
    }

    #[test]
    fn decode_signed_txn_rejects_unknown_type_tag() {
        let txn = rmpv::Value::Map(vec![
            (rmpv::Value::from("snd"), rmpv::Value::Binary(vec![1; 32])),
            (rmpv::Value::from("fee"), rmpv::Value::from(1000)),
            (rmpv::Value::from("fv"), rmpv::Value::from(1)),
            (rmpv::Value::from("lv"), rmpv::Value::from(1000)),
            (rmpv::Value::from("gh"), rmpv::Value::Binary(vec![0; 32])),
            (rmpv::Value::from("type"), rmpv::Value::from("appl")),
        ]);
        let signed = rmpv::Value::Map(vec![(rmpv::Value::from("txn"), txn)]);
        let bytes = rmp_serde::to_vec_named(&signed).unwrap();

        let err = decode_signed_txn(&bytes).unwrap_err();
        match err {
            IndexerError::UnknownTxType(tag) => assert_eq!(tag, "appl"),
            other => panic!("expected UnknownTxType, got {other:?}"),
        }
    }

    #[test]
    fn block_header_round_trips() {
        let header = BlockHeader {
            round: 5,
            previous_block_hash: None,
            seed: None,
            txn_root: None,
            timestamp: 100,
            genesis_id: "test".into(),
            genesis_hash: None,
            txn_counter: 42,
            fee_sink: Some(Address::new([3; 32])),
            rewards_pool: Some(Address::new([4; 32])),
            earn: 0,
            rewards_rate: 0,
            rewards_residue: 0,
            rewards_recalculation_round: 0,
            current_protocol: "future".into(),
            next_protocol: String::new(),
            next_protocol_approvals: 0,
            next_protocol_vote_before: 0,
            next_protocol_switch_on: 0,
            upgrade_propose: String::new(),
            upgrade_delay: 0,
            upgrade_approve: false,
        };
        let block = Block {
            header,
            transactions: vec![sample_txn()],
        };
        let envelope = BlockEnvelope {
            block,
            cert: None,
        };
        let bytes = rmp_serde::to_vec_named(&envelope).unwrap();
        let decoded = decode_block(&bytes).unwrap();
        assert_eq!(decoded.header.round, 5);
        assert_eq!(decoded.transactions.len(), 1);
    }
}
