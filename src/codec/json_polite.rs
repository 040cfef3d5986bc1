//! Structured-JSON projection of a decoded transaction (§4.1 decoder
//! contract: "decode the `type` tag and the `note` (if it itself
//! parses as canonical msgpack) as structured values; treat all other
//! fields transparently").
//!
//! Grounded on `blockarchiver.py`'s `unmsgpack`/`make_ob_json_polite`:
//! byte strings that aren't valid UTF-8 become base64 so the result is
//! valid JSON, and the `note` field gets one extra attempt at being
//! unpacked as nested canonical msgpack before falling back to bytes.

use data_encoding::BASE64;
use serde::Serialize;

use crate::{codec::canonical::canonical_encode, error::IndexerError};

/// Converts any canonically-encodable value (a [`SignedTransaction`]
/// or a [`BlockHeader`]) into a `serde_json::Value` suitable for a
/// `jsonb`/`json` storage column.
///
/// [`SignedTransaction`]: crate::codec::transaction::SignedTransaction
/// [`BlockHeader`]: crate::codec::block::BlockHeader
pub fn to_structured_json<T: Serialize>(value: &T) -> Result<serde_json::Value, IndexerError> {
    let bytes = canonical_encode(value)?;
    let rmp_value: rmpv::Value = rmpv::decode::read_value(&mut &bytes[..])
        .map_err(|e| IndexerError::MalformedRecord(format!("re-reading own encoding: {e}")))?;
    Ok(polite_value(rmp_value, None))
}

fn polite_value(value: rmpv::Value, key_hint: Option<&str>) -> serde_json::Value {
    match value {
        rmpv::Value::Nil => serde_json::Value::Null,
        rmpv::Value::Boolean(b) => serde_json::Value::Bool(b),
        rmpv::Value::Integer(i) => serde_json::json!(i),
        rmpv::Value::F32(f) => serde_json::json!(f),
        rmpv::Value::F64(f) => serde_json::json!(f),
        rmpv::Value::String(s) => {
            serde_json::Value::String(s.as_str().unwrap_or_default().to_string())
        }
        rmpv::Value::Binary(bytes) => {
            if key_hint == Some("note") {
                if let Ok(inner) = rmpv::decode::read_value(&mut &bytes[..]) {
                    return serde_json::json!({
                        "decoded_note": polite_value(inner, None),
                    });
                }
            }
            serde_json::Value::String(BASE64.encode(&bytes))
        }
        rmpv::Value::Array(items) => {
            serde_json::Value::Array(items.into_iter().map(|v| polite_value(v, None)).collect())
        }
        rmpv::Value::Map(entries) => {
            let mut map = serde_json::Map::with_capacity(entries.len());
            for (k, v) in entries {
                let key = match &k {
                    rmpv::Value::String(s) => s.as_str().unwrap_or_default().to_string(),
                    other => polite_value(other.clone(), None).to_string(),
                };
                let rendered = polite_value(v, Some(key.as_str()));
                map.insert(key, rendered);
            }
            serde_json::Value::Object(map)
        }
        rmpv::Value::Ext(kind, bytes) => serde_json::json!({
            "ext_kind": kind,
            "data": BASE64.encode(&bytes),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{
        primitives::{Address, HashDigest},
        transaction::{Payment, SignedTransaction, Transaction, TransactionType},
    };

    #[test]
    fn addresses_become_base64_strings() {
        let txn = SignedTransaction {
            sig: None,
            multisig: None,
            logicsig: None,
            transaction: Transaction {
                sender: Address::new([9; 32]),
                fee: 1000,
                first_valid: 1,
                last_valid: 10,
                note: vec![],
                genesis_id: "t".into(),
                genesis_hash: HashDigest([0; 32]),
                group: None,
                lease: None,
                txn_type: TransactionType::Payment(Payment {
                    receiver: Address::new([2; 32]),
                    amount: 1,
                    close_remainder_to: None,
                }),
            },
            closing_amount: None,
            sender_rewards: None,
            receiver_rewards: None,
            close_rewards: None,
            has_genesis_id: None,
            has_genesis_hash: None,
        };
        let json = to_structured_json(&txn).unwrap();
        assert!(json["snd"].is_string());
        assert_eq!(json["fee"], 1000);
    }
}
