//! The field-precedence comparator (§4.5 Algorithm step 3).
//!
//! Grounded on `validate_accounting.py`'s `CheckContext.check` plus its
//! `assetEquality`/`dictifyAssetConfig`/`dictifyAppParams`/
//! `dictifyAppLocal` helpers: each field is compared independently and
//! every mismatch is recorded rather than stopping at the first one.

use std::collections::BTreeMap;

use serde_json::Value;

/// Indexer-only provenance fields stripped before any deep-equal (§6).
const INDEXER_ONLY_FIELDS: &[&str] = &[
    "deleted",
    "created-at-round",
    "deleted-at-round",
    "destroyed-at-round",
    "optin-at-round",
    "opted-in-at-round",
    "opted-out-at-round",
    "closeout-at-round",
    "closed-out-at-round",
    "closed-at-round",
];

/// One independently-recorded field mismatch on a single address.
#[derive(Debug, Clone)]
pub struct FieldMismatch {
    pub field: &'static str,
    pub detail: String,
}

/// Compares a node account and an indexer account snapshot at the same
/// round, returning every field that disagrees.
pub fn compare_accounts(indexer_account: &Value, algod_account: &Value) -> Vec<FieldMismatch> {
    let mut mismatches = Vec::new();

    compare_microalgos(indexer_account, algod_account, &mut mismatches);
    compare_asset_holdings(indexer_account, algod_account, &mut mismatches);
    compare_created_assets(indexer_account, algod_account, &mut mismatches);
    compare_created_apps(indexer_account, algod_account, &mut mismatches);
    compare_apps_local_state(indexer_account, algod_account, &mut mismatches);

    mismatches
}

fn compare_microalgos(indexer: &Value, algod: &Value, out: &mut Vec<FieldMismatch>) {
    let algod_v = algod.get("amount-without-pending-rewards").and_then(Value::as_i64);
    let indexer_v = indexer.get("amount-without-pending-rewards").and_then(Value::as_i64);
    if algod_v != indexer_v {
        out.push(FieldMismatch {
            field: "amount-without-pending-rewards",
            detail: format!("algod v={:?} indexer v={:?}", algod_v, indexer_v),
        });
    }
}

fn nonzero_amounts(assets: &[Value]) -> Vec<&Value> {
    assets
        .iter()
        .filter(|a| a.get("amount").and_then(Value::as_i64).unwrap_or(0) != 0)
        .collect()
}

fn compare_asset_holdings(indexer: &Value, algod: &Value, out: &mut Vec<FieldMismatch>) {
    let i_assets = indexer.get("assets").and_then(Value::as_array);
    let a_assets = algod.get("assets").and_then(Value::as_array);

    match (i_assets, a_assets) {
        (Some(i), Some(a)) => {
            let by_id = |assets: &[Value]| -> BTreeMap<i64, i64> {
                assets
                    .iter()
                    .filter_map(|r| {
                        let id = r.get("asset-id").and_then(Value::as_i64)?;
                        let amount = r.get("amount").and_then(Value::as_i64).unwrap_or(0);
                        Some((id, amount))
                    })
                    .collect()
            };
            let mut i_map = by_id(i);
            let a_map = by_id(a);
            // An indexer-only holding at amount 0 (opted in, never
            // funded, or closed out) is not a mismatch even when algod
            // has other holdings on this account.
            i_map.retain(|id, &mut amount| a_map.contains_key(id) || amount != 0);
            if i_map != a_map {
                out.push(FieldMismatch {
                    field: "assets",
                    detail: format!("algod={a_map:?} indexer={i_map:?}"),
                });
            }
        }
        (Some(i), None) => {
            let nonzero = nonzero_amounts(i);
            if !nonzero.is_empty() {
                out.push(FieldMismatch {
                    field: "assets",
                    detail: format!("indexer has assets but not algod: {nonzero:?}"),
                });
            }
        }
        (None, Some(a)) => {
            let nonzero = nonzero_amounts(a);
            if !nonzero.is_empty() {
                out.push(FieldMismatch {
                    field: "assets",
                    detail: format!("algod has assets but not indexer: {nonzero:?}"),
                });
            }
        }
        (None, None) => {}
    }
}

fn strip_indexer_only(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(k, _)| !INDEXER_ONLY_FIELDS.contains(&k.as_str()))
                .map(|(k, v)| (k.clone(), strip_indexer_only(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(strip_indexer_only).collect()),
        other => other.clone(),
    }
}

fn dictify_by<'a>(rows: &'a [Value], key_field: &str) -> BTreeMap<String, Value> {
    rows.iter()
        .filter_map(|r| {
            let key = r.get(key_field)?.to_string();
            Some((key, strip_indexer_only(r)))
        })
        .collect()
}

fn compare_created_assets(indexer: &Value, algod: &Value, out: &mut Vec<FieldMismatch>) {
    let algod_rows = algod.get("created-assets").and_then(Value::as_array).cloned().unwrap_or_default();
    let indexer_rows: Vec<Value> = indexer
        .get("created-assets")
        .and_then(Value::as_array)
        .map(|rows| {
            rows.iter()
                .filter(|r| r.get("params").and_then(|p| p.get("total")).and_then(Value::as_i64) != Some(0))
                .cloned()
                .collect()
        })
        .unwrap_or_default();

    if algod_rows.is_empty() && indexer_rows.is_empty() {
        return;
    }
    let algod_map = dictify_by(&algod_rows, "index");
    let indexer_map = dictify_by(&indexer_rows, "index");
    if algod_map != indexer_map {
        out.push(FieldMismatch {
            field: "created-assets",
            detail: format!("indexer and algod disagree on created assets: algod={algod_map:?} indexer={indexer_map:?}"),
        });
    }
}

fn has_programs(row: &Value) -> bool {
    let params = row.get("params");
    params.and_then(|p| p.get("approval-program")).is_some()
        && params.and_then(|p| p.get("clear-state-program")).is_some()
}

fn compare_created_apps(indexer: &Value, algod: &Value, out: &mut Vec<FieldMismatch>) {
    let algod_rows = algod.get("created-apps").and_then(Value::as_array).cloned().unwrap_or_default();
    let indexer_rows: Vec<Value> = indexer
        .get("created-apps")
        .and_then(Value::as_array)
        .map(|rows| rows.iter().filter(|r| has_programs(r)).cloned().collect())
        .unwrap_or_default();

    if algod_rows.is_empty() && indexer_rows.is_empty() {
        return;
    }
    let algod_map = dictify_by(&algod_rows, "id");
    let indexer_map = dictify_by(&indexer_rows, "id");
    if algod_map != indexer_map {
        out.push(FieldMismatch {
            field: "created-apps",
            detail: format!("indexer and algod disagree on created apps: algod={algod_map:?} indexer={indexer_map:?}"),
        });
    }
}

fn has_nonzero_schema(row: &Value) -> bool {
    let schema = row.get("schema");
    schema.and_then(|s| s.get("num-byte-slice")).and_then(Value::as_i64).unwrap_or(0) != 0
        || schema.and_then(|s| s.get("num-uint")).and_then(Value::as_i64).unwrap_or(0) != 0
}

fn compare_apps_local_state(indexer: &Value, algod: &Value, out: &mut Vec<FieldMismatch>) {
    let algod_rows = algod.get("apps-local-state").and_then(Value::as_array).cloned().unwrap_or_default();
    let indexer_rows: Vec<Value> = indexer
        .get("apps-local-state")
        .and_then(Value::as_array)
        .map(|rows| rows.iter().filter(|r| has_nonzero_schema(r)).cloned().collect())
        .unwrap_or_default();

    if algod_rows.is_empty() && indexer_rows.is_empty() {
        return;
    }
    let algod_map = dictify_by(&algod_rows, "id");
    let indexer_map = dictify_by(&indexer_rows, "id");
    if algod_map != indexer_map {
        out.push(FieldMismatch {
            field: "apps-local-state",
            detail: format!("indexer and algod disagree on app local state: algod={algod_map:?} indexer={indexer_map:?}"),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn matching_accounts_produce_no_mismatch() {
        let account = json!({
            "address": "AAAA",
            "amount-without-pending-rewards": 1000,
        });
        assert!(compare_accounts(&account, &account).is_empty());
    }

    #[test]
    fn microalgos_mismatch_is_recorded_with_both_values() {
        let indexer = json!({"amount-without-pending-rewards": 900});
        let algod = json!({"amount-without-pending-rewards": 1000});
        let mismatches = compare_accounts(&indexer, &algod);
        assert_eq!(mismatches.len(), 1);
        assert_eq!(mismatches[0].field, "amount-without-pending-rewards");
        assert!(mismatches[0].detail.contains("1000"));
        assert!(mismatches[0].detail.contains("900"));
    }

    #[test]
    fn zero_amount_indexer_only_asset_is_not_a_mismatch() {
        let indexer = json!({"assets": [{"asset-id": 5, "amount": 0}]});
        let algod = json!({});
        assert!(compare_accounts(&indexer, &algod).is_empty());
    }

    #[test]
    fn zero_amount_indexer_only_asset_is_not_a_mismatch_alongside_a_shared_asset() {
        let indexer = json!({
            "assets": [{"asset-id": 7, "amount": 50}, {"asset-id": 5, "amount": 0}],
        });
        let algod = json!({"assets": [{"asset-id": 7, "amount": 50}]});
        assert!(compare_accounts(&indexer, &algod).is_empty());
    }

    #[test]
    fn nonzero_indexer_only_asset_alongside_a_shared_asset_is_a_mismatch() {
        let indexer = json!({
            "assets": [{"asset-id": 7, "amount": 50}, {"asset-id": 5, "amount": 3}],
        });
        let algod = json!({"assets": [{"asset-id": 7, "amount": 50}]});
        let mismatches = compare_accounts(&indexer, &algod);
        assert_eq!(mismatches.len(), 1);
        assert_eq!(mismatches[0].field, "assets");
    }

    #[test]
    fn created_asset_ignores_indexer_only_fields() {
        let indexer = json!({
            "created-assets": [{"index": 7, "params": {"total": 100}, "created-at-round": 55, "deleted": false}],
        });
        let algod = json!({
            "created-assets": [{"index": 7, "params": {"total": 100}}],
        });
        assert!(compare_accounts(&indexer, &algod).is_empty());
    }

    #[test]
    fn destroyed_asset_with_zero_total_is_filtered_from_indexer_side() {
        let indexer = json!({
            "created-assets": [{"index": 7, "params": {"total": 0}, "deleted": true}],
        });
        let algod = json!({});
        assert!(compare_accounts(&indexer, &algod).is_empty());
    }
}
