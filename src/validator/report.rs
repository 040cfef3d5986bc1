//! Aggregated result of a validation run (§4.5 `validate(...) -> report`).

use crate::codec::Address;
use crate::validator::comparator::FieldMismatch;

/// One address whose node/indexer snapshots disagreed.
#[derive(Debug, Clone)]
pub struct Mismatch {
    pub address: Address,
    pub fields: Vec<FieldMismatch>,
    /// `fee-sink`/`rewards-pool` mismatches are recorded but don't
    /// count against `neq` (§4.5 Algorithm step 4).
    pub exempt: bool,
    /// Last ≤30 transactions touching this address, newest first
    /// (§4.5 Algorithm step 6).
    pub transcript: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub matched: u64,
    pub mismatched: u64,
    pub mismatches: Vec<Mismatch>,
    pub last_address: Option<Address>,
}

impl ValidationReport {
    pub fn record_match(&mut self) {
        self.matched += 1;
    }

    pub fn record_mismatch(&mut self, mismatch: Mismatch, max_mismatches: Option<usize>) {
        if !mismatch.exempt {
            self.mismatched += 1;
        }
        if max_mismatches.map_or(true, |max| self.mismatches.len() < max) {
            self.mismatches.push(mismatch);
        }
    }

    pub fn is_clean(&self) -> bool {
        self.mismatched == 0
    }
}
