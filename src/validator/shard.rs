//! Address-space sharding for distributing validator work across
//! parallel runs (§4.5 Algorithm step 1, §8 "Shard partition").
//!
//! Grounded on `validate_accounting.py`'s `shard_bounds`/`bytedec`:
//! the original treats the first 8 bytes of an address as a
//! big-endian prefix and splits that prefix space into `b` equal
//! chunks, then fudges the lower bound by one ULP because the
//! indexer's pagination cursor means "strictly after this address".
//! We keep the chunking math but expose the bounds as plain inclusive
//! lo / exclusive hi so callers don't have to know about the cursor
//! quirk; [`predecessor`] is the ULP fudge, used only at the call site
//! that builds the initial pagination cursor.

use crate::codec::Address;

/// Inclusive lower bound / exclusive upper bound of shard `a` of `b`
/// (1-indexed, `a` clamped into `1..=b`). `None` on either side means
/// "no bound" (first/last shard).
pub fn shard_bounds(a: u64, b: u64) -> (Option<Address>, Option<Address>) {
    assert!(b >= 1, "shard denominator must be at least 1");
    let a = a.clamp(1, b);
    let chunk: u128 = (1u128 << 64) / b as u128;

    let lo = (a > 1).then(|| prefix_address(chunk * (a as u128 - 1)));
    let hi = (a < b).then(|| prefix_address(chunk * a as u128));
    (lo, hi)
}

fn prefix_address(prefix: u128) -> Address {
    let prefix = prefix as u64;
    let mut bytes = [0u8; 32];
    bytes[..8].copy_from_slice(&prefix.to_be_bytes());
    Address::new(bytes)
}

/// Decrements the 32-byte address as a big-endian number by one,
/// `None` if it was already the zero address.
pub fn predecessor(addr: &Address) -> Option<Address> {
    let mut bytes = *addr.as_bytes();
    for byte in bytes.iter_mut().rev() {
        if *byte == 0 {
            *byte = 0xff;
        } else {
            *byte -= 1;
            return Some(Address::new(bytes));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_and_last_shard_have_open_bounds() {
        let (lo, _) = shard_bounds(1, 4);
        assert!(lo.is_none());
        let (_, hi) = shard_bounds(4, 4);
        assert!(hi.is_none());
    }

    #[test]
    fn adjacent_shards_share_a_boundary() {
        for b in [1u64, 2, 3, 16, 200] {
            for a in 1..b {
                let (_, hi) = shard_bounds(a, b);
                let (lo, _) = shard_bounds(a + 1, b);
                assert_eq!(hi, lo, "shard {a}/{b} hi must equal shard {}/{b} lo", a + 1);
            }
        }
    }

    #[test]
    fn single_shard_covers_everything() {
        let (lo, hi) = shard_bounds(1, 1);
        assert!(lo.is_none());
        assert!(hi.is_none());
    }

    #[test]
    fn predecessor_decrements_last_byte() {
        let addr = Address::new([0u8; 32]);
        assert!(predecessor(&addr).is_none());

        let mut bytes = [0u8; 32];
        bytes[7] = 1;
        let addr = Address::new(bytes);
        let pred = predecessor(&addr).unwrap();
        assert_eq!(pred.as_bytes()[7], 0);
        assert_eq!(pred.as_bytes()[..7], [0u8; 7]);
    }
}
