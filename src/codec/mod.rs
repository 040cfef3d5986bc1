//! Canonical msgpack decoding/encoding of blocks and transactions (C1,
//! spec.md §4.1).
//!
//! No byte-keyed map survives past [`canonical`]'s decoder boundary:
//! every transaction variant is a typed struct discriminated by the
//! wire `type` tag (Design Notes "Dynamic-key msgpack maps").

pub mod block;
pub mod canonical;
pub mod json_polite;
pub mod primitives;
pub mod transaction;

pub use block::{Block, BlockEnvelope, BlockHeader};
pub use canonical::{canonical_encode, decode_block, decode_header, decode_signed_txn};
pub use primitives::{decode_address, encode_address, Address, HashDigest, Intra, Round};
pub use transaction::{SignedTransaction, Transaction, TransactionType};
