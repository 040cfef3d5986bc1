//! C5 AccountingValidator: cross-checks the accounting projection
//! against a live algod node (§4.5).

mod client;
mod comparator;
mod config;
mod report;
mod shard;
mod validate;

pub use config::{ValidationFilters, ValidatorConfig};
pub use report::{Mismatch, ValidationReport};
pub use shard::shard_bounds;
pub use validate::validate;
