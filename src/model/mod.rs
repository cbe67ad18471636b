//! Core data model types for merkle_distributor

mod hash;
mod holder;
mod identity;

pub use hash::Digest;
pub use holder::{parse_decimal, sort_records, HolderRecord, HolderValue};
pub use identity::{Address, Identity};
