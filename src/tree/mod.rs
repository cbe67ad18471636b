//! Binary Merkle tree over an ordered leaf sequence
//!
//! The tree is kept level by level:
//! - level 0 is the leaf sequence exactly as the caller ordered it
//! - each following level combines adjacent pairs of the one below
//! - the last level holds the single root digest
//!
//! Two policies decide every digest above the leaves and are fixed for the
//! lifetime of a tree: how a pair is hashed ([`PairHashing`]) and what happens
//! to the last node of an odd-length level ([`OddNodePolicy`]).

mod builder;
mod proof;

pub use builder::MerkleTree;
pub use proof::{verify, verify_sorted, MerkleProof};

use serde::{Deserialize, Serialize};

/// How two sibling digests are combined into their parent
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairHashing {
    /// `keccak(min(a, b) ++ max(a, b))`, the rule OpenZeppelin's `MerkleProof` checks
    #[default]
    Sorted,
    /// `keccak(left ++ right)` by position
    Positional,
}

/// What happens to the unpaired last node of an odd-length level
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OddNodePolicy {
    /// Pair the node with itself
    #[default]
    Duplicate,
    /// Carry the node to the next level unchanged
    Promote,
}

/// Policies a tree is built and verified with
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeConfig {
    #[serde(default)]
    pub pair_hashing: PairHashing,
    #[serde(default)]
    pub odd_node: OddNodePolicy,
}

impl TreeConfig {
    pub fn new(pair_hashing: PairHashing, odd_node: OddNodePolicy) -> Self {
        TreeConfig {
            pair_hashing,
            odd_node,
        }
    }
}
