//! Inclusion proofs and their verification

use super::builder::hash_pair;
use super::{OddNodePolicy, PairHashing, TreeConfig};
use crate::model::Digest;
use serde::{Deserialize, Serialize};

/// Sibling digests from a leaf up to the root
///
/// `siblings[0]` sits on the leaf's own level and the last entry is the
/// sibling nearest the root. The leaf index and leaf count are kept so that
/// positional trees can tell left from right and spot promoted levels.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleProof {
    leaf_index: usize,
    leaf_count: usize,
    siblings: Vec<Digest>,
}

impl MerkleProof {
    pub fn new(leaf_index: usize, leaf_count: usize, siblings: Vec<Digest>) -> Self {
        MerkleProof {
            leaf_index,
            leaf_count,
            siblings,
        }
    }

    pub fn leaf_index(&self) -> usize {
        self.leaf_index
    }

    pub fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    pub fn siblings(&self) -> &[Digest] {
        &self.siblings
    }

    pub fn len(&self) -> usize {
        self.siblings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.siblings.is_empty()
    }

    /// Siblings as `0x`-prefixed lowercase hex strings
    pub fn to_hex(&self) -> Vec<String> {
        self.siblings.iter().map(Digest::to_hex).collect()
    }
}

/// Recompute the root from `leaf` and `proof` and compare it with `root`
pub fn verify(leaf: &Digest, proof: &MerkleProof, root: &Digest, config: &TreeConfig) -> bool {
    match config.pair_hashing {
        PairHashing::Sorted => verify_sorted(leaf, proof.siblings(), root),
        PairHashing::Positional => verify_positional(leaf, proof, root, config.odd_node),
    }
}

/// Index-free verification for sorted-pair trees
///
/// Mirrors what an on-chain `MerkleProof.verify` does: fold each sibling into
/// the running digest, smaller operand first.
pub fn verify_sorted(leaf: &Digest, siblings: &[Digest], root: &Digest) -> bool {
    let computed = siblings
        .iter()
        .fold(*leaf, |node, sibling| Digest::combine_sorted(&node, sibling));
    computed == *root
}

fn verify_positional(
    leaf: &Digest,
    proof: &MerkleProof,
    root: &Digest,
    odd_node: OddNodePolicy,
) -> bool {
    let mut index = proof.leaf_index;
    let mut width = proof.leaf_count;
    if index >= width {
        return false;
    }

    let mut node = *leaf;
    let mut siblings = proof.siblings.iter();
    while width > 1 {
        let lone = index % 2 == 0 && index + 1 == width;
        if !(lone && odd_node == OddNodePolicy::Promote) {
            let Some(sibling) = siblings.next() else {
                return false;
            };
            node = if index % 2 == 0 {
                hash_pair(&node, sibling, PairHashing::Positional)
            } else {
                hash_pair(sibling, &node, PairHashing::Positional)
            };
        }
        index /= 2;
        width = width.div_ceil(2);
    }

    siblings.next().is_none() && node == *root
}
