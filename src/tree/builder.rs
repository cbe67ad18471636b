//! Bottom-up tree construction and proof extraction

use super::{MerkleProof, OddNodePolicy, PairHashing, TreeConfig};
use crate::model::Digest;
use crate::{Error, Result};
use tracing::{debug, trace};

/// A Merkle tree stored as its levels, leaves first
///
/// Levels are written once by [`MerkleTree::build`] and only read afterwards.
#[derive(Clone, Debug)]
pub struct MerkleTree {
    levels: Vec<Vec<Digest>>,
    config: TreeConfig,
}

impl MerkleTree {
    /// Build a tree over `leaves` in the order given
    pub fn build(leaves: Vec<Digest>, config: TreeConfig) -> Result<Self> {
        if leaves.is_empty() {
            return Err(Error::EmptyInput);
        }

        let leaf_count = leaves.len();
        let mut levels = vec![leaves];
        loop {
            let current = &levels[levels.len() - 1];
            if current.len() == 1 {
                break;
            }
            let next = next_level(current, &config);
            trace!("level {} has {} nodes", levels.len(), next.len());
            levels.push(next);
        }

        let tree = MerkleTree { levels, config };
        debug!(
            "Built merkle tree: {} leaves, depth {}, root {}",
            leaf_count,
            tree.depth(),
            tree.root().short()
        );
        Ok(tree)
    }

    /// The root digest
    pub fn root(&self) -> Digest {
        // build() guarantees the last level holds exactly one digest
        self.levels[self.levels.len() - 1][0]
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    pub fn leaves(&self) -> &[Digest] {
        &self.levels[0]
    }

    pub fn leaf_count(&self) -> usize {
        self.levels[0].len()
    }

    /// All levels, leaves first and root last
    pub fn levels(&self) -> &[Vec<Digest>] {
        &self.levels
    }

    /// Number of levels above the leaves
    pub fn depth(&self) -> usize {
        self.levels.len() - 1
    }

    /// Position of a leaf in level 0, if present
    pub fn position(&self, leaf: &Digest) -> Option<usize> {
        self.levels[0].iter().position(|l| l == leaf)
    }

    /// Sibling path from the leaf at `index` up to the root
    pub fn proof(&self, index: usize) -> Result<MerkleProof> {
        let leaf_count = self.leaf_count();
        if index >= leaf_count {
            return Err(Error::IndexOutOfRange { index, leaf_count });
        }

        let mut siblings = Vec::with_capacity(self.depth());
        let mut current = index;
        for level in &self.levels[..self.depth()] {
            let sibling = current ^ 1;
            if sibling < level.len() {
                siblings.push(level[sibling]);
            } else if self.config.odd_node == OddNodePolicy::Duplicate {
                siblings.push(level[current]);
            }
            current /= 2;
        }

        Ok(MerkleProof::new(index, leaf_count, siblings))
    }
}

pub(super) fn hash_pair(left: &Digest, right: &Digest, pair_hashing: PairHashing) -> Digest {
    match pair_hashing {
        PairHashing::Sorted => Digest::combine_sorted(left, right),
        PairHashing::Positional => Digest::combine(left, right),
    }
}

fn next_level(level: &[Digest], config: &TreeConfig) -> Vec<Digest> {
    level
        .chunks(2)
        .map(|pair| match pair {
            [left, right] => hash_pair(left, right, config.pair_hashing),
            [lone] => match config.odd_node {
                OddNodePolicy::Duplicate => hash_pair(lone, lone, config.pair_hashing),
                OddNodePolicy::Promote => *lone,
            },
            _ => unreachable!("chunks(2) yields one or two items"),
        })
        .collect()
}
