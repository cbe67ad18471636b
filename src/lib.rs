//! # merkle_distributor
//!
//! Merkle distribution trees for token and NFT airdrops.
//!
//! A distribution commits to a list of holders with a single Keccak-256
//! Merkle root and hands every holder a short inclusion proof, so a contract
//! that stores only the root can check any claim.
//!
//! ## Core Concepts
//!
//! - **Holder records**: an identity (address or token id) and a number
//! - **Leaves**: records encoded under an explicit [`EncodingPolicy`] and hashed
//! - **Tree**: leaves combined pairwise under a fixed [`TreeConfig`]
//! - **Claims**: per-holder index, value and proof, plus the reserved `"root"` entry
//!
//! ## Example
//!
//! ```ignore
//! use merkle_distributor::{input, Distribution, DistributionConfig};
//!
//! let records = input::load_balances(Path::new("balances.json"))?;
//! let dist = Distribution::assemble(records, &DistributionConfig::default())?;
//! dist.write(Path::new("output/addr-to-claim.json"))?;
//! ```

pub mod config;
pub mod distribution;
pub mod encoding;
pub mod input;
pub mod logging;
pub mod model;
pub mod paths;
pub mod snapshot;
pub mod tree;

mod error;

pub use config::DistributionConfig;
pub use distribution::{ClaimFile, ClaimRecord, Distribution, ROOT_KEY};
pub use encoding::{EncodingPolicy, LeafEncoder};
pub use error::{Error, Result};
pub use model::{Address, Digest, HolderRecord, HolderValue, Identity};
pub use snapshot::{snapshot_balances, JsonLogSource, Snapshot, TransferSource};
pub use tree::{verify, verify_sorted, MerkleProof, MerkleTree, OddNodePolicy, PairHashing, TreeConfig};
