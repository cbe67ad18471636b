//! Distribution catalog: one claim per holder plus the published root
//!
//! The written mapping looks like:
//!
//! ```json
//! {
//!   "0xAb5801a7D398351b8bE11C439e05C5B3259aeC9B": { "index": 0, "amount": "100", "proof": ["0x…"] },
//!   "root": { "proof": ["0x…"] }
//! }
//! ```

use crate::config::DistributionConfig;
use crate::encoding::LeafEncoder;
use crate::model::{
    parse_decimal, sort_records, Address, Digest, HolderRecord, HolderValue, Identity,
};
use crate::tree::{verify, MerkleProof, MerkleTree};
use crate::{Error, Result};
use num_bigint::BigInt;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

/// Key of the reserved entry that carries the root
pub const ROOT_KEY: &str = "root";

/// What one holder can claim, and the proof that backs it
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimRecord {
    pub index: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<String>,
    pub proof: Vec<String>,
}

impl ClaimRecord {
    fn new(index: u64, value: &HolderValue, proof: Vec<String>) -> Self {
        let (amount, metadata) = match value {
            HolderValue::Balance(n) => (Some(n.to_string()), None),
            HolderValue::Metadata(n) => (None, Some(n.to_string())),
        };
        ClaimRecord {
            index,
            amount,
            metadata,
            proof,
        }
    }

    /// Rebuild the holder value this claim was issued for
    pub fn value(&self) -> Result<HolderValue> {
        match (&self.amount, &self.metadata) {
            (Some(amount), None) => Ok(HolderValue::Balance(parse_decimal(amount)?)),
            (None, Some(metadata)) => Ok(HolderValue::Metadata(parse_decimal(metadata)?)),
            _ => Err(Error::Input(format!(
                "claim {} must carry exactly one of amount or metadata",
                self.index
            ))),
        }
    }

    /// Decode the hex proof strings
    pub fn siblings(&self) -> Result<Vec<Digest>> {
        self.proof
            .iter()
            .map(|s| {
                Digest::from_hex(s)
                    .map_err(|e| Error::Input(format!("invalid proof entry {:?}: {}", s, e)))
            })
            .collect()
    }
}

#[derive(Serialize)]
struct RootEntry<'a> {
    proof: [&'a str; 1],
}

/// A complete distribution: sorted holders, their tree, and their claims
#[derive(Debug)]
pub struct Distribution {
    config: DistributionConfig,
    records: Vec<HolderRecord>,
    tree: MerkleTree,
    claims: BTreeMap<String, ClaimRecord>,
}

impl Distribution {
    /// Sort, encode, build, and prove every record
    pub fn assemble(records: Vec<HolderRecord>, config: &DistributionConfig) -> Result<Self> {
        let records = sort_records(records)?;
        let encoder = LeafEncoder::new(config.encoding.clone())?;

        let leaves = records
            .iter()
            .enumerate()
            .map(|(i, record)| encoder.encode(record, i as u64))
            .collect::<Result<Vec<_>>>()?;

        let tree = MerkleTree::build(leaves, config.tree)?;
        let root = tree.root();

        let mut claims = BTreeMap::new();
        for (index, record) in records.iter().enumerate() {
            let proof = tree.proof(index).map_err(|e| {
                Error::ProofGeneration(format!("{} (index {}): {}", record.identity, index, e))
            })?;
            if !verify(&tree.leaves()[index], &proof, &root, &config.tree) {
                return Err(Error::ProofGeneration(format!(
                    "proof for {} (index {}) does not reproduce the root",
                    record.identity, index
                )));
            }

            let claim = ClaimRecord::new(index as u64, &record.value, proof.to_hex());
            if claims.insert(record.identity.key(), claim).is_some() {
                return Err(Error::Input(format!("duplicate identity: {}", record.identity)));
            }
        }

        info!(
            "Assembled distribution: {} claims, root {}",
            claims.len(),
            root
        );

        Ok(Distribution {
            config: config.clone(),
            records,
            tree,
            claims,
        })
    }

    pub fn root(&self) -> Digest {
        self.tree.root()
    }

    pub fn tree(&self) -> &MerkleTree {
        &self.tree
    }

    pub fn config(&self) -> &DistributionConfig {
        &self.config
    }

    /// Records in distribution order
    pub fn records(&self) -> &[HolderRecord] {
        &self.records
    }

    pub fn claims(&self) -> &BTreeMap<String, ClaimRecord> {
        &self.claims
    }

    pub fn claim(&self, identity: &Identity) -> Option<&ClaimRecord> {
        self.claims.get(&identity.key())
    }

    /// Leaf and proof for one holder
    pub fn proof_for(&self, identity: &Identity) -> Result<(Digest, MerkleProof)> {
        let index = self
            .records
            .iter()
            .position(|r| &r.identity == identity)
            .ok_or_else(|| Error::Input(format!("{} is not part of this distribution", identity)))?;
        Ok((self.tree.leaves()[index], self.tree.proof(index)?))
    }

    pub fn len(&self) -> usize {
        self.claims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }

    /// Sum of all values in the distribution
    pub fn total(&self) -> BigInt {
        self.records.iter().map(|r| r.value.number()).sum()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the claim mapping, creating parent directories
    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_json()?)?;
        debug!("Wrote {} claims to {}", self.len(), path.display());
        Ok(())
    }
}

impl Serialize for Distribution {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let root = self.root().to_hex();
        let mut map = serializer.serialize_map(Some(self.claims.len() + 1))?;
        for (key, claim) in &self.claims {
            map.serialize_entry(key, claim)?;
        }
        map.serialize_entry(ROOT_KEY, &RootEntry { proof: [&root] })?;
        map.end()
    }
}

/// A claim mapping read back from disk
#[derive(Clone, Debug)]
pub struct ClaimFile {
    pub root: Digest,
    pub claims: BTreeMap<String, ClaimRecord>,
}

impl ClaimFile {
    pub fn from_json(json: &str) -> Result<Self> {
        let mut entries: BTreeMap<String, serde_json::Value> = serde_json::from_str(json)?;
        let root_entry = entries
            .remove(ROOT_KEY)
            .ok_or_else(|| Error::Input("claim file has no root entry".into()))?;
        let root = root_entry
            .get("proof")
            .and_then(|p| p.get(0))
            .and_then(|p| p.as_str())
            .ok_or_else(|| Error::Input("root entry must be {\"proof\": [\"0x…\"]}".into()))?;
        let root = Digest::from_hex(root)
            .map_err(|e| Error::Input(format!("invalid root {:?}: {}", root, e)))?;

        let claims = entries
            .into_iter()
            .map(|(key, value)| -> Result<(String, ClaimRecord)> {
                Ok((key, serde_json::from_value(value)?))
            })
            .collect::<Result<BTreeMap<_, _>>>()?;
        Ok(ClaimFile { root, claims })
    }

    pub fn load(path: &Path) -> Result<Self> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    /// Re-encode the claim stored under `key` and check it against the root
    pub fn verify_claim(&self, key: &str, config: &DistributionConfig) -> Result<bool> {
        let claim = self
            .claims
            .get(key)
            .ok_or_else(|| Error::Input(format!("no claim for {}", key)))?;
        let identity = parse_identity_key(key)?;
        let record = HolderRecord {
            identity,
            value: claim.value()?,
        };
        let leaf = LeafEncoder::new(config.encoding.clone())?.encode(&record, claim.index)?;
        let proof = MerkleProof::new(claim.index as usize, self.claims.len(), claim.siblings()?);
        Ok(verify(&leaf, &proof, &self.root, &config.tree))
    }
}

/// Claim keys are either checksummed addresses or decimal token ids
fn parse_identity_key(key: &str) -> Result<Identity> {
    if key.starts_with("0x") {
        Ok(Identity::Address(Address::parse(key)?))
    } else {
        Identity::parse_token_id(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigUint;

    fn addr(byte: u8) -> Address {
        Address::from_bytes([byte; 20])
    }

    fn sample() -> Vec<HolderRecord> {
        vec![
            HolderRecord::balance(addr(0xc), 10),
            HolderRecord::balance(addr(0xa), 100),
            HolderRecord::balance(addr(0xb), 50),
        ]
    }

    #[test]
    fn test_assemble_orders_and_indexes() {
        let dist = Distribution::assemble(sample(), &DistributionConfig::default()).unwrap();
        let a = dist.claim(&addr(0xa).into()).unwrap();
        let b = dist.claim(&addr(0xb).into()).unwrap();
        let c = dist.claim(&addr(0xc).into()).unwrap();

        assert_eq!((a.index, b.index, c.index), (0, 1, 2));
        assert_eq!(a.amount.as_deref(), Some("100"));
        assert_eq!(b.proof.len(), 2);
        assert_eq!(dist.total(), BigInt::from(160));
        assert_eq!(dist.len(), 3);
    }

    #[test]
    fn test_json_has_root_entry() {
        let dist = Distribution::assemble(sample(), &DistributionConfig::default()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&dist.to_json().unwrap()).unwrap();

        assert_eq!(value[ROOT_KEY]["proof"][0], dist.root().to_hex());
        let key = addr(0xb).to_checksum();
        assert_eq!(value[&key]["index"], 1);
        assert_eq!(value[&key]["amount"], "50");
        assert!(value[&key].get("metadata").is_none());
        assert_eq!(value.as_object().unwrap().len(), 4);
    }

    #[test]
    fn test_duplicate_identity_is_input_error() {
        let mut records = sample();
        records.push(HolderRecord::balance(addr(0xa), 7));
        let err = Distribution::assemble(records, &DistributionConfig::default()).unwrap_err();
        assert!(matches!(err, Error::Input(_)));
    }

    #[test]
    fn test_empty_is_rejected() {
        let err = Distribution::assemble(Vec::new(), &DistributionConfig::default()).unwrap_err();
        assert!(matches!(err, Error::EmptyInput));
    }

    #[test]
    fn test_negative_amount_is_encoding_error() {
        let mut records = sample();
        records.push(HolderRecord::balance(addr(0xd), -5));
        let err = Distribution::assemble(records, &DistributionConfig::default()).unwrap_err();
        assert!(matches!(err, Error::Encoding(_)));
    }

    #[test]
    fn test_claim_file_roundtrip_verifies() {
        let config = DistributionConfig::default();
        let dist = Distribution::assemble(sample(), &config).unwrap();
        let file = ClaimFile::from_json(&dist.to_json().unwrap()).unwrap();

        assert_eq!(file.root, dist.root());
        for key in dist.claims().keys() {
            assert!(file.verify_claim(key, &config).unwrap(), "{}", key);
        }
    }

    #[test]
    fn test_claim_file_detects_edited_amount() {
        let config = DistributionConfig::default();
        let dist = Distribution::assemble(sample(), &config).unwrap();
        let mut file = ClaimFile::from_json(&dist.to_json().unwrap()).unwrap();

        let key = addr(0xb).to_checksum();
        file.claims.get_mut(&key).unwrap().amount = Some("5000".into());
        assert!(!file.verify_claim(&key, &config).unwrap());
    }

    #[test]
    fn test_nft_distribution() {
        let config = DistributionConfig::nft(vec![0x01]);
        let records = (1u32..=5)
            .map(|id| HolderRecord::metadata(Identity::TokenId(BigUint::from(id)), id * 3))
            .collect();
        let dist = Distribution::assemble(records, &config).unwrap();

        let claim = dist.claim(&Identity::TokenId(BigUint::from(5u32))).unwrap();
        assert_eq!(claim.index, 0);
        assert_eq!(claim.metadata.as_deref(), Some("15"));
        assert!(claim.amount.is_none());

        let file = ClaimFile::from_json(&dist.to_json().unwrap()).unwrap();
        assert!(file.verify_claim("3", &config).unwrap());
    }

    #[test]
    fn test_proof_for_unknown_identity() {
        let dist = Distribution::assemble(sample(), &DistributionConfig::default()).unwrap();
        assert!(dist.proof_for(&addr(0xee).into()).is_err());
        let (leaf, proof) = dist.proof_for(&addr(0xc).into()).unwrap();
        assert!(verify(&leaf, &proof, &dist.root(), &dist.config().tree));
    }

    #[test]
    fn test_write_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output").join("addr-to-claim.json");
        let dist = Distribution::assemble(sample(), &DistributionConfig::default()).unwrap();
        dist.write(&path).unwrap();
        let file = ClaimFile::load(&path).unwrap();
        assert_eq!(file.claims.len(), 3);
    }

    #[test]
    fn test_empty_nft_prefix_refused() {
        let records = vec![HolderRecord::metadata(Identity::TokenId(BigUint::from(1u32)), 2)];
        let err = Distribution::assemble(records, &DistributionConfig::nft(vec![])).unwrap_err();
        assert!(matches!(err, Error::Encoding(_)));
    }

    #[test]
    fn test_internal_node_cannot_be_claimed() {
        let config = DistributionConfig::nft(vec![0x01]);
        let records = (1u32..=4)
            .map(|id| HolderRecord::metadata(Identity::TokenId(BigUint::from(id)), id))
            .collect();
        let dist = Distribution::assemble(records, &config).unwrap();
        let tree = dist.tree();
        let node = tree.levels()[1][0];

        // Present the children of the first level-1 node as a record
        let (a, b) = (tree.leaves()[0], tree.leaves()[1]);
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let forged_id = BigUint::from_bytes_be(lo.as_bytes());
        let forged = HolderRecord::metadata(
            Identity::TokenId(forged_id.clone()),
            BigInt::from_bytes_be(num_bigint::Sign::Plus, hi.as_bytes()),
        );
        let leaf = LeafEncoder::new(config.encoding.clone())
            .unwrap()
            .encode(&forged, 0)
            .unwrap();
        assert_ne!(leaf, node);

        let short_proof = MerkleProof::new(0, 2, tree.proof(0).unwrap().siblings()[1..].to_vec());
        assert!(!verify(&leaf, &short_proof, &dist.root(), &config.tree));

        let mut file = ClaimFile::from_json(&dist.to_json().unwrap()).unwrap();
        file.claims.insert(
            forged_id.to_string(),
            ClaimRecord::new(0, &forged.value, short_proof.to_hex()),
        );
        assert!(!file.verify_claim(&forged_id.to_string(), &config).unwrap());

        // Without a prefix the same record would hash to the node itself
        let unprefixed = DistributionConfig::nft(vec![]);
        assert!(matches!(
            file.verify_claim(&forged_id.to_string(), &unprefixed),
            Err(Error::Encoding(_))
        ));
    }
}
