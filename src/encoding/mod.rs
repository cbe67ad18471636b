//! Canonical leaf encoding
//!
//! A leaf is the Keccak-256 hash of a record's fields concatenated in a fixed
//! order. Numeric fields are big-endian and left-padded with zeros to 32
//! bytes so that integers of different lengths can never produce the same
//! byte string. Which fields go in, and in what order, is an explicit
//! [`EncodingPolicy`] rather than a hidden default.
//!
//! Internal tree nodes hash exactly two digests, so a leaf preimage of
//! [`NODE_PREIMAGE_LEN`] bytes could be read as a node and is refused.

use crate::model::{Digest, HolderRecord, HolderValue, Identity};
use crate::{Error, Result};
use num_bigint::{BigInt, BigUint};
use serde::{Deserialize, Serialize};

/// Width of every padded numeric field
pub const WORD_SIZE: usize = 32;

/// Length of an internal node's preimage, `left ++ right`
pub const NODE_PREIMAGE_LEN: usize = 2 * WORD_SIZE;

/// Field layout used to turn a record into leaf bytes
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncodingPolicy {
    /// `identity ++ pad32(amount)`
    #[default]
    AccountAmount,
    /// `pad32(index) ++ identity ++ pad32(amount)`
    IndexedAccountAmount,
    /// `prefix ++ pad32(token_id) ++ pad32(metadata)`
    PrefixedIdMetadata {
        #[serde(with = "hex_bytes")]
        prefix: Vec<u8>,
    },
}

impl EncodingPolicy {
    /// Reject layouts that can only produce node-shaped leaves
    pub fn validate(&self) -> Result<()> {
        match self {
            EncodingPolicy::PrefixedIdMetadata { prefix } if prefix.is_empty() => {
                Err(Error::Encoding(
                    "metadata leaves need a non-empty prefix; without one a leaf is \
                     indistinguishable from an internal node"
                        .into(),
                ))
            }
            _ => Ok(()),
        }
    }
}

/// Encodes holder records into leaves under one policy
#[derive(Clone, Debug, Default)]
pub struct LeafEncoder {
    policy: EncodingPolicy,
}

impl LeafEncoder {
    pub fn new(policy: EncodingPolicy) -> Result<Self> {
        policy.validate()?;
        Ok(LeafEncoder { policy })
    }

    pub fn policy(&self) -> &EncodingPolicy {
        &self.policy
    }

    /// Canonical byte string for a record at `index` in distribution order
    pub fn encode_bytes(&self, record: &HolderRecord, index: u64) -> Result<Vec<u8>> {
        let bytes = self.layout(record, index)?;
        if bytes.len() == NODE_PREIMAGE_LEN {
            return Err(Error::Encoding(format!(
                "leaf for {} is {} bytes, the shape of an internal node",
                record.identity, NODE_PREIMAGE_LEN
            )));
        }
        Ok(bytes)
    }

    fn layout(&self, record: &HolderRecord, index: u64) -> Result<Vec<u8>> {
        match &self.policy {
            EncodingPolicy::AccountAmount => {
                let amount = balance_of(record)?;
                let mut out = identity_bytes(&record.identity)?;
                out.extend_from_slice(&pad_signed(amount)?);
                Ok(out)
            }
            EncodingPolicy::IndexedAccountAmount => {
                let amount = balance_of(record)?;
                let mut out = pad_unsigned(&BigUint::from(index))?.to_vec();
                out.extend(identity_bytes(&record.identity)?);
                out.extend_from_slice(&pad_signed(amount)?);
                Ok(out)
            }
            EncodingPolicy::PrefixedIdMetadata { prefix } => {
                let id = match &record.identity {
                    Identity::TokenId(id) => id,
                    Identity::Address(addr) => {
                        return Err(Error::Encoding(format!(
                            "metadata leaves need a token id, got address {}",
                            addr
                        )))
                    }
                };
                let metadata = match &record.value {
                    HolderValue::Metadata(m) => m,
                    HolderValue::Balance(_) => {
                        return Err(Error::Encoding(format!(
                            "metadata leaves need a metadata value for token {}",
                            id
                        )))
                    }
                };
                let mut out = prefix.clone();
                out.extend_from_slice(&pad_unsigned(id)?);
                out.extend_from_slice(&pad_signed(metadata)?);
                Ok(out)
            }
        }
    }

    /// Hash a record into its leaf
    pub fn encode(&self, record: &HolderRecord, index: u64) -> Result<Digest> {
        Ok(Digest::keccak(&self.encode_bytes(record, index)?))
    }
}

fn balance_of(record: &HolderRecord) -> Result<&BigInt> {
    match &record.value {
        HolderValue::Balance(amount) => Ok(amount),
        HolderValue::Metadata(_) => Err(Error::Encoding(format!(
            "balance leaves need an amount, {} carries metadata",
            record.identity
        ))),
    }
}

fn identity_bytes(identity: &Identity) -> Result<Vec<u8>> {
    match identity {
        Identity::Address(addr) => Ok(addr.as_bytes().to_vec()),
        Identity::TokenId(id) => Ok(pad_unsigned(id)?.to_vec()),
    }
}

/// Big-endian, left-padded to 32 bytes; negative values are rejected
pub fn pad_signed(value: &BigInt) -> Result<[u8; WORD_SIZE]> {
    match value.to_biguint() {
        Some(unsigned) => pad_unsigned(&unsigned),
        None => Err(Error::Encoding(format!(
            "negative value {} cannot be encoded",
            value
        ))),
    }
}

/// Big-endian, left-padded to 32 bytes; values wider than 256 bits overflow
pub fn pad_unsigned(value: &BigUint) -> Result<[u8; WORD_SIZE]> {
    let mut word = [0u8; WORD_SIZE];
    let bytes = value.to_bytes_be();
    if bytes.len() > WORD_SIZE {
        return Err(Error::Encoding(format!(
            "value {} does not fit in {} bytes",
            value, WORD_SIZE
        )));
    }
    word[WORD_SIZE - bytes.len()..].copy_from_slice(&bytes);
    Ok(word)
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        let s = s.strip_prefix("0x").unwrap_or(&s);
        hex::decode(s).map_err(serde::de::Error::custom)
    }
}
