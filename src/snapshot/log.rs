//! Raw event logs and ERC-20 `Transfer` decoding

use crate::model::{Address, Digest};
use crate::{Error, Result};
use num_bigint::{BigInt, BigUint, Sign};
use serde::{Deserialize, Deserializer};
use std::path::Path;

/// Event signature whose hash is topic 0 of every ERC-20 transfer
pub const TRANSFER_SIGNATURE: &str = "Transfer(address,address,uint256)";

/// `keccak("Transfer(address,address,uint256)")`
pub fn transfer_topic() -> Digest {
    Digest::keccak(TRANSFER_SIGNATURE.as_bytes())
}

/// One log entry in the shape `eth_getLogs` returns it
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLog {
    #[serde(deserialize_with = "de_address")]
    pub address: Address,
    pub topics: Vec<Digest>,
    #[serde(deserialize_with = "de_hex_bytes")]
    pub data: Vec<u8>,
    #[serde(deserialize_with = "de_quantity")]
    pub block_number: u64,
}

/// A decoded token movement
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transfer {
    pub from: Address,
    pub to: Address,
    pub value: BigInt,
}

impl Transfer {
    /// Decode a transfer log; logs with another topic 0 yield `None`
    pub fn decode(log: &RawLog) -> Result<Option<Self>> {
        match log.topics.first() {
            Some(topic) if *topic == transfer_topic() => {}
            _ => return Ok(None),
        }
        if log.topics.len() < 3 {
            return Err(Error::Input(format!(
                "transfer log in block {} has {} topics, expected 3",
                log.block_number,
                log.topics.len()
            )));
        }
        if log.data.len() != 32 {
            return Err(Error::Input(format!(
                "transfer log in block {} has {} data bytes, expected 32",
                log.block_number,
                log.data.len()
            )));
        }
        Ok(Some(Transfer {
            from: Address::from_word(log.topics[1].as_bytes()),
            to: Address::from_word(log.topics[2].as_bytes()),
            value: BigInt::from_biguint(Sign::Plus, BigUint::from_bytes_be(&log.data)),
        }))
    }
}

/// Where transfer logs come from
pub trait TransferSource {
    /// Logs emitted by `token` in blocks `from_block..=to_block`
    fn logs(&self, token: &Address, from_block: u64, to_block: u64) -> Result<Vec<RawLog>>;
}

/// Logs served from an in-memory dump, e.g. a saved `eth_getLogs` response
#[derive(Clone, Debug, Default)]
pub struct JsonLogSource {
    logs: Vec<RawLog>,
}

impl JsonLogSource {
    pub fn new(logs: Vec<RawLog>) -> Self {
        JsonLogSource { logs }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(JsonLogSource::new(serde_json::from_str(json)?))
    }

    pub fn load(path: &Path) -> Result<Self> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    pub fn len(&self) -> usize {
        self.logs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.logs.is_empty()
    }
}

impl TransferSource for JsonLogSource {
    fn logs(&self, token: &Address, from_block: u64, to_block: u64) -> Result<Vec<RawLog>> {
        Ok(self
            .logs
            .iter()
            .filter(|log| {
                log.address == *token && (from_block..=to_block).contains(&log.block_number)
            })
            .cloned()
            .collect())
    }
}

fn strip_0x(s: &str) -> &str {
    s.strip_prefix("0x").unwrap_or(s)
}

fn de_address<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Address, D::Error> {
    let s = String::deserialize(deserializer)?;
    Address::parse(&s).map_err(serde::de::Error::custom)
}

fn de_hex_bytes<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Vec<u8>, D::Error> {
    let s = String::deserialize(deserializer)?;
    hex::decode(strip_0x(&s)).map_err(serde::de::Error::custom)
}

/// JSON-RPC quantities are `0x`-prefixed hex; plain numbers are accepted too
fn de_quantity<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<u64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Quantity {
        Number(u64),
        Text(String),
    }

    match Quantity::deserialize(deserializer)? {
        Quantity::Number(n) => Ok(n),
        Quantity::Text(s) => match s.strip_prefix("0x") {
            Some(hex) => u64::from_str_radix(hex, 16).map_err(serde::de::Error::custom),
            None => s.parse().map_err(serde::de::Error::custom),
        },
    }
}
