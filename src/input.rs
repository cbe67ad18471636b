//! Loading holder records from JSON mappings
//!
//! Input files are flat objects of identity → decimal string. Entries are read
//! in document order into a `Vec` so that nothing downstream depends on hash
//! map iteration, and a key that appears twice is reported instead of the
//! later value silently winning.

use crate::model::{parse_decimal, Address, HolderRecord, Identity};
use crate::{Error, Result};
use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use std::fmt;
use std::path::Path;
use tracing::debug;

/// Key the snapshot writer uses for the token's total supply
pub const TOTAL_SUPPLY_KEY: &str = "totalSupply";

/// Object entries in the order they appear in the document
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OrderedEntries(pub Vec<(String, String)>);

impl<'de> Deserialize<'de> for OrderedEntries {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_map(EntriesVisitor)
    }
}

struct EntriesVisitor;

impl<'de> Visitor<'de> for EntriesVisitor {
    type Value = OrderedEntries;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an object mapping identities to decimal strings")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<Self::Value, A::Error> {
        let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some(entry) = access.next_entry::<String, String>()? {
            entries.push(entry);
        }
        Ok(OrderedEntries(entries))
    }
}

fn read_entries(json: &str) -> Result<Vec<(String, String)>> {
    let OrderedEntries(entries) = serde_json::from_str(json)?;
    let mut keys: Vec<&str> = entries.iter().map(|(k, _)| k.as_str()).collect();
    keys.sort_unstable();
    if let Some(pair) = keys.windows(2).find(|w| w[0] == w[1]) {
        return Err(Error::Input(format!("duplicate key in input: {}", pair[0])));
    }
    Ok(entries)
}

/// Parse `{address: balance}`; a `totalSupply` entry is skipped
pub fn parse_balances(json: &str) -> Result<Vec<HolderRecord>> {
    let records = read_entries(json)?
        .into_iter()
        .filter(|(key, _)| key != TOTAL_SUPPLY_KEY)
        .map(|(key, value)| {
            let address = Address::parse(&key)?;
            let amount = parse_decimal(&value)
                .map_err(|e| Error::Input(format!("balance of {}: {}", key, e)))?;
            Ok(HolderRecord::balance(address, amount))
        })
        .collect::<Result<Vec<_>>>()?;
    debug!("Parsed {} balances", records.len());
    Ok(records)
}

/// Parse `{token_id: metadata}`
pub fn parse_metadata(json: &str) -> Result<Vec<HolderRecord>> {
    let records = read_entries(json)?
        .into_iter()
        .map(|(key, value)| {
            let id = Identity::parse_token_id(&key)?;
            let metadata = parse_decimal(&value)
                .map_err(|e| Error::Input(format!("metadata of token {}: {}", key, e)))?;
            Ok(HolderRecord::metadata(id, metadata))
        })
        .collect::<Result<Vec<_>>>()?;
    debug!("Parsed metadata for {} tokens", records.len());
    Ok(records)
}

pub fn load_balances(path: &Path) -> Result<Vec<HolderRecord>> {
    parse_balances(&std::fs::read_to_string(path)?)
}

pub fn load_metadata(path: &Path) -> Result<Vec<HolderRecord>> {
    parse_metadata(&std::fs::read_to_string(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::HolderValue;
    use num_bigint::BigInt;

    const A: &str = "0x1111111111111111111111111111111111111111";
    const B: &str = "0x2222222222222222222222222222222222222222";

    #[test]
    fn test_parse_balances_keeps_document_order() {
        let json = format!(r#"{{"{}": "5", "{}": "7"}}"#, B, A);
        let records = parse_balances(&json).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].identity, Identity::Address(Address::parse(B).unwrap()));
        assert_eq!(records[1].value, HolderValue::Balance(BigInt::from(7)));
    }

    #[test]
    fn test_parse_balances_skips_total_supply() {
        let json = format!(r#"{{"{}": "5", "totalSupply": "5"}}"#, A);
        assert_eq!(parse_balances(&json).unwrap().len(), 1);
    }

    #[test]
    fn test_unparsable_amount_is_error_not_zero() {
        let json = format!(r#"{{"{}": "lots"}}"#, A);
        let err = parse_balances(&json).unwrap_err();
        assert!(matches!(err, Error::Input(msg) if msg.contains("lots")));
    }

    #[test]
    fn test_duplicate_json_key_detected() {
        let json = format!(r#"{{"{}": "1", "{}": "2"}}"#, A, A);
        assert!(matches!(parse_balances(&json), Err(Error::Input(_))));
    }

    #[test]
    fn test_bad_address_rejected() {
        assert!(matches!(parse_balances(r#"{"0x1234": "1"}"#), Err(Error::Input(_))));
    }

    #[test]
    fn test_non_string_value_rejected() {
        let json = format!(r#"{{"{}": 5}}"#, A);
        assert!(matches!(parse_balances(&json), Err(Error::Json(_))));
    }

    #[test]
    fn test_parse_metadata() {
        let records = parse_metadata(r#"{"1": "300", "2": "100"}"#).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].value, HolderValue::Metadata(BigInt::from(300)));
        assert!(parse_metadata(r#"{"abc": "1"}"#).is_err());
    }
}
