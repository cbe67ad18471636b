//! Holder records: one identity and the value it can claim

use super::Identity;
use crate::{Error, Result};
use num_bigint::BigInt;
use std::cmp::Ordering;
use std::str::FromStr;

/// The numeric payload of a holder record
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum HolderValue {
    /// A token balance in the smallest unit
    Balance(BigInt),
    /// An encoded metadata word for an NFT
    Metadata(BigInt),
}

impl HolderValue {
    pub fn number(&self) -> &BigInt {
        match self {
            HolderValue::Balance(n) | HolderValue::Metadata(n) => n,
        }
    }
}

/// One entry of a distribution
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct HolderRecord {
    pub identity: Identity,
    pub value: HolderValue,
}

impl HolderRecord {
    pub fn balance(identity: impl Into<Identity>, amount: impl Into<BigInt>) -> Self {
        HolderRecord {
            identity: identity.into(),
            value: HolderValue::Balance(amount.into()),
        }
    }

    pub fn metadata(identity: impl Into<Identity>, metadata: impl Into<BigInt>) -> Self {
        HolderRecord {
            identity: identity.into(),
            value: HolderValue::Metadata(metadata.into()),
        }
    }

    /// Distribution order: larger values first, ties by identity ascending
    pub fn distribution_order(a: &HolderRecord, b: &HolderRecord) -> Ordering {
        b.value
            .number()
            .cmp(a.value.number())
            .then_with(|| a.identity.cmp(&b.identity))
    }
}

/// Parse a base-10 integer string
///
/// A leading `-` is accepted so that negative values reach the encoder and
/// are reported there; anything else that is not a digit is rejected.
pub fn parse_decimal(s: &str) -> Result<BigInt> {
    let digits = s.strip_prefix('-').unwrap_or(s);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::Input(format!("could not parse {:?} as a decimal integer", s)));
    }
    BigInt::from_str(s).map_err(|e| Error::Input(format!("could not parse {:?}: {}", s, e)))
}

/// Sort records into distribution order, rejecting repeated identities
pub fn sort_records(mut records: Vec<HolderRecord>) -> Result<Vec<HolderRecord>> {
    if records.is_empty() {
        return Err(Error::EmptyInput);
    }

    let mut identities: Vec<&Identity> = records.iter().map(|r| &r.identity).collect();
    identities.sort();
    if let Some(pair) = identities.windows(2).find(|w| w[0] == w[1]) {
        return Err(Error::Input(format!("duplicate identity: {}", pair[0])));
    }

    records.sort_by(HolderRecord::distribution_order);
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Address;

    fn addr(byte: u8) -> Address {
        Address::from_bytes([byte; 20])
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!(parse_decimal("100").unwrap(), BigInt::from(100));
        assert_eq!(parse_decimal("-7").unwrap(), BigInt::from(-7));
        let big = "115792089237316195423570985008687907853269984665640564039457584007913129639935";
        assert_eq!(parse_decimal(big).unwrap().to_string(), big);
    }

    #[test]
    fn test_parse_decimal_rejects_garbage() {
        for bad in ["", "-", "abc", "1.5", "0x10", " 1", "+1", "1e18"] {
            assert!(
                matches!(parse_decimal(bad), Err(Error::Input(_))),
                "{:?} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_sort_descending_with_identity_tiebreak() {
        let records = vec![
            HolderRecord::balance(addr(3), 10),
            HolderRecord::balance(addr(2), 50),
            HolderRecord::balance(addr(1), 50),
            HolderRecord::balance(addr(4), 100),
        ];
        let sorted = sort_records(records).unwrap();
        let order: Vec<_> = sorted.iter().map(|r| r.identity.clone()).collect();
        assert_eq!(
            order,
            vec![
                Identity::Address(addr(4)),
                Identity::Address(addr(1)),
                Identity::Address(addr(2)),
                Identity::Address(addr(3)),
            ]
        );
    }

    #[test]
    fn test_sort_rejects_duplicates() {
        let records = vec![
            HolderRecord::balance(addr(1), 10),
            HolderRecord::balance(addr(2), 20),
            HolderRecord::balance(addr(1), 30),
        ];
        let err = sort_records(records).unwrap_err();
        assert!(matches!(err, Error::Input(msg) if msg.contains("duplicate")));
    }

    #[test]
    fn test_sort_rejects_empty() {
        assert!(matches!(sort_records(Vec::new()), Err(Error::EmptyInput)));
    }
}
