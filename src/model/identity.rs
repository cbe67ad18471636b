//! Holder identities: account addresses and numeric token ids

use crate::{Error, Result};
use num_bigint::BigUint;
use sha3::{Digest as _, Keccak256};
use std::fmt;
use std::str::FromStr;

/// A 20-byte account address
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address([u8; 20]);

impl Address {
    /// The zero address; transfers from it are mints
    pub const ZERO: Address = Address([0u8; 20]);

    /// `0x000000000000000000000000000000000000dEaD`; transfers to it are burns
    pub const DEAD: Address = Address([
        0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0xde, 0xad,
    ]);

    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Address(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Take the low 20 bytes of a 32-byte word, as event topics store addresses
    pub fn from_word(word: &[u8; 32]) -> Self {
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&word[12..]);
        Address(bytes)
    }

    /// Parse a 40-digit hex address, with or without `0x`, in any case
    pub fn parse(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let cleaned = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        if cleaned.len() != 40 {
            return Err(Error::Input(format!(
                "invalid address length for {:?}: expected 40 hex chars, got {}",
                s,
                cleaned.len()
            )));
        }
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(cleaned, &mut bytes)
            .map_err(|e| Error::Input(format!("invalid address {:?}: {}", s, e)))?;
        Ok(Address(bytes))
    }

    /// EIP-55 mixed-case checksum encoding
    pub fn to_checksum(&self) -> String {
        let lower = hex::encode(self.0);
        let hash = Keccak256::digest(lower.as_bytes());
        let mut out = String::with_capacity(42);
        out.push_str("0x");
        for (i, c) in lower.chars().enumerate() {
            let nibble = if i % 2 == 0 {
                hash[i / 2] >> 4
            } else {
                hash[i / 2] & 0x0f
            };
            if c.is_ascii_alphabetic() && nibble >= 8 {
                out.push(c.to_ascii_uppercase());
            } else {
                out.push(c);
            }
        }
        out
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_checksum())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_checksum())
    }
}

impl FromStr for Address {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Address::parse(s)
    }
}

/// Who a claim belongs to
///
/// Addresses order before numeric ids; within a kind, addresses order by
/// their bytes and ids numerically.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Identity {
    Address(Address),
    TokenId(BigUint),
}

impl Identity {
    /// Parse a decimal token id
    pub fn parse_token_id(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::Input(format!("invalid token id: {:?}", s)));
        }
        BigUint::from_str(trimmed)
            .map(Identity::TokenId)
            .map_err(|e| Error::Input(format!("invalid token id {:?}: {}", s, e)))
    }

    /// The key this identity is stored under in a claim mapping
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identity::Address(addr) => write!(f, "{}", addr),
            Identity::TokenId(id) => write!(f, "{}", id),
        }
    }
}

impl From<Address> for Identity {
    fn from(addr: Address) -> Self {
        Identity::Address(addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_known_vectors() {
        // Vectors from EIP-55
        for expected in [
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
            "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359",
            "0xdbF03B407c01E7cD3CBea99509d93f8DDDC8C6FB",
            "0xD1220A0cf47c7B9Be7A2E6BA89F429762e7b9aDb",
        ] {
            let addr = Address::parse(&expected.to_lowercase()).unwrap();
            assert_eq!(addr.to_checksum(), expected);
        }
    }

    #[test]
    fn test_parse_without_prefix_and_mixed_case() {
        let a = Address::parse("5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed").unwrap();
        let b = Address::parse("0x5AAEB6053F3E94C9B9A09F33669435E7EF1BEAED").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_parse_invalid_length() {
        assert!(matches!(Address::parse("0x1234"), Err(Error::Input(_))));
    }

    #[test]
    fn test_parse_invalid_hex() {
        let result = Address::parse("0xzz00000000000000000000000000000000000000");
        assert!(matches!(result, Err(Error::Input(_))));
    }

    #[test]
    fn test_dead_address() {
        assert_eq!(
            Address::DEAD,
            Address::parse("0x000000000000000000000000000000000000dead").unwrap()
        );
    }

    #[test]
    fn test_from_word_takes_low_bytes() {
        let mut word = [0xffu8; 32];
        word[12..].copy_from_slice(&[7u8; 20]);
        assert_eq!(Address::from_word(&word), Address::from_bytes([7u8; 20]));
    }

    #[test]
    fn test_token_id_parse() {
        assert_eq!(
            Identity::parse_token_id("42").unwrap(),
            Identity::TokenId(BigUint::from(42u32))
        );
        assert!(Identity::parse_token_id("-1").is_err());
        assert!(Identity::parse_token_id("0x10").is_err());
        assert!(Identity::parse_token_id("").is_err());
    }

    #[test]
    fn test_identity_ordering() {
        let addr = Identity::Address(Address::from_bytes([0xff; 20]));
        let id = Identity::TokenId(BigUint::from(0u32));
        assert!(addr < id);
        assert!(
            Identity::TokenId(BigUint::from(2u32)) < Identity::TokenId(BigUint::from(10u32))
        );
    }
}
