//! 32-byte Keccak-256 digest used for leaves, nodes and roots

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest as _, Keccak256};
use std::fmt;

/// A 32-byte Keccak-256 digest
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Digest([u8; 32]);

impl Digest {
    /// The zero digest
    pub const ZERO: Digest = Digest([0u8; 32]);

    /// Create a digest from raw bytes
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Digest(bytes)
    }

    /// Hash arbitrary data
    pub fn keccak(data: &[u8]) -> Self {
        Digest(Keccak256::digest(data).into())
    }

    /// Hash multiple pieces of data as one concatenated message
    pub fn keccak_many(parts: &[&[u8]]) -> Self {
        let mut hasher = Keccak256::new();
        for part in parts {
            hasher.update(part);
        }
        Digest(hasher.finalize().into())
    }

    /// Hash two child digests in the given order
    pub fn combine(left: &Digest, right: &Digest) -> Self {
        Self::keccak_many(&[&left.0, &right.0])
    }

    /// Hash two child digests, smaller one first
    pub fn combine_sorted(a: &Digest, b: &Digest) -> Self {
        if a <= b {
            Self::combine(a, b)
        } else {
            Self::combine(b, a)
        }
    }

    /// Get the raw bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// `0x`-prefixed lowercase hex
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Parse from hex, with or without a `0x` prefix
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let s = s.trim();
        let s = s.strip_prefix("0x").unwrap_or(s);
        let mut arr = [0u8; 32];
        hex::decode_to_slice(s, &mut arr)?;
        Ok(Digest(arr))
    }

    /// Get a short prefix for display
    pub fn short(&self) -> String {
        self.to_hex()[..10].to_string()
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.short())
    }
}

impl AsRef<[u8]> for Digest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Digest::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keccak_empty_input() {
        // Well-known Keccak-256 of the empty string
        assert_eq!(
            Digest::keccak(b"").to_hex(),
            "0xc5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn test_keccak_many_matches_concatenation() {
        let joined = Digest::keccak(b"helloworld");
        let parts = Digest::keccak_many(&[b"hello", b"world"]);
        assert_eq!(joined, parts);
    }

    #[test]
    fn test_combine_sorted_is_symmetric() {
        let a = Digest::keccak(b"a");
        let b = Digest::keccak(b"b");
        assert_eq!(Digest::combine_sorted(&a, &b), Digest::combine_sorted(&b, &a));
        assert_ne!(Digest::combine(&a, &b), Digest::combine(&b, &a));
    }

    #[test]
    fn test_hex_format() {
        let d = Digest::keccak(b"test data");
        let hex = d.to_hex();
        assert!(hex.starts_with("0x"));
        assert_eq!(hex.len(), 66);
        assert_eq!(hex, hex.to_lowercase());
        assert_eq!(Digest::from_hex(&hex).unwrap(), d);
        assert_eq!(Digest::from_hex(&hex[2..]).unwrap(), d);
    }

    #[test]
    fn test_from_hex_rejects_short_input() {
        assert!(Digest::from_hex("0x1234").is_err());
    }
}
