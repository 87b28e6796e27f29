use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::EncodingError;

/// 256-bit digest linking ledger entries into a chain.
///
/// Every entry stores the digest of its predecessor and its own digest. The
/// first entry's predecessor is [`EntryHash::GENESIS`]. Digests serialize as
/// lowercase hex so persisted rows stay readable by auditors.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryHash([u8; 32]);

impl EntryHash {
    /// Predecessor of the first entry in every chain: 32 zero bytes.
    ///
    /// Fixed at compile time and never derived from any entry.
    pub const GENESIS: Self = Self([0u8; 32]);

    /// Wrap a pre-computed digest.
    pub const fn from_hash(hash: [u8; 32]) -> Self {
        Self(hash)
    }

    /// Returns `true` if this is the genesis constant.
    pub fn is_genesis(&self) -> bool {
        *self == Self::GENESIS
    }

    /// The raw 32-byte digest.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Hex-encoded string representation.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short hex representation (first 8 characters).
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }

    /// Parse from a hex string.
    pub fn from_hex(s: &str) -> Result<Self, EncodingError> {
        let bytes = hex::decode(s).map_err(|e| EncodingError::InvalidHex(e.to_string()))?;
        if bytes.len() != 32 {
            return Err(EncodingError::InvalidLength {
                expected: 32,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl fmt::Debug for EntryHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntryHash({})", self.short_hex())
    }
}

impl fmt::Display for EntryHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl From<[u8; 32]> for EntryHash {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl Serialize for EntryHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for EntryHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn genesis_is_all_zeros() {
        assert!(EntryHash::GENESIS.is_genesis());
        assert_eq!(EntryHash::GENESIS.as_bytes(), &[0u8; 32]);
        assert_eq!(EntryHash::GENESIS.to_hex(), "0".repeat(64));
    }

    #[test]
    fn hex_roundtrip() {
        let hash = EntryHash::from_hash([0xab; 32]);
        let parsed = EntryHash::from_hex(&hash.to_hex()).unwrap();
        assert_eq!(hash, parsed);
    }

    #[test]
    fn from_hex_rejects_wrong_length() {
        let err = EntryHash::from_hex("abcd").unwrap_err();
        assert_eq!(
            err,
            EncodingError::InvalidLength {
                expected: 32,
                actual: 2
            }
        );
    }

    #[test]
    fn from_hex_rejects_garbage() {
        assert!(matches!(
            EntryHash::from_hex("zz"),
            Err(EncodingError::InvalidHex(_))
        ));
    }

    #[test]
    fn serializes_as_hex_string() {
        let hash = EntryHash::from_hash([1; 32]);
        let json = serde_json::to_string(&hash).unwrap();
        assert_eq!(json, format!("\"{}\"", "01".repeat(32)));
        let parsed: EntryHash = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, hash);
    }

    #[test]
    fn short_hex_is_8_chars() {
        assert_eq!(EntryHash::from_hash([7; 32]).short_hex().len(), 8);
    }
}
