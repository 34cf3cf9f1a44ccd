//! Content identifier used as the storage key for records.
//!
//! # Invariants
//! - `DocumentHash::ZERO` is the "absent" sentinel and never a storage key.
//! - Text form is `0x` followed by 64 lowercase hex digits.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;

/// Byte length of a document hash.
pub const DOCUMENT_HASH_LEN: usize = 32;

/// Fixed-size document content identifier.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct DocumentHash([u8; DOCUMENT_HASH_LEN]);

impl DocumentHash {
    /// Sentinel meaning "no document".
    pub const ZERO: Self = Self([0u8; DOCUMENT_HASH_LEN]);

    pub const fn from_bytes(bytes: [u8; DOCUMENT_HASH_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; DOCUMENT_HASH_LEN] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; DOCUMENT_HASH_LEN]
    }

    /// Returns `None` for the sentinel, `Some(self)` otherwise.
    pub fn non_zero(self) -> Option<Self> {
        if self.is_zero() {
            None
        } else {
            Some(self)
        }
    }

    /// Parses `0x`-prefixed (or bare) hex text.
    pub fn from_hex(value: &str) -> Result<Self, HashParseError> {
        let trimmed = value.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        if digits.len() != DOCUMENT_HASH_LEN * 2 {
            return Err(HashParseError::InvalidLength(digits.len()));
        }

        let mut bytes = [0u8; DOCUMENT_HASH_LEN];
        hex::decode_to_slice(digits, &mut bytes)
            .map_err(|_| HashParseError::InvalidHex(trimmed.to_string()))?;
        Ok(Self(bytes))
    }

    /// Returns the canonical `0x`-prefixed lowercase hex form.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Decodes a raw storage blob.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, HashParseError> {
        let array: [u8; DOCUMENT_HASH_LEN] = bytes
            .try_into()
            .map_err(|_| HashParseError::InvalidLength(bytes.len() * 2))?;
        Ok(Self(array))
    }
}

impl Display for DocumentHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl Debug for DocumentHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "DocumentHash({self})")
    }
}

impl FromStr for DocumentHash {
    type Err = HashParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl From<[u8; DOCUMENT_HASH_LEN]> for DocumentHash {
    fn from(value: [u8; DOCUMENT_HASH_LEN]) -> Self {
        Self(value)
    }
}

impl Serialize for DocumentHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for DocumentHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::from_hex(&text).map_err(serde::de::Error::custom)
    }
}

/// Hash text parse errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HashParseError {
    /// Digit count is not 64.
    InvalidLength(usize),
    InvalidHex(String),
}

impl Display for HashParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidLength(digits) => write!(
                f,
                "document hash must have {} hex digits, got {digits}",
                DOCUMENT_HASH_LEN * 2
            ),
            Self::InvalidHex(value) => write!(f, "document hash is not valid hex: `{value}`"),
        }
    }
}

impl Error for HashParseError {}

#[cfg(test)]
mod tests {
    use super::{DocumentHash, HashParseError};

    const SAMPLE: &str = "0x1234567890abcdef1234567890abcdef1234567890abcdef1234567890abcdef";

    #[test]
    fn parses_prefixed_and_bare_hex() {
        let prefixed = DocumentHash::from_hex(SAMPLE).expect("prefixed parse");
        let bare = DocumentHash::from_hex(&SAMPLE[2..]).expect("bare parse");
        assert_eq!(prefixed, bare);
        assert_eq!(prefixed.to_string(), SAMPLE);
    }

    #[test]
    fn zero_hash_is_sentinel() {
        let zero = DocumentHash::from_hex(&format!("0x{}", "0".repeat(64))).expect("zero parse");
        assert!(zero.is_zero());
        assert_eq!(zero, DocumentHash::ZERO);
        assert_eq!(zero.non_zero(), None);
        assert_eq!(DocumentHash::default(), DocumentHash::ZERO);
    }

    #[test]
    fn rejects_short_and_non_hex_input() {
        assert_eq!(
            DocumentHash::from_hex("0x1234"),
            Err(HashParseError::InvalidLength(4))
        );
        let err = DocumentHash::from_hex(&format!("0x{}", "zz".repeat(32)))
            .expect_err("non-hex must fail");
        assert!(matches!(err, HashParseError::InvalidHex(_)));
    }

    #[test]
    fn serde_uses_hex_text() {
        let hash: DocumentHash = SAMPLE.parse().expect("parse");
        let json = serde_json::to_string(&hash).expect("serialize");
        assert_eq!(json, format!("\"{SAMPLE}\""));
        let back: DocumentHash = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, hash);
    }
}
