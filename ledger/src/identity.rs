//! Actor identities.
//!
//! An identity is an opaque 20-byte, public-key-derived address. The ledger
//! uses it only as a map key and as the subject of authorization checks;
//! key custody and signing live in the external wallet layer.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identity([u8; 20]);

#[derive(Debug, Error)]
pub enum ParseIdentityError {
    #[error("identity must be 0x-prefixed hex")]
    MissingPrefix,

    #[error("identity must encode exactly 20 bytes")]
    BadLength,

    #[error("invalid hex: {0}")]
    BadHex(#[from] hex::FromHexError),
}

impl Identity {
    /// The all-zero identity. Valid as a map key, never as a grant target.
    pub const NULL: Identity = Identity([0u8; 20]);

    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn is_null(&self) -> bool {
        *self == Self::NULL
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identity({self})")
    }
}

impl FromStr for Identity {
    type Err = ParseIdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex_part = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .ok_or(ParseIdentityError::MissingPrefix)?;

        let bytes = hex::decode(hex_part)?;
        let bytes: [u8; 20] = bytes
            .try_into()
            .map_err(|_| ParseIdentityError::BadLength)?;

        Ok(Self(bytes))
    }
}

impl Serialize for Identity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Identity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_parse_roundtrip() {
        let id = Identity::from_bytes([0xab; 20]);
        let text = id.to_string();
        assert!(text.starts_with("0x"));
        assert_eq!(text.parse::<Identity>().unwrap(), id);
    }

    #[test]
    fn null_identity_is_detected() {
        assert!(Identity::NULL.is_null());
        assert!(!Identity::from_bytes([1; 20]).is_null());
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(matches!(
            "abcd".parse::<Identity>(),
            Err(ParseIdentityError::MissingPrefix)
        ));
        assert!(matches!(
            "0xabcd".parse::<Identity>(),
            Err(ParseIdentityError::BadLength)
        ));
        assert!("0xzz".repeat(10).parse::<Identity>().is_err());
    }
}
