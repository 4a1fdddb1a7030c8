//! Identity types for AssetOps
//!
//! Ledger identities (wallets, contracts, transaction hashes) are hex strings
//! validated on construction and stored lowercase, so two spellings of the
//! same address always compare equal. Internal identifiers are strongly typed
//! wrappers around UUIDs to prevent accidental mixing of different ID types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::{OperationError, Result};

/// Macro to generate ID types with common implementations
macro_rules! define_id_type {
    ($name:ident, $prefix:literal, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new random ID
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Parse from a string (with or without prefix)
            pub fn parse(s: &str) -> std::result::Result<Self, uuid::Error> {
                let s = s.strip_prefix(concat!($prefix, "_")).unwrap_or(s);
                Ok(Self(Uuid::parse_str(s)?))
            }

            /// Get the inner UUID
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}_{}", $prefix, self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }
    };
}

define_id_type!(RequestId, "req", "Correlation identifier for one orchestrated request");
define_id_type!(VerificationId, "verif", "Identifier of an issued verification proof");

/// Macro to generate hex-encoded ledger identity types
macro_rules! define_hex_type {
    ($name:ident, $bytes:literal, $what:literal, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Parse and normalize a `0x`-prefixed hex string
            pub fn parse(s: &str) -> Result<Self> {
                let trimmed = s.trim();
                let hex = trimmed
                    .strip_prefix("0x")
                    .or_else(|| trimmed.strip_prefix("0X"))
                    .ok_or_else(|| OperationError::invalid_request(format!(
                        "{} must start with 0x: {}", $what, s
                    )))?;
                if hex.len() != $bytes * 2 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
                    return Err(OperationError::invalid_request(format!(
                        "{} must be {} hex characters: {}", $what, $bytes * 2, s
                    )));
                }
                Ok(Self(format!("0x{}", hex.to_ascii_lowercase())))
            }

            /// Build from raw bytes
            pub fn from_bytes(bytes: [u8; $bytes]) -> Self {
                let mut out = String::with_capacity(2 + $bytes * 2);
                out.push_str("0x");
                for b in bytes {
                    out.push_str(&format!("{:02x}", b));
                }
                Self(out)
            }

            /// The canonical lowercase string
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = OperationError;

            fn from_str(s: &str) -> Result<Self> {
                Self::parse(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = OperationError;

            fn try_from(s: String) -> Result<Self> {
                Self::parse(&s)
            }
        }

        impl From<$name> for String {
            fn from(v: $name) -> String {
                v.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_hex_type!(WalletAddress, 20, "wallet address", "Address of an externally owned wallet");
define_hex_type!(AssetAddress, 20, "asset address", "Address of an asset (or auxiliary) contract");
define_hex_type!(TxHash, 32, "transaction hash", "Hash of a submitted ledger transaction");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_is_normalized_to_lowercase() {
        let a = WalletAddress::parse("0xAbCdEf0123456789abcdef0123456789ABCDEF01").unwrap();
        let b = WalletAddress::parse("0xabcdef0123456789abcdef0123456789abcdef01").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "0xabcdef0123456789abcdef0123456789abcdef01");
    }

    #[test]
    fn test_address_rejects_bad_input() {
        assert!(WalletAddress::parse("abcdef0123456789abcdef0123456789abcdef01").is_err());
        assert!(WalletAddress::parse("0x1234").is_err());
        assert!(AssetAddress::parse("0xzzcdef0123456789abcdef0123456789abcdef01").is_err());
    }

    #[test]
    fn test_tx_hash_from_bytes() {
        let hash = TxHash::from_bytes([0xab; 32]);
        assert_eq!(hash.as_str().len(), 66);
        assert_eq!(TxHash::parse(hash.as_str()).unwrap(), hash);
    }

    #[test]
    fn test_serde_round_trip_validates() {
        let json = "\"0x00000000000000000000000000000000000000aa\"";
        let addr: AssetAddress = serde_json::from_str(json).unwrap();
        assert_eq!(serde_json::to_string(&addr).unwrap(), json);
        assert!(serde_json::from_str::<AssetAddress>("\"0x12\"").is_err());
    }

    #[test]
    fn test_request_id_prefix() {
        let id = RequestId::new();
        assert!(id.to_string().starts_with("req_"));
        assert_eq!(RequestId::parse(&id.to_string()).unwrap(), id);
    }
}
