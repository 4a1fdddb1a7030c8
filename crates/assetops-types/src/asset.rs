//! Asset variants
//!
//! Every tokenized instrument belongs to exactly one variant. The variant
//! decides which contract family an operation is routed to and which
//! operations are available at all.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{OperationError, Result};

/// Maximum decimal precision an asset may declare
pub const MAX_DECIMALS: u8 = 18;

/// Asset variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetType {
    Bond,
    Cryptocurrency,
    Equity,
    Fund,
    Stablecoin,
    Deposit,
}

impl AssetType {
    /// All variants, in display order
    pub const ALL: [AssetType; 6] = [
        AssetType::Bond,
        AssetType::Cryptocurrency,
        AssetType::Equity,
        AssetType::Fund,
        AssetType::Stablecoin,
        AssetType::Deposit,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bond => "bond",
            Self::Cryptocurrency => "cryptocurrency",
            Self::Equity => "equity",
            Self::Fund => "fund",
            Self::Stablecoin => "stablecoin",
            Self::Deposit => "deposit",
        }
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetType {
    type Err = OperationError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bond" => Ok(Self::Bond),
            "cryptocurrency" => Ok(Self::Cryptocurrency),
            "equity" => Ok(Self::Equity),
            "fund" => Ok(Self::Fund),
            "stablecoin" => Ok(Self::Stablecoin),
            "deposit" | "tokenizeddeposit" => Ok(Self::Deposit),
            other => Err(OperationError::invalid_request(format!(
                "unknown asset type: {}",
                other
            ))),
        }
    }
}

/// Off-chain metadata stored next to an asset contract
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetMetadata {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    /// ISIN or other instrument identifier, when the variant has one
    pub isin: Option<String>,
    /// Free-form attributes (e.g. fund category, equity class)
    #[serde(default)]
    pub attributes: serde_json::Map<String, serde_json::Value>,
}
