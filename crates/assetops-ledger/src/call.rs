//! Contract call model
//!
//! A [`LedgerCall`] names a contract family, the function on it, the contract
//! it targets and positional arguments. Amounts are always integer base units.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use assetops_types::{AssetAddress, AssetType, BaseUnits, Role, WalletAddress};

/// Contract family exposing a set of entry points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContractFamily {
    Bond,
    CryptoCurrency,
    Equity,
    Fund,
    StableCoin,
    Deposit,
    /// Yield schedule attached to a bond
    FixedYield,
    /// Any fungible token (used for approvals)
    Erc20,
    /// Deploys yield schedules
    FixedYieldFactory,
    /// Deploys assets of one variant
    Factory(AssetType),
}

impl ContractFamily {
    /// Token contract family for an asset variant
    pub const fn for_asset(asset_type: AssetType) -> Self {
        match asset_type {
            AssetType::Bond => Self::Bond,
            AssetType::Cryptocurrency => Self::CryptoCurrency,
            AssetType::Equity => Self::Equity,
            AssetType::Fund => Self::Fund,
            AssetType::Stablecoin => Self::StableCoin,
            AssetType::Deposit => Self::Deposit,
        }
    }

    pub fn is_factory(&self) -> bool {
        matches!(self, Self::Factory(_) | Self::FixedYieldFactory)
    }
}

impl fmt::Display for ContractFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bond => f.write_str("Bond"),
            Self::CryptoCurrency => f.write_str("CryptoCurrency"),
            Self::Equity => f.write_str("Equity"),
            Self::Fund => f.write_str("Fund"),
            Self::StableCoin => f.write_str("StableCoin"),
            Self::Deposit => f.write_str("Deposit"),
            Self::FixedYield => f.write_str("FixedYield"),
            Self::Erc20 => f.write_str("ERC20"),
            Self::FixedYieldFactory => f.write_str("FixedYieldFactory"),
            Self::Factory(asset_type) => {
                write!(f, "{}Factory", Self::for_asset(*asset_type))
            }
        }
    }
}

/// Concrete ledger entry point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct CallSelector {
    pub family: ContractFamily,
    pub function: &'static str,
}

impl CallSelector {
    pub const fn new(family: ContractFamily, function: &'static str) -> Self {
        Self { family, function }
    }
}

impl fmt::Display for CallSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.family, self.function)
    }
}

/// Where a call is sent
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallTarget {
    /// A deployed contract
    Contract(AssetAddress),
    /// The ledger's well-known factory for the selector's family
    Factory,
}

/// Positional call argument
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum CallArg {
    Address(String),
    Units(BaseUnits),
    Role(Role),
    Uint(u64),
    Timestamp(DateTime<Utc>),
    Text(String),
}

impl From<&WalletAddress> for CallArg {
    fn from(wallet: &WalletAddress) -> Self {
        Self::Address(wallet.as_str().to_string())
    }
}

impl From<&AssetAddress> for CallArg {
    fn from(asset: &AssetAddress) -> Self {
        Self::Address(asset.as_str().to_string())
    }
}

impl From<BaseUnits> for CallArg {
    fn from(units: BaseUnits) -> Self {
        Self::Units(units)
    }
}

impl From<Role> for CallArg {
    fn from(role: Role) -> Self {
        Self::Role(role)
    }
}

/// A fully resolved ledger call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerCall {
    pub selector: CallSelector,
    pub target: CallTarget,
    pub args: Vec<CallArg>,
}

impl LedgerCall {
    /// Call on a deployed contract
    pub fn new(selector: CallSelector, contract: &AssetAddress) -> Self {
        Self {
            selector,
            target: CallTarget::Contract(contract.clone()),
            args: Vec::new(),
        }
    }

    /// Call on the family's factory
    pub fn factory(selector: CallSelector) -> Self {
        Self {
            selector,
            target: CallTarget::Factory,
            args: Vec::new(),
        }
    }

    /// Append an argument
    pub fn arg(mut self, arg: impl Into<CallArg>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn function(&self) -> &'static str {
        self.selector.function
    }

    pub fn contract(&self) -> Option<&AssetAddress> {
        match &self.target {
            CallTarget::Contract(address) => Some(address),
            CallTarget::Factory => None,
        }
    }
}

impl fmt::Display for LedgerCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.target {
            CallTarget::Contract(address) => write!(f, "{}@{}", self.selector, address),
            CallTarget::Factory => write!(f, "{}", self.selector),
        }
    }
}
