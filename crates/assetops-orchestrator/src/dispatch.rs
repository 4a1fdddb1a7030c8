//! Asset-type dispatcher
//!
//! One static table maps (asset variant, operation, leg) to the ledger entry
//! point. A pair with no entry is unsupported, whatever the payload. Composite
//! operations resolve every call they make here, one [`Leg`] per call.

use serde::Serialize;

use assetops_ledger::{CallSelector, ContractFamily};
use assetops_types::{AssetType, OperationError, OperationKind, Result};

/// Which call of an operation an entry point serves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Leg {
    /// The operation's own entry point on the asset contract or its factory
    Primary,
    /// Grant half of a role update
    Grant,
    /// Revoke half of a role update
    Revoke,
    /// `withdrawToken` for any token held by the asset
    Token,
    /// Entry point on the bond's yield-schedule contract
    YieldSchedule,
    /// Allowance on the underlying asset ahead of a top-up
    Approval,
}

impl Leg {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Grant => "grant",
            Self::Revoke => "revoke",
            Self::Token => "token",
            Self::YieldSchedule => "yield-schedule",
            Self::Approval => "approval",
        }
    }
}

/// One supported (variant, operation, leg) entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SupportEntry {
    pub asset_type: AssetType,
    pub operation: OperationKind,
    pub leg: Leg,
    pub selector: CallSelector,
}

const fn at(
    asset_type: AssetType,
    operation: OperationKind,
    leg: Leg,
    family: ContractFamily,
    function: &'static str,
) -> SupportEntry {
    SupportEntry {
        asset_type,
        operation,
        leg,
        selector: CallSelector::new(family, function),
    }
}

const fn entry(
    asset_type: AssetType,
    operation: OperationKind,
    function: &'static str,
) -> SupportEntry {
    at(asset_type, operation, Leg::Primary, ContractFamily::for_asset(asset_type), function)
}

const fn factory(asset_type: AssetType) -> SupportEntry {
    at(
        asset_type,
        OperationKind::Create,
        Leg::Primary,
        ContractFamily::Factory(asset_type),
        "create",
    )
}

/// Entry points shared by every variant
macro_rules! common_ops {
    ($t:expr) => {
        [
            factory($t),
            entry($t, Op::Mint, "mint"),
            entry($t, Op::Transfer, "transfer"),
            entry($t, Op::GrantRole, "grantRole"),
            entry($t, Op::RevokeRole, "revokeRole"),
            at($t, Op::UpdateRoles, Leg::Grant, ContractFamily::for_asset($t), "grantRole"),
            at($t, Op::UpdateRoles, Leg::Revoke, ContractFamily::for_asset($t), "revokeRole"),
            at($t, Op::Withdraw, Leg::Token, ContractFamily::for_asset($t), "withdrawToken"),
        ]
    };
}

use AssetType::{Bond, Cryptocurrency, Deposit, Equity, Fund, Stablecoin};
use ContractFamily::{Erc20, FixedYield, FixedYieldFactory};
use OperationKind as Op;

const CRYPTOCURRENCY: [SupportEntry; 8] = common_ops!(Cryptocurrency);

const BOND: [SupportEntry; 8] = common_ops!(Bond);
const BOND_EXTRA: [SupportEntry; 10] = [
    entry(Bond, Op::Burn, "burn"),
    entry(Bond, Op::BlockUser, "blockUser"),
    entry(Bond, Op::UnblockUser, "unblockUser"),
    entry(Bond, Op::Mature, "mature"),
    at(Bond, Op::SetYieldSchedule, Leg::Primary, FixedYieldFactory, "create"),
    entry(Bond, Op::TopUp, "topUpUnderlyingAsset"),
    at(Bond, Op::TopUp, Leg::YieldSchedule, FixedYield, "topUpUnderlyingAsset"),
    at(Bond, Op::TopUp, Leg::Approval, Erc20, "approve"),
    entry(Bond, Op::Withdraw, "withdrawUnderlyingAsset"),
    at(Bond, Op::Withdraw, Leg::YieldSchedule, FixedYield, "withdrawUnderlyingAsset"),
];

const EQUITY: [SupportEntry; 8] = common_ops!(Equity);
const EQUITY_EXTRA: [SupportEntry; 3] = [
    entry(Equity, Op::Burn, "burn"),
    entry(Equity, Op::BlockUser, "blockUser"),
    entry(Equity, Op::UnblockUser, "unblockUser"),
];

const FUND: [SupportEntry; 8] = common_ops!(Fund);
const FUND_EXTRA: [SupportEntry; 3] = [
    entry(Fund, Op::Burn, "burn"),
    entry(Fund, Op::BlockUser, "blockUser"),
    entry(Fund, Op::UnblockUser, "unblockUser"),
];

const STABLECOIN: [SupportEntry; 8] = common_ops!(Stablecoin);
const STABLECOIN_EXTRA: [SupportEntry; 7] = [
    entry(Stablecoin, Op::Burn, "burn"),
    entry(Stablecoin, Op::Freeze, "freeze"),
    entry(Stablecoin, Op::Pause, "pause"),
    entry(Stablecoin, Op::Unpause, "unpause"),
    entry(Stablecoin, Op::UpdateCollateral, "updateCollateral"),
    entry(Stablecoin, Op::BlockUser, "blockUser"),
    entry(Stablecoin, Op::UnblockUser, "unblockUser"),
];

const DEPOSIT: [SupportEntry; 8] = common_ops!(Deposit);
const DEPOSIT_EXTRA: [SupportEntry; 7] = [
    entry(Deposit, Op::Burn, "burn"),
    entry(Deposit, Op::Freeze, "freeze"),
    entry(Deposit, Op::Pause, "pause"),
    entry(Deposit, Op::Unpause, "unpause"),
    entry(Deposit, Op::UpdateCollateral, "updateCollateral"),
    entry(Deposit, Op::AllowUser, "allowUser"),
    entry(Deposit, Op::DisallowUser, "disallowUser"),
];

/// Every supported entry point. (variant, operation, leg) is unique.
pub static SUPPORT_TABLE: &[&[SupportEntry]] = &[
    &BOND,
    &BOND_EXTRA,
    &CRYPTOCURRENCY,
    &EQUITY,
    &EQUITY_EXTRA,
    &FUND,
    &FUND_EXTRA,
    &STABLECOIN,
    &STABLECOIN_EXTRA,
    &DEPOSIT,
    &DEPOSIT_EXTRA,
];

fn entries() -> impl Iterator<Item = &'static SupportEntry> {
    SUPPORT_TABLE.iter().flat_map(|group| group.iter())
}

/// Every entry point of `operation` on `asset_type`, in [`Leg`] order
pub fn entries_for(asset_type: AssetType, operation: OperationKind) -> Vec<SupportEntry> {
    let mut found: Vec<SupportEntry> = entries()
        .filter(|e| e.asset_type == asset_type && e.operation == operation)
        .copied()
        .collect();
    found.sort_by_key(|e| e.leg);
    found
}

/// Leading entry point for `operation` on an asset of `asset_type`
///
/// This is the support check: any leg makes the pair supported.
pub fn selector_for(asset_type: AssetType, operation: OperationKind) -> Result<CallSelector> {
    entries_for(asset_type, operation)
        .first()
        .map(|e| e.selector)
        .ok_or(OperationError::UnsupportedOperation {
            asset_type,
            operation,
        })
}

/// Entry point for one `leg` of `operation`
pub fn entry_point(
    asset_type: AssetType,
    operation: OperationKind,
    leg: Leg,
) -> Result<CallSelector> {
    entries()
        .find(|e| e.asset_type == asset_type && e.operation == operation && e.leg == leg)
        .map(|e| e.selector)
        .ok_or(OperationError::UnsupportedOperation {
            asset_type,
            operation,
        })
}

pub fn is_supported(asset_type: AssetType, operation: OperationKind) -> bool {
    selector_for(asset_type, operation).is_ok()
}

/// Supported operations per variant, in [`OperationKind::ALL`] order
pub fn support_matrix() -> Vec<(AssetType, Vec<OperationKind>)> {
    AssetType::ALL
        .iter()
        .map(|asset_type| {
            let operations = OperationKind::ALL
                .iter()
                .copied()
                .filter(|op| is_supported(*asset_type, *op))
                .collect();
            (*asset_type, operations)
        })
        .collect()
}
