//! Operation requests
//!
//! An [`OperationRequest`] is the normalized input the presentation layer hands
//! to the orchestrator. It is immutable once built: the operation kind is
//! derived from the payload so the two can never disagree.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{
    AssetAddress, AssetMetadata, AssetType, OperationError, Result, Role, RoleSet, WalletAddress,
};

/// Abstract state-changing operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OperationKind {
    Create,
    Mint,
    Burn,
    Transfer,
    Freeze,
    Pause,
    Unpause,
    BlockUser,
    UnblockUser,
    AllowUser,
    DisallowUser,
    GrantRole,
    RevokeRole,
    UpdateRoles,
    UpdateCollateral,
    Withdraw,
    Mature,
    SetYieldSchedule,
    TopUp,
}

impl OperationKind {
    pub const ALL: [OperationKind; 19] = [
        OperationKind::Create,
        OperationKind::Mint,
        OperationKind::Burn,
        OperationKind::Transfer,
        OperationKind::Freeze,
        OperationKind::Pause,
        OperationKind::Unpause,
        OperationKind::BlockUser,
        OperationKind::UnblockUser,
        OperationKind::AllowUser,
        OperationKind::DisallowUser,
        OperationKind::GrantRole,
        OperationKind::RevokeRole,
        OperationKind::UpdateRoles,
        OperationKind::UpdateCollateral,
        OperationKind::Withdraw,
        OperationKind::Mature,
        OperationKind::SetYieldSchedule,
        OperationKind::TopUp,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Mint => "mint",
            Self::Burn => "burn",
            Self::Transfer => "transfer",
            Self::Freeze => "freeze",
            Self::Pause => "pause",
            Self::Unpause => "unpause",
            Self::BlockUser => "block-user",
            Self::UnblockUser => "unblock-user",
            Self::AllowUser => "allow-user",
            Self::DisallowUser => "disallow-user",
            Self::GrantRole => "grant-role",
            Self::RevokeRole => "revoke-role",
            Self::UpdateRoles => "update-roles",
            Self::UpdateCollateral => "update-collateral",
            Self::Withdraw => "withdraw",
            Self::Mature => "mature",
            Self::SetYieldSchedule => "set-yield-schedule",
            Self::TopUp => "top-up",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationKind {
    type Err = OperationError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == wanted)
            .ok_or_else(|| OperationError::invalid_request(format!("unknown operation: {}", s)))
    }
}

/// Second-factor method the user authenticates the write with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VerificationType {
    Pincode,
    TwoFactor,
    SecretCode,
}

impl fmt::Display for VerificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pincode => write!(f, "pincode"),
            Self::TwoFactor => write!(f, "two-factor"),
            Self::SecretCode => write!(f, "secret-code"),
        }
    }
}

/// Raw verification code as typed by the user
#[derive(Clone, Serialize, Deserialize)]
pub struct VerificationCode {
    pub code: String,
    pub kind: VerificationType,
}

impl VerificationCode {
    pub fn new(code: impl Into<String>, kind: VerificationType) -> Self {
        Self {
            code: code.into(),
            kind,
        }
    }

    pub fn pincode(code: impl Into<String>) -> Self {
        Self::new(code, VerificationType::Pincode)
    }

    pub fn two_factor(code: impl Into<String>) -> Self {
        Self::new(code, VerificationType::TwoFactor)
    }

    pub fn secret_code(code: impl Into<String>) -> Self {
        Self::new(code, VerificationType::SecretCode)
    }
}

impl fmt::Debug for VerificationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerificationCode")
            .field("code", &"<redacted>")
            .field("kind", &self.kind)
            .finish()
    }
}

/// Which contract a bond withdrawal or top-up targets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "target", rename_all = "kebab-case")]
pub enum WithdrawTarget {
    /// Underlying asset held by the bond contract itself
    Bond { underlying: AssetAddress },
    /// Underlying asset held by the bond's yield-schedule contract
    YieldSchedule {
        schedule: AssetAddress,
        underlying: AssetAddress,
    },
    /// Any token held by the asset contract
    Token { token: AssetAddress },
}

impl WithdrawTarget {
    /// The asset whose precision scales the amount
    pub fn precision_asset(&self) -> &AssetAddress {
        match self {
            Self::Bond { underlying } => underlying,
            Self::YieldSchedule { underlying, .. } => underlying,
            Self::Token { token } => token,
        }
    }
}

/// Contract receiving a bond top-up
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "target", rename_all = "kebab-case")]
pub enum TopUpTarget {
    Bond,
    YieldSchedule { schedule: AssetAddress },
}

/// Operation-specific arguments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "kebab-case")]
pub enum OperationPayload {
    Mint {
        to: WalletAddress,
        amount: String,
    },
    Burn {
        amount: String,
        /// Caller-supplied upper bound, e.g. the current balance
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ceiling: Option<String>,
    },
    Transfer {
        to: WalletAddress,
        amount: String,
        /// Caller-supplied upper bound, e.g. the current balance
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ceiling: Option<String>,
    },
    /// Sets the frozen part of `user`'s balance; zero lifts the freeze
    Freeze {
        user: WalletAddress,
        amount: String,
        /// Caller-supplied upper bound, e.g. the current balance
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ceiling: Option<String>,
    },
    Pause,
    Unpause,
    BlockUser {
        user: WalletAddress,
    },
    UnblockUser {
        user: WalletAddress,
    },
    AllowUser {
        user: WalletAddress,
    },
    DisallowUser {
        user: WalletAddress,
    },
    GrantRole {
        account: WalletAddress,
        roles: Vec<Role>,
    },
    RevokeRole {
        account: WalletAddress,
        roles: Vec<Role>,
    },
    UpdateRoles {
        account: WalletAddress,
        desired: RoleSet,
        current: RoleSet,
    },
    /// Proven collateral; zero is a valid claim
    UpdateCollateral {
        amount: String,
    },
    Withdraw {
        to: WalletAddress,
        amount: String,
        #[serde(flatten)]
        target: WithdrawTarget,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ceiling: Option<String>,
    },
    Mature,
    SetYieldSchedule {
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        /// Yield rate in basis points per interval
        rate_bps: u32,
        interval_secs: u64,
    },
    TopUp {
        amount: String,
        underlying: AssetAddress,
        #[serde(flatten)]
        target: TopUpTarget,
        /// Underlying balance available to the operator
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ceiling: Option<String>,
    },
}

impl OperationPayload {
    /// The operation this payload describes
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::Mint { .. } => OperationKind::Mint,
            Self::Burn { .. } => OperationKind::Burn,
            Self::Transfer { .. } => OperationKind::Transfer,
            Self::Freeze { .. } => OperationKind::Freeze,
            Self::Pause => OperationKind::Pause,
            Self::Unpause => OperationKind::Unpause,
            Self::BlockUser { .. } => OperationKind::BlockUser,
            Self::UnblockUser { .. } => OperationKind::UnblockUser,
            Self::AllowUser { .. } => OperationKind::AllowUser,
            Self::DisallowUser { .. } => OperationKind::DisallowUser,
            Self::GrantRole { .. } => OperationKind::GrantRole,
            Self::RevokeRole { .. } => OperationKind::RevokeRole,
            Self::UpdateRoles { .. } => OperationKind::UpdateRoles,
            Self::UpdateCollateral { .. } => OperationKind::UpdateCollateral,
            Self::Withdraw { .. } => OperationKind::Withdraw,
            Self::Mature => OperationKind::Mature,
            Self::SetYieldSchedule { .. } => OperationKind::SetYieldSchedule,
            Self::TopUp { .. } => OperationKind::TopUp,
        }
    }
}

/// A normalized request to run one operation against one asset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationRequest {
    asset_type: AssetType,
    asset_address: AssetAddress,
    actor: WalletAddress,
    verification: VerificationCode,
    payload: OperationPayload,
}

impl OperationRequest {
    pub fn new(
        asset_type: AssetType,
        asset_address: AssetAddress,
        actor: WalletAddress,
        verification: VerificationCode,
        payload: OperationPayload,
    ) -> Self {
        Self {
            asset_type,
            asset_address,
            actor,
            verification,
            payload,
        }
    }

    pub fn kind(&self) -> OperationKind {
        self.payload.kind()
    }

    pub fn asset_type(&self) -> AssetType {
        self.asset_type
    }

    pub fn asset_address(&self) -> &AssetAddress {
        &self.asset_address
    }

    pub fn actor(&self) -> &WalletAddress {
        &self.actor
    }

    pub fn verification(&self) -> &VerificationCode {
        &self.verification
    }

    pub fn payload(&self) -> &OperationPayload {
        &self.payload
    }
}

/// Variant-specific creation parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AssetParams {
    Bond {
        /// Maximum supply as a human decimal amount
        cap: String,
        /// Face value per bond in the underlying asset
        face_value: String,
        maturity_date: DateTime<Utc>,
        underlying: AssetAddress,
    },
    Cryptocurrency {
        initial_supply: String,
    },
    Equity {
        class: String,
        category: String,
    },
    Fund {
        class: String,
        category: String,
        management_fee_bps: u16,
    },
    Stablecoin {
        collateral_liveness_secs: u64,
    },
    Deposit {
        collateral_liveness_secs: u64,
    },
}

impl AssetParams {
    pub fn asset_type(&self) -> AssetType {
        match self {
            Self::Bond { .. } => AssetType::Bond,
            Self::Cryptocurrency { .. } => AssetType::Cryptocurrency,
            Self::Equity { .. } => AssetType::Equity,
            Self::Fund { .. } => AssetType::Fund,
            Self::Stablecoin { .. } => AssetType::Stablecoin,
            Self::Deposit { .. } => AssetType::Deposit,
        }
    }
}

/// An administrator to enroll on a freshly created asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitialAdmin {
    pub wallet: WalletAddress,
    pub roles: RoleSet,
}

/// Request to deploy a new asset contract
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAssetRequest {
    pub actor: WalletAddress,
    pub verification: VerificationCode,
    pub metadata: AssetMetadata,
    pub params: AssetParams,
    #[serde(default)]
    pub initial_admins: Vec<InitialAdmin>,
}

impl CreateAssetRequest {
    pub fn asset_type(&self) -> AssetType {
        self.params.asset_type()
    }
}
