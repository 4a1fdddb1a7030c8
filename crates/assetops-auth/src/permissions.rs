//! Capabilities and caller permissions
//!
//! Every operation kind maps to exactly one capability. A caller holding
//! [`Capability::Admin`] holds all of them.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use assetops_types::{OperationError, OperationKind, WalletAddress};

/// Capability required to run an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    #[serde(rename = "asset:mint")]
    Mint,
    #[serde(rename = "asset:burn")]
    Burn,
    #[serde(rename = "asset:transfer")]
    Transfer,
    #[serde(rename = "asset:manage")]
    Manage,
    #[serde(rename = "asset:users")]
    Users,
    #[serde(rename = "asset:roles")]
    Roles,
    #[serde(rename = "asset:create")]
    Create,
    #[serde(rename = "admin")]
    Admin,
}

impl Capability {
    pub const ALL: [Capability; 8] = [
        Capability::Mint,
        Capability::Burn,
        Capability::Transfer,
        Capability::Manage,
        Capability::Users,
        Capability::Roles,
        Capability::Create,
        Capability::Admin,
    ];

    /// The capability an operation kind requires
    pub fn for_operation(kind: OperationKind) -> Self {
        match kind {
            OperationKind::Create => Self::Create,
            OperationKind::Mint => Self::Mint,
            OperationKind::Burn => Self::Burn,
            OperationKind::Transfer | OperationKind::Withdraw => Self::Transfer,
            OperationKind::Freeze
            | OperationKind::Pause
            | OperationKind::Unpause
            | OperationKind::UpdateCollateral
            | OperationKind::Mature
            | OperationKind::SetYieldSchedule
            | OperationKind::TopUp => Self::Manage,
            OperationKind::BlockUser
            | OperationKind::UnblockUser
            | OperationKind::AllowUser
            | OperationKind::DisallowUser => Self::Users,
            OperationKind::GrantRole | OperationKind::RevokeRole | OperationKind::UpdateRoles => {
                Self::Roles
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mint => "asset:mint",
            Self::Burn => "asset:burn",
            Self::Transfer => "asset:transfer",
            Self::Manage => "asset:manage",
            Self::Users => "asset:users",
            Self::Roles => "asset:roles",
            Self::Create => "asset:create",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Capability {
    type Err = OperationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| OperationError::invalid_request(format!("unknown capability: {}", s)))
    }
}

/// Set of capabilities granted to a caller
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permissions(HashSet<Capability>);

impl Permissions {
    pub fn new(capabilities: impl IntoIterator<Item = Capability>) -> Self {
        Self(capabilities.into_iter().collect())
    }

    pub fn admin() -> Self {
        Self::new([Capability::Admin])
    }

    pub fn grant(&mut self, capability: Capability) {
        self.0.insert(capability);
    }

    /// Whether the set holds `capability`, directly or through admin
    pub fn has(&self, capability: Capability) -> bool {
        self.0.contains(&capability) || self.0.contains(&Capability::Admin)
    }

    /// Fail with `PermissionDenied` unless `kind` is allowed
    pub fn require(&self, kind: OperationKind) -> Result<(), OperationError> {
        let capability = Capability::for_operation(kind);
        if self.has(capability) {
            Ok(())
        } else {
            Err(OperationError::PermissionDenied {
                operation: kind,
                capability: capability.to_string(),
            })
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Capability> {
        self.0.iter()
    }
}

/// Caller identity as established by the session layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticatedCaller {
    pub wallet: WalletAddress,
    pub permissions: Permissions,
}

impl AuthenticatedCaller {
    pub fn new(wallet: WalletAddress, permissions: Permissions) -> Self {
        Self { wallet, permissions }
    }

    pub fn is_admin(&self) -> bool {
        self.permissions.has(Capability::Admin)
    }
}
