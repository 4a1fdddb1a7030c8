//! Access-control roles on asset contracts
//!
//! A [`RoleSet`] always carries every known role, so the "desired" and
//! "current" sets of a role update can be diffed key by key without having to
//! decide what a missing key means.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::{OperationError, Result};

/// Role defined by the asset contracts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    DefaultAdminRole,
    SupplyManagementRole,
    UserManagementRole,
    AuditorRole,
}

impl Role {
    pub const ALL: [Role; 4] = [
        Role::DefaultAdminRole,
        Role::SupplyManagementRole,
        Role::UserManagementRole,
        Role::AuditorRole,
    ];

    /// Name used on the ledger
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DefaultAdminRole => "DEFAULT_ADMIN_ROLE",
            Self::SupplyManagementRole => "SUPPLY_MANAGEMENT_ROLE",
            Self::UserManagementRole => "USER_MANAGEMENT_ROLE",
            Self::AuditorRole => "AUDITOR_ROLE",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = OperationError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_uppercase();
        Self::ALL
            .iter()
            .copied()
            .find(|r| r.as_str() == wanted)
            .ok_or_else(|| OperationError::invalid_request(format!("unknown role: {}", s)))
    }
}

/// Complete role assignment for one account
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RoleSet(BTreeMap<Role, bool>);

impl RoleSet {
    /// A set with every role off
    pub fn none() -> Self {
        Self(Role::ALL.iter().map(|r| (*r, false)).collect())
    }

    /// A set with every role on
    pub fn all() -> Self {
        Self(Role::ALL.iter().map(|r| (*r, true)).collect())
    }

    /// A set with exactly the given roles on
    pub fn from_roles(roles: impl IntoIterator<Item = Role>) -> Self {
        let mut set = Self::none();
        for role in roles {
            set.0.insert(role, true);
        }
        set
    }

    pub fn set(&mut self, role: Role, enabled: bool) {
        self.0.insert(role, enabled);
    }

    pub fn with(mut self, role: Role, enabled: bool) -> Self {
        self.set(role, enabled);
        self
    }

    pub fn has(&self, role: Role) -> bool {
        self.0.get(&role).copied().unwrap_or(false)
    }

    /// Roles that are on, in role order
    pub fn enabled(&self) -> Vec<Role> {
        self.0.iter().filter(|(_, on)| **on).map(|(r, _)| *r).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Role, bool)> + '_ {
        self.0.iter().map(|(r, on)| (*r, *on))
    }

    /// Compute the grants and revocations that turn `current` into `desired`
    pub fn diff(desired: &RoleSet, current: &RoleSet) -> RoleDiff {
        let mut grant = Vec::new();
        let mut revoke = Vec::new();
        for role in Role::ALL {
            match (desired.has(role), current.has(role)) {
                (true, false) => grant.push(role),
                (false, true) => revoke.push(role),
                _ => {}
            }
        }
        RoleDiff { grant, revoke }
    }
}

impl Default for RoleSet {
    fn default() -> Self {
        Self::none()
    }
}

// Partial maps are completed with `false` so the invariant holds after decoding
impl<'de> Deserialize<'de> for RoleSet {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let given = BTreeMap::<Role, bool>::deserialize(deserializer)?;
        let mut set = RoleSet::none();
        for (role, on) in given {
            set.set(role, on);
        }
        Ok(set)
    }
}

/// Result of diffing two role sets
///
/// `grant` and `revoke` are disjoint by construction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleDiff {
    pub grant: Vec<Role>,
    pub revoke: Vec<Role>,
}

impl RoleDiff {
    pub fn is_empty(&self) -> bool {
        self.grant.is_empty() && self.revoke.is_empty()
    }

    /// Number of ledger calls the diff translates into
    pub fn call_count(&self) -> usize {
        self.grant.len() + self.revoke.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_set_is_always_complete() {
        let set = RoleSet::from_roles([Role::AuditorRole]);
        assert_eq!(set.iter().count(), Role::ALL.len());
        assert!(set.has(Role::AuditorRole));
        assert!(!set.has(Role::DefaultAdminRole));
    }

    #[test]
    fn test_diff_grant_and_revoke() {
        let desired = RoleSet::none()
            .with(Role::SupplyManagementRole, true)
            .with(Role::AuditorRole, false);
        let current = RoleSet::none()
            .with(Role::SupplyManagementRole, false)
            .with(Role::AuditorRole, true);

        let diff = RoleSet::diff(&desired, &current);
        assert_eq!(diff.grant, vec![Role::SupplyManagementRole]);
        assert_eq!(diff.revoke, vec![Role::AuditorRole]);
        assert!(diff.grant.iter().all(|r| !diff.revoke.contains(r)));
        assert_eq!(diff.call_count(), 2);
    }

    #[test]
    fn test_diff_of_equal_sets_is_empty() {
        let set = RoleSet::all();
        assert!(RoleSet::diff(&set, &set).is_empty());
    }

    #[test]
    fn test_partial_json_is_completed() {
        let set: RoleSet = serde_json::from_str(r#"{"AUDITOR_ROLE": true}"#).unwrap();
        assert!(set.has(Role::AuditorRole));
        assert_eq!(set.iter().count(), Role::ALL.len());
    }

    #[test]
    fn test_role_parse() {
        assert_eq!("supply_management_role".parse::<Role>().unwrap(), Role::SupplyManagementRole);
        assert!("MINTER".parse::<Role>().is_err());
    }
}
