//! Access control guard
//!
//! Runs before anything else touches the request: the caller must be the
//! request's actor and hold the capability for its operation kind.

use assetops_auth::{AuthenticatedCaller, Capability};
use assetops_types::{OperationError, OperationKind, Result, WalletAddress};
use tracing::warn;

/// Check that `caller` may run `kind` on behalf of `actor`
pub fn authorize(
    caller: &AuthenticatedCaller,
    actor: &WalletAddress,
    kind: OperationKind,
) -> Result<()> {
    if &caller.wallet != actor {
        warn!(caller = %caller.wallet, actor = %actor, "Caller is not the request actor");
        return Err(OperationError::PermissionDenied {
            operation: kind,
            capability: format!("wallet {}", actor),
        });
    }

    caller.permissions.require(kind).map_err(|err| {
        warn!(
            caller = %caller.wallet,
            operation = %kind,
            capability = %Capability::for_operation(kind),
            "Permission denied"
        );
        err
    })
}
