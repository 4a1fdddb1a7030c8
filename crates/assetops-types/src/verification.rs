//! Verification proofs
//!
//! A [`VerificationContext`] authorizes exactly one pending write. It is
//! deliberately not `Clone`: whoever holds it consumes it.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

use crate::{VerificationId, WalletAddress};

/// Single-use proof the ledger accepts as authorization for a write
#[derive(Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ChallengeResponse(String);

impl ChallengeResponse {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ChallengeResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ChallengeResponse(<redacted>)")
    }
}

/// Proof produced by the verification gate for one wallet
#[derive(Debug)]
pub struct VerificationContext {
    pub wallet: WalletAddress,
    pub challenge_response: ChallengeResponse,
    pub verification_id: Option<VerificationId>,
    pub expires_at: DateTime<Utc>,
}

impl VerificationContext {
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    pub fn is_bound_to(&self, wallet: &WalletAddress) -> bool {
        &self.wallet == wallet
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_challenge_response_is_redacted() {
        let response = ChallengeResponse::new("deadbeef");
        assert!(!format!("{:?}", response).contains("deadbeef"));
        assert_eq!(response.expose(), "deadbeef");
    }

    #[test]
    fn test_context_expiry() {
        let wallet = WalletAddress::parse("0x1111111111111111111111111111111111111111").unwrap();
        let context = VerificationContext {
            wallet: wallet.clone(),
            challenge_response: ChallengeResponse::new("x"),
            verification_id: None,
            expires_at: Utc::now() - chrono::Duration::seconds(1),
        };
        assert!(context.is_expired());
        assert!(context.is_bound_to(&wallet));
    }
}
