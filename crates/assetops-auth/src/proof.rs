//! Signed verification proofs
//!
//! A successful verification yields a [`VerificationContext`] whose challenge
//! response is `<nonce>.<mac>`, where the MAC is HMAC-SHA256 over the wallet,
//! proof id, nonce and expiry. Proofs expire after the configured TTL and are
//! accepted exactly once.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;
use std::time::Duration;
use zeroize::Zeroizing;

use assetops_types::{ChallengeResponse, VerificationContext, VerificationId, WalletAddress};

use crate::config::ProofConfig;
use crate::error::{AuthError, AuthResult};
use crate::totp::constant_time_compare;

type HmacSha256 = Hmac<Sha256>;

/// Issues and redeems single-use verification proofs
pub struct ProofIssuer {
    key: Zeroizing<Vec<u8>>,
    ttl: Duration,
    /// Consumed proof ids with their expiry, pruned once expired
    consumed: DashMap<VerificationId, DateTime<Utc>>,
}

impl ProofIssuer {
    pub fn new(config: &ProofConfig) -> Self {
        let key = if config.signing_key.is_empty() {
            let mut bytes = vec![0u8; 32];
            rand::thread_rng().fill_bytes(&mut bytes);
            bytes
        } else {
            config.signing_key.as_bytes().to_vec()
        };

        Self {
            key: Zeroizing::new(key),
            ttl: config.ttl,
            consumed: DashMap::new(),
        }
    }

    /// Issue a fresh proof for `wallet`
    pub fn issue(&self, wallet: &WalletAddress) -> AuthResult<VerificationContext> {
        let ttl = chrono::Duration::from_std(self.ttl)
            .map_err(|e| AuthError::Internal(format!("Invalid proof ttl: {}", e)))?;
        let verification_id = VerificationId::new();
        let expires_at = Utc::now() + ttl;

        let mut nonce = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut nonce);
        let nonce = hex::encode(nonce);

        let mac = self.sign(wallet, &verification_id, &nonce, &expires_at)?;

        Ok(VerificationContext {
            wallet: wallet.clone(),
            challenge_response: ChallengeResponse::new(format!("{}.{}", nonce, mac)),
            verification_id: Some(verification_id),
            expires_at,
        })
    }

    /// Check that a proof is authentic, unexpired and unused
    pub fn verify(&self, context: &VerificationContext) -> AuthResult<()> {
        let id = context.verification_id.as_ref().ok_or(AuthError::ProofInvalid)?;
        let (nonce, mac) = context
            .challenge_response
            .expose()
            .split_once('.')
            .ok_or(AuthError::ProofInvalid)?;

        let expected = self.sign(&context.wallet, id, nonce, &context.expires_at)?;
        if !constant_time_compare(mac, &expected) {
            return Err(AuthError::ProofInvalid);
        }
        if context.is_expired() {
            return Err(AuthError::ProofExpired);
        }
        if self.consumed.contains_key(id) {
            return Err(AuthError::ProofConsumed);
        }
        Ok(())
    }

    /// Redeem a proof; a second redemption fails with [`AuthError::ProofConsumed`]
    pub fn consume(&self, context: &VerificationContext) -> AuthResult<()> {
        self.verify(context)?;
        self.prune();

        let id = context.verification_id.clone().ok_or(AuthError::ProofInvalid)?;
        match self.consumed.entry(id) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(AuthError::ProofConsumed),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(context.expires_at);
                Ok(())
            }
        }
    }

    fn prune(&self) {
        let now = Utc::now();
        self.consumed.retain(|_, expires_at| *expires_at > now);
    }

    fn sign(
        &self,
        wallet: &WalletAddress,
        id: &VerificationId,
        nonce: &str,
        expires_at: &DateTime<Utc>,
    ) -> AuthResult<String> {
        let mut mac =
            HmacSha256::new_from_slice(&self.key).map_err(|_| AuthError::CryptoError)?;
        mac.update(wallet.as_str().as_bytes());
        mac.update(b"|");
        mac.update(id.as_uuid().as_bytes());
        mac.update(b"|");
        mac.update(nonce.as_bytes());
        mac.update(b"|");
        mac.update(&expires_at.timestamp_millis().to_be_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }
}
