//! Verification gate
//!
//! Turns a user-supplied code into a single-use [`VerificationContext`]. The
//! orchestrator only sees the [`VerificationService`] trait; [`VerificationGate`]
//! is the implementation backed by a [`CredentialStore`].

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

use assetops_types::{VerificationCode, VerificationContext, VerificationType, WalletAddress};

use crate::config::VerificationConfig;
use crate::error::{AuthError, AuthResult};
use crate::lockout::LockoutTracker;
use crate::pincode::PincodeService;
use crate::proof::ProofIssuer;
use crate::secret_code::SecretCodeService;
use crate::store::{CredentialStore, InMemoryCredentialStore};
use crate::totp::{TotpService, TotpSetup};

/// Authorization seam used by the orchestrator
#[async_trait]
pub trait VerificationService: Send + Sync {
    /// Check `code` for `wallet` and issue a proof for one pending write
    async fn authorize(
        &self,
        wallet: &WalletAddress,
        code: &VerificationCode,
    ) -> AuthResult<VerificationContext>;

    /// Redeem a proof right before the write it authorizes
    async fn consume(&self, context: &VerificationContext) -> AuthResult<()>;
}

/// Verification gate over stored PIN, TOTP and secret-code credentials
pub struct VerificationGate {
    store: Arc<dyn CredentialStore>,
    pincode: PincodeService,
    totp: TotpService,
    secret_codes: SecretCodeService,
    lockout: LockoutTracker,
    proofs: ProofIssuer,
    /// TOTP counters already accepted per wallet
    used_totp: DashMap<(WalletAddress, u64), ()>,
}

impl VerificationGate {
    pub fn new(config: VerificationConfig, store: Arc<dyn CredentialStore>) -> Self {
        Self {
            store,
            pincode: PincodeService::new(config.pincode.clone()),
            totp: TotpService::new(config.totp.clone()),
            secret_codes: SecretCodeService::new(config.secret_code.clone()),
            lockout: LockoutTracker::new(config.lockout.clone()),
            proofs: ProofIssuer::new(&config.proof),
            used_totp: DashMap::new(),
        }
    }

    /// Gate backed by an [`InMemoryCredentialStore`]
    pub fn in_memory(config: VerificationConfig) -> Self {
        Self::new(config, Arc::new(InMemoryCredentialStore::new()))
    }

    pub fn totp(&self) -> &TotpService {
        &self.totp
    }

    pub fn lockout(&self) -> &LockoutTracker {
        &self.lockout
    }

    // =========================================================================
    // Enrollment
    // =========================================================================

    /// Store a new PIN code for `wallet`
    pub async fn enroll_pincode(&self, wallet: &WalletAddress, pincode: &str) -> AuthResult<()> {
        let hash = self.pincode.hash_pincode(pincode)?;
        self.store.set_pincode_hash(wallet, hash).await?;
        tracing::info!(wallet = %wallet, "PIN code enrolled");
        Ok(())
    }

    /// Generate and store a TOTP secret; the setup is returned once
    pub async fn enroll_two_factor(&self, wallet: &WalletAddress) -> AuthResult<TotpSetup> {
        let setup = self.totp.generate_setup(wallet.as_str())?;
        self.store.set_totp_secret(wallet, setup.secret.clone()).await?;
        tracing::info!(wallet = %wallet, "Two-factor enrolled");
        Ok(setup)
    }

    /// Generate a fresh batch of secret codes, replacing any previous batch
    pub async fn enroll_secret_codes(&self, wallet: &WalletAddress) -> AuthResult<Vec<String>> {
        let codes = self.secret_codes.generate_codes();
        let hashes = codes.iter().map(|c| self.secret_codes.hash_code(c)).collect();
        self.store.set_secret_code_hashes(wallet, hashes).await?;
        tracing::info!(wallet = %wallet, count = codes.len(), "Secret codes enrolled");
        Ok(codes)
    }

    // =========================================================================
    // Code checks
    // =========================================================================

    async fn check_code(&self, wallet: &WalletAddress, code: &VerificationCode) -> AuthResult<()> {
        match code.kind {
            VerificationType::Pincode => self.check_pincode(wallet, &code.code).await,
            VerificationType::TwoFactor => self.check_totp(wallet, code.code.trim()).await,
            VerificationType::SecretCode => self.check_secret_code(wallet, &code.code).await,
        }
    }

    async fn check_pincode(&self, wallet: &WalletAddress, pincode: &str) -> AuthResult<()> {
        let hash = self
            .store
            .pincode_hash(wallet)
            .await?
            .ok_or(AuthError::NotEnrolled(VerificationType::Pincode))?;

        self.pincode.validate_format(pincode)?;
        if self.pincode.verify_pincode(pincode, &hash)? {
            Ok(())
        } else {
            Err(AuthError::InvalidCode(VerificationType::Pincode))
        }
    }

    async fn check_totp(&self, wallet: &WalletAddress, code: &str) -> AuthResult<()> {
        let secret = self
            .store
            .totp_secret(wallet)
            .await?
            .ok_or(AuthError::NotEnrolled(VerificationType::TwoFactor))?;

        let counter = self
            .totp
            .verify_code(&secret, code)?
            .ok_or(AuthError::InvalidCode(VerificationType::TwoFactor))?;

        self.prune_used_totp()?;
        match self.used_totp.entry((wallet.clone(), counter)) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(AuthError::CodeReused),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(());
                Ok(())
            }
        }
    }

    async fn check_secret_code(&self, wallet: &WalletAddress, code: &str) -> AuthResult<()> {
        if !self.store.has_secret_codes(wallet).await? {
            return Err(AuthError::NotEnrolled(VerificationType::SecretCode));
        }

        let hash = self.secret_codes.hash_code(code);
        if self.store.consume_secret_code(wallet, &hash).await? {
            return Ok(());
        }
        if self.store.secret_code_used(wallet, &hash).await? {
            return Err(AuthError::CodeReused);
        }
        Err(AuthError::InvalidCode(VerificationType::SecretCode))
    }

    /// Forget accepted TOTP counters that can no longer verify
    fn prune_used_totp(&self) -> AuthResult<()> {
        let oldest_valid = self
            .totp
            .current_counter()?
            .saturating_sub(self.totp.skew());
        self.used_totp.retain(|(_, counter), _| *counter >= oldest_valid);
        Ok(())
    }
}

#[async_trait]
impl VerificationService for VerificationGate {
    async fn authorize(
        &self,
        wallet: &WalletAddress,
        code: &VerificationCode,
    ) -> AuthResult<VerificationContext> {
        self.lockout.check(wallet).await?;

        match self.check_code(wallet, code).await {
            Ok(()) => {
                self.lockout.reset(wallet).await;
            }
            Err(err) => {
                if err.counts_as_failure() {
                    self.lockout.record_failure(wallet).await;
                }
                tracing::warn!(
                    wallet = %wallet,
                    method = %code.kind,
                    error_code = err.error_code(),
                    "Verification failed"
                );
                return Err(err);
            }
        }

        let context = self.proofs.issue(wallet)?;
        tracing::debug!(
            wallet = %wallet,
            method = %code.kind,
            expires_at = %context.expires_at,
            "Verification proof issued"
        );
        Ok(context)
    }

    async fn consume(&self, context: &VerificationContext) -> AuthResult<()> {
        self.proofs.consume(context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LockoutConfig, PincodeConfig};

    fn wallet() -> WalletAddress {
        WalletAddress::parse("0x3333333333333333333333333333333333333333").unwrap()
    }

    fn gate() -> VerificationGate {
        VerificationGate::in_memory(VerificationConfig {
            pincode: PincodeConfig {
                memory_cost: 4096,
                time_cost: 1,
                ..Default::default()
            },
            lockout: LockoutConfig {
                max_failures: 3,
                ..Default::default()
            },
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn test_pincode_authorize_and_consume() {
        let gate = gate();
        let wallet = wallet();
        gate.enroll_pincode(&wallet, "123456").await.unwrap();

        let context = gate
            .authorize(&wallet, &VerificationCode::pincode("123456"))
            .await
            .unwrap();
        assert!(context.is_bound_to(&wallet));
        assert!(context.verification_id.is_some());

        gate.consume(&context).await.unwrap();
        assert!(matches!(gate.consume(&context).await, Err(AuthError::ProofConsumed)));
    }

    #[tokio::test]
    async fn test_wrong_pincode_and_lockout() {
        let gate = gate();
        let wallet = wallet();
        gate.enroll_pincode(&wallet, "123456").await.unwrap();

        for _ in 0..3 {
            let err = gate
                .authorize(&wallet, &VerificationCode::pincode("654321"))
                .await
                .unwrap_err();
            assert!(matches!(err, AuthError::InvalidCode(VerificationType::Pincode)));
        }

        // Locked: even the right code is refused
        let err = gate
            .authorize(&wallet, &VerificationCode::pincode("123456"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Locked { .. }));
    }

    #[tokio::test]
    async fn test_not_enrolled() {
        let gate = gate();
        let err = gate
            .authorize(&wallet(), &VerificationCode::two_factor("000000"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::NotEnrolled(VerificationType::TwoFactor)));
    }

    #[tokio::test]
    async fn test_totp_replay_rejected() {
        let gate = gate();
        let wallet = wallet();
        let setup = gate.enroll_two_factor(&wallet).await.unwrap();
        let code = gate.totp().generate_current_code(&setup.secret).unwrap();

        gate.authorize(&wallet, &VerificationCode::two_factor(code.clone()))
            .await
            .unwrap();
        let err = gate
            .authorize(&wallet, &VerificationCode::two_factor(code))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::CodeReused));
    }

    #[tokio::test]
    async fn test_secret_code_single_use() {
        let gate = gate();
        let wallet = wallet();
        let codes = gate.enroll_secret_codes(&wallet).await.unwrap();

        let code = codes[0].to_lowercase();
        gate.authorize(&wallet, &VerificationCode::secret_code(code.clone()))
            .await
            .unwrap();

        let err = gate
            .authorize(&wallet, &VerificationCode::secret_code(code))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::CodeReused));

        let err = gate
            .authorize(&wallet, &VerificationCode::secret_code("ZZZZ-ZZZZ"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCode(VerificationType::SecretCode)));
    }

    #[tokio::test]
    async fn test_proof_bound_to_wallet() {
        let gate = gate();
        let wallet = wallet();
        gate.enroll_pincode(&wallet, "111111").await.unwrap();

        let mut context = gate
            .authorize(&wallet, &VerificationCode::pincode("111111"))
            .await
            .unwrap();
        context.wallet =
            WalletAddress::parse("0x4444444444444444444444444444444444444444").unwrap();
        assert!(matches!(gate.consume(&context).await, Err(AuthError::ProofInvalid)));
    }
}
