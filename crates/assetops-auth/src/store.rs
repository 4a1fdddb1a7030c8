//! Credential storage
//!
//! Verification secrets live behind [`CredentialStore`] so the gate can be
//! backed by any persistence layer. [`InMemoryCredentialStore`] keeps them in
//! concurrent maps for tests and single-process deployments.

use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashSet;

use assetops_types::WalletAddress;

use crate::error::AuthResult;

/// Stored verification secrets, keyed by wallet
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Argon2 hash of the wallet's PIN code
    async fn pincode_hash(&self, wallet: &WalletAddress) -> AuthResult<Option<String>>;

    async fn set_pincode_hash(&self, wallet: &WalletAddress, hash: String) -> AuthResult<()>;

    /// Base32 TOTP secret
    async fn totp_secret(&self, wallet: &WalletAddress) -> AuthResult<Option<String>>;

    async fn set_totp_secret(&self, wallet: &WalletAddress, secret: String) -> AuthResult<()>;

    /// Replace the wallet's secret codes with a new batch of hashes
    async fn set_secret_code_hashes(
        &self,
        wallet: &WalletAddress,
        hashes: Vec<String>,
    ) -> AuthResult<()>;

    /// Whether the wallet has any secret codes enrolled
    async fn has_secret_codes(&self, wallet: &WalletAddress) -> AuthResult<bool>;

    /// Atomically remove an unused code. Returns `false` if it was not present.
    async fn consume_secret_code(&self, wallet: &WalletAddress, hash: &str) -> AuthResult<bool>;

    /// Whether the code hash was already consumed
    async fn secret_code_used(&self, wallet: &WalletAddress, hash: &str) -> AuthResult<bool>;
}

/// In-memory credential store
#[derive(Default)]
pub struct InMemoryCredentialStore {
    pincodes: DashMap<WalletAddress, String>,
    totp_secrets: DashMap<WalletAddress, String>,
    secret_codes: DashMap<WalletAddress, SecretCodes>,
}

#[derive(Default)]
struct SecretCodes {
    unused: HashSet<String>,
    used: HashSet<String>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn pincode_hash(&self, wallet: &WalletAddress) -> AuthResult<Option<String>> {
        Ok(self.pincodes.get(wallet).map(|h| h.clone()))
    }

    async fn set_pincode_hash(&self, wallet: &WalletAddress, hash: String) -> AuthResult<()> {
        self.pincodes.insert(wallet.clone(), hash);
        Ok(())
    }

    async fn totp_secret(&self, wallet: &WalletAddress) -> AuthResult<Option<String>> {
        Ok(self.totp_secrets.get(wallet).map(|s| s.clone()))
    }

    async fn set_totp_secret(&self, wallet: &WalletAddress, secret: String) -> AuthResult<()> {
        self.totp_secrets.insert(wallet.clone(), secret);
        Ok(())
    }

    async fn set_secret_code_hashes(
        &self,
        wallet: &WalletAddress,
        hashes: Vec<String>,
    ) -> AuthResult<()> {
        self.secret_codes.insert(
            wallet.clone(),
            SecretCodes {
                unused: hashes.into_iter().collect(),
                used: HashSet::new(),
            },
        );
        Ok(())
    }

    async fn has_secret_codes(&self, wallet: &WalletAddress) -> AuthResult<bool> {
        Ok(self
            .secret_codes
            .get(wallet)
            .map(|codes| !codes.unused.is_empty() || !codes.used.is_empty())
            .unwrap_or(false))
    }

    async fn consume_secret_code(&self, wallet: &WalletAddress, hash: &str) -> AuthResult<bool> {
        let Some(mut codes) = self.secret_codes.get_mut(wallet) else {
            return Ok(false);
        };
        if codes.unused.remove(hash) {
            codes.used.insert(hash.to_string());
            return Ok(true);
        }
        Ok(false)
    }

    async fn secret_code_used(&self, wallet: &WalletAddress, hash: &str) -> AuthResult<bool> {
        Ok(self
            .secret_codes
            .get(wallet)
            .map(|codes| codes.used.contains(hash))
            .unwrap_or(false))
    }
}
