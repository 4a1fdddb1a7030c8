//! Failed-attempt lockout
//!
//! Tracks consecutive verification failures per wallet and locks the wallet
//! out once the configured threshold is reached. Each lockout lasts longer
//! than the previous one, up to the configured maximum.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

use assetops_types::WalletAddress;

use crate::config::LockoutConfig;
use crate::error::{AuthError, AuthResult};

/// Lockout tracker shared by every verification method
#[derive(Clone)]
pub struct LockoutTracker {
    config: LockoutConfig,
    attempts: Arc<RwLock<HashMap<WalletAddress, FailedAttempts>>>,
}

#[derive(Debug, Clone)]
struct FailedAttempts {
    /// Consecutive failures since the last success or lockout
    failed_count: u32,
    /// Last failed attempt time
    last_failed: Instant,
    /// Duration applied at the next lockout
    next_lockout: Duration,
    locked_until: Option<Instant>,
}

impl LockoutTracker {
    pub fn new(config: LockoutConfig) -> Self {
        Self {
            config,
            attempts: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Fail with [`AuthError::Locked`] while the wallet is locked out
    pub async fn check(&self, wallet: &WalletAddress) -> AuthResult<()> {
        if !self.config.enabled {
            return Ok(());
        }

        match self.locked_for(wallet).await {
            Some(remaining) => Err(AuthError::locked(remaining)),
            None => Ok(()),
        }
    }

    /// Record a failed verification attempt
    pub async fn record_failure(&self, wallet: &WalletAddress) {
        if !self.config.enabled {
            return;
        }

        let mut attempts = self.attempts.write().await;
        let now = Instant::now();

        let entry = attempts.entry(wallet.clone()).or_insert(FailedAttempts {
            failed_count: 0,
            last_failed: now,
            next_lockout: self.config.lockout_duration,
            locked_until: None,
        });

        entry.failed_count += 1;
        entry.last_failed = now;

        if entry.failed_count >= self.config.max_failures {
            let lockout = entry.next_lockout.min(self.config.max_lockout_duration);
            entry.locked_until = Some(now + lockout);
            entry.failed_count = 0;

            // Progressive lockout
            entry.next_lockout = Duration::from_secs_f64(
                (entry.next_lockout.as_secs_f64() * self.config.lockout_multiplier)
                    .min(self.config.max_lockout_duration.as_secs_f64()),
            );

            tracing::warn!(
                wallet = %wallet,
                lockout_seconds = lockout.as_secs(),
                "Wallet locked due to failed verification attempts"
            );
        }
    }

    /// Clear the failure history after a successful verification
    pub async fn reset(&self, wallet: &WalletAddress) {
        self.attempts.write().await.remove(wallet);
    }

    /// Remaining lockout time, if the wallet is locked
    pub async fn locked_for(&self, wallet: &WalletAddress) -> Option<Duration> {
        let attempts = self.attempts.read().await;
        let locked_until = attempts.get(wallet)?.locked_until?;
        let now = Instant::now();
        (now < locked_until).then(|| locked_until.duration_since(now))
    }

    /// Drop entries that are neither locked nor recently active
    pub async fn cleanup(&self) {
        let mut attempts = self.attempts.write().await;
        let now = Instant::now();
        attempts.retain(|_, attempt| {
            if matches!(attempt.locked_until, Some(until) if now < until) {
                return true;
            }
            now.duration_since(attempt.last_failed) < self.config.max_lockout_duration
        });
    }
}
