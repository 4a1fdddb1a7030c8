//! Verification configuration
//!
//! Centralized configuration for every verification component with secure
//! defaults following OWASP recommendations.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main verification configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerificationConfig {
    /// PIN code hashing configuration
    #[serde(default)]
    pub pincode: PincodeConfig,
    /// TOTP (2FA) configuration
    #[serde(default)]
    pub totp: TotpConfig,
    /// Secret (backup) code configuration
    #[serde(default)]
    pub secret_code: SecretCodeConfig,
    /// Proof signing configuration
    #[serde(default)]
    pub proof: ProofConfig,
    /// Failed-attempt lockout configuration
    #[serde(default)]
    pub lockout: LockoutConfig,
}

/// PIN code configuration (Argon2id)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PincodeConfig {
    /// Exact number of digits in a PIN code
    pub length: usize,
    /// Memory cost in KiB
    pub memory_cost: u32,
    /// Time cost (iterations)
    pub time_cost: u32,
    /// Parallelism factor
    pub parallelism: u32,
    /// Output hash length in bytes
    pub hash_length: u32,
    /// Pepper (additional secret, optional)
    pub pepper: Option<String>,
}

impl Default for PincodeConfig {
    fn default() -> Self {
        Self {
            length: 6,
            memory_cost: 19456, // 19 MiB
            time_cost: 2,
            parallelism: 1,
            hash_length: 32,
            pepper: None,
        }
    }
}

/// TOTP (Time-based One-Time Password) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TotpConfig {
    /// TOTP issuer name (shown in authenticator apps)
    pub issuer: String,
    /// Number of digits in OTP (6 or 8)
    pub digits: u32,
    /// Time step in seconds (usually 30)
    pub step: u64,
    /// Algorithm (SHA1, SHA256, SHA512)
    pub algorithm: String,
    /// Allow time skew (number of periods before/after current)
    pub skew: u8,
}

impl Default for TotpConfig {
    fn default() -> Self {
        Self {
            issuer: "AssetOps".to_string(),
            digits: 6,
            step: 30,
            algorithm: "SHA1".to_string(), // Most compatible with authenticator apps
            skew: 1,
        }
    }
}

/// Secret (backup) code configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecretCodeConfig {
    /// Number of codes generated per enrollment
    pub count: usize,
    /// Characters per code (formatted as XXXX-XXXX when 8)
    pub length: usize,
}

impl Default for SecretCodeConfig {
    fn default() -> Self {
        Self {
            count: 10,
            length: 8,
        }
    }
}

/// Proof signing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProofConfig {
    /// HMAC key used to sign challenge responses (empty = random per process)
    pub signing_key: String,
    /// How long an issued proof stays valid
    #[serde(with = "humantime_serde")]
    pub ttl: Duration,
}

impl Default for ProofConfig {
    fn default() -> Self {
        Self {
            signing_key: String::new(),
            ttl: Duration::from_secs(5 * 60), // 5 minutes
        }
    }
}

/// Lockout after repeated verification failures
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockoutConfig {
    /// Enable lockout tracking
    pub enabled: bool,
    /// Consecutive failures before the wallet is locked
    pub max_failures: u32,
    /// First lockout duration
    #[serde(with = "humantime_serde")]
    pub lockout_duration: Duration,
    /// Progressive lockout multiplier
    pub lockout_multiplier: f64,
    /// Maximum lockout duration
    #[serde(with = "humantime_serde")]
    pub max_lockout_duration: Duration,
}

impl Default for LockoutConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_failures: 5,
            lockout_duration: Duration::from_secs(60),
            lockout_multiplier: 2.0, // Double lockout on each lock
            max_lockout_duration: Duration::from_secs(60 * 60),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = VerificationConfig::default();
        assert_eq!(config.pincode.length, 6);
        assert_eq!(config.totp.step, 30);
        assert_eq!(config.proof.ttl, Duration::from_secs(300));
        assert_eq!(config.lockout.max_failures, 5);
    }

    #[test]
    fn test_humantime_durations() {
        let json = serde_json::json!({
            "proof": { "signing_key": "k", "ttl": "90s" },
            "lockout": {
                "enabled": false,
                "max_failures": 3,
                "lockout_duration": "2m",
                "lockout_multiplier": 1.5,
                "max_lockout_duration": "1h"
            }
        });
        let config: VerificationConfig = serde_json::from_value(json).unwrap();
        assert_eq!(config.proof.ttl, Duration::from_secs(90));
        assert_eq!(config.lockout.lockout_duration, Duration::from_secs(120));
        assert!(!config.lockout.enabled);
        assert_eq!(config.totp.digits, 6);
    }
}
