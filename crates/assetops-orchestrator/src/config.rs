//! Orchestrator configuration
//!
//! Polling budgets for the two waits the orchestrator performs: confirmation
//! on the derived index and finality on the ledger. Durations are written in
//! humantime form (`500ms`, `5s`).
//!
//! Amount bounds are not configured here: a ceiling belongs to one field of
//! one request and travels in its payload.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Bounded polling with exponential backoff
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollPolicy {
    /// Maximum number of poll rounds
    pub max_polls: u32,
    /// Delay after the first unsuccessful round
    #[serde(with = "humantime_serde")]
    pub initial_backoff: Duration,
    /// Upper bound for any single delay
    #[serde(with = "humantime_serde")]
    pub max_backoff: Duration,
    /// Growth factor between consecutive delays
    pub multiplier: f64,
}

/// Polling budget for the derived index
pub type ConfirmationConfig = PollPolicy;

/// Polling budget for ledger receipts
pub type FinalityConfig = PollPolicy;

impl PollPolicy {
    /// Defaults for index confirmation
    pub fn confirmation() -> Self {
        Self {
            max_polls: 30,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(5),
            multiplier: 2.0,
        }
    }

    /// Defaults for ledger finality
    pub fn finality() -> Self {
        Self {
            max_polls: 60,
            initial_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(2),
            multiplier: 1.5,
        }
    }

    /// Delay to wait after poll round `round` (0-based) came back incomplete
    pub fn delay_for(&self, round: u32) -> Duration {
        let factor = self.multiplier.max(1.0).powi(round.min(64) as i32);
        let secs = self.initial_backoff.as_secs_f64() * factor;
        Duration::from_secs_f64(secs.min(self.max_backoff.as_secs_f64()))
    }
}

/// Main orchestrator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    #[serde(default = "PollPolicy::confirmation")]
    pub confirmation: ConfirmationConfig,
    #[serde(default = "PollPolicy::finality")]
    pub finality: FinalityConfig,
    /// Reject amounts with more significant fractional digits than the asset has
    #[serde(default = "default_true")]
    pub reject_excess_precision: bool,
}

fn default_true() -> bool {
    true
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            confirmation: PollPolicy::confirmation(),
            finality: PollPolicy::finality(),
            reject_excess_precision: true,
        }
    }
}

/// Invalid configuration value
#[derive(Error, Debug)]
#[error("Invalid value for {var}: {reason}")]
pub struct ConfigError {
    pub var: String,
    pub reason: String,
}

impl OrchestratorConfig {
    /// Create configuration from `ASSETOPS_*` environment variables
    ///
    /// A `.env` file is loaded first when present. Unset variables keep their
    /// defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Try to load .env file (ignore errors)
        let _ = dotenvy::dotenv();

        let mut config = Self::default();

        read_u32("ASSETOPS_CONFIRMATION_MAX_POLLS", &mut config.confirmation.max_polls)?;
        read_duration(
            "ASSETOPS_CONFIRMATION_INITIAL_BACKOFF",
            &mut config.confirmation.initial_backoff,
        )?;
        read_duration(
            "ASSETOPS_CONFIRMATION_MAX_BACKOFF",
            &mut config.confirmation.max_backoff,
        )?;
        read_u32("ASSETOPS_FINALITY_MAX_POLLS", &mut config.finality.max_polls)?;
        read_duration(
            "ASSETOPS_FINALITY_INITIAL_BACKOFF",
            &mut config.finality.initial_backoff,
        )?;
        read_duration("ASSETOPS_FINALITY_MAX_BACKOFF", &mut config.finality.max_backoff)?;

        read_bool(
            "ASSETOPS_REJECT_EXCESS_PRECISION",
            &mut config.reject_excess_precision,
        )?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, policy) in [("confirmation", &self.confirmation), ("finality", &self.finality)] {
            if policy.max_polls == 0 {
                return Err(ConfigError {
                    var: format!("{}.max_polls", name),
                    reason: "must be at least 1".to_string(),
                });
            }
            if policy.initial_backoff > policy.max_backoff {
                return Err(ConfigError {
                    var: format!("{}.initial_backoff", name),
                    reason: "must not exceed max_backoff".to_string(),
                });
            }
        }
        Ok(())
    }
}

fn read_u32(var: &str, target: &mut u32) -> Result<(), ConfigError> {
    if let Ok(value) = std::env::var(var) {
        *target = value.trim().parse().map_err(|e| ConfigError {
            var: var.to_string(),
            reason: format!("{}", e),
        })?;
    }
    Ok(())
}

fn read_bool(var: &str, target: &mut bool) -> Result<(), ConfigError> {
    if let Ok(value) = std::env::var(var) {
        *target = match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            other => {
                return Err(ConfigError {
                    var: var.to_string(),
                    reason: format!("expected a boolean, got {:?}", other),
                })
            }
        };
    }
    Ok(())
}

fn read_duration(var: &str, target: &mut Duration) -> Result<(), ConfigError> {
    if let Ok(value) = std::env::var(var) {
        *target = humantime::parse_duration(value.trim()).map_err(|e| ConfigError {
            var: var.to_string(),
            reason: e.to_string(),
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_grows_and_caps() {
        let policy = PollPolicy::confirmation();
        assert_eq!(policy.delay_for(0), Duration::from_millis(500));
        assert_eq!(policy.delay_for(1), Duration::from_secs(1));
        assert_eq!(policy.delay_for(2), Duration::from_secs(2));
        assert_eq!(policy.delay_for(10), Duration::from_secs(5));
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let json = serde_json::json!({
            "confirmation": {
                "max_polls": 3,
                "initial_backoff": "10ms",
                "max_backoff": "40ms",
                "multiplier": 2.0
            },
            "reject_excess_precision": false
        });
        let config: OrchestratorConfig = serde_json::from_value(json).unwrap();
        assert_eq!(config.confirmation.max_polls, 3);
        assert_eq!(config.confirmation.initial_backoff, Duration::from_millis(10));
        assert_eq!(config.finality, PollPolicy::finality());
        assert!(!config.reject_excess_precision);
        assert!(OrchestratorConfig::default().reject_excess_precision);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_polls() {
        let mut config = OrchestratorConfig::default();
        config.finality.max_polls = 0;
        assert!(config.validate().is_err());
    }
}
