//! Verification error types
//!
//! Errors are designed to be:
//! - Informative for logging/debugging
//! - Safe for external exposure (no code or secret leakage)
//! - Convertible into the orchestration error taxonomy

use assetops_types::{OperationError, VerificationType};
use thiserror::Error;

/// Result type alias for verification operations
pub type AuthResult<T> = Result<T, AuthError>;

/// Verification error types
#[derive(Debug, Error)]
pub enum AuthError {
    // =========================================================================
    // Code Errors
    // =========================================================================
    /// The supplied code does not match the enrolled secret
    #[error("Invalid {0} code")]
    InvalidCode(VerificationType),

    /// The wallet has no secret enrolled for this method
    #[error("No {0} enrolled for this wallet")]
    NotEnrolled(VerificationType),

    /// PIN code does not meet the format requirements
    #[error("PIN code does not meet requirements: {0}")]
    WeakPincode(String),

    // =========================================================================
    // Replay Errors
    // =========================================================================
    /// The code was already used for an earlier write
    #[error("Verification code already used")]
    CodeReused,

    /// The proof was already consumed
    #[error("Verification proof already consumed")]
    ProofConsumed,

    /// The proof is past its expiry
    #[error("Verification proof has expired")]
    ProofExpired,

    /// The proof was not issued by this gate or was tampered with
    #[error("Verification proof is invalid")]
    ProofInvalid,

    /// The proof belongs to another wallet
    #[error("Verification proof is bound to another wallet")]
    WalletMismatch,

    // =========================================================================
    // Lockout Errors
    // =========================================================================
    /// Too many failed attempts
    #[error("Wallet is locked, try again in {retry_after} seconds")]
    Locked {
        /// Seconds until the wallet is unlocked
        retry_after: u64,
    },

    // =========================================================================
    // Internal Errors
    // =========================================================================
    /// Hashing failed
    #[error("Hashing failed")]
    HashingFailed,

    /// Cryptographic operation failed
    #[error("Cryptographic operation failed")]
    CryptoError,

    /// Credential store failure
    #[error("Credential store error: {0}")]
    Store(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Create a locked error with retry-after duration
    pub fn locked(duration: std::time::Duration) -> Self {
        Self::Locked {
            retry_after: duration.as_secs().max(1),
        }
    }

    /// Whether the failure counts toward the lockout threshold
    pub fn counts_as_failure(&self) -> bool {
        matches!(self, Self::InvalidCode(_) | Self::WeakPincode(_))
    }

    /// Get error code for machine-readable responses
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidCode(_) => "INVALID_CODE",
            Self::NotEnrolled(_) => "NOT_ENROLLED",
            Self::WeakPincode(_) => "WEAK_PINCODE",
            Self::CodeReused => "CODE_REUSED",
            Self::ProofConsumed => "PROOF_CONSUMED",
            Self::ProofExpired => "PROOF_EXPIRED",
            Self::ProofInvalid => "PROOF_INVALID",
            Self::WalletMismatch => "WALLET_MISMATCH",
            Self::Locked { .. } => "WALLET_LOCKED",
            Self::HashingFailed | Self::CryptoError | Self::Store(_) | Self::Internal(_) => {
                "INTERNAL_ERROR"
            }
        }
    }
}

impl From<argon2::password_hash::Error> for AuthError {
    fn from(_: argon2::password_hash::Error) -> Self {
        Self::HashingFailed
    }
}

impl From<AuthError> for OperationError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCode(_)
            | AuthError::NotEnrolled(_)
            | AuthError::WeakPincode(_)
            | AuthError::WalletMismatch
            | AuthError::ProofInvalid
            | AuthError::Locked { .. } => OperationError::AuthenticationFailure {
                reason: err.to_string(),
            },
            AuthError::CodeReused | AuthError::ProofConsumed | AuthError::ProofExpired => {
                OperationError::ReplayRejected {
                    reason: err.to_string(),
                }
            }
            AuthError::HashingFailed
            | AuthError::CryptoError
            | AuthError::Store(_)
            | AuthError::Internal(_) => OperationError::Collaborator {
                service: "verification".to_string(),
                reason: err.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(AuthError::CodeReused.error_code(), "CODE_REUSED");
        assert_eq!(AuthError::Internal("secret info".to_string()).error_code(), "INTERNAL_ERROR");
    }

    #[test]
    fn test_conversion_into_operation_error() {
        let err: OperationError = AuthError::InvalidCode(VerificationType::Pincode).into();
        assert!(matches!(err, OperationError::AuthenticationFailure { .. }));

        let err: OperationError = AuthError::ProofExpired.into();
        assert!(matches!(err, OperationError::ReplayRejected { .. }));

        let err: OperationError = AuthError::Store("down".to_string()).into();
        assert!(matches!(err, OperationError::Collaborator { .. }));
    }

    #[test]
    fn test_locked_rounds_up_to_one_second() {
        let err = AuthError::locked(std::time::Duration::from_millis(200));
        assert!(matches!(err, AuthError::Locked { retry_after: 1 }));
    }
}
