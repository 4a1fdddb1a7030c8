//! Error types for AssetOps
//!
//! Validation and authorization failures are raised before anything touches
//! the ledger. Failures after a submission always travel together with the
//! hashes that were already broadcast.

use thiserror::Error;

use crate::{AssetType, OperationKind, TxHash};

/// Result type for AssetOps operations
pub type Result<T> = std::result::Result<T, OperationError>;

/// AssetOps error taxonomy
#[derive(Debug, Clone, Error)]
pub enum OperationError {
    // ========================================================================
    // Pre-submission failures (zero side effects)
    // ========================================================================

    /// The verification code did not match
    #[error("Authentication failed: {reason}")]
    AuthenticationFailure { reason: String },

    /// The verification proof or code was already used or has expired
    #[error("Verification replay rejected: {reason}")]
    ReplayRejected { reason: String },

    /// The caller lacks the capability required for the operation
    #[error("Permission denied: {operation} requires {capability}")]
    PermissionDenied {
        operation: OperationKind,
        capability: String,
    },

    /// The asset variant has no entry point for the operation
    #[error("Operation {operation} is not supported for {asset_type} assets")]
    UnsupportedOperation {
        asset_type: AssetType,
        operation: OperationKind,
    },

    /// The amount could not be normalized
    #[error("Invalid amount '{amount}': {reason}")]
    InvalidAmount { amount: String, reason: String },

    /// The request is malformed
    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },

    /// The off-chain metadata write failed
    #[error("Metadata write failed: {reason}")]
    MetadataWrite { reason: String },

    // ========================================================================
    // Ledger failures
    // ========================================================================

    /// The ledger refused or reverted a call
    #[error("Ledger rejected the call: {reason}")]
    LedgerRejection { reason: String },

    /// A transaction did not reach finality in time
    #[error("Transaction {hash} did not reach finality after {attempts} checks")]
    FinalityTimeout { hash: TxHash, attempts: u32 },

    /// Some sub-calls were broadcast before another failed
    #[error("Partial failure after {} submitted transaction(s): {cause}", .submitted.len())]
    PartialFailure {
        submitted: Vec<TxHash>,
        cause: Box<OperationError>,
    },

    /// The derived index has not caught up; the hashes are valid
    #[error("Indexing timeout: {} transaction(s) not yet visible to the read path", .hashes.len())]
    IndexingTimeout { hashes: Vec<TxHash> },

    /// A collaborator failed for reasons unrelated to the request
    #[error("{service} unavailable: {reason}")]
    Collaborator { service: String, reason: String },
}

impl OperationError {
    pub fn invalid_request(reason: impl Into<String>) -> Self {
        Self::InvalidRequest {
            reason: reason.into(),
        }
    }

    pub fn invalid_amount(amount: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidAmount {
            amount: amount.into(),
            reason: reason.into(),
        }
    }

    /// Whether the error was raised before any ledger call could be issued
    pub fn is_pre_submission(&self) -> bool {
        matches!(
            self,
            Self::AuthenticationFailure { .. }
                | Self::ReplayRejected { .. }
                | Self::PermissionDenied { .. }
                | Self::UnsupportedOperation { .. }
                | Self::InvalidAmount { .. }
                | Self::InvalidRequest { .. }
                | Self::MetadataWrite { .. }
        )
    }

    /// Hashes that were broadcast despite the error
    pub fn submitted_hashes(&self) -> &[TxHash] {
        match self {
            Self::PartialFailure { submitted, .. } => submitted,
            Self::IndexingTimeout { hashes } => hashes,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = OperationError::UnsupportedOperation {
            asset_type: AssetType::Cryptocurrency,
            operation: OperationKind::Freeze,
        };
        assert_eq!(
            err.to_string(),
            "Operation freeze is not supported for cryptocurrency assets"
        );
        assert!(err.is_pre_submission());
    }

    #[test]
    fn test_submitted_hashes() {
        let hash = TxHash::from_bytes([3; 32]);
        let err = OperationError::IndexingTimeout {
            hashes: vec![hash.clone()],
        };
        assert_eq!(err.submitted_hashes(), &[hash]);
        assert!(!err.is_pre_submission());
    }
}
