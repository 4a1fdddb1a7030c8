//! Ledger collaborator errors

use assetops_types::{AssetAddress, OperationError, TxHash};
use thiserror::Error;

/// Errors raised by the ledger, the derived index and the metadata store
#[derive(Error, Debug, Clone)]
pub enum LedgerError {
    #[error("Call {selector} rejected: {reason}")]
    Rejected { selector: String, reason: String },

    #[error("Transaction {hash} reverted: {reason}")]
    Reverted { hash: TxHash, reason: String },

    #[error("Unknown asset: {asset}")]
    UnknownAsset { asset: AssetAddress },

    #[error("Metadata store error: {message}")]
    Metadata { message: String },

    #[error("{service} unavailable: {message}")]
    Unavailable { service: String, message: String },
}

pub type Result<T> = std::result::Result<T, LedgerError>;

impl LedgerError {
    pub fn unavailable(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Unavailable {
            service: service.into(),
            message: message.into(),
        }
    }
}

impl From<LedgerError> for OperationError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Rejected { .. } | LedgerError::Reverted { .. } => {
                OperationError::LedgerRejection {
                    reason: err.to_string(),
                }
            }
            LedgerError::UnknownAsset { .. } => OperationError::InvalidRequest {
                reason: err.to_string(),
            },
            LedgerError::Metadata { message } => OperationError::MetadataWrite { reason: message },
            LedgerError::Unavailable { service, message } => OperationError::Collaborator {
                service,
                reason: message,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversion() {
        let err: OperationError = LedgerError::Rejected {
            selector: "Bond.mint".to_string(),
            reason: "paused".to_string(),
        }
        .into();
        assert!(matches!(err, OperationError::LedgerRejection { ref reason } if reason.contains("Bond.mint")));

        let err: OperationError = LedgerError::Metadata {
            message: "timeout".to_string(),
        }
        .into();
        assert!(matches!(err, OperationError::MetadataWrite { .. }));

        let err: OperationError = LedgerError::unavailable("index", "down").into();
        assert!(err.to_string().contains("index unavailable"));
    }
}
