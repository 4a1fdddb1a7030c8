//! Transaction records and composite results
//!
//! A [`TransactionRecord`] is created the moment a ledger call is accepted and
//! reaches a terminal state once the derived index has observed it or the
//! confirmation budget runs out. Terminal records are never touched again.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{OperationError, TxHash};

/// Status of a submitted transaction from the read path's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    /// Accepted by the ledger, not yet seen by the index
    Submitted,
    /// Observed by the derived index
    Confirmed,
    /// The index did not observe it within the polling budget
    TimedOut,
}

impl TransactionStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Submitted)
    }
}

/// One submitted ledger transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub hash: TxHash,
    pub submitted_at: DateTime<Utc>,
    status: TransactionStatus,
    pub settled_at: Option<DateTime<Utc>>,
}

impl TransactionRecord {
    /// Record a freshly submitted transaction
    pub fn submitted(hash: TxHash) -> Self {
        Self {
            hash,
            submitted_at: Utc::now(),
            status: TransactionStatus::Submitted,
            settled_at: None,
        }
    }

    pub fn status(&self) -> TransactionStatus {
        self.status
    }

    /// Move to CONFIRMED; returns false if the record was already terminal
    pub fn confirm(&mut self) -> bool {
        self.settle(TransactionStatus::Confirmed)
    }

    /// Move to TIMED_OUT; returns false if the record was already terminal
    pub fn time_out(&mut self) -> bool {
        self.settle(TransactionStatus::TimedOut)
    }

    fn settle(&mut self, to: TransactionStatus) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = to;
        self.settled_at = Some(Utc::now());
        true
    }
}

/// Lifecycle of a composite operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompositeStatus {
    Pending,
    Confirming,
    Confirmed,
    /// Failed after at least one call was broadcast
    PartialFailure,
    IndexingTimeout,
    /// Refused before anything was broadcast
    Rejected,
}

/// Outcome of one orchestrated operation
///
/// Records are in the caller's intended order, not completion order. `error`
/// holds the first failure encountered in that order; any hashes listed next
/// to it were broadcast and are irrevocable.
#[derive(Debug)]
pub struct CompositeOperationResult {
    pub records: Vec<TransactionRecord>,
    pub error: Option<OperationError>,
    pub status: CompositeStatus,
}

impl CompositeOperationResult {
    pub fn pending() -> Self {
        Self {
            records: Vec::new(),
            error: None,
            status: CompositeStatus::Pending,
        }
    }

    /// Transaction hashes in request order
    pub fn hashes(&self) -> Vec<TxHash> {
        self.records.iter().map(|r| r.hash.clone()).collect()
    }

    pub fn is_confirmed(&self) -> bool {
        self.status == CompositeStatus::Confirmed
    }

    /// Derive the terminal status from the records and error
    pub fn settle_status(&mut self) {
        self.status = if self.error.is_some() && self.records.is_empty() {
            CompositeStatus::Rejected
        } else if self.error.is_some() {
            CompositeStatus::PartialFailure
        } else if self
            .records
            .iter()
            .any(|r| r.status() == TransactionStatus::TimedOut)
        {
            CompositeStatus::IndexingTimeout
        } else if self.records.iter().all(|r| r.status() == TransactionStatus::Confirmed) {
            CompositeStatus::Confirmed
        } else {
            CompositeStatus::Confirming
        };
    }

    /// Collapse into the presentation-layer contract
    ///
    /// A failure with nothing submitted returns the bare error. A failure after
    /// at least one submission becomes `PartialFailure` carrying the hashes. An
    /// indexing timeout keeps the hashes as well.
    pub fn into_result(self) -> Result<Vec<TxHash>, OperationError> {
        let hashes = self.hashes();
        match self.error {
            Some(err) if hashes.is_empty() => Err(err),
            Some(err) => Err(OperationError::PartialFailure {
                submitted: hashes,
                cause: Box::new(err),
            }),
            None if self.status == CompositeStatus::IndexingTimeout => {
                Err(OperationError::IndexingTimeout { hashes })
            }
            None => Ok(hashes),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hash(b: u8) -> TxHash {
        TxHash::from_bytes([b; 32])
    }

    #[test]
    fn test_terminal_records_are_not_mutated() {
        let mut record = TransactionRecord::submitted(hash(1));
        assert!(record.confirm());
        assert!(!record.time_out());
        assert_eq!(record.status(), TransactionStatus::Confirmed);
    }

    #[test]
    fn test_settle_status() {
        let mut result = CompositeOperationResult::pending();
        result.records.push(TransactionRecord::submitted(hash(1)));
        result.records[0].confirm();
        result.settle_status();
        assert_eq!(result.status, CompositeStatus::Confirmed);

        result.records.push(TransactionRecord::submitted(hash(2)));
        result.records[1].time_out();
        result.settle_status();
        assert_eq!(result.status, CompositeStatus::IndexingTimeout);
    }

    #[test]
    fn test_into_result_keeps_hashes_on_partial_failure() {
        let mut result = CompositeOperationResult::pending();
        result.records.push(TransactionRecord::submitted(hash(7)));
        result.error = Some(OperationError::LedgerRejection {
            reason: "reverted".to_string(),
        });
        result.settle_status();
        assert_eq!(result.status, CompositeStatus::PartialFailure);

        match result.into_result() {
            Err(OperationError::PartialFailure { submitted, cause }) => {
                assert_eq!(submitted, vec![hash(7)]);
                assert!(matches!(*cause, OperationError::LedgerRejection { .. }));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_into_result_without_submissions_is_bare_error() {
        let mut result = CompositeOperationResult::pending();
        result.error = Some(OperationError::LedgerRejection {
            reason: "paused".to_string(),
        });
        result.settle_status();
        assert_eq!(result.status, CompositeStatus::Rejected);
        assert!(matches!(
            result.into_result(),
            Err(OperationError::LedgerRejection { .. })
        ));
    }
}
