//! Transaction submission and confirmation pipeline
//!
//! Submission fans out concurrently but always reports in the caller's order.
//! Confirmation then polls the derived index until every hash is observed or
//! the budget is spent. Nothing here ever resubmits a call.

use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, info, warn};

use assetops_ledger::{DerivedIndex, LedgerCall, LedgerClient, ReceiptStatus, TxReceipt};
use assetops_types::{
    ChallengeResponse, CompositeOperationResult, CompositeStatus, OperationError,
    TransactionRecord, TxHash, WalletAddress,
};

use crate::config::{ConfirmationConfig, FinalityConfig};

/// Records and first error of a group of submissions, in input order
#[derive(Debug, Default)]
pub struct SubmissionBatch {
    pub records: Vec<TransactionRecord>,
    pub error: Option<OperationError>,
}

impl SubmissionBatch {
    /// Append `other`, keeping the earliest error
    pub fn extend(&mut self, other: SubmissionBatch) {
        self.records.extend(other.records);
        if self.error.is_none() {
            self.error = other.error;
        }
    }

    pub fn into_result(self) -> CompositeOperationResult {
        CompositeOperationResult {
            records: self.records,
            error: self.error,
            status: CompositeStatus::Pending,
        }
    }
}

/// Submits ledger calls and waits on both sides of the consistency gap
#[derive(Clone)]
pub struct ConfirmationPipeline {
    ledger: Arc<dyn LedgerClient>,
    index: Arc<dyn DerivedIndex>,
    confirmation: ConfirmationConfig,
    finality: FinalityConfig,
}

impl ConfirmationPipeline {
    pub fn new(
        ledger: Arc<dyn LedgerClient>,
        index: Arc<dyn DerivedIndex>,
        confirmation: ConfirmationConfig,
        finality: FinalityConfig,
    ) -> Self {
        Self {
            ledger,
            index,
            confirmation,
            finality,
        }
    }

    pub fn ledger(&self) -> &Arc<dyn LedgerClient> {
        &self.ledger
    }

    // =========================================================================
    // Submission
    // =========================================================================

    /// Submit a single call
    pub async fn submit(
        &self,
        call: &LedgerCall,
        signer: &WalletAddress,
        proof: &ChallengeResponse,
    ) -> Result<TransactionRecord, OperationError> {
        match self.ledger.submit(call, signer, proof).await {
            Ok(hash) => {
                info!(call = %call, hash = %hash, "Transaction submitted");
                Ok(TransactionRecord::submitted(hash))
            }
            Err(err) => {
                warn!(call = %call, error = %err, "Submission failed");
                Err(err.into())
            }
        }
    }

    /// Submit `calls` concurrently
    ///
    /// Successful records keep the order of `calls`, whatever order the ledger
    /// accepted them in. The error is the first failure in that same order.
    pub async fn submit_all(
        &self,
        calls: &[LedgerCall],
        signer: &WalletAddress,
        proof: &ChallengeResponse,
    ) -> SubmissionBatch {
        let outcomes = join_all(calls.iter().map(|call| self.submit(call, signer, proof))).await;

        let mut batch = SubmissionBatch::default();
        for outcome in outcomes {
            match outcome {
                Ok(record) => batch.records.push(record),
                Err(err) => {
                    if batch.error.is_none() {
                        batch.error = Some(err);
                    }
                }
            }
        }
        batch
    }

    /// Submit `calls` one after another, each only once the previous one is final
    ///
    /// Stops at the first failure; later calls are never sent.
    pub async fn submit_sequential(
        &self,
        calls: &[LedgerCall],
        signer: &WalletAddress,
        proof: &ChallengeResponse,
    ) -> SubmissionBatch {
        let mut batch = SubmissionBatch::default();

        for (position, call) in calls.iter().enumerate() {
            let record = match self.submit(call, signer, proof).await {
                Ok(record) => record,
                Err(err) => {
                    batch.error = Some(err);
                    break;
                }
            };
            let hash = record.hash.clone();
            batch.records.push(record);

            if position + 1 < calls.len() {
                if let Err(err) = self.await_finality(&hash).await {
                    batch.error = Some(err);
                    break;
                }
            }
        }
        batch
    }

    // =========================================================================
    // Waiting
    // =========================================================================

    /// Poll the ledger until `hash` is mined
    ///
    /// A reverted receipt is a [`OperationError::LedgerRejection`]; no receipt
    /// within the finality budget is a [`OperationError::FinalityTimeout`].
    pub async fn await_finality(&self, hash: &TxHash) -> Result<TxReceipt, OperationError> {
        for round in 0..self.finality.max_polls {
            match self.ledger.transaction_receipt(hash).await {
                Ok(Some(receipt)) => {
                    return match receipt.status {
                        ReceiptStatus::Success => {
                            debug!(hash = %hash, block = receipt.block_number, "Transaction final");
                            Ok(receipt)
                        }
                        ReceiptStatus::Reverted { ref reason } => {
                            warn!(hash = %hash, reason = %reason, "Transaction reverted");
                            Err(OperationError::LedgerRejection {
                                reason: format!("transaction {} reverted: {}", hash, reason),
                            })
                        }
                    };
                }
                Ok(None) => {}
                Err(err) => debug!(hash = %hash, error = %err, "Receipt lookup failed"),
            }

            if round + 1 < self.finality.max_polls {
                tokio::time::sleep(self.finality.delay_for(round)).await;
            }
        }

        warn!(hash = %hash, attempts = self.finality.max_polls, "Finality timeout");
        Err(OperationError::FinalityTimeout {
            hash: hash.clone(),
            attempts: self.finality.max_polls,
        })
    }

    /// Wait for the derived index to observe every submitted record
    ///
    /// Records the index has seen become CONFIRMED and are not polled again.
    /// Records still unseen when the budget runs out become TIMED_OUT. Index
    /// errors count as "not observed yet". The terminal status is settled
    /// before returning.
    pub async fn confirm(&self, result: &mut CompositeOperationResult) {
        if result.records.is_empty() {
            result.settle_status();
            return;
        }
        result.status = CompositeStatus::Confirming;

        for round in 0..self.confirmation.max_polls {
            let unobserved: Vec<usize> = result
                .records
                .iter()
                .enumerate()
                .filter(|(_, r)| !r.status().is_terminal())
                .map(|(i, _)| i)
                .collect();
            if unobserved.is_empty() {
                break;
            }

            let checks = join_all(
                unobserved
                    .iter()
                    .map(|&i| self.index.has_observed(&result.records[i].hash)),
            )
            .await;

            for (&i, check) in unobserved.iter().zip(checks) {
                match check {
                    Ok(true) => {
                        result.records[i].confirm();
                    }
                    Ok(false) => {}
                    Err(err) => {
                        debug!(hash = %result.records[i].hash, error = %err, "Index lookup failed")
                    }
                }
            }

            let remaining = result
                .records
                .iter()
                .filter(|r| !r.status().is_terminal())
                .count();
            debug!(round = round + 1, remaining, "Confirmation poll");
            if remaining == 0 {
                break;
            }
            if round + 1 < self.confirmation.max_polls {
                tokio::time::sleep(self.confirmation.delay_for(round)).await;
            }
        }

        for record in result.records.iter_mut() {
            if record.time_out() {
                warn!(hash = %record.hash, "Derived index did not observe transaction in time");
            }
        }

        result.settle_status();
        info!(
            status = ?result.status,
            transactions = result.records.len(),
            "Confirmation finished"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assetops_ledger::{CallSelector, ContractFamily, InMemoryIndex, InMemoryLedger};
    use assetops_types::{AssetAddress, BaseUnits, TransactionStatus};
    use std::time::Duration;

    fn signer() -> WalletAddress {
        WalletAddress::parse("0xdddddddddddddddddddddddddddddddddddddddd").unwrap()
    }

    fn proof() -> ChallengeResponse {
        ChallengeResponse::new("nonce.mac")
    }

    fn call(function: &'static str) -> LedgerCall {
        let asset = AssetAddress::parse("0xeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee").unwrap();
        LedgerCall::new(CallSelector::new(ContractFamily::Deposit, function), &asset)
            .arg(BaseUnits::from(1u128))
    }

    fn policy(max_polls: u32) -> ConfirmationConfig {
        ConfirmationConfig {
            max_polls,
            initial_backoff: Duration::from_millis(10),
            max_backoff: Duration::from_millis(40),
            multiplier: 2.0,
        }
    }

    fn setup(max_polls: u32) -> (Arc<InMemoryLedger>, Arc<InMemoryIndex>, ConfirmationPipeline) {
        let index = Arc::new(InMemoryIndex::new());
        let ledger = Arc::new(InMemoryLedger::new().with_index(index.clone()));
        let pipeline =
            ConfirmationPipeline::new(ledger.clone(), index.clone(), policy(max_polls), policy(5));
        (ledger, index, pipeline)
    }

    #[tokio::test(start_paused = true)]
    async fn test_order_is_request_order_not_completion_order() {
        let (ledger, _, pipeline) = setup(3);
        ledger.delay_function("burn", Duration::from_millis(50));

        let calls = vec![call("burn"), call("mint")];
        let batch = pipeline.submit_all(&calls, &signer(), &proof()).await;

        assert!(batch.error.is_none());
        let submitted = ledger.submitted().await;
        // mint was accepted first, burn is still reported first
        assert_eq!(submitted[0].call.function(), "mint");
        assert_eq!(batch.records[0].hash, submitted[1].hash);
        assert_eq!(batch.records[1].hash, submitted[0].hash);
    }

    #[tokio::test(start_paused = true)]
    async fn test_confirms_within_lag_plus_one_polls() {
        let (ledger, index, pipeline) = setup(4);
        ledger.set_index_lag(3);

        let batch = pipeline.submit_all(&[call("mint")], &signer(), &proof()).await;
        let mut result = batch.into_result();
        pipeline.confirm(&mut result).await;

        assert_eq!(result.status, CompositeStatus::Confirmed);
        assert_eq!(index.poll_count(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out_without_losing_hashes() {
        let (ledger, index, pipeline) = setup(3);
        ledger.set_index_lag(10);

        let batch = pipeline.submit_all(&[call("mint")], &signer(), &proof()).await;
        let mut result = batch.into_result();
        pipeline.confirm(&mut result).await;

        assert_eq!(result.status, CompositeStatus::IndexingTimeout);
        assert_eq!(result.records[0].status(), TransactionStatus::TimedOut);
        assert_eq!(index.poll_count(), 3);
        let hashes = result.hashes();
        match result.into_result() {
            Err(OperationError::IndexingTimeout { hashes: reported }) => assert_eq!(reported, hashes),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_index_errors_count_as_unobserved() {
        let (_, index, pipeline) = setup(2);
        index.set_unavailable(true);

        let batch = pipeline.submit_all(&[call("mint")], &signer(), &proof()).await;
        let mut result = batch.into_result();
        pipeline.confirm(&mut result).await;
        assert_eq!(result.status, CompositeStatus::IndexingTimeout);
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_error_in_input_order() {
        let (ledger, _, pipeline) = setup(3);
        ledger.reject_function("pause", "not paused").await;
        ledger.reject_function("unpause", "not paused").await;

        let calls = vec![call("mint"), call("unpause"), call("pause")];
        let batch = pipeline.submit_all(&calls, &signer(), &proof()).await;

        assert_eq!(batch.records.len(), 1);
        match batch.error {
            Some(OperationError::LedgerRejection { reason }) => assert!(reason.contains("unpause")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_sequential_stops_at_failure() {
        let (ledger, _, pipeline) = setup(3);
        ledger.revert_function("approve", "allowance").await;

        let calls = vec![call("approve"), call("topUpUnderlyingAsset")];
        let batch = pipeline.submit_sequential(&calls, &signer(), &proof()).await;

        assert_eq!(ledger.submitted_functions().await, vec!["approve"]);
        assert_eq!(batch.records.len(), 1);
        assert!(matches!(batch.error, Some(OperationError::LedgerRejection { .. })));
    }
}
