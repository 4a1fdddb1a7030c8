//! In-memory ledger
//!
//! Records every accepted call, mines it immediately into a receipt and
//! publishes the hash to a linked [`InMemoryIndex`]. Rejections, reverts and
//! submission delays can be injected per call.

use async_trait::async_trait;
use dashmap::DashMap;
use sha3::{Digest, Keccak256};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info};

use assetops_types::{AssetAddress, ChallengeResponse, TxHash, WalletAddress};

use crate::call::{CallTarget, LedgerCall};
use crate::client::{LedgerClient, ReceiptStatus, TxReceipt};
use crate::error::{LedgerError, Result};
use crate::index::InMemoryIndex;

type CallMatcher = Box<dyn Fn(&LedgerCall) -> bool + Send + Sync>;

/// How a matching call fails
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FailureMode {
    /// Refused at submission, no hash
    Reject,
    /// Accepted and mined, but the receipt is reverted
    Revert,
}

struct FailureRule {
    matcher: CallMatcher,
    mode: FailureMode,
    reason: String,
}

/// A call the ledger accepted
#[derive(Debug, Clone)]
pub struct SubmittedCall {
    pub hash: TxHash,
    pub call: LedgerCall,
    pub signer: WalletAddress,
}

/// In-memory ledger for tests and demos
pub struct InMemoryLedger {
    submitted: RwLock<Vec<SubmittedCall>>,
    receipts: DashMap<TxHash, TxReceipt>,
    rules: RwLock<Vec<FailureRule>>,
    delays: DashMap<&'static str, Duration>,
    index: Option<Arc<InMemoryIndex>>,
    index_lag: AtomicU32,
    nonce: AtomicU64,
    block: AtomicU64,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self {
            submitted: RwLock::new(Vec::new()),
            receipts: DashMap::new(),
            rules: RwLock::new(Vec::new()),
            delays: DashMap::new(),
            index: None,
            index_lag: AtomicU32::new(0),
            nonce: AtomicU64::new(0),
            block: AtomicU64::new(1),
        }
    }

    /// Publish mined transactions to `index`
    pub fn with_index(mut self, index: Arc<InMemoryIndex>) -> Self {
        self.index = Some(index);
        self
    }

    /// Polls a published hash stays invisible to the linked index
    pub fn set_index_lag(&self, polls: u32) {
        self.index_lag.store(polls, Ordering::SeqCst);
    }

    /// Refuse every call to `function`
    pub async fn reject_function(&self, function: &'static str, reason: impl Into<String>) {
        self.reject_when(move |call| call.function() == function, reason)
            .await;
    }

    /// Refuse every call matching `matcher`
    pub async fn reject_when(
        &self,
        matcher: impl Fn(&LedgerCall) -> bool + Send + Sync + 'static,
        reason: impl Into<String>,
    ) {
        self.add_rule(Box::new(matcher), FailureMode::Reject, reason.into())
            .await;
    }

    /// Accept calls to `function` but revert them when mined
    pub async fn revert_function(&self, function: &'static str, reason: impl Into<String>) {
        self.add_rule(
            Box::new(move |call: &LedgerCall| call.function() == function),
            FailureMode::Revert,
            reason.into(),
        )
        .await;
    }

    /// Delay submissions of `function` by `delay`
    pub fn delay_function(&self, function: &'static str, delay: Duration) {
        self.delays.insert(function, delay);
    }

    /// Accepted calls in acceptance order
    pub async fn submitted(&self) -> Vec<SubmittedCall> {
        self.submitted.read().await.clone()
    }

    /// Function names of accepted calls in acceptance order
    pub async fn submitted_functions(&self) -> Vec<&'static str> {
        self.submitted
            .read()
            .await
            .iter()
            .map(|s| s.call.function())
            .collect()
    }

    pub async fn submission_count(&self) -> usize {
        self.submitted.read().await.len()
    }

    async fn add_rule(&self, matcher: CallMatcher, mode: FailureMode, reason: String) {
        self.rules.write().await.push(FailureRule {
            matcher,
            mode,
            reason,
        });
    }

    async fn failure_for(&self, call: &LedgerCall) -> Option<(FailureMode, String)> {
        self.rules
            .read()
            .await
            .iter()
            .find(|rule| (rule.matcher)(call))
            .map(|rule| (rule.mode, rule.reason.clone()))
    }

    fn tx_hash(&self, call: &LedgerCall, signer: &WalletAddress) -> Result<TxHash> {
        let nonce = self.nonce.fetch_add(1, Ordering::SeqCst);
        let mut hasher = Keccak256::new();
        hasher.update(call_fingerprint(call, signer)?);
        hasher.update(nonce.to_be_bytes());
        Ok(TxHash::from_bytes(hasher.finalize().into()))
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

/// Deterministic encoding of a call and its signer
fn call_fingerprint(call: &LedgerCall, signer: &WalletAddress) -> Result<Vec<u8>> {
    let mut bytes = serde_json::to_vec(call)
        .map_err(|e| LedgerError::unavailable("ledger", format!("cannot encode call: {}", e)))?;
    bytes.extend_from_slice(signer.as_str().as_bytes());
    Ok(bytes)
}

#[async_trait]
impl LedgerClient for InMemoryLedger {
    async fn submit(
        &self,
        call: &LedgerCall,
        signer: &WalletAddress,
        proof: &ChallengeResponse,
    ) -> Result<TxHash> {
        if proof.expose().is_empty() {
            return Err(LedgerError::Rejected {
                selector: call.selector.to_string(),
                reason: "missing challenge response".to_string(),
            });
        }

        let delay = self.delays.get(call.function()).map(|d| *d);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let failure = self.failure_for(call).await;
        if let Some((FailureMode::Reject, reason)) = &failure {
            debug!(call = %call, reason = %reason, "Call rejected");
            return Err(LedgerError::Rejected {
                selector: call.selector.to_string(),
                reason: reason.clone(),
            });
        }

        let hash = self.tx_hash(call, signer)?;
        let block_number = self.block.fetch_add(1, Ordering::SeqCst);

        let status = match failure {
            Some((FailureMode::Revert, reason)) => ReceiptStatus::Reverted { reason },
            _ => ReceiptStatus::Success,
        };
        let contract_address = match (&call.target, &status) {
            (CallTarget::Factory, ReceiptStatus::Success) => {
                Some(self.predict_address(call, signer).await?)
            }
            _ => None,
        };

        self.receipts.insert(
            hash.clone(),
            TxReceipt {
                hash: hash.clone(),
                status,
                block_number,
                contract_address,
            },
        );
        self.submitted.write().await.push(SubmittedCall {
            hash: hash.clone(),
            call: call.clone(),
            signer: signer.clone(),
        });

        if let Some(index) = &self.index {
            index.publish(hash.clone(), self.index_lag.load(Ordering::SeqCst));
        }

        info!(call = %call, hash = %hash, block = block_number, "Transaction mined");
        Ok(hash)
    }

    async fn transaction_receipt(&self, hash: &TxHash) -> Result<Option<TxReceipt>> {
        Ok(self.receipts.get(hash).map(|r| r.clone()))
    }

    async fn predict_address(
        &self,
        call: &LedgerCall,
        signer: &WalletAddress,
    ) -> Result<AssetAddress> {
        // CREATE2-style: the address depends only on deployer and init data
        let digest: [u8; 32] = Keccak256::digest(call_fingerprint(call, signer)?).into();
        let mut address = [0u8; 20];
        address.copy_from_slice(&digest[12..]);
        Ok(AssetAddress::from_bytes(address))
    }
}
