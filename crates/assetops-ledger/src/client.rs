//! Ledger client seam

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use assetops_types::{AssetAddress, ChallengeResponse, TxHash, WalletAddress};

use crate::call::LedgerCall;
use crate::error::Result;

/// Outcome of a mined transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReceiptStatus {
    Success,
    Reverted { reason: String },
}

/// Receipt of a mined transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    pub hash: TxHash,
    pub status: ReceiptStatus,
    pub block_number: u64,
    /// Address of the contract deployed by the transaction, if any
    pub contract_address: Option<AssetAddress>,
}

impl TxReceipt {
    pub fn is_success(&self) -> bool {
        self.status == ReceiptStatus::Success
    }
}

/// Write path to the ledger
///
/// Submission returns as soon as the ledger accepts the call; whether the
/// transaction was mined is observed through [`LedgerClient::transaction_receipt`].
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Submit a call signed by `signer` and authorized by `proof`
    async fn submit(
        &self,
        call: &LedgerCall,
        signer: &WalletAddress,
        proof: &ChallengeResponse,
    ) -> Result<TxHash>;

    /// Receipt of a mined transaction, `None` while pending
    async fn transaction_receipt(&self, hash: &TxHash) -> Result<Option<TxReceipt>>;

    /// Address a factory call by `signer` will deploy to
    async fn predict_address(&self, call: &LedgerCall, signer: &WalletAddress)
        -> Result<AssetAddress>;
}
