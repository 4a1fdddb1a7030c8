//! Shared setup for orchestration tests: every collaborator in memory

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use assetops_auth::config::{PincodeConfig, VerificationConfig};
use assetops_auth::{AuthenticatedCaller, Capability, Permissions, VerificationGate};
use assetops_ledger::{
    InMemoryIndex, InMemoryLedger, InMemoryMetadataStore, LedgerClient, SubmittedCall,
};
use assetops_orchestrator::{Collaborators, Orchestrator, OrchestratorConfig, PollPolicy};
use assetops_types::{
    AssetAddress, AssetType, OperationPayload, OperationRequest, TxHash, VerificationCode,
    WalletAddress,
};

pub const PINCODE: &str = "482913";

pub fn operator() -> WalletAddress {
    WalletAddress::parse("0x1111111111111111111111111111111111111111").unwrap()
}

pub fn recipient() -> WalletAddress {
    WalletAddress::parse("0x2222222222222222222222222222222222222222").unwrap()
}

/// Asset under test, 6 decimals
pub fn asset() -> AssetAddress {
    AssetAddress::parse("0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa").unwrap()
}

/// Underlying asset of the bond, 18 decimals
pub fn underlying() -> AssetAddress {
    AssetAddress::parse("0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb").unwrap()
}

/// Yield schedule attached to the bond
pub fn schedule() -> AssetAddress {
    AssetAddress::parse("0xcccccccccccccccccccccccccccccccccccccccc").unwrap()
}

pub fn fast_policy(max_polls: u32) -> PollPolicy {
    PollPolicy {
        max_polls,
        initial_backoff: Duration::from_millis(5),
        max_backoff: Duration::from_millis(20),
        multiplier: 2.0,
    }
}

pub struct Harness {
    pub gate: Arc<VerificationGate>,
    pub ledger: Arc<InMemoryLedger>,
    pub index: Arc<InMemoryIndex>,
    pub metadata: Arc<InMemoryMetadataStore>,
    pub orchestrator: Orchestrator,
}

impl Harness {
    pub async fn new() -> Self {
        Self::with_confirmation_polls(5).await
    }

    pub async fn with_confirmation_polls(max_polls: u32) -> Self {
        let gate = Arc::new(VerificationGate::in_memory(VerificationConfig {
            pincode: PincodeConfig {
                memory_cost: 4096,
                time_cost: 1,
                ..Default::default()
            },
            ..Default::default()
        }));
        gate.enroll_pincode(&operator(), PINCODE).await.unwrap();

        let index = Arc::new(InMemoryIndex::new());
        index.set_decimals(asset(), 6);
        index.set_decimals(underlying(), 18);
        let ledger = Arc::new(InMemoryLedger::new().with_index(index.clone()));
        let metadata = Arc::new(InMemoryMetadataStore::new());

        let orchestrator = build(&gate, ledger.clone(), &index, &metadata, max_polls);

        Self {
            gate,
            ledger,
            index,
            metadata,
            orchestrator,
        }
    }

    /// Same collaborators, different ledger
    pub fn orchestrator_with_ledger(&self, ledger: Arc<dyn LedgerClient>) -> Orchestrator {
        build(&self.gate, ledger, &self.index, &self.metadata, 5)
    }

    /// Calls the ledger accepted, looked up by hash
    pub async fn call_for(&self, hash: &TxHash) -> SubmittedCall {
        self.ledger
            .submitted()
            .await
            .into_iter()
            .find(|c| &c.hash == hash)
            .unwrap()
    }
}

fn build(
    gate: &Arc<VerificationGate>,
    ledger: Arc<dyn LedgerClient>,
    index: &Arc<InMemoryIndex>,
    metadata: &Arc<InMemoryMetadataStore>,
    max_polls: u32,
) -> Orchestrator {
    let config = OrchestratorConfig {
        confirmation: fast_policy(max_polls),
        finality: fast_policy(5),
        ..Default::default()
    };
    Orchestrator::new(
        Collaborators {
            verification: gate.clone(),
            ledger,
            index: index.clone(),
            precision: index.clone(),
            metadata: metadata.clone(),
        },
        config,
    )
}

pub fn admin() -> AuthenticatedCaller {
    AuthenticatedCaller::new(operator(), Permissions::admin())
}

pub fn caller_with(capabilities: impl IntoIterator<Item = Capability>) -> AuthenticatedCaller {
    AuthenticatedCaller::new(operator(), Permissions::new(capabilities))
}

pub fn request(asset_type: AssetType, payload: OperationPayload) -> OperationRequest {
    request_with_code(asset_type, payload, VerificationCode::pincode(PINCODE))
}

pub fn request_with_code(
    asset_type: AssetType,
    payload: OperationPayload,
    code: VerificationCode,
) -> OperationRequest {
    OperationRequest::new(asset_type, asset(), operator(), code, payload)
}
