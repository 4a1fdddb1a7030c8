//! Operation orchestrator
//!
//! Entry point for every state-changing operation:
//!
//! ```text
//! guard → support check → verification → plan (normalize, dispatch)
//!       → consume proof → submit → confirm
//! ```
//!
//! Every step before "submit" fails with zero ledger calls.

use std::sync::Arc;
use tracing::{info, info_span, warn, Instrument};

use assetops_auth::{AuthenticatedCaller, VerificationService};
use assetops_ledger::{DerivedIndex, LedgerClient, MetadataStore, PrecisionSource};
use assetops_types::{
    AssetAddress, ChallengeResponse, CompositeOperationResult, CreateAssetRequest,
    OperationError, OperationKind, OperationRequest, RequestId, Result, TxHash,
    VerificationCode, VerificationContext, WalletAddress,
};

use crate::composer::Composer;
use crate::config::OrchestratorConfig;
use crate::dispatch::selector_for;
use crate::guard;
use crate::normalizer::AmountNormalizer;
use crate::pipeline::{ConfirmationPipeline, SubmissionBatch};

/// External services the orchestrator depends on
#[derive(Clone)]
pub struct Collaborators {
    pub verification: Arc<dyn VerificationService>,
    pub ledger: Arc<dyn LedgerClient>,
    pub index: Arc<dyn DerivedIndex>,
    pub precision: Arc<dyn PrecisionSource>,
    pub metadata: Arc<dyn MetadataStore>,
}

/// Outcome of an asset creation
#[derive(Debug)]
pub struct CreatedAsset {
    /// Address of the new asset, once the creation call was broadcast
    pub address: Option<AssetAddress>,
    pub result: CompositeOperationResult,
}

/// Authorizes, dispatches, submits and confirms asset operations
pub struct Orchestrator {
    verification: Arc<dyn VerificationService>,
    composer: Composer,
    config: OrchestratorConfig,
}

impl Orchestrator {
    pub fn new(collaborators: Collaborators, config: OrchestratorConfig) -> Self {
        let normalizer =
            AmountNormalizer::new(collaborators.precision, config.reject_excess_precision);
        let pipeline = ConfirmationPipeline::new(
            collaborators.ledger,
            collaborators.index,
            config.confirmation.clone(),
            config.finality.clone(),
        );
        Self {
            verification: collaborators.verification,
            composer: Composer::new(normalizer, pipeline, collaborators.metadata),
            config,
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn composer(&self) -> &Composer {
        &self.composer
    }

    /// Run one operation to a terminal status
    pub async fn execute(
        &self,
        caller: &AuthenticatedCaller,
        request: OperationRequest,
    ) -> CompositeOperationResult {
        let request_id = RequestId::new();
        let span = info_span!(
            "operation",
            request_id = %request_id,
            asset = %request.asset_address(),
            asset_type = %request.asset_type(),
            operation = %request.kind(),
        );
        self.run(caller, &request).instrument(span).await
    }

    /// Run one operation and collapse the outcome into ordered hashes
    pub async fn execute_for_hashes(
        &self,
        caller: &AuthenticatedCaller,
        request: OperationRequest,
    ) -> Result<Vec<TxHash>> {
        self.execute(caller, request).await.into_result()
    }

    async fn run(
        &self,
        caller: &AuthenticatedCaller,
        request: &OperationRequest,
    ) -> CompositeOperationResult {
        let kind = request.kind();
        let actor = request.actor();

        let prepared = async {
            guard::authorize(caller, actor, kind)?;
            selector_for(request.asset_type(), kind)?;
            let context = self.verify(actor, request.verification()).await?;
            let plan = self.composer.plan(request).await?;
            let proof = self.redeem(context).await?;
            Ok::<_, OperationError>((plan, proof))
        }
        .await;

        let (plan, proof) = match prepared {
            Ok(prepared) => prepared,
            Err(err) => return rejected(err),
        };

        let batch = self.composer.execute(&plan, actor, &proof).await;
        self.finish(batch).await
    }

    /// Deploy a new asset, write its metadata and enroll its initial admins
    pub async fn create_asset(
        &self,
        caller: &AuthenticatedCaller,
        request: CreateAssetRequest,
    ) -> CreatedAsset {
        let request_id = RequestId::new();
        let span = info_span!(
            "create_asset",
            request_id = %request_id,
            asset_type = %request.asset_type(),
            symbol = %request.metadata.symbol,
        );
        self.run_create(caller, &request).instrument(span).await
    }

    async fn run_create(
        &self,
        caller: &AuthenticatedCaller,
        request: &CreateAssetRequest,
    ) -> CreatedAsset {
        let actor = &request.actor;

        let prepared = async {
            guard::authorize(caller, actor, OperationKind::Create)?;
            selector_for(request.asset_type(), OperationKind::Create)?;
            let context = self.verify(actor, &request.verification).await?;
            let call = self.composer.create_call(request).await?;
            let proof = self.redeem(context).await?;
            Ok::<_, OperationError>((call, proof))
        }
        .await;

        let (call, proof) = match prepared {
            Ok(prepared) => prepared,
            Err(err) => {
                return CreatedAsset {
                    address: None,
                    result: rejected(err),
                }
            }
        };

        match self.composer.create_asset(request, &call, &proof).await {
            Ok((address, batch)) => CreatedAsset {
                address: Some(address),
                result: self.finish(batch).await,
            },
            Err(err) => CreatedAsset {
                address: None,
                result: rejected(err),
            },
        }
    }

    // =========================================================================
    // Steps
    // =========================================================================

    /// Obtain a proof from the verification service, bound to `actor`
    async fn verify(
        &self,
        actor: &WalletAddress,
        code: &VerificationCode,
    ) -> Result<VerificationContext> {
        let context = self.verification.authorize(actor, code).await?;
        if !context.is_bound_to(actor) {
            return Err(OperationError::AuthenticationFailure {
                reason: "verification proof is bound to another wallet".to_string(),
            });
        }
        Ok(context)
    }

    /// Redeem the proof for the write about to happen
    async fn redeem(&self, context: VerificationContext) -> Result<ChallengeResponse> {
        if context.is_expired() {
            return Err(OperationError::ReplayRejected {
                reason: "verification proof has expired".to_string(),
            });
        }
        self.verification.consume(&context).await?;
        Ok(context.challenge_response)
    }

    /// Confirm whatever was broadcast and settle the terminal status
    async fn finish(&self, batch: SubmissionBatch) -> CompositeOperationResult {
        let mut result = batch.into_result();
        self.composer.pipeline().confirm(&mut result).await;

        match &result.error {
            Some(err) => warn!(
                submitted = result.records.len(),
                status = ?result.status,
                error = %err,
                "Operation finished with an error"
            ),
            None => info!(
                submitted = result.records.len(),
                status = ?result.status,
                "Operation finished"
            ),
        }
        result
    }
}

/// Result for a request refused before anything was broadcast
fn rejected(err: OperationError) -> CompositeOperationResult {
    warn!(error = %err, "Operation rejected");
    let mut result = CompositeOperationResult::pending();
    result.error = Some(err);
    result.settle_status();
    result
}
