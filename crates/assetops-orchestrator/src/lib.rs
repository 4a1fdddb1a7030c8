//! AssetOps Orchestrator - authorization, dispatch, composition and confirmation
//!
//! Takes a normalized [`OperationRequest`](assetops_types::OperationRequest)
//! and returns the ordered transaction hashes it produced or a typed error.
//!
//! # Pipeline
//!
//! 1. [`guard`]: the caller must hold the capability for the operation kind
//! 2. [`dispatch`]: the (asset variant, operation) pair must be supported
//! 3. Verification: the code is exchanged for a single-use proof
//! 4. [`normalizer`] + [`composer`]: amounts become base units and the
//!    request becomes an [`ExecutionPlan`]
//! 5. [`pipeline`]: calls are submitted and confirmed against the derived index
//!
//! Steps 1 to 4 have no side effects on the ledger. Partially completed
//! composite operations are reported, never rolled back.

pub mod composer;
pub mod config;
pub mod dispatch;
pub mod guard;
pub mod normalizer;
pub mod orchestrator;
pub mod pipeline;

pub use composer::{admin_grant_calls, role_update_plan, Composer, ExecutionPlan};
pub use config::{ConfigError, ConfirmationConfig, FinalityConfig, OrchestratorConfig, PollPolicy};
pub use dispatch::{
    entries_for, entry_point, is_supported, selector_for, support_matrix, Leg, SupportEntry,
    SUPPORT_TABLE,
};
pub use normalizer::AmountNormalizer;
pub use orchestrator::{Collaborators, CreatedAsset, Orchestrator};
pub use pipeline::{ConfirmationPipeline, SubmissionBatch};
