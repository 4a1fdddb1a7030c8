//! AssetOps Types - Canonical domain types for tokenized asset operations
//!
//! This crate contains all foundational types for AssetOps with zero dependencies
//! on other assetops crates. It defines the type system shared by the
//! verification, ledger and orchestration layers:
//!
//! - Identity types (WalletAddress, AssetAddress, TxHash, RequestId)
//! - Asset variants and the operation kinds that can target them
//! - Role sets and role diffs
//! - Base-unit amount conversion for arbitrary decimal precision
//! - Transaction records and composite operation results
//! - Single-use verification proofs
//!
//! # Operation Flow
//!
//! ```text
//! Request → Guard → Verification → Normalize → Dispatch → Submit → Confirm
//! ```

pub mod identity;
pub mod asset;
pub mod amount;
pub mod operation;
pub mod role;
pub mod transaction;
pub mod verification;
pub mod error;

pub use identity::*;
pub use asset::*;
pub use amount::*;
pub use operation::*;
pub use role::*;
pub use transaction::*;
pub use verification::*;
pub use error::*;

/// Version of the AssetOps types schema
pub const TYPES_VERSION: &str = "0.1.0";
