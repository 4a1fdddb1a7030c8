//! AssetOps Ledger - collaborators on both sides of the consistency gap
//!
//! - [`LedgerClient`]: the write path. Accepts contract calls and returns
//!   transaction hashes.
//! - [`DerivedIndex`]: the read path. Observes mined transactions some time
//!   after the ledger accepted them.
//! - [`PrecisionSource`]: decimal precision per asset, served by the index.
//! - [`MetadataStore`]: off-chain descriptive data for each asset.
//!
//! Each seam ships an in-memory implementation.
//!
//! # Invariants
//!
//! 1. A rejected call leaves no transaction behind
//! 2. An accepted call always yields a receipt
//! 3. Factory deployments land on the predicted address

pub mod call;
pub mod client;
pub mod error;
pub mod index;
pub mod memory;
pub mod metadata;

pub use call::{CallArg, CallSelector, CallTarget, ContractFamily, LedgerCall};
pub use client::{LedgerClient, ReceiptStatus, TxReceipt};
pub use error::{LedgerError, Result};
pub use index::{DerivedIndex, InMemoryIndex, PrecisionSource};
pub use memory::{InMemoryLedger, SubmittedCall};
pub use metadata::{InMemoryMetadataStore, MetadataStore};
