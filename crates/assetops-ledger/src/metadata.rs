//! Off-chain asset metadata store

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use assetops_types::{AssetAddress, AssetMetadata};

use crate::error::{LedgerError, Result};

/// Eventually consistent store for descriptive asset data
#[async_trait]
pub trait MetadataStore: Send + Sync {
    async fn upsert(&self, asset: &AssetAddress, metadata: &AssetMetadata) -> Result<()>;
}

/// In-memory metadata store
#[derive(Default)]
pub struct InMemoryMetadataStore {
    records: DashMap<AssetAddress, AssetMetadata>,
    failing: AtomicBool,
}

impl InMemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, asset: &AssetAddress) -> Option<AssetMetadata> {
        self.records.get(asset).map(|m| m.clone())
    }

    /// Make every subsequent write fail
    pub fn fail_writes(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl MetadataStore for InMemoryMetadataStore {
    async fn upsert(&self, asset: &AssetAddress, metadata: &AssetMetadata) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(LedgerError::Metadata {
                message: format!("write for {} refused", asset),
            });
        }
        self.records.insert(asset.clone(), metadata.clone());
        Ok(())
    }
}
