//! Derived index (read path)
//!
//! The index lags behind the ledger. [`InMemoryIndex`] models the lag as a
//! number of `has_observed` polls a transaction stays invisible for.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use assetops_types::{AssetAddress, TxHash, MAX_DECIMALS};

use crate::error::{LedgerError, Result};

/// Secondary read store fed asynchronously from the ledger
#[async_trait]
pub trait DerivedIndex: Send + Sync {
    async fn has_observed(&self, hash: &TxHash) -> Result<bool>;
}

/// Resolves the decimal precision of an asset
#[async_trait]
pub trait PrecisionSource: Send + Sync {
    async fn decimals(&self, asset: &AssetAddress) -> Result<u8>;
}

/// In-memory derived index
#[derive(Default)]
pub struct InMemoryIndex {
    /// Published hashes with the number of polls left before they show up
    pending: DashMap<TxHash, u32>,
    decimals: DashMap<AssetAddress, u8>,
    unavailable: AtomicBool,
    polls: AtomicU64,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `hash` visible after `lag` more polls
    pub fn publish(&self, hash: TxHash, lag: u32) {
        self.pending.insert(hash, lag);
    }

    /// Register the precision of an asset
    pub fn set_decimals(&self, asset: AssetAddress, decimals: u8) {
        self.decimals.insert(asset, decimals);
    }

    /// Simulate an outage: every lookup fails
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Total `has_observed` calls served
    pub fn poll_count(&self) -> u64 {
        self.polls.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(LedgerError::unavailable("index", "index is not reachable"));
        }
        Ok(())
    }
}

#[async_trait]
impl DerivedIndex for InMemoryIndex {
    async fn has_observed(&self, hash: &TxHash) -> Result<bool> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        let Some(mut remaining) = self.pending.get_mut(hash) else {
            return Ok(false);
        };
        if *remaining == 0 {
            return Ok(true);
        }
        *remaining -= 1;
        Ok(false)
    }
}

#[async_trait]
impl PrecisionSource for InMemoryIndex {
    async fn decimals(&self, asset: &AssetAddress) -> Result<u8> {
        self.check_available()?;
        let decimals = self
            .decimals
            .get(asset)
            .map(|d| *d)
            .ok_or_else(|| LedgerError::UnknownAsset {
                asset: asset.clone(),
            })?;
        if decimals > MAX_DECIMALS {
            return Err(LedgerError::unavailable(
                "index",
                format!("asset {} reports {} decimals", asset, decimals),
            ));
        }
        Ok(decimals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lag_counts_polls() {
        let index = InMemoryIndex::new();
        let hash = TxHash::from_bytes([7; 32]);

        assert!(!index.has_observed(&hash).await.unwrap());
        index.publish(hash.clone(), 2);
        assert!(!index.has_observed(&hash).await.unwrap());
        assert!(!index.has_observed(&hash).await.unwrap());
        assert!(index.has_observed(&hash).await.unwrap());
        assert!(index.has_observed(&hash).await.unwrap());
        assert_eq!(index.poll_count(), 5);
    }

    #[tokio::test]
    async fn test_decimals() {
        let index = InMemoryIndex::new();
        let asset = AssetAddress::parse("0x7777777777777777777777777777777777777777").unwrap();

        assert!(matches!(
            index.decimals(&asset).await,
            Err(LedgerError::UnknownAsset { .. })
        ));
        index.set_decimals(asset.clone(), 6);
        assert_eq!(index.decimals(&asset).await.unwrap(), 6);

        index.set_unavailable(true);
        assert!(index.decimals(&asset).await.is_err());
    }
}
