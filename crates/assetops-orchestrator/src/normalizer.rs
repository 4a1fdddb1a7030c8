//! Amount normalizer
//!
//! Resolves an asset's precision and turns a human decimal amount into base
//! units. Each amount field brings its own [`AmountRules`]; the normalizer only
//! contributes the process-wide precision policy through [`AmountNormalizer::rules`].

use std::sync::Arc;

use assetops_ledger::PrecisionSource;
use assetops_types::{normalize_amount, AmountRules, AssetAddress, BaseUnits, Result};
use tracing::debug;

/// Normalizes user-entered amounts against ledger precision
#[derive(Clone)]
pub struct AmountNormalizer {
    precision: Arc<dyn PrecisionSource>,
    base: AmountRules,
}

impl AmountNormalizer {
    pub fn new(precision: Arc<dyn PrecisionSource>, reject_excess_precision: bool) -> Self {
        Self {
            precision,
            base: AmountRules {
                reject_excess_precision,
                ..AmountRules::default()
            },
        }
    }

    /// Rules for a field that must be positive and has no upper bound
    pub fn rules(&self) -> &AmountRules {
        &self.base
    }

    /// Normalize `amount` using the precision of `asset`
    pub async fn normalize(
        &self,
        amount: &str,
        asset: &AssetAddress,
        rules: &AmountRules,
    ) -> Result<BaseUnits> {
        let decimals = self.decimals(asset).await?;
        self.normalize_at(amount, decimals, rules)
    }

    /// Normalize `amount` at a known precision
    pub fn normalize_at(&self, amount: &str, decimals: u8, rules: &AmountRules) -> Result<BaseUnits> {
        let units = normalize_amount(amount, decimals, rules)?;
        debug!(
            amount,
            decimals,
            units = %units,
            ceiling = rules.ceiling.as_deref().unwrap_or("none"),
            "Amount normalized"
        );
        Ok(units)
    }

    /// Resolve the precision of `asset`
    pub async fn decimals(&self, asset: &AssetAddress) -> Result<u8> {
        Ok(self.precision.decimals(asset).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assetops_ledger::InMemoryIndex;
    use assetops_types::OperationError;

    fn asset() -> AssetAddress {
        AssetAddress::parse("0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb").unwrap()
    }

    fn normalizer(reject_excess_precision: bool) -> AmountNormalizer {
        let index = InMemoryIndex::new();
        index.set_decimals(asset(), 6);
        AmountNormalizer::new(Arc::new(index), reject_excess_precision)
    }

    #[tokio::test]
    async fn test_uses_asset_precision() {
        let normalizer = normalizer(true);
        let units = normalizer
            .normalize("12.5", &asset(), normalizer.rules())
            .await
            .unwrap();
        assert_eq!(units.as_str(), "12500000");
    }

    #[tokio::test]
    async fn test_rejections() {
        let normalizer = normalizer(true);
        let bounded = normalizer.rules().bounded_by(Some("100"));
        assert!(matches!(
            normalizer.normalize("0", &asset(), &bounded).await,
            Err(OperationError::InvalidAmount { .. })
        ));
        assert!(matches!(
            normalizer.normalize("1.0000001", &asset(), &bounded).await,
            Err(OperationError::InvalidAmount { .. })
        ));
        assert!(matches!(
            normalizer.normalize("100.000001", &asset(), &bounded).await,
            Err(OperationError::InvalidAmount { .. })
        ));
        assert!(normalizer.normalize("100", &asset(), &bounded).await.is_ok());
    }

    #[tokio::test]
    async fn test_ceiling_applies_only_where_given() {
        let normalizer = normalizer(true);
        assert!(normalizer
            .normalize("1000000", &asset(), normalizer.rules())
            .await
            .is_ok());
        assert!(normalizer
            .normalize("1000000", &asset(), &normalizer.rules().bounded_by(Some("10")))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_lenient_precision_truncates() {
        let normalizer = normalizer(false);
        let units = normalizer
            .normalize("1.23456789", &asset(), normalizer.rules())
            .await
            .unwrap();
        assert_eq!(units.as_str(), "1234567");
    }

    #[tokio::test]
    async fn test_unknown_asset() {
        let normalizer = normalizer(true);
        let other = AssetAddress::parse("0xcccccccccccccccccccccccccccccccccccccccc").unwrap();
        assert!(matches!(
            normalizer.normalize("1", &other, normalizer.rules()).await,
            Err(OperationError::InvalidRequest { .. })
        ));
    }
}
