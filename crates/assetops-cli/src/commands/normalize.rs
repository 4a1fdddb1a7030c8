//! Amount normalization

use assetops_types::{from_base_units, normalize_amount, AmountRules};

use crate::display;

/// Normalize `amount` at `decimals` and show the display round trip
pub fn run(amount: &str, decimals: u8, allow_zero: bool) -> anyhow::Result<()> {
    display::section("Amount normalization");

    let rules = AmountRules {
        allow_zero,
        ..AmountRules::default()
    };
    let units = match normalize_amount(amount, decimals, &rules) {
        Ok(units) => units,
        Err(err) => {
            display::error(&err.to_string());
            return Err(err.into());
        }
    };

    display::kv("input", amount);
    display::kv("decimals", &decimals.to_string());
    display::kv("base units", units.as_str());
    display::kv("displayed", &from_base_units(&units, decimals));
    display::success("Amount is valid");
    Ok(())
}
