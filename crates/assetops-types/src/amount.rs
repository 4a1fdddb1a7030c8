//! Base-unit amount conversion
//!
//! Ledger contracts store balances as unsigned integers scaled by the asset's
//! decimal precision (up to 18 decimals, 256-bit range). Amounts are therefore
//! handled as decimal digit strings end to end so no value is ever squeezed
//! through a float or a fixed-width integer.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use crate::{OperationError, Result, MAX_DECIMALS};

/// Integer amount in an asset's smallest unit
///
/// Always a minimal-length string of ASCII digits: no sign, no leading zeros,
/// no exponent. Zero is `"0"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BaseUnits(String);

impl BaseUnits {
    /// The zero amount
    pub fn zero() -> Self {
        Self("0".to_string())
    }

    /// Parse an integer digit string
    pub fn parse(s: &str) -> Result<Self> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(OperationError::invalid_amount(s, "base units must be digits only"));
        }
        Ok(Self::from_digits(s))
    }

    fn from_digits(digits: &str) -> Self {
        let trimmed = digits.trim_start_matches('0');
        if trimmed.is_empty() {
            Self::zero()
        } else {
            Self(trimmed.to_string())
        }
    }

    pub fn is_zero(&self) -> bool {
        self.0 == "0"
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert to `u128` when the value fits
    pub fn to_u128(&self) -> Option<u128> {
        self.0.parse().ok()
    }
}

impl From<u128> for BaseUnits {
    fn from(v: u128) -> Self {
        Self(v.to_string())
    }
}

impl TryFrom<String> for BaseUnits {
    type Error = OperationError;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl From<BaseUnits> for String {
    fn from(v: BaseUnits) -> String {
        v.0
    }
}

impl fmt::Display for BaseUnits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialOrd for BaseUnits {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BaseUnits {
    fn cmp(&self, other: &Self) -> Ordering {
        // Minimal-length digit strings order by length first
        self.0
            .len()
            .cmp(&other.0.len())
            .then_with(|| self.0.cmp(&other.0))
    }
}

/// A human decimal amount split into its integer and fractional digits
#[derive(Debug, Clone, PartialEq, Eq)]
struct DecimalParts {
    integer: String,
    fraction: String,
}

impl DecimalParts {
    /// Number of fractional digits that carry value (trailing zeros ignored)
    fn significant_fraction_digits(&self) -> usize {
        self.fraction.trim_end_matches('0').len()
    }
}

fn parse_decimal(input: &str) -> Result<DecimalParts> {
    let cleaned: String = input
        .trim()
        .chars()
        .filter(|c| *c != '_' && *c != ',')
        .collect();
    let unsigned = cleaned.strip_prefix('+').unwrap_or(&cleaned);

    if unsigned.starts_with('-') {
        return Err(OperationError::invalid_amount(input, "amount must not be negative"));
    }

    let (integer, fraction) = match unsigned.split_once('.') {
        Some((i, f)) => (i, f),
        None => (unsigned, ""),
    };

    if integer.is_empty() && fraction.is_empty() {
        return Err(OperationError::invalid_amount(input, "amount is empty"));
    }
    if !integer.bytes().all(|b| b.is_ascii_digit()) || !fraction.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(OperationError::invalid_amount(
            input,
            "amount must be a plain decimal number",
        ));
    }

    Ok(DecimalParts {
        integer: integer.to_string(),
        fraction: fraction.to_string(),
    })
}

fn check_decimals(decimals: u8) -> Result<()> {
    if decimals > MAX_DECIMALS {
        return Err(OperationError::invalid_request(format!(
            "decimal precision {} exceeds maximum {}",
            decimals, MAX_DECIMALS
        )));
    }
    Ok(())
}

/// Convert a human decimal amount into base units
///
/// Fractional digits beyond `decimals` are truncated toward zero; the result
/// is never rounded up.
pub fn to_base_units(amount: &str, decimals: u8) -> Result<BaseUnits> {
    check_decimals(decimals)?;
    let parts = parse_decimal(amount)?;
    let precision = decimals as usize;

    let mut digits = parts.integer;
    if parts.fraction.len() >= precision {
        digits.push_str(&parts.fraction[..precision]);
    } else {
        digits.push_str(&parts.fraction);
        digits.extend(std::iter::repeat('0').take(precision - parts.fraction.len()));
    }

    Ok(BaseUnits::from_digits(&digits))
}

/// Render base units as a human decimal amount
///
/// Trailing fractional zeros are dropped, so `1500000` at 6 decimals renders
/// as `1.5`.
pub fn from_base_units(units: &BaseUnits, decimals: u8) -> String {
    let precision = decimals as usize;
    let digits = units.as_str();
    if precision == 0 {
        return digits.to_string();
    }

    let padded = if digits.len() <= precision {
        format!("{}{}", "0".repeat(precision - digits.len() + 1), digits)
    } else {
        digits.to_string()
    };
    let (integer, fraction) = padded.split_at(padded.len() - precision);
    let fraction = fraction.trim_end_matches('0');

    if fraction.is_empty() {
        integer.to_string()
    } else {
        format!("{}.{}", integer, fraction)
    }
}

/// Validation rules applied on top of the raw conversion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmountRules {
    /// Whether a zero amount is acceptable for this field
    pub allow_zero: bool,
    /// Reject amounts with more significant fractional digits than the asset supports
    pub reject_excess_precision: bool,
    /// Optional upper bound as a human decimal amount (e.g. current balance)
    pub ceiling: Option<String>,
}

impl Default for AmountRules {
    fn default() -> Self {
        Self {
            allow_zero: false,
            reject_excess_precision: true,
            ceiling: None,
        }
    }
}

impl AmountRules {
    /// Rules with an upper bound
    pub fn with_ceiling(ceiling: impl Into<String>) -> Self {
        Self {
            ceiling: Some(ceiling.into()),
            ..Default::default()
        }
    }

    /// Rules that accept zero
    pub fn allowing_zero() -> Self {
        Self {
            allow_zero: true,
            ..Default::default()
        }
    }

    /// These rules, bounded by a caller-supplied ceiling when there is one
    pub fn bounded_by(&self, ceiling: Option<&str>) -> Self {
        Self {
            ceiling: ceiling.map(str::to_string),
            ..self.clone()
        }
    }

    /// These rules, accepting zero
    pub fn zero_allowed(&self) -> Self {
        Self {
            allow_zero: true,
            ..self.clone()
        }
    }
}

/// Validate and convert an amount according to `rules`
pub fn normalize_amount(amount: &str, decimals: u8, rules: &AmountRules) -> Result<BaseUnits> {
    check_decimals(decimals)?;
    let parts = parse_decimal(amount)?;

    if rules.reject_excess_precision && parts.significant_fraction_digits() > decimals as usize {
        return Err(OperationError::invalid_amount(
            amount,
            format!("at most {} fractional digits are allowed", decimals),
        ));
    }

    let units = to_base_units(amount, decimals)?;

    if units.is_zero() && !rules.allow_zero {
        return Err(OperationError::invalid_amount(amount, "amount must be greater than zero"));
    }

    if let Some(ref ceiling) = rules.ceiling {
        let limit = to_base_units(ceiling, decimals)?;
        if units > limit {
            return Err(OperationError::invalid_amount(
                amount,
                format!("amount exceeds the maximum of {}", ceiling),
            ));
        }
    }

    Ok(units)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_base_units() {
        assert_eq!(to_base_units("1.5", 6).unwrap().as_str(), "1500000");
        assert_eq!(to_base_units("100", 18).unwrap().as_str(), "100000000000000000000");
        assert_eq!(to_base_units("0.000001", 6).unwrap().as_str(), "1");
        assert_eq!(to_base_units("42", 0).unwrap().as_str(), "42");
        assert_eq!(to_base_units(".25", 2).unwrap().as_str(), "25");
        assert_eq!(to_base_units("1,000.5", 1).unwrap().as_str(), "10005");
    }

    #[test]
    fn test_truncates_never_rounds_up() {
        assert_eq!(to_base_units("1.999", 2).unwrap().as_str(), "199");
        assert_eq!(to_base_units("0.009", 2).unwrap().as_str(), "0");
        assert_eq!(to_base_units("7.77777777", 0).unwrap().as_str(), "7");
    }

    #[test]
    fn test_output_is_minimal() {
        assert_eq!(to_base_units("000.010", 3).unwrap().as_str(), "10");
        assert_eq!(to_base_units("0", 18).unwrap().as_str(), "0");
    }

    #[test]
    fn test_huge_amount_does_not_overflow() {
        let units = to_base_units("115792089237316195423570985008687907853269984665640564039457", 18)
            .unwrap();
        assert_eq!(units.as_str().len(), 78);
        assert!(units.to_u128().is_none());
    }

    #[test]
    fn test_rejects_malformed() {
        assert!(to_base_units("-1", 2).is_err());
        assert!(to_base_units("1e5", 2).is_err());
        assert!(to_base_units("", 2).is_err());
        assert!(to_base_units(".", 2).is_err());
        assert!(to_base_units("1.2.3", 2).is_err());
        assert!(to_base_units("1", 19).is_err());
    }

    #[test]
    fn test_from_base_units() {
        assert_eq!(from_base_units(&BaseUnits::parse("1500000").unwrap(), 6), "1.5");
        assert_eq!(from_base_units(&BaseUnits::parse("1").unwrap(), 6), "0.000001");
        assert_eq!(from_base_units(&BaseUnits::zero(), 6), "0");
        assert_eq!(from_base_units(&BaseUnits::parse("42").unwrap(), 0), "42");
        assert_eq!(from_base_units(&BaseUnits::parse("100").unwrap(), 2), "1");
    }

    #[test]
    fn test_display_reproduces_within_precision() {
        let cases = [
            ("1.23456789", 4u8, "1.2345"),
            ("0.5", 18, "0.5"),
            ("999.999", 2, "999.99"),
            ("3", 6, "3"),
        ];
        for (input, decimals, expected) in cases {
            let units = to_base_units(input, decimals).unwrap();
            assert_eq!(from_base_units(&units, decimals), expected, "{} @ {}", input, decimals);
        }
    }

    #[test]
    fn test_normalize_rules() {
        let rules = AmountRules::default();
        assert!(normalize_amount("0", 6, &rules).is_err());
        assert!(normalize_amount("0", 6, &AmountRules::allowing_zero()).is_ok());

        // excess non-zero precision is rejected, trailing zeros are fine
        assert!(normalize_amount("1.1234567", 6, &rules).is_err());
        assert_eq!(normalize_amount("1.1234560", 6, &rules).unwrap().as_str(), "1123456");

        let lenient = AmountRules {
            reject_excess_precision: false,
            ..Default::default()
        };
        assert_eq!(normalize_amount("1.1234567", 6, &lenient).unwrap().as_str(), "1123456");
    }

    #[test]
    fn test_normalize_ceiling() {
        let rules = AmountRules::with_ceiling("100.5");
        assert!(normalize_amount("100.5", 2, &rules).is_ok());
        assert!(normalize_amount("100.51", 2, &rules).is_err());
        assert!(normalize_amount("1000", 2, &rules).is_err());
    }

    #[test]
    fn test_field_rules_keep_precision_policy() {
        let lenient = AmountRules {
            reject_excess_precision: false,
            ..Default::default()
        };
        let bounded = lenient.bounded_by(Some("5"));
        assert!(!bounded.reject_excess_precision);
        assert!(normalize_amount("5.0001", 2, &bounded).is_ok());
        assert!(normalize_amount("5.01", 2, &bounded).is_err());

        let unbounded = bounded.bounded_by(None);
        assert!(normalize_amount("5000", 2, &unbounded).is_ok());

        let zero = AmountRules::default().zero_allowed();
        assert!(zero.reject_excess_precision);
        assert_eq!(normalize_amount("0", 6, &zero).unwrap(), BaseUnits::zero());
    }

    #[test]
    fn test_base_units_ordering() {
        let small = BaseUnits::parse("99").unwrap();
        let large = BaseUnits::parse("100").unwrap();
        assert!(small < large);
        assert_eq!(BaseUnits::parse("007").unwrap(), BaseUnits::from(7u128));
    }
}
