//! Rate amounts
//!
//! A freight rate is a quote, not a balance: amounts are compared against
//! policy thresholds and displayed, never summed. The only arithmetic
//! invariant that matters is non-negativity, enforced at construction.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("Rate amount cannot be negative: {0}")]
    NegativeAmount(Decimal),
}

/// A non-negative rate amount.
///
/// Ordering follows the underlying decimal, which is what the elevation
/// threshold check relies on.
///
/// # Example
/// ```
/// use freightgate_core::Amount;
/// use rust_decimal::Decimal;
///
/// let quote = Amount::new(Decimal::new(2_500, 0)).unwrap();
/// let threshold = Amount::new(Decimal::new(10_000, 0)).unwrap();
/// assert!(quote < threshold);
///
/// assert!(Amount::new(Decimal::new(-1, 0)).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    /// Validated constructor; rejects negative values.
    pub fn new(value: Decimal) -> Result<Self, AmountError> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(AmountError::NegativeAmount(value));
        }
        Ok(Self(value))
    }

    /// Skip validation. For compile-time constants and rows already
    /// validated on the way into storage.
    #[inline]
    pub const fn new_unchecked(value: Decimal) -> Self {
        Self(value)
    }

    /// The underlying decimal
    #[inline]
    pub const fn value(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = AmountError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_amount_accepted() {
        let rate = Amount::new(Decimal::new(2_500, 0)).unwrap();
        assert_eq!(rate.value(), Decimal::new(2_500, 0));
    }

    #[test]
    fn test_zero_amount_accepted() {
        assert!(Amount::new(Decimal::ZERO).is_ok());
    }

    #[test]
    fn test_negative_amount_rejected() {
        assert!(matches!(
            Amount::new(Decimal::new(-250, 0)),
            Err(AmountError::NegativeAmount(_))
        ));
    }

    #[test]
    fn test_ordering_against_threshold() {
        let below = Amount::new(Decimal::new(9_999, 0)).unwrap();
        let threshold = Amount::new(Decimal::new(10_000, 0)).unwrap();
        let above = Amount::new(Decimal::new(10_001, 0)).unwrap();

        assert!(below < threshold);
        assert!(above >= threshold);
        assert!(threshold >= threshold);
    }

    #[test]
    fn test_serde_rejects_negative() {
        let ok: Result<Amount, _> = serde_json::from_str("1250.50");
        assert_eq!(ok.unwrap().value(), Decimal::new(125_050, 2));

        let bad: Result<Amount, _> = serde_json::from_str("-1");
        assert!(bad.is_err());
    }

    #[test]
    fn test_display_matches_decimal() {
        let rate = Amount::new(Decimal::new(125_050, 2)).unwrap();
        assert_eq!(rate.to_string(), "1250.50");
    }
}
