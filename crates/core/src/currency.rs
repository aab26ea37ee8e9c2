//! Currency - Type-safe currency codes
//!
//! Freight rates are quoted in a small set of fiat currencies; anything
//! else uses the `Other` fallback.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur when parsing currencies
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CurrencyError {
    #[error("Empty currency code")]
    EmptyCode,

    #[error("Currency code too long (max 10 chars): {0}")]
    TooLong(String),

    #[error("Invalid currency code format: {0}")]
    InvalidFormat(String),
}

/// Currency codes for rate quotes
///
/// The lanes FreightGate serves quote in USD, CAD, and MXN; EUR covers
/// the occasional trans-Atlantic contract. Anything else uses `Other`.
///
/// # Examples
/// ```
/// use freightgate_core::Currency;
///
/// let usd: Currency = "usd".parse().unwrap();
/// assert_eq!(usd, Currency::Usd);
/// assert_eq!(usd.to_string(), "USD");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Currency {
    /// US Dollar
    Usd,
    /// Canadian Dollar
    Cad,
    /// Mexican Peso
    Mxn,
    /// Euro
    Eur,
    /// Any other currency
    Other(String),
}

impl Currency {
    /// Returns the currency code as a string slice
    pub fn code(&self) -> &str {
        match self {
            Currency::Usd => "USD",
            Currency::Cad => "CAD",
            Currency::Mxn => "MXN",
            Currency::Eur => "EUR",
            Currency::Other(s) => s.as_str(),
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Currency {
    type Err = CurrencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_uppercase();

        if s.is_empty() {
            return Err(CurrencyError::EmptyCode);
        }

        if s.len() > 10 {
            return Err(CurrencyError::TooLong(s));
        }

        if !s.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(CurrencyError::InvalidFormat(s));
        }

        Ok(match s.as_str() {
            "USD" => Currency::Usd,
            "CAD" => Currency::Cad,
            "MXN" => Currency::Mxn,
            "EUR" => Currency::Eur,
            _ => Currency::Other(s),
        })
    }
}

impl TryFrom<String> for Currency {
    type Error = CurrencyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Currency> for String {
    fn from(currency: Currency) -> Self {
        currency.code().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_currency() {
        assert_eq!("USD".parse::<Currency>().unwrap(), Currency::Usd);
        assert_eq!("cad".parse::<Currency>().unwrap(), Currency::Cad);
    }

    #[test]
    fn test_parse_other_currency() {
        let parsed: Currency = "GBP".parse().unwrap();
        assert!(matches!(parsed, Currency::Other(ref s) if s == "GBP"));
    }

    #[test]
    fn test_parse_empty_rejected() {
        assert!(matches!("".parse::<Currency>(), Err(CurrencyError::EmptyCode)));
    }

    #[test]
    fn test_parse_invalid_rejected() {
        assert!(matches!(
            "US-D".parse::<Currency>(),
            Err(CurrencyError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_display_roundtrip() {
        let usd = Currency::Usd;
        assert_eq!(usd.to_string().parse::<Currency>().unwrap(), usd);
    }
}
