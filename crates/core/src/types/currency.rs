//! Currency codes and amount formatting.
//!
//! Wallets can settle in fiat (`CAD`) as well as crypto (`BTC`, `XMR`), so
//! currencies are open-ended codes rather than a closed ISO 4217 enum.

use core::fmt;
use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Currency`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CurrencyError {
    #[error("currency code cannot be empty")]
    Empty,
    #[error("currency code must be at most {max} characters")]
    TooLong { max: usize },
    #[error("currency code {0:?} must be ASCII letters and digits")]
    InvalidCharacter(String),
}

/// An upper-cased currency code such as `CAD` or `BTC`.
///
/// ```
/// use crypto_cart_core::Currency;
///
/// let cad = Currency::parse(" cad ").unwrap();
/// assert_eq!(cad.code(), "CAD");
/// assert!(Currency::parse("C$").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency(String);

impl Currency {
    /// Longest code accepted.
    pub const MAX_LENGTH: usize = 10;

    /// Parse and normalize a currency code.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty, longer than
    /// [`Self::MAX_LENGTH`], or contains anything but ASCII alphanumerics.
    pub fn parse(s: &str) -> Result<Self, CurrencyError> {
        let code = s.trim();
        if code.is_empty() {
            return Err(CurrencyError::Empty);
        }
        if code.len() > Self::MAX_LENGTH {
            return Err(CurrencyError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        if !code.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(CurrencyError::InvalidCharacter(code.to_owned()));
        }
        Ok(Self(code.to_ascii_uppercase()))
    }

    #[must_use]
    pub fn code(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Currency {
    type Err = CurrencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Currency {
    type Error = CurrencyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Currency> for String {
    fn from(currency: Currency) -> Self {
        currency.0
    }
}

impl AsRef<str> for Currency {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Format an amount for display, e.g. `25.00 CAD` or `0.0015 BTC`.
///
/// Trailing zeros are dropped, but at least two decimal places are kept.
#[must_use]
pub fn format_amount(amount: Decimal, currency: &Currency) -> String {
    let mut shown = amount.normalize();
    if shown.scale() < 2 {
        shown.rescale(2);
    }
    format!("{shown} {currency}")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn test_parse_normalizes_case_and_whitespace() {
        assert_eq!(Currency::parse(" btc\n").unwrap().code(), "BTC");
    }

    #[test]
    fn test_parse_rejects_bad_codes() {
        assert_eq!(Currency::parse("   "), Err(CurrencyError::Empty));
        assert!(matches!(
            Currency::parse("ABCDEFGHIJK"),
            Err(CurrencyError::TooLong { .. })
        ));
        assert!(matches!(
            Currency::parse("C$"),
            Err(CurrencyError::InvalidCharacter(_))
        ));
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: Currency = serde_json::from_str("\"xmr\"").unwrap();
        assert_eq!(ok.code(), "XMR");
        assert!(serde_json::from_str::<Currency>("\"\"").is_err());
    }

    #[test]
    fn test_format_amount_pads_fiat() {
        let cad = Currency::parse("CAD").unwrap();
        assert_eq!(format_amount(dec!(25), &cad), "25.00 CAD");
        assert_eq!(format_amount(dec!(12.5), &cad), "12.50 CAD");
    }

    #[test]
    fn test_format_amount_keeps_crypto_precision() {
        let btc = Currency::parse("BTC").unwrap();
        assert_eq!(format_amount(dec!(0.00150000), &btc), "0.0015 BTC");
    }
}
