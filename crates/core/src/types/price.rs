//! Type-safe price representation in integer minor currency units.
//!
//! All money in the storefront is Kenyan shillings stored as cents. Arithmetic
//! never touches floating point; formatting and parsing go through integer
//! math and `rust_decimal` respectively.

use core::fmt;
use core::iter::Sum;
use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Currency code shown in front of every formatted amount.
pub const CURRENCY_CODE: &str = "KES";

/// Minor units per major unit (cents per shilling).
const MINOR_PER_MAJOR: u64 = 100;

/// Errors that can occur when parsing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The input string is empty.
    #[error("price cannot be empty")]
    Empty,
    /// The input is not a decimal number.
    #[error("price is not a number: {0}")]
    NotANumber(String),
    /// The input is negative.
    #[error("price cannot be negative")]
    Negative,
    /// The input has more precision than the currency supports.
    #[error("price must have at most 2 decimal places")]
    TooPrecise,
    /// The input does not fit in the minor-unit representation.
    #[error("price is too large")]
    Overflow,
}

/// A non-negative amount of money in minor currency units (cents).
///
/// ## Examples
///
/// ```
/// use phoneplace_core::Price;
///
/// let price = Price::from_minor(150_000);
/// assert_eq!(price.display(), "KES 1,500.00");
/// assert_eq!(price.times(3), Price::from_minor(450_000));
///
/// assert_eq!(Price::parse_major("1500.5").unwrap(), Price::from_minor(150_050));
/// assert!(Price::parse_major("1.001").is_err());
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Price(u64);

impl Price {
    /// Zero shillings.
    pub const ZERO: Self = Self(0);

    /// Create a price from an amount in minor units.
    #[must_use]
    pub const fn from_minor(minor: u64) -> Self {
        Self(minor)
    }

    /// The amount in minor units.
    #[must_use]
    pub const fn minor(self) -> u64 {
        self.0
    }

    /// Whether the amount is zero.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Price of `quantity` units at this unit price.
    ///
    /// Saturates at `u64::MAX` minor units rather than wrapping.
    #[must_use]
    pub const fn times(self, quantity: u32) -> Self {
        Self(self.0.saturating_mul(quantity as u64))
    }

    /// Sum of two prices, saturating at `u64::MAX` minor units.
    #[must_use]
    pub const fn plus(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// Parse an amount entered in major units (e.g. `"1500.50"` shillings).
    ///
    /// # Errors
    ///
    /// Returns an error if the input:
    /// - Is empty or not a decimal number
    /// - Is negative
    /// - Has more than two fractional digits
    /// - Does not fit in `u64` minor units
    pub fn parse_major(input: &str) -> Result<Self, PriceError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(PriceError::Empty);
        }

        let amount = Decimal::from_str(trimmed)
            .map_err(|_| PriceError::NotANumber(trimmed.to_owned()))?;

        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }

        let minor = amount
            .checked_mul(Decimal::from(MINOR_PER_MAJOR))
            .ok_or(PriceError::Overflow)?
            .normalize();

        if minor.scale() != 0 {
            return Err(PriceError::TooPrecise);
        }

        u64::try_from(minor)
            .map(Self)
            .map_err(|_| PriceError::Overflow)
    }

    /// Format for display, e.g. `KES 1,500.00`.
    #[must_use]
    pub fn display(self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let major = self.0 / MINOR_PER_MAJOR;
        let cents = self.0 % MINOR_PER_MAJOR;
        write!(f, "{CURRENCY_CODE} {}.{cents:02}", group_thousands(major))
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Self::plus)
    }
}

impl From<u64> for Price {
    fn from(minor: u64) -> Self {
        Self(minor)
    }
}

impl From<Price> for u64 {
    fn from(price: Price) -> Self {
        price.0
    }
}

/// Insert `,` between groups of three digits.
fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_formats() {
        assert_eq!(Price::ZERO.display(), "KES 0.00");
        assert_eq!(Price::from_minor(5).display(), "KES 0.05");
        assert_eq!(Price::from_minor(99_999).display(), "KES 999.99");
        assert_eq!(Price::from_minor(150_000).display(), "KES 1,500.00");
        assert_eq!(Price::from_minor(1_234_567_890).display(), "KES 12,345,678.90");
    }

    #[test]
    fn test_times_and_sum() {
        let unit = Price::from_minor(150_000);
        assert_eq!(unit.times(2), Price::from_minor(300_000));
        assert_eq!(unit.times(0), Price::ZERO);

        let total: Price = [unit.times(2), Price::ZERO, Price::from_minor(1)]
            .into_iter()
            .sum();
        assert_eq!(total.minor(), 300_001);
    }

    #[test]
    fn test_times_saturates() {
        assert_eq!(Price::from_minor(u64::MAX).times(2).minor(), u64::MAX);
    }

    #[test]
    fn test_parse_major_valid() {
        assert_eq!(Price::parse_major("1500").unwrap().minor(), 150_000);
        assert_eq!(Price::parse_major("1500.5").unwrap().minor(), 150_050);
        assert_eq!(Price::parse_major(" 0.99 ").unwrap().minor(), 99);
        assert_eq!(Price::parse_major("2.10").unwrap().minor(), 210);
        assert_eq!(Price::parse_major("0").unwrap(), Price::ZERO);
    }

    #[test]
    fn test_parse_major_invalid() {
        assert_eq!(Price::parse_major(""), Err(PriceError::Empty));
        assert_eq!(Price::parse_major("-1"), Err(PriceError::Negative));
        assert_eq!(Price::parse_major("1.005"), Err(PriceError::TooPrecise));
        assert!(matches!(
            Price::parse_major("abc"),
            Err(PriceError::NotANumber(_))
        ));
    }

    #[test]
    fn test_serde_is_minor_units() {
        let price = Price::from_minor(129_900);
        assert_eq!(serde_json::to_string(&price).unwrap(), "129900");
        let parsed: Price = serde_json::from_str("129900").unwrap();
        assert_eq!(parsed, price);
    }
}
