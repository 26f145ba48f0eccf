//! Type-safe price representation using decimal arithmetic.
//!
//! Both backends exchange prices as JSON numbers (occasionally as numeric
//! strings). [`Price`] accepts either on input and always writes a number.

use core::fmt;
use core::iter::Sum;
use core::ops::Add;
use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Errors produced when validating or parsing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The text is not a decimal number.
    #[error("invalid price: {0}")]
    Invalid(String),
    /// The amount is zero or negative.
    #[error("price must be greater than zero")]
    NotPositive,
    /// The amount is negative.
    #[error("price cannot be negative")]
    Negative,
    /// The amount exceeds [`Price::MAX`].
    #[error("price exceeds the maximum allowed ({})", Price::MAX)]
    TooLarge,
}

/// A monetary amount in the store currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Price(Decimal);

impl Price {
    /// Largest price the catalog accepts for a product.
    pub const MAX: Self = Self(Decimal::from_parts(99_999_999, 0, 0, false, 2));

    /// Zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a price from a decimal amount.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Create a price from an amount in cents.
    #[must_use]
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, 2))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Price of `quantity` units.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }

    /// Check a selling price: strictly positive and at most [`Price::MAX`].
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::NotPositive`] or [`PriceError::TooLarge`].
    pub fn validate_selling(self) -> Result<Self, PriceError> {
        if self.0 <= Decimal::ZERO {
            return Err(PriceError::NotPositive);
        }
        if self > Self::MAX {
            return Err(PriceError::TooLarge);
        }
        Ok(self)
    }

    /// Check a supplier price: non-negative and at most [`Price::MAX`].
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] or [`PriceError::TooLarge`].
    pub fn validate_supplier(self) -> Result<Self, PriceError> {
        if self.0.is_sign_negative() && !self.0.is_zero() {
            return Err(PriceError::Negative);
        }
        if self > Self::MAX {
            return Err(PriceError::TooLarge);
        }
        Ok(self)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.0)
    }
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_start_matches('$');
        Decimal::from_str(trimmed)
            .map(Self)
            .map_err(|_| PriceError::Invalid(s.to_owned()))
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        rust_decimal::serde::float::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        <Decimal as Deserialize>::deserialize(deserializer).map(Self)
    }
}
