//! Price arithmetic in whole Serbian dinars.
//!
//! Prices are plain integers in the store currency (RSD). Anything that
//! scales a price - finish multipliers, promotional percentages - goes through
//! exact decimal arithmetic and is rounded half away from zero, so repeated
//! calls with the same inputs always produce the same amount.

use core::fmt;
use core::iter::Sum;
use core::ops::Add;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// An amount in RSD.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(feature = "postgres", sqlx(transparent))]
#[serde(transparent)]
pub struct Price(i64);

impl Price {
    /// Zero dinars.
    pub const ZERO: Self = Self(0);

    /// ISO 4217 code of the only currency the store sells in.
    pub const CURRENCY_CODE: &'static str = "RSD";

    /// Create a price from a whole-dinar amount.
    #[must_use]
    pub const fn new(amount: i64) -> Self {
        Self(amount)
    }

    /// Get the whole-dinar amount.
    #[must_use]
    pub const fn amount(&self) -> i64 {
        self.0
    }

    /// Returns `true` if the amount is zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Scale by a finish multiplier, rounding half away from zero.
    #[must_use]
    ///
    /// Saturates at the `i64` bounds instead of overflowing.
    pub fn scaled(self, multiplier: Multiplier) -> Self {
        let amount = Decimal::from(self.0)
            .checked_mul(multiplier.0)
            .map_or_else(|| saturated(self.0.is_negative()), round_to_whole);
        Self(amount)
    }

    /// Take `percent`% of this price, rounding half away from zero.
    #[must_use]
    pub fn percent(self, percent: u8) -> Self {
        Self(round_to_whole(
            Decimal::from(self.0) * Decimal::from(percent) / Decimal::ONE_HUNDRED,
        ))
    }

    /// Multiply by a line quantity.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self(self.0.saturating_mul(i64::from(quantity)))
    }

    /// Subtract, flooring the result at zero.
    #[must_use]
    pub fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0).max(0))
    }

    /// Format for customer-facing display, e.g. `1.575 RSD`.
    ///
    /// Uses the Serbian convention of `.` as the thousands separator.
    #[must_use]
    pub fn display_rsd(&self) -> String {
        let digits = self.0.unsigned_abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(ch);
        }
        let sign = if self.0 < 0 { "-" } else { "" };
        format!("{sign}{grouped} {}", Self::CURRENCY_CODE)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl From<i64> for Price {
    fn from(amount: i64) -> Self {
        Self(amount)
    }
}

/// Round a decimal to a whole number, half away from zero, clamped to the
/// `i64` range.
fn round_to_whole(value: Decimal) -> i64 {
    value
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .unwrap_or_else(|| saturated(value.is_sign_negative()))
}

const fn saturated(negative: bool) -> i64 {
    if negative { i64::MIN } else { i64::MAX }
}

/// Errors that can occur when constructing a [`Multiplier`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MultiplierError {
    /// The multiplier would discount the base price.
    #[error("price multiplier must be at least 1.0 (got {0})")]
    BelowOne(Decimal),
}

/// A finish price multiplier (always `>= 1.0`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Multiplier(Decimal);

impl Multiplier {
    /// The identity multiplier (no surcharge).
    pub const ONE: Self = Self(Decimal::ONE);

    /// Create a multiplier from a decimal value.
    ///
    /// # Errors
    ///
    /// Returns [`MultiplierError::BelowOne`] if `value < 1.0`.
    pub fn new(value: Decimal) -> Result<Self, MultiplierError> {
        if value < Decimal::ONE {
            return Err(MultiplierError::BelowOne(value));
        }
        Ok(Self(value.normalize()))
    }

    /// Create a multiplier from hundredths, e.g. `175` for `1.75`.
    ///
    /// # Errors
    ///
    /// Returns [`MultiplierError::BelowOne`] if `hundredths < 100`.
    pub fn from_hundredths(hundredths: u32) -> Result<Self, MultiplierError> {
        Self::new(Decimal::new(i64::from(hundredths), 2))
    }

    /// Get the underlying decimal.
    #[must_use]
    pub const fn value(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Multiplier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<Decimal> for Multiplier {
    type Error = MultiplierError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Multiplier> for Decimal {
    fn from(multiplier: Multiplier) -> Self {
        multiplier.0
    }
}
