use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An amount in Vietnamese dong.
///
/// VND has no minor unit in this domain, so the value is a whole number of
/// dong stored as `i64`. Fractional intermediate results (child rates,
/// percentage discounts) go through [`Decimal`] and are rounded back with
/// [`Money::from_decimal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoneyError {
    #[error("Amount overflow while computing {0}")]
    Overflow(&'static str),
}

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn vnd(amount: i64) -> Self {
        Self(amount)
    }

    pub const fn amount(self) -> i64 {
        self.0
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub fn to_decimal(self) -> Decimal {
        Decimal::from(self.0)
    }

    /// Round to the nearest dong, halves away from zero.
    pub fn from_decimal(value: Decimal) -> Result<Self, MoneyError> {
        value
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
            .map(Self)
            .ok_or(MoneyError::Overflow("decimal conversion"))
    }

    pub fn checked_add(self, other: Money) -> Result<Self, MoneyError> {
        self.0
            .checked_add(other.0)
            .map(Self)
            .ok_or(MoneyError::Overflow("addition"))
    }

    pub fn checked_sub(self, other: Money) -> Result<Self, MoneyError> {
        self.0
            .checked_sub(other.0)
            .map(Self)
            .ok_or(MoneyError::Overflow("subtraction"))
    }

    /// Multiply by a head count.
    pub fn times(self, count: u32) -> Result<Self, MoneyError> {
        self.0
            .checked_mul(i64::from(count))
            .map(Self)
            .ok_or(MoneyError::Overflow("multiplication"))
    }

    /// Multiply by a fractional rate and round once at the end.
    pub fn scale(self, rate: Decimal, count: u32) -> Result<Self, MoneyError> {
        let product = self
            .to_decimal()
            .checked_mul(rate)
            .and_then(|v| v.checked_mul(Decimal::from(count)))
            .ok_or(MoneyError::Overflow("rate multiplication"))?;
        Self::from_decimal(product)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} VND", self.0)
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        Money(iter.fold(0i64, |acc, m| acc.saturating_add(m.0)))
    }
}
