//! Money type with exact cent precision.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! Amounts are stored as an `i64` count of minor units (cents). `Decimal`
//! only appears at the boundary (parsing, formatting, rate arithmetic).

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Number of fractional digits of the reporting currency.
pub const MINOR_UNIT_SCALE: u32 = 2;

/// Errors produced when converting external values into [`Money`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyError {
    /// The value carries more precision than one cent.
    #[error("Amount {0} has more than two fractional digits")]
    TooPrecise(Decimal),

    /// The value does not fit in the minor-unit range.
    #[error("Amount {0} is out of range")]
    Overflow(Decimal),

    /// The text is not a decimal number.
    #[error("Invalid amount: {0}")]
    Malformed(String),
}

/// A monetary amount in the single reporting currency.
///
/// Locale-agnostic: formatting with symbols or digit grouping belongs to the
/// presentation layer. The operators follow `i64` overflow semantics; sums
/// of caller-supplied amounts go through [`Money::checked_add`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl Money {
    /// Zero.
    pub const ZERO: Self = Self(0);

    /// Creates an amount from a count of cents.
    #[must_use]
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Returns the amount as a count of cents.
    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }

    /// Converts an exact decimal value, rejecting sub-cent precision.
    pub fn from_decimal(value: Decimal) -> Result<Self, MoneyError> {
        let normalized = value.normalize();
        if normalized.scale() > MINOR_UNIT_SCALE {
            return Err(MoneyError::TooPrecise(value));
        }
        Self::from_decimal_truncated(value)
    }

    /// Converts a decimal value, truncating toward zero at the cent.
    pub fn from_decimal_truncated(value: Decimal) -> Result<Self, MoneyError> {
        let cents = value
            .checked_mul(Decimal::ONE_HUNDRED)
            .ok_or(MoneyError::Overflow(value))?
            .trunc();
        cents
            .to_i64()
            .map(Self)
            .ok_or(MoneyError::Overflow(value))
    }

    /// Returns the amount as a decimal with two fractional digits.
    #[must_use]
    pub fn to_decimal(self) -> Decimal {
        Decimal::new(self.0, MINOR_UNIT_SCALE)
    }

    /// Returns true if the amount is zero.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Returns true if the amount is strictly positive.
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Returns true if the amount is negative.
    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Absolute value.
    #[must_use]
    pub const fn abs(self) -> Self {
        Self(self.0.abs())
    }

    /// Divides by `divisor`, truncating toward zero at the cent.
    ///
    /// Returns zero for a non-positive divisor.
    #[must_use]
    pub const fn div_trunc(self, divisor: i64) -> Self {
        if divisor <= 0 {
            return Self::ZERO;
        }
        Self(self.0 / divisor)
    }

    /// Multiplies by a decimal rate, truncating toward zero at the cent.
    ///
    /// Returns zero when the product does not fit.
    #[must_use]
    pub fn mul_rate_trunc(self, rate: Decimal) -> Self {
        self.to_decimal()
            .checked_mul(rate)
            .map(|product| product.round_dp_with_strategy(MINOR_UNIT_SCALE, RoundingStrategy::ToZero))
            .and_then(|product| Self::from_decimal_truncated(product).ok())
            .unwrap_or(Self::ZERO)
    }

    /// Checked addition. Returns `None` on overflow.
    #[must_use]
    pub const fn checked_add(self, rhs: Self) -> Option<Self> {
        match self.0.checked_add(rhs.0) {
            Some(cents) => Some(Self(cents)),
            None => None,
        }
    }

    /// Checked subtraction. Returns `None` on overflow.
    #[must_use]
    pub const fn checked_sub(self, rhs: Self) -> Option<Self> {
        match self.0.checked_sub(rhs.0) {
            Some(cents) => Some(Self(cents)),
            None => None,
        }
    }

    /// Splits into `parts` truncated shares; the last share takes the
    /// remainder so the shares sum exactly to `self`.
    ///
    /// Returns an empty vector for `parts == 0`.
    #[must_use]
    pub fn split_even(self, parts: usize) -> Vec<Self> {
        let Ok(count) = i64::try_from(parts) else {
            return Vec::new();
        };
        if count == 0 {
            return Vec::new();
        }
        let share = self.div_trunc(count);
        let mut shares = vec![share; parts];
        if let Some(last) = shares.last_mut() {
            *last = Self(self.0 - share.0 * (count - 1));
        }
        shares
    }

    /// Smaller of two amounts.
    #[must_use]
    pub fn min(self, other: Self) -> Self {
        Ord::min(self, other)
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Neg for Money {
    type Output = Self;

    fn neg(self) -> Self {
        Self(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_decimal())
    }
}

impl FromStr for Money {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value =
            Decimal::from_str(s.trim()).map_err(|_| MoneyError::Malformed(s.to_string()))?;
        Self::from_decimal(value)
    }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Self {
        money.to_decimal()
    }
}

impl TryFrom<Decimal> for Money {
    type Error = MoneyError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::from_decimal(value)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = <Decimal as Deserialize>::deserialize(deserializer)?;
        Self::from_decimal(value).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_money_from_decimal() {
        assert_eq!(Money::from_decimal(dec!(12.34)).unwrap(), Money::from_cents(1234));
        assert_eq!(Money::from_decimal(dec!(50)).unwrap(), Money::from_cents(5000));
        assert_eq!(Money::from_decimal(dec!(-0.5)).unwrap(), Money::from_cents(-50));
        assert_eq!(Money::from_decimal(dec!(1.2300)).unwrap(), Money::from_cents(123));
    }

    #[test]
    fn test_money_rejects_sub_cent() {
        assert!(matches!(
            Money::from_decimal(dec!(1.005)),
            Err(MoneyError::TooPrecise(_))
        ));
    }

    #[test]
    fn test_money_truncates_toward_zero() {
        assert_eq!(
            Money::from_decimal_truncated(dec!(1.999)).unwrap(),
            Money::from_cents(199)
        );
        assert_eq!(
            Money::from_decimal_truncated(dec!(-1.999)).unwrap(),
            Money::from_cents(-199)
        );
    }

    #[test]
    fn test_money_display_two_places() {
        assert_eq!(Money::from_cents(123_450).to_string(), "1234.50");
        assert_eq!(Money::from_cents(-5).to_string(), "-0.05");
        assert_eq!(Money::ZERO.to_string(), "0.00");
    }

    #[test]
    fn test_money_from_str() {
        assert_eq!("950.00".parse::<Money>().unwrap(), Money::from_cents(95_000));
        assert!(matches!(
            "abc".parse::<Money>(),
            Err(MoneyError::Malformed(_))
        ));
    }

    #[test]
    fn test_div_trunc() {
        assert_eq!(Money::from_cents(10_000).div_trunc(3), Money::from_cents(3333));
        assert_eq!(Money::from_cents(10_000).div_trunc(0), Money::ZERO);
    }

    #[test]
    fn test_checked_add_overflow() {
        assert_eq!(
            Money::from_cents(150).checked_add(Money::from_cents(-50)),
            Some(Money::from_cents(100))
        );
        assert_eq!(Money::from_cents(i64::MAX).checked_add(Money::from_cents(1)), None);
        assert_eq!(Money::from_cents(i64::MIN).checked_sub(Money::from_cents(1)), None);
    }

    #[test]
    fn test_split_even() {
        assert_eq!(
            Money::from_cents(10_000).split_even(3),
            vec![Money::from_cents(3333), Money::from_cents(3333), Money::from_cents(3334)]
        );
        assert_eq!(
            Money::from_cents(1).split_even(4),
            vec![Money::ZERO, Money::ZERO, Money::ZERO, Money::from_cents(1)]
        );
        assert_eq!(Money::from_cents(-7).split_even(2), vec![Money::from_cents(-3), Money::from_cents(-4)]);
        assert!(Money::from_cents(500).split_even(0).is_empty());
    }

    #[test]
    fn test_mul_rate_trunc() {
        // 1000.00 * 0.004083... = 4.0833.. -> 4.08
        let rate = dec!(4.9) / dec!(1200);
        assert_eq!(Money::from_cents(100_000).mul_rate_trunc(rate), Money::from_cents(408));
    }

    #[test]
    fn test_serde_roundtrip_string_form() {
        let json = serde_json::to_string(&Money::from_cents(5000)).unwrap();
        assert_eq!(json, "\"50.00\"");
        let back: Money = serde_json::from_str("\"50.00\"").unwrap();
        assert_eq!(back, Money::from_cents(5000));
        let from_number: Money = serde_json::from_str("12.5").unwrap();
        assert_eq!(from_number, Money::from_cents(1250));
        assert!(serde_json::from_str::<Money>("\"1.001\"").is_err());
    }
}
