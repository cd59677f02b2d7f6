use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, Mul, Neg, Sub, SubAssign},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

//--------------------------------------      Money       ------------------------------------------------------------
/// A monetary amount in cents.
///
/// All totals flowing through the gateway are held as integer cents to keep arithmetic exact; the decimal values on
/// the wire are converted once, at the boundary, via [`Money::try_from`].
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct Money(i64);

op!(binary Money, Add, add);
op!(binary Money, Sub, sub);
op!(inplace Money, SubAssign, sub_assign);
op!(unary Money, Neg, neg);

impl Mul<i64> for Money {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self::from_cents(self.0 * rhs)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented as a money amount: {0}")]
pub struct MoneyConversionError(String);

impl PartialEq for Money {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Money {}

/// Converts a decimal amount in major currency units (e.g. `10.50`) into cents, rounding to the nearest cent.
impl TryFrom<f64> for Money {
    type Error = MoneyConversionError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if !value.is_finite() {
            return Err(MoneyConversionError(format!("{value} is not a finite amount")));
        }
        let cents = (value * 100.0).round();
        if cents.abs() >= i64::MAX as f64 {
            return Err(MoneyConversionError(format!("{value} is too large to represent in cents")));
        }
        #[allow(clippy::cast_possible_truncation)]
        Ok(Self(cents as i64))
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let amount = self.0 as f64 / 100.0;
        write!(f, "${amount:0.2}")
    }
}

impl Money {
    pub fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    pub fn zero() -> Self {
        Self(0)
    }

    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn decimal_conversion_rounds_to_cents() {
        assert_eq!(Money::try_from(10.50).unwrap(), Money::from_cents(1050));
        assert_eq!(Money::try_from(0.015).unwrap(), Money::from_cents(2));
        assert_eq!(Money::try_from(-3.33).unwrap(), Money::from_cents(-333));
    }

    #[test]
    fn non_finite_amounts_are_rejected() {
        assert!(Money::try_from(f64::NAN).is_err());
        assert!(Money::try_from(f64::INFINITY).is_err());
    }

    #[test]
    fn arithmetic_is_exact() {
        let a = Money::from_cents(105_000);
        let b = Money::from_cents(100_000);
        assert_eq!(a - b, Money::from_cents(5000));
        assert_eq!(-(a - b), Money::from_cents(-5000));
        assert!(a > b);
    }

    #[test]
    fn display_uses_major_units() {
        assert_eq!(Money::from_cents(1050).to_string(), "$10.50");
        assert_eq!(Money::from_cents(5).to_string(), "$0.05");
    }
}
