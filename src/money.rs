use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

/// Money in integer minor units (e.g. centavos) of the single client currency
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// create from minor units (cents, centavos)
    pub const fn from_minor(amount: i64) -> Self {
        Money(amount)
    }

    /// create from whole currency units, two minor digits
    pub const fn from_major(amount: i64) -> Self {
        Money(amount * 100)
    }

    /// underlying minor-unit amount
    pub const fn as_minor(&self) -> i64 {
        self.0
    }

    /// major-unit view for display and reporting
    pub fn as_major_decimal(&self) -> Decimal {
        Decimal::new(self.0, 2)
    }

    /// check if zero
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// check if strictly positive
    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// check if strictly negative
    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// absolute value
    pub fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// minimum of two values
    pub fn min(self, other: Self) -> Self {
        Money(self.0.min(other.0))
    }

    /// maximum of two values
    pub fn max(self, other: Self) -> Self {
        Money(self.0.max(other.0))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_major_decimal())
    }
}

impl From<i64> for Money {
    fn from(minor: i64) -> Self {
        Money::from_minor(minor)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, other: Money) -> Money {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, other: Money) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, other: Money) -> Money {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, other: Money) {
        self.0 -= other.0;
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Money {
        Money(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minor_major_conversion() {
        assert_eq!(Money::from_major(10), Money::from_minor(1000));
        assert_eq!(Money::from_minor(1050).as_minor(), 1050);
    }

    #[test]
    fn test_display_in_major_units() {
        assert_eq!(Money::from_minor(1050).to_string(), "10.50");
        assert_eq!(Money::from_minor(-25).to_string(), "-0.25");
        assert_eq!(Money::ZERO.to_string(), "0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_minor(700);
        let b = Money::from_minor(300);
        assert_eq!(a + b, Money::from_minor(1000));
        assert_eq!(a - b, Money::from_minor(400));
        assert_eq!(-b, Money::from_minor(-300));
        assert_eq!(b.min(a), b);
        assert_eq!((b - a).abs(), Money::from_minor(400));
    }

    #[test]
    fn test_sum() {
        let total: Money = [100, 250, 650].into_iter().map(Money::from_minor).sum();
        assert_eq!(total, Money::from_minor(1000));
    }

    #[test]
    fn test_sign_checks() {
        assert!(Money::from_minor(1).is_positive());
        assert!(Money::from_minor(-1).is_negative());
        assert!(Money::ZERO.is_zero());
        assert!(!Money::ZERO.is_positive());
        assert!(!Money::ZERO.is_negative());
    }
}
