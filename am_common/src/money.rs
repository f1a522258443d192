use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

//--------------------------------------        Cents        ---------------------------------------------------------
/// An amount of money in the minor units of its currency. A 45.99 USD course is `Cents(4599)`.
///
/// All stored prices and totals use this type. Rendering into a locale-specific string happens at the
/// presentation edge via the [`crate::currency`] module.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct Cents(i64);

op!(binary Cents, Add, add);
op!(binary Cents, Sub, sub);
op!(inplace Cents, AddAssign, add_assign);
op!(inplace Cents, SubAssign, sub_assign);
op!(unary Cents, Neg, neg);

impl Mul<i64> for Cents {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self::from(self.value() * rhs)
    }
}

impl Sum for Cents {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented in cents: {0}")]
pub struct CentsConversionError(String);

impl From<i64> for Cents {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl PartialEq for Cents {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Cents {}

impl TryFrom<u64> for Cents {
    type Error = CentsConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value > i64::MAX as u64 {
            Err(CentsConversionError(format!("Value {} is too large to convert to Cents", value)))
        } else {
            #[allow(clippy::cast_possible_wrap)]
            Ok(Self(value as i64))
        }
    }
}

impl Display for Cents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl Cents {
    pub fn value(&self) -> i64 {
        self.0
    }

    /// Converts whole currency units into cents. `Cents::from_major(45)` is 45.00.
    pub fn from_major(units: i64) -> Self {
        Self(units * 100)
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn arithmetic_delegates_to_the_inner_value() {
        let a = Cents::from(250);
        let b = Cents::from(100);
        assert_eq!(a + b, Cents::from(350));
        assert_eq!(a - b, Cents::from(150));
        assert_eq!(-a, Cents::from(-250));
        assert_eq!(b * 3, Cents::from(300));
        let mut c = a;
        c += b;
        assert_eq!(c, Cents::from(350));
        c -= a;
        assert_eq!(c, b);
    }

    #[test]
    fn sums_an_iterator_of_line_totals() {
        let total: Cents = [4599, 1250, 999].into_iter().map(Cents::from).sum();
        assert_eq!(total, Cents::from(6848));
    }

    #[test]
    fn displays_as_major_units() {
        assert_eq!(Cents::from(4599).to_string(), "45.99");
        assert_eq!(Cents::from(5).to_string(), "0.05");
        assert_eq!(Cents::from(0).to_string(), "0.00");
        assert_eq!(Cents::from(-123).to_string(), "-1.23");
        assert_eq!(Cents::from_major(12).to_string(), "12.00");
    }

    #[test]
    fn rejects_u64_values_that_overflow() {
        assert!(Cents::try_from(u64::MAX).is_err());
        assert_eq!(Cents::try_from(500_u64).unwrap(), Cents::from(500));
    }
}
