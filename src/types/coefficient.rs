use std::fmt;

use num_bigint::BigInt;

use crate::types::integer::{Int, UInt};

/// The sign of a [Coefficient]. Stored separately from the magnitude so that negative zero
/// (a legal decimal coefficient) remains representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
    Negative,
    Positive,
}

/// The coefficient of a [Decimal](crate::types::decimal::Decimal): a signed magnitude.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coefficient {
    sign: Sign,
    magnitude: UInt,
}

impl Coefficient {
    pub(crate) fn new<I: Into<UInt>>(sign: Sign, magnitude: I) -> Coefficient {
        Coefficient {
            sign,
            magnitude: magnitude.into(),
        }
    }

    /// Constructs the distinguished negative-zero coefficient.
    pub fn negative_zero() -> Coefficient {
        Coefficient {
            sign: Sign::Negative,
            magnitude: UInt::U64(0),
        }
    }

    pub fn sign(&self) -> Sign {
        self.sign
    }

    pub fn magnitude(&self) -> &UInt {
        &self.magnitude
    }

    pub fn is_zero(&self) -> bool {
        self.magnitude.is_zero()
    }

    pub fn is_negative_zero(&self) -> bool {
        self.sign == Sign::Negative && self.magnitude.is_zero()
    }

    /// This coefficient's value as an [Int]. Note that negative zero collapses to zero in
    /// this view; callers that care must check [Coefficient::is_negative_zero] first.
    pub fn as_int(&self) -> Int {
        Int::from_uint_magnitude(self.magnitude.clone(), self.sign == Sign::Negative)
    }
}

impl fmt::Display for Coefficient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.sign == Sign::Negative {
            write!(f, "-")?;
        }
        write!(f, "{}", self.magnitude)
    }
}

impl From<u64> for Coefficient {
    fn from(value: u64) -> Self {
        Coefficient::new(Sign::Positive, value)
    }
}

impl From<i64> for Coefficient {
    fn from(value: i64) -> Self {
        let sign = if value < 0 {
            Sign::Negative
        } else {
            Sign::Positive
        };
        Coefficient::new(sign, value.unsigned_abs())
    }
}

impl From<Int> for Coefficient {
    fn from(value: Int) -> Self {
        let sign = if value.is_negative() {
            Sign::Negative
        } else {
            Sign::Positive
        };
        Coefficient::new(sign, value.magnitude())
    }
}

impl From<BigInt> for Coefficient {
    fn from(value: BigInt) -> Self {
        Coefficient::from(Int::from(value))
    }
}
