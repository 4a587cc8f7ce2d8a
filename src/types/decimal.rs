use std::cmp::Ordering;
use std::fmt;

use num_bigint::BigUint;

use crate::ion_eq::IonEq;
use crate::types::coefficient::{Coefficient, Sign};
use crate::types::integer::Int;

// Scales further than this are printed in exponent notation rather than padded with zeros.
const MAX_PADDED_ZEROS: i64 = 32;

/// An arbitrary-precision decimal: a signed coefficient times ten raised to a signed exponent.
///
/// `PartialEq` and `Ord` compare *numeric* value (`7.0 == 7.00`); use [IonEq] to compare
/// data-model identity, which distinguishes coefficient/exponent pairs and negative zero.
#[derive(Debug, Clone)]
pub struct Decimal {
    pub(crate) coefficient: Coefficient,
    pub(crate) exponent: i64,
}

impl Decimal {
    pub fn new<I: Into<Coefficient>>(coefficient: I, exponent: i64) -> Decimal {
        Decimal {
            coefficient: coefficient.into(),
            exponent,
        }
    }

    pub fn negative_zero() -> Decimal {
        Decimal::negative_zero_with_exponent(0)
    }

    pub fn negative_zero_with_exponent(exponent: i64) -> Decimal {
        Decimal {
            coefficient: Coefficient::negative_zero(),
            exponent,
        }
    }

    pub fn coefficient(&self) -> &Coefficient {
        &self.coefficient
    }

    pub fn exponent(&self) -> i64 {
        self.exponent
    }

    pub fn is_zero(&self) -> bool {
        self.coefficient.is_zero()
    }

    // -1, 0, or 1, with negative zero collapsing to 0
    fn numeric_sign(&self) -> i8 {
        if self.coefficient.is_zero() {
            0
        } else if self.coefficient.sign() == Sign::Negative {
            -1
        } else {
            1
        }
    }

    // Compares the absolute numeric values, ignoring sign.
    fn compare_magnitudes(&self, other: &Decimal) -> Ordering {
        // The exponent of each value's most significant digit serves as a first-pass comparison.
        let digits_self = self.coefficient.magnitude().number_of_decimal_digits() as i64;
        let digits_other = other.coefficient.magnitude().number_of_decimal_digits() as i64;
        let leading_self = digits_self + self.exponent;
        let leading_other = digits_other + other.exponent;
        if leading_self != leading_other {
            return leading_self.cmp(&leading_other);
        }

        // Same order of magnitude; scale to a common exponent and compare coefficients.
        // The exponent gap is bounded by the digit-count gap at this point, so the
        // multiplication below stays small.
        let magnitude_self = self.coefficient.magnitude().as_big_uint();
        let magnitude_other = other.coefficient.magnitude().as_big_uint();
        let ten = BigUint::from(10u32);
        if self.exponent >= other.exponent {
            let scale = (self.exponent - other.exponent) as u32;
            (magnitude_self * ten.pow(scale)).cmp(&magnitude_other)
        } else {
            let scale = (other.exponent - self.exponent) as u32;
            magnitude_self.cmp(&(magnitude_other * ten.pow(scale)))
        }
    }
}

impl PartialEq for Decimal {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Decimal {}

impl PartialOrd for Decimal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Decimal {
    fn cmp(&self, other: &Self) -> Ordering {
        let sign_self = self.numeric_sign();
        let sign_other = other.numeric_sign();
        if sign_self != sign_other {
            return sign_self.cmp(&sign_other);
        }
        if sign_self == 0 {
            return Ordering::Equal;
        }
        let magnitude_ordering = self.compare_magnitudes(other);
        if sign_self < 0 {
            magnitude_ordering.reverse()
        } else {
            magnitude_ordering
        }
    }
}

impl IonEq for Decimal {
    fn ion_eq(&self, other: &Self) -> bool {
        self.exponent == other.exponent && self.coefficient == other.coefficient
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.coefficient.sign() == Sign::Negative {
            write!(f, "-")?;
        }
        let digits = self.coefficient.magnitude().to_string();
        let number_of_digits = digits.len() as i64;
        match self.exponent {
            0 => write!(f, "{digits}."),
            exponent if exponent > 0 || -exponent - number_of_digits > MAX_PADDED_ZEROS => {
                write!(f, "{digits}d{exponent}")
            }
            exponent if -exponent < number_of_digits => {
                // The decimal point lands inside the digit sequence
                let point_at = (number_of_digits + exponent) as usize;
                write!(f, "{}.{}", &digits[..point_at], &digits[point_at..])
            }
            exponent => {
                // 0.00…digits
                write!(f, "0.")?;
                for _ in 0..(-exponent - number_of_digits) {
                    write!(f, "0")?;
                }
                write!(f, "{digits}")
            }
        }
    }
}

impl From<i64> for Decimal {
    fn from(value: i64) -> Self {
        Decimal::new(value, 0)
    }
}

impl From<u64> for Decimal {
    fn from(value: u64) -> Self {
        Decimal::new(value, 0)
    }
}

impl From<Int> for Decimal {
    fn from(value: Int) -> Self {
        Decimal::new(value, 0)
    }
}
