use std::cmp::Ordering;
use std::fmt;
use std::ops::Neg;

use num_bigint::{BigInt, BigUint};
use num_traits::{ToPrimitive, Zero};

use crate::result::{decoding_error, IonResult};

/// An unsigned integer magnitude of arbitrary size.
#[derive(Debug, Clone)]
pub enum UInt {
    /// A magnitude small enough to fit in a machine word
    U64(u64),
    /// A magnitude of arbitrary size
    BigUInt(BigUint),
}

impl UInt {
    pub fn is_zero(&self) -> bool {
        match self {
            UInt::U64(value) => *value == 0,
            UInt::BigUInt(value) => value.is_zero(),
        }
    }

    /// Returns the magnitude as a `u64` if it fits.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            UInt::U64(value) => Some(*value),
            UInt::BigUInt(value) => value.to_u64(),
        }
    }

    pub(crate) fn as_big_uint(&self) -> BigUint {
        match self {
            UInt::U64(value) => BigUint::from(*value),
            UInt::BigUInt(value) => value.clone(),
        }
    }

    /// The number of base-10 digits needed to represent this magnitude. Zero has one digit.
    pub fn number_of_decimal_digits(&self) -> usize {
        match self {
            UInt::U64(value) => {
                let mut value = *value;
                let mut digits = 1;
                while value >= 10 {
                    value /= 10;
                    digits += 1;
                }
                digits
            }
            UInt::BigUInt(value) => value.to_str_radix(10).len(),
        }
    }
}

impl PartialEq for UInt {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for UInt {}

impl PartialOrd for UInt {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for UInt {
    fn cmp(&self, other: &Self) -> Ordering {
        use UInt::*;
        match (self, other) {
            (U64(a), U64(b)) => a.cmp(b),
            (BigUInt(a), BigUInt(b)) => a.cmp(b),
            (U64(a), BigUInt(b)) => BigUint::from(*a).cmp(b),
            (BigUInt(a), U64(b)) => a.cmp(&BigUint::from(*b)),
        }
    }
}

impl fmt::Display for UInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UInt::U64(value) => write!(f, "{value}"),
            UInt::BigUInt(value) => write!(f, "{value}"),
        }
    }
}

impl From<u64> for UInt {
    fn from(value: u64) -> Self {
        UInt::U64(value)
    }
}

impl From<usize> for UInt {
    fn from(value: usize) -> Self {
        UInt::U64(value as u64)
    }
}

impl From<BigUint> for UInt {
    fn from(value: BigUint) -> Self {
        // Demote to the machine-word representation whenever possible
        match value.to_u64() {
            Some(small) => UInt::U64(small),
            None => UInt::BigUInt(value),
        }
    }
}

/// A signed integer of arbitrary size.
///
/// Most integers encountered in the wild fit in an `i64`; the [BigInt](num_bigint::BigInt)
/// representation is only used when a value is too large for the fast path.
#[derive(Debug, Clone)]
pub enum Int {
    I64(i64),
    BigInt(BigInt),
}

impl Int {
    pub fn is_zero(&self) -> bool {
        match self {
            Int::I64(value) => *value == 0,
            Int::BigInt(value) => value.is_zero(),
        }
    }

    pub fn is_negative(&self) -> bool {
        match self {
            Int::I64(value) => *value < 0,
            Int::BigInt(value) => value.sign() == num_bigint::Sign::Minus,
        }
    }

    /// Assembles an [Int] from a magnitude and a sign, choosing the smallest workable
    /// representation.
    pub fn from_uint_magnitude(magnitude: UInt, is_negative: bool) -> Int {
        match &magnitude {
            UInt::U64(value) => {
                if is_negative {
                    // A u64 magnitude of exactly i64::MIN's absolute value still fits in an i64
                    if *value <= (i64::MAX as u64) + 1 {
                        return Int::I64((*value as i128).neg() as i64);
                    }
                } else if *value <= i64::MAX as u64 {
                    return Int::I64(*value as i64);
                }
            }
            UInt::BigUInt(_) => {}
        }
        let mut big = BigInt::from(magnitude.as_big_uint());
        if is_negative {
            big = -big;
        }
        Int::BigInt(big)
    }

    /// The magnitude of this integer, discarding its sign.
    pub fn magnitude(&self) -> UInt {
        match self {
            Int::I64(value) => UInt::U64(value.unsigned_abs()),
            Int::BigInt(value) => UInt::from(value.magnitude().clone()),
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Int::I64(value) => Some(*value),
            Int::BigInt(value) => value.to_i64(),
        }
    }

    pub fn as_f64(&self) -> f64 {
        match self {
            Int::I64(value) => *value as f64,
            Int::BigInt(value) => value.to_f64().unwrap_or(f64::INFINITY),
        }
    }

    pub(crate) fn as_big_int(&self) -> BigInt {
        match self {
            Int::I64(value) => BigInt::from(*value),
            Int::BigInt(value) => value.clone(),
        }
    }

    /// Interprets `bytes` as a big-endian two's-complement signed integer. An empty slice is
    /// zero. The inverse of [Int::to_twos_complement_be].
    pub fn from_twos_complement_be(bytes: &[u8]) -> Int {
        let big = BigInt::from_signed_bytes_be(bytes);
        Int::from(big)
    }

    /// Encodes this integer as a minimal-length big-endian two's-complement byte sequence.
    pub fn to_twos_complement_be(&self) -> Vec<u8> {
        match self {
            Int::I64(value) => BigInt::from(*value).to_signed_bytes_be(),
            Int::BigInt(value) => value.to_signed_bytes_be(),
        }
    }

    /// Parses a base-10 integer literal: `[+-]?digits`, with `_` permitted between digits.
    pub fn from_decimal_str(text: &str) -> IonResult<Int> {
        Self::from_radix_str(text, 10, None)
    }

    /// Parses a base-16 integer literal: `[+-]?0x` (or `0X`) followed by hex digits, with `_`
    /// permitted between digits.
    pub fn from_hex_str(text: &str) -> IonResult<Int> {
        Self::from_radix_str(text, 16, Some(&["0x", "0X"]))
    }

    /// Parses a base-2 integer literal: `[+-]?0b` (or `0B`) followed by binary digits, with `_`
    /// permitted between digits.
    pub fn from_binary_str(text: &str) -> IonResult<Int> {
        Self::from_radix_str(text, 2, Some(&["0b", "0B"]))
    }

    fn from_radix_str(text: &str, radix: u32, prefixes: Option<&[&str]>) -> IonResult<Int> {
        let (is_negative, unsigned) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text.strip_prefix('+').unwrap_or(text)),
        };
        let digits = match prefixes {
            Some(prefixes) => {
                let mut stripped = None;
                for prefix in prefixes {
                    if let Some(rest) = unsigned.strip_prefix(prefix) {
                        stripped = Some(rest);
                        break;
                    }
                }
                match stripped {
                    Some(rest) => rest,
                    None => {
                        return decoding_error(format!(
                            "invalid base-{radix} integer (missing radix prefix): '{text}'"
                        ))
                    }
                }
            }
            None => unsigned,
        };
        let digits = strip_digit_separators(digits, radix)
            .ok_or_else(|| crate::result::decoding_error_raw(format!("invalid integer: '{text}'")))?;
        if digits.is_empty() {
            return decoding_error(format!("invalid integer (no digits): '{text}'"));
        }

        let magnitude = match u64::from_str_radix(&digits, radix) {
            Ok(value) => UInt::U64(value),
            // Overflow (or, unreachable here, malformed digits): fall back to the big
            // representation
            Err(_) => match BigUint::parse_bytes(digits.as_bytes(), radix) {
                Some(value) => UInt::BigUInt(value),
                None => return decoding_error(format!("invalid integer: '{text}'")),
            },
        };
        Ok(Int::from_uint_magnitude(magnitude, is_negative))
    }
}

/// Removes `_` digit separators, confirming that each one sits between two digits of the
/// given radix and that every remaining character is a valid digit. Returns `None` if the
/// text is malformed.
fn strip_digit_separators(digits: &str, radix: u32) -> Option<String> {
    let mut output = String::with_capacity(digits.len());
    let mut previous: Option<char> = None;
    let mut chars = digits.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '_' {
            let previous_is_digit = previous.map(|p| p.is_digit(radix)).unwrap_or(false);
            let next_is_digit = chars.peek().map(|n| n.is_digit(radix)).unwrap_or(false);
            if !previous_is_digit || !next_is_digit {
                return None;
            }
        } else if c.is_digit(radix) {
            output.push(c);
        } else {
            return None;
        }
        previous = Some(c);
    }
    Some(output)
}

impl PartialEq for Int {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Int {}

impl PartialOrd for Int {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Int {
    fn cmp(&self, other: &Self) -> Ordering {
        use Int::*;
        match (self, other) {
            (I64(a), I64(b)) => a.cmp(b),
            (BigInt(a), BigInt(b)) => a.cmp(b),
            (I64(a), BigInt(b)) => num_bigint::BigInt::from(*a).cmp(b),
            (BigInt(a), I64(b)) => a.cmp(&num_bigint::BigInt::from(*b)),
        }
    }
}

impl fmt::Display for Int {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Int::I64(value) => write!(f, "{value}"),
            Int::BigInt(value) => write!(f, "{value}"),
        }
    }
}

impl From<i64> for Int {
    fn from(value: i64) -> Self {
        Int::I64(value)
    }
}

impl From<i32> for Int {
    fn from(value: i32) -> Self {
        Int::I64(value as i64)
    }
}

impl From<BigInt> for Int {
    fn from(value: BigInt) -> Self {
        // Demote to the machine-word representation whenever possible
        match value.to_i64() {
            Some(small) => Int::I64(small),
            None => Int::BigInt(value),
        }
    }
}

impl TryFrom<&Int> for i64 {
    type Error = crate::result::IonError;

    fn try_from(value: &Int) -> Result<Self, Self::Error> {
        value.as_i64().ok_or_else(|| {
            crate::result::decoding_error_raw(format!("integer {value} is too large for an i64"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_str_round_trip() -> IonResult<()> {
        for text in ["0", "5", "-17", "9223372036854775807", "-9223372036854775808"] {
            let value = Int::from_decimal_str(text)?;
            assert_eq!(value.to_string(), text);
        }
        Ok(())
    }

    #[test]
    fn decimal_str_larger_than_i64() -> IonResult<()> {
        let text = "123456789012345678901234567890";
        let value = Int::from_decimal_str(text)?;
        assert!(matches!(value, Int::BigInt(_)));
        assert_eq!(value.to_string(), text);
        Ok(())
    }

    #[test]
    fn hex_and_binary_strs() -> IonResult<()> {
        assert_eq!(Int::from_hex_str("0x1f")?, Int::I64(31));
        assert_eq!(Int::from_hex_str("-0xBEEF")?, Int::I64(-48879));
        assert_eq!(Int::from_binary_str("0b101")?, Int::I64(5));
        assert_eq!(Int::from_binary_str("-0b1000_0000")?, Int::I64(-128));
        Ok(())
    }

    #[test]
    fn digit_separators_must_sit_between_digits() {
        assert_eq!(Int::from_decimal_str("1_000").unwrap(), Int::I64(1000));
        assert!(Int::from_decimal_str("_1000").is_err());
        assert!(Int::from_decimal_str("1000_").is_err());
        assert!(Int::from_decimal_str("1__000").is_err());
        assert!(Int::from_hex_str("0x_ff").is_err());
    }

    #[test]
    fn rejects_malformed_text() {
        assert!(Int::from_decimal_str("").is_err());
        assert!(Int::from_decimal_str("-").is_err());
        assert!(Int::from_decimal_str("12a").is_err());
        assert!(Int::from_hex_str("17").is_err());
        assert!(Int::from_binary_str("0b102").is_err());
    }

    #[test]
    fn twos_complement_round_trip() {
        let values = [
            Int::I64(0),
            Int::I64(1),
            Int::I64(-1),
            Int::I64(127),
            Int::I64(128),
            Int::I64(-128),
            Int::I64(-129),
            Int::I64(i64::MAX),
            Int::I64(i64::MIN),
            Int::from_decimal_str("98765432109876543210987654321098765432109").unwrap(),
            Int::from_decimal_str("-98765432109876543210987654321098765432109").unwrap(),
        ];
        for value in &values {
            let bytes = value.to_twos_complement_be();
            assert_eq!(&Int::from_twos_complement_be(&bytes), value);
        }
    }

    #[test]
    fn from_twos_complement_interprets_the_sign_bit() {
        assert_eq!(Int::from_twos_complement_be(&[]), Int::I64(0));
        assert_eq!(Int::from_twos_complement_be(&[0x7F]), Int::I64(127));
        assert_eq!(Int::from_twos_complement_be(&[0xFF]), Int::I64(-1));
        assert_eq!(Int::from_twos_complement_be(&[0x00, 0xFF]), Int::I64(255));
        assert_eq!(Int::from_twos_complement_be(&[0x80, 0x00]), Int::I64(-32768));
    }

    #[test]
    fn ordering_considers_sign_then_magnitude() {
        let huge_positive = Int::from_decimal_str("999999999999999999999999").unwrap();
        let huge_negative = Int::from_decimal_str("-999999999999999999999999").unwrap();
        assert!(huge_negative < Int::I64(-5));
        assert!(Int::I64(-5) < Int::I64(0));
        assert!(Int::I64(0) < huge_positive);
        assert!(Int::I64(i64::MAX) < huge_positive);
    }

    #[test]
    fn magnitude_of_i64_min_is_representable() {
        let min = Int::I64(i64::MIN);
        assert_eq!(min.magnitude(), UInt::U64(9_223_372_036_854_775_808));
        let rebuilt = Int::from_uint_magnitude(min.magnitude(), true);
        assert_eq!(rebuilt, min);
    }
}
