use num_bigint::BigUint;

use crate::binary::uint::{magnitude_from_slice, DecodedUInt};
use crate::data_source::IonDataSource;
use crate::result::IonResult;
use crate::types::integer::{Int, UInt};

const SIGN_BIT: u8 = 0b1000_0000;

/// Represents a fixed-length big-endian signed integer in sign-and-magnitude form: the high
/// bit of the first byte is the sign, the remaining bits are the magnitude. Decimal
/// coefficients and timestamp fractional-second coefficients use this encoding, which makes
/// negative zero representable.
#[derive(Debug)]
pub struct DecodedInt {
    value: Int,
    is_negative_zero: bool,
    size_in_bytes: usize,
}

impl DecodedInt {
    /// Reads a `length`-byte signed magnitude from the provided data source.
    pub fn read<R: IonDataSource>(data_source: &mut R, length: usize) -> IonResult<DecodedInt> {
        if length == 0 {
            return Ok(DecodedInt {
                value: Int::I64(0),
                is_negative_zero: false,
                size_in_bytes: 0,
            });
        }

        let (is_negative, magnitude) = if length <= 8 {
            let mut buffer = [0u8; 8];
            let bytes = &mut buffer[..length];
            data_source.read_exact_or_eof(bytes)?;
            let is_negative = bytes[0] & SIGN_BIT != 0;
            bytes[0] &= !SIGN_BIT;
            // With the sign bit cleared, eight bytes carry at most 63 magnitude bits
            (is_negative, UInt::U64(magnitude_from_slice(bytes)))
        } else {
            let mut buffer = vec![0u8; length];
            data_source.read_exact_or_eof(&mut buffer)?;
            let is_negative = buffer[0] & SIGN_BIT != 0;
            buffer[0] &= !SIGN_BIT;
            (is_negative, UInt::from(BigUint::from_bytes_be(&buffer)))
        };

        let is_negative_zero = is_negative && magnitude.is_zero();
        Ok(DecodedInt {
            value: Int::from_uint_magnitude(magnitude, is_negative),
            is_negative_zero,
            size_in_bytes: length,
        })
    }

    /// Appends the sign-and-magnitude encoding of the given value to `output`, returning the
    /// number of bytes written. Positive zero writes no bytes; negative zero writes a single
    /// sign byte.
    pub fn write(output: &mut Vec<u8>, is_negative: bool, magnitude: &UInt) -> usize {
        if magnitude.is_zero() {
            if is_negative {
                output.push(SIGN_BIT);
                return 1;
            }
            return 0;
        }

        let start = output.len();
        DecodedUInt::write_uint(output, magnitude);
        // If the magnitude's own high bit is occupied, open a fresh byte for the sign
        if output[start] & SIGN_BIT != 0 {
            output.insert(start, 0);
        }
        if is_negative {
            output[start] |= SIGN_BIT;
        }
        output.len() - start
    }

    pub fn value(&self) -> &Int {
        &self.value
    }

    pub fn into_value(self) -> Int {
        self.value
    }

    /// Negative zero is a valid decimal coefficient; it decodes as a zero [Int] with this
    /// flag set.
    pub fn is_negative_zero(&self) -> bool {
        self.is_negative_zero
    }

    pub fn size_in_bytes(&self) -> usize {
        self.size_in_bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn read_bytes(bytes: &[u8]) -> DecodedInt {
        DecodedInt::read(&mut Cursor::new(bytes), bytes.len()).expect("read failed")
    }

    #[test]
    fn read_sign_and_magnitude() {
        assert_eq!(read_bytes(&[]).value(), &Int::I64(0));
        assert_eq!(read_bytes(&[0x05]).value(), &Int::I64(5));
        assert_eq!(read_bytes(&[0x85]).value(), &Int::I64(-5));
        assert_eq!(read_bytes(&[0x01, 0x00]).value(), &Int::I64(256));
        assert_eq!(read_bytes(&[0x81, 0x00]).value(), &Int::I64(-256));
    }

    #[test]
    fn read_negative_zero() {
        let decoded = read_bytes(&[0x80]);
        assert_eq!(decoded.value(), &Int::I64(0));
        assert!(decoded.is_negative_zero());

        let positive_zero = read_bytes(&[0x00]);
        assert!(!positive_zero.is_negative_zero());
    }

    #[test]
    fn write_prepends_a_byte_when_the_sign_collides() {
        let mut output = Vec::new();
        // 128's high bit is set, so the encoding must grow to two bytes
        DecodedInt::write(&mut output, false, &UInt::U64(128));
        assert_eq!(output, vec![0x00, 0x80]);

        output.clear();
        DecodedInt::write(&mut output, true, &UInt::U64(128));
        assert_eq!(output, vec![0x80, 0x80]);
    }

    #[test]
    fn write_zero_variants() {
        let mut output = Vec::new();
        assert_eq!(DecodedInt::write(&mut output, false, &UInt::U64(0)), 0);
        assert!(output.is_empty());
        assert_eq!(DecodedInt::write(&mut output, true, &UInt::U64(0)), 1);
        assert_eq!(output, vec![0x80]);
    }

    #[test]
    fn round_trip_through_both_directions() -> IonResult<()> {
        for value in [0i64, 1, -1, 127, -127, 128, -128, 3_000_000, -3_000_000] {
            let mut output = Vec::new();
            let length = DecodedInt::write(
                &mut output,
                value < 0,
                &UInt::U64(value.unsigned_abs()),
            );
            let decoded = DecodedInt::read(&mut Cursor::new(&output), length)?;
            assert_eq!(decoded.value(), &Int::I64(value), "round trip failed for {value}");
        }
        Ok(())
    }
}
