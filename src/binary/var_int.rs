use std::io::Write;

use arrayvec::ArrayVec;

use crate::data_source::IonDataSource;
use crate::result::{decoding_error, IonResult};

const BITS_PER_ENCODED_BYTE: usize = 7;
const LOWER_7_BITMASK: u8 = 0b0111_1111;
const LOWER_6_BITMASK: u8 = 0b0011_1111;
const HIGHEST_BIT_VALUE: u8 = 0b1000_0000;
const SIGN_BIT_VALUE: u8 = 0b0100_0000;

// An i64's 63 magnitude bits require up to ceil((63 - 6) / 7) + 1 = 10 encoded bytes
const MAX_ENCODED_SIZE_IN_BYTES: usize = 10;

/// Represents a variable-length signed integer. The first byte carries the sign in its
/// second-highest bit and six bits of magnitude; remaining bytes carry seven magnitude bits
/// each. As with [VarUInt](crate::binary::var_uint::VarUInt), the final byte is marked by a
/// set high bit.
///
/// A sign bit with a zero magnitude is negative zero, a distinct value used by the timestamp
/// encoding to represent an unknown local offset.
#[derive(Debug)]
pub struct VarInt {
    value: i64,
    is_negative_zero: bool,
    size_in_bytes: usize,
}

impl VarInt {
    /// Reads a VarInt from the provided data source.
    pub fn read<R: IonDataSource>(data_source: &mut R) -> IonResult<VarInt> {
        let mut magnitude: u128 = 0;
        let mut is_negative = false;
        let mut is_first_byte = true;

        let mut byte_processor = |byte: u8| {
            if is_first_byte {
                is_first_byte = false;
                is_negative = byte & SIGN_BIT_VALUE != 0;
                magnitude = (byte & LOWER_6_BITMASK) as u128;
            } else {
                magnitude = (magnitude << BITS_PER_ENCODED_BYTE) | (byte & LOWER_7_BITMASK) as u128;
            }
            byte < HIGHEST_BIT_VALUE
        };

        let encoded_size_in_bytes = data_source.read_next_byte_while(&mut byte_processor)?;

        if encoded_size_in_bytes > MAX_ENCODED_SIZE_IN_BYTES {
            return decoding_error(format!(
                "found a {encoded_size_in_bytes}-byte VarInt; the largest supported size is {MAX_ENCODED_SIZE_IN_BYTES} bytes"
            ));
        }
        // The magnitude accumulator is wide enough that 10 encoded bytes cannot overflow it;
        // bounds-check the result against i64 instead of the encoding.
        let max_magnitude = if is_negative {
            i64::MAX as u128 + 1 // |i64::MIN|
        } else {
            i64::MAX as u128
        };
        if magnitude > max_magnitude {
            return decoding_error("found a VarInt too large to fit in an i64");
        }

        let is_negative_zero = is_negative && magnitude == 0;
        let value = if is_negative {
            (magnitude as i128).wrapping_neg() as i64
        } else {
            magnitude as i64
        };

        Ok(VarInt {
            value,
            is_negative_zero,
            size_in_bytes: encoded_size_in_bytes,
        })
    }

    /// Encodes the given signed value as a VarInt and writes it to the sink, returning the
    /// number of bytes written.
    pub fn write_i64<W: Write>(sink: &mut W, value: i64) -> IonResult<usize> {
        let magnitude = value.unsigned_abs();
        let mut groups: ArrayVec<u8, { MAX_ENCODED_SIZE_IN_BYTES + 1 }> = ArrayVec::new();
        let mut remaining = magnitude;
        loop {
            groups.push((remaining & LOWER_7_BITMASK as u64) as u8);
            remaining >>= BITS_PER_ENCODED_BYTE;
            if remaining == 0 {
                break;
            }
        }
        // The most significant group becomes the wire-first byte; it must leave its
        // second-highest bit free for the sign
        if groups.last().unwrap() & SIGN_BIT_VALUE != 0 {
            groups.push(0);
        }
        if value < 0 {
            *groups.last_mut().unwrap() |= SIGN_BIT_VALUE;
        }
        // End flag goes on the wire-last (least significant) byte
        groups[0] |= HIGHEST_BIT_VALUE;
        groups.reverse();

        sink.write_all(&groups)?;
        Ok(groups.len())
    }

    /// Writes the one-byte negative-zero encoding used for unknown timestamp offsets.
    pub fn write_negative_zero<W: Write>(sink: &mut W) -> IonResult<usize> {
        sink.write_all(&[HIGHEST_BIT_VALUE | SIGN_BIT_VALUE])?;
        Ok(1)
    }

    #[inline(always)]
    pub fn value(&self) -> i64 {
        self.value
    }

    #[inline(always)]
    pub fn is_negative_zero(&self) -> bool {
        self.is_negative_zero
    }

    #[inline(always)]
    pub fn size_in_bytes(&self) -> usize {
        self.size_in_bytes
    }
}

#[cfg(test)]
mod tests {
    use super::VarInt;
    use crate::result::IonResult;
    use std::io::Cursor;

    fn expect_read(bytes: &[u8], value: i64) {
        let var_int = VarInt::read(&mut Cursor::new(bytes)).expect("read failed");
        assert_eq!(var_int.value(), value);
        assert_eq!(var_int.size_in_bytes(), bytes.len());
        assert!(!var_int.is_negative_zero());
    }

    fn expect_written(value: i64, expected: &[u8]) {
        let mut buffer = Vec::new();
        VarInt::write_i64(&mut buffer, value).expect("write failed");
        assert_eq!(buffer.as_slice(), expected);
    }

    #[test]
    fn single_byte_values() {
        expect_read(&[0b1000_0000], 0);
        expect_read(&[0b1001_0001], 17);
        expect_read(&[0b1101_0001], -17);
        expect_read(&[0b1011_1111], 63);
        expect_read(&[0b1111_1111], -63);
        expect_written(0, &[0b1000_0000]);
        expect_written(17, &[0b1001_0001]);
        expect_written(-17, &[0b1101_0001]);
    }

    #[test]
    fn multi_byte_values() {
        expect_read(&[0b0000_0111, 0b1110_1000], 1000);
        expect_read(&[0b0100_0111, 0b1110_1000], -1000);
        expect_written(1000, &[0b0000_0111, 0b1110_1000]);
        expect_written(-1000, &[0b0100_0111, 0b1110_1000]);
    }

    #[test]
    fn magnitudes_that_collide_with_the_sign_bit_grow_a_byte() {
        // 64 needs 7 magnitude bits, which do not fit beside the sign bit in the first byte
        expect_written(64, &[0b0000_0000, 0b1100_0000]);
        expect_written(-64, &[0b0100_0000, 0b1100_0000]);
        expect_read(&[0b0000_0000, 0b1100_0000], 64);
        expect_read(&[0b0100_0000, 0b1100_0000], -64);
    }

    #[test]
    fn negative_zero() -> IonResult<()> {
        let mut buffer = Vec::new();
        VarInt::write_negative_zero(&mut buffer)?;
        assert_eq!(buffer.as_slice(), &[0b1100_0000]);
        let var_int = VarInt::read(&mut Cursor::new(&buffer))?;
        assert!(var_int.is_negative_zero());
        assert_eq!(var_int.value(), 0);
        Ok(())
    }

    #[test]
    fn i64_extremes_round_trip() -> IonResult<()> {
        for value in [i64::MAX, i64::MIN, i64::MAX - 1, i64::MIN + 1] {
            let mut buffer = Vec::new();
            VarInt::write_i64(&mut buffer, value)?;
            let var_int = VarInt::read(&mut Cursor::new(&buffer))?;
            assert_eq!(var_int.value(), value);
        }
        Ok(())
    }

    #[test]
    fn oversized_encoding_is_an_error() {
        let bytes = [
            0b0011_1111,
            0b0111_1111,
            0b0111_1111,
            0b0111_1111,
            0b0111_1111,
            0b0111_1111,
            0b0111_1111,
            0b0111_1111,
            0b0111_1111,
            0b0111_1111,
            0b1111_1111,
        ];
        assert!(VarInt::read(&mut Cursor::new(&bytes)).is_err());
    }
}
