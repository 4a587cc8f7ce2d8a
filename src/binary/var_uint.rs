use std::io::Write;

use arrayvec::ArrayVec;

use crate::data_source::IonDataSource;
use crate::result::{decoding_error, IonResult};

const BITS_PER_ENCODED_BYTE: usize = 7;
const STORAGE_SIZE_IN_BITS: usize = std::mem::size_of::<usize>() * 8;
// Ceiling division; the largest number of encoded bytes a `usize` magnitude can need.
const MAX_ENCODED_SIZE_IN_BYTES: usize =
    (STORAGE_SIZE_IN_BITS + BITS_PER_ENCODED_BYTE - 1) / BITS_PER_ENCODED_BYTE;

const LOWER_7_BITMASK: u8 = 0b0111_1111;
const HIGHEST_BIT_VALUE: u8 = 0b1000_0000;

/// Represents a variable-length unsigned integer: base-128 groups written big-endian, with the
/// high bit of each byte clear except on the final byte, where it marks the end of the
/// encoding. See the
/// [VarUInt and VarInt Fields](https://amazon-ion.github.io/ion-docs/docs/binary.html#varuint-and-varint-fields)
/// section of the binary Ion spec for more details.
#[derive(Debug)]
pub struct VarUInt {
    value: usize,
    size_in_bytes: usize,
}

impl VarUInt {
    /// Reads a VarUInt from the provided data source.
    pub fn read<R: IonDataSource>(data_source: &mut R) -> IonResult<VarUInt> {
        let mut magnitude: usize = 0;
        let mut first_byte: Option<u8> = None;

        let mut byte_processor = |byte: u8| {
            first_byte.get_or_insert(byte);
            magnitude = (magnitude << BITS_PER_ENCODED_BYTE) | (byte & LOWER_7_BITMASK) as usize;
            // A clear high bit means another byte follows
            byte < HIGHEST_BIT_VALUE
        };

        let encoded_size_in_bytes = data_source.read_next_byte_while(&mut byte_processor)?;

        // An encoding longer than MAX_ENCODED_SIZE_IN_BYTES bytes, or exactly that long with
        // more than the one leftover magnitude bit set in its first byte, has silently
        // overflowed the accumulator. Checking the bounds once after the loop keeps the
        // per-byte hot path branch-free; it also rejects degenerate zero-padded encodings of
        // small values, an accepted trade-off.
        let overflowed = encoded_size_in_bytes > MAX_ENCODED_SIZE_IN_BYTES
            || (encoded_size_in_bytes == MAX_ENCODED_SIZE_IN_BYTES
                && first_byte.map(|byte| byte > 1u8).unwrap_or(false));
        if overflowed {
            return decoding_error(format!(
                "found a {encoded_size_in_bytes}-byte VarUInt; the largest supported size is {MAX_ENCODED_SIZE_IN_BYTES} bytes"
            ));
        }

        Ok(VarUInt {
            value: magnitude,
            size_in_bytes: encoded_size_in_bytes,
        })
    }

    /// Encodes the given unsigned value as a VarUInt and writes it to the sink, returning the
    /// number of bytes written.
    pub fn write_u64<W: Write>(sink: &mut W, magnitude: u64) -> IonResult<usize> {
        // A u64 needs at most ceil(64 / 7) = 10 encoded bytes
        let mut buffer: ArrayVec<u8, 10> = ArrayVec::new();
        let mut remaining = magnitude;
        loop {
            buffer.push((remaining & LOWER_7_BITMASK as u64) as u8);
            remaining >>= BITS_PER_ENCODED_BYTE;
            if remaining == 0 {
                break;
            }
        }
        // The first group pushed holds the least significant bits; on the wire it comes last
        // and carries the end flag.
        buffer[0] |= HIGHEST_BIT_VALUE;
        buffer.reverse();

        sink.write_all(&buffer)?;
        Ok(buffer.len())
    }

    /// Returns the magnitude of the unsigned integer.
    #[inline(always)]
    pub fn value(&self) -> usize {
        self.value
    }

    /// Returns the number of bytes that were read from the data source to construct this
    /// unsigned integer.
    #[inline(always)]
    pub fn size_in_bytes(&self) -> usize {
        self.size_in_bytes
    }
}

#[cfg(test)]
mod tests {
    use super::VarUInt;
    use crate::result::IonResult;
    use std::io::{BufReader, Cursor};

    const ERROR_MESSAGE: &str = "Failed to read a VarUInt from the provided data.";

    #[test]
    fn read_var_uint() {
        let var_uint = VarUInt::read(&mut Cursor::new(&[0b0111_1001, 0b0000_1111, 0b1000_0001]))
            .expect(ERROR_MESSAGE);
        assert_eq!(3, var_uint.size_in_bytes());
        assert_eq!(1_984_385, var_uint.value());
    }

    #[test]
    fn read_var_uint_spanning_multiple_fills() {
        // A BufReader whose internal buffer is a single byte forces the read to span
        // multiple I/O operations
        let var_uint = VarUInt::read(&mut BufReader::with_capacity(
            1,
            Cursor::new(&[0b0111_1001, 0b0000_1111, 0b1000_0001]),
        ))
        .expect(ERROR_MESSAGE);
        assert_eq!(var_uint.size_in_bytes(), 3);
        assert_eq!(var_uint.value(), 1_984_385);
    }

    #[test]
    fn read_var_uint_zero() {
        let var_uint = VarUInt::read(&mut Cursor::new(&[0b1000_0000])).expect(ERROR_MESSAGE);
        assert_eq!(var_uint.size_in_bytes(), 1);
        assert_eq!(var_uint.value(), 0);
    }

    #[test]
    fn read_var_uint_two_byte_max_value() {
        let var_uint =
            VarUInt::read(&mut Cursor::new(&[0b0111_1111, 0b1111_1111])).expect(ERROR_MESSAGE);
        assert_eq!(var_uint.size_in_bytes(), 2);
        assert_eq!(var_uint.value(), 16_383);
    }

    #[test]
    fn read_var_uint_truncated_is_an_error() {
        // The end flag never appears
        assert!(VarUInt::read(&mut Cursor::new(&[0b0111_1111, 0b0111_1111])).is_err());
    }

    #[test]
    fn read_var_uint_overflow_detection() {
        VarUInt::read(&mut Cursor::new(&[
            0b0111_1111,
            0b0111_1111,
            0b0111_1111,
            0b0111_1111,
            0b0111_1111,
            0b0111_1111,
            0b0111_1111,
            0b0111_1111,
            0b0111_1111,
            0b1111_1111, // 1 byte more than the maximum allowed on 64-bit systems
        ]))
        .expect_err("this should have failed due to overflow");
    }

    #[test]
    fn read_var_uint_slight_overflow_detection() {
        VarUInt::read(&mut Cursor::new(&[
            0b0000_0011, // One bit more than the maximum allowed on 64-bit systems
            0b0111_1111,
            0b0111_1111,
            0b0111_1111,
            0b0111_1111,
            0b0111_1111,
            0b0111_1111,
            0b0111_1111,
            0b0111_1111,
            0b1111_1111,
        ]))
        .expect_err("this should have failed due to overflow");
    }

    fn var_uint_encoding_test(value: u64, expected_encoding: &[u8]) -> IonResult<()> {
        let mut buffer = vec![];
        let encoded_size = VarUInt::write_u64(&mut buffer, value)?;
        assert_eq!(encoded_size, expected_encoding.len());
        assert_eq!(buffer.as_slice(), expected_encoding);
        Ok(())
    }

    #[test]
    fn write_var_uint_single_byte_values() -> IonResult<()> {
        var_uint_encoding_test(0, &[0b1000_0000])?;
        var_uint_encoding_test(6, &[0b1000_0110])?;
        var_uint_encoding_test(17, &[0b1001_0001])?;
        var_uint_encoding_test(41, &[0b1010_1001])?;
        Ok(())
    }

    #[test]
    fn write_var_uint_multi_byte_values() -> IonResult<()> {
        var_uint_encoding_test(279, &[0b0000_0010, 0b1001_0111])?;
        var_uint_encoding_test(555, &[0b0000_0100, 0b1010_1011])?;
        var_uint_encoding_test(81_991, &[0b0000_0101, 0b0000_0000, 0b1100_0111])?;
        var_uint_encoding_test(400_600, &[0b0001_1000, 0b0011_1001, 0b1101_1000])?;
        Ok(())
    }

    #[test]
    fn u64_max_round_trip() -> IonResult<()> {
        let mut buffer = Vec::new();
        let encoded_size = VarUInt::write_u64(&mut buffer, u64::MAX)?;
        assert_eq!(encoded_size, 10);
        let value = VarUInt::read(&mut buffer.as_slice())?;
        assert_eq!(value.value() as u64, u64::MAX);
        Ok(())
    }
}
