use num_bigint::BigUint;
use num_traits::Zero;

use crate::data_source::IonDataSource;
use crate::result::IonResult;
use crate::types::integer::UInt;

/// Represents a fixed-length big-endian unsigned integer magnitude, the encoding used for
/// positive and negative int payloads and for symbol IDs. The value's length is carried by
/// the enclosing type descriptor, not the field itself; zero occupies zero bytes.
#[derive(Debug)]
pub struct DecodedUInt {
    value: UInt,
    size_in_bytes: usize,
}

impl DecodedUInt {
    /// Reads a `length`-byte magnitude from the provided data source.
    pub fn read<R: IonDataSource>(data_source: &mut R, length: usize) -> IonResult<DecodedUInt> {
        let value = if length <= 8 {
            let mut buffer = [0u8; 8];
            let bytes = &mut buffer[..length];
            data_source.read_exact_or_eof(bytes)?;
            UInt::U64(magnitude_from_slice(bytes))
        } else {
            let mut buffer = vec![0u8; length];
            data_source.read_exact_or_eof(&mut buffer)?;
            UInt::from(BigUint::from_bytes_be(&buffer))
        };
        Ok(DecodedUInt {
            value,
            size_in_bytes: length,
        })
    }

    /// Appends the minimal big-endian encoding of `magnitude` to `output`, returning the
    /// number of bytes written. Zero writes no bytes.
    pub fn write_u64(output: &mut Vec<u8>, magnitude: u64) -> usize {
        if magnitude == 0 {
            return 0;
        }
        let leading_empty_bytes = (magnitude.leading_zeros() / 8) as usize;
        let bytes = magnitude.to_be_bytes();
        output.extend_from_slice(&bytes[leading_empty_bytes..]);
        8 - leading_empty_bytes
    }

    /// Appends the minimal big-endian encoding of `magnitude` to `output`, returning the
    /// number of bytes written.
    pub fn write_uint(output: &mut Vec<u8>, magnitude: &UInt) -> usize {
        match magnitude {
            UInt::U64(value) => Self::write_u64(output, *value),
            UInt::BigUInt(value) => {
                if value.is_zero() {
                    return 0;
                }
                let bytes = value.to_bytes_be();
                output.extend_from_slice(&bytes);
                bytes.len()
            }
        }
    }

    pub fn value(&self) -> &UInt {
        &self.value
    }

    pub fn into_value(self) -> UInt {
        self.value
    }

    pub fn size_in_bytes(&self) -> usize {
        self.size_in_bytes
    }
}

// Accumulates up to eight big-endian bytes into a u64.
pub(crate) fn magnitude_from_slice(bytes: &[u8]) -> u64 {
    let mut magnitude: u64 = 0;
    for byte in bytes.iter().copied() {
        magnitude = (magnitude << 8) | byte as u64;
    }
    magnitude
}
