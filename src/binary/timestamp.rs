use crate::binary::int::DecodedInt;
use crate::binary::var_int::VarInt;
use crate::binary::var_uint::VarUInt;
use crate::result::IonResult;
use crate::types::coefficient::Sign;
use crate::types::timestamp::{Precision, Timestamp};

/// Appends the binary encoding of a timestamp's body to `output`, returning the number of
/// bytes written. The layout is: `VarInt` offset (negative zero for an unknown offset),
/// then `VarUInt` calendar fields out to the value's precision, then — if fractional seconds
/// are present — a `VarInt` exponent and sign-and-magnitude coefficient.
pub(crate) fn encode_timestamp(output: &mut Vec<u8>, timestamp: &Timestamp) -> IonResult<usize> {
    let start = output.len();
    match timestamp.offset_minutes() {
        None => VarInt::write_negative_zero(output)?,
        Some(minutes) => VarInt::write_i64(output, minutes as i64)?,
    };

    let precision = timestamp.precision();
    VarUInt::write_u64(output, timestamp.year() as u64)?;
    if precision >= Precision::Month {
        VarUInt::write_u64(output, timestamp.month() as u64)?;
    }
    if precision >= Precision::Day {
        VarUInt::write_u64(output, timestamp.day() as u64)?;
    }
    if precision >= Precision::HourAndMinute {
        VarUInt::write_u64(output, timestamp.hour() as u64)?;
        VarUInt::write_u64(output, timestamp.minute() as u64)?;
    }
    if precision >= Precision::Second {
        VarUInt::write_u64(output, timestamp.second() as u64)?;
        if let Some(fraction) = timestamp.fractional_seconds() {
            VarInt::write_i64(output, fraction.exponent())?;
            DecodedInt::write(
                output,
                fraction.coefficient().sign() == Sign::Negative,
                fraction.coefficient().magnitude(),
            );
        }
    }
    Ok(output.len() - start)
}
