use crate::binary::int::DecodedInt;
use crate::binary::var_int::VarInt;
use crate::result::IonResult;
use crate::types::coefficient::Sign;
use crate::types::decimal::Decimal;

/// Appends the binary encoding of a decimal's body (a `VarInt` exponent followed by a
/// sign-and-magnitude coefficient) to `output`, returning the number of bytes written.
/// The value `0d0` has an empty encoding.
pub(crate) fn encode_decimal(output: &mut Vec<u8>, decimal: &Decimal) -> IonResult<usize> {
    let coefficient = decimal.coefficient();
    if coefficient.is_zero() && !coefficient.is_negative_zero() && decimal.exponent() == 0 {
        return Ok(0);
    }
    let start = output.len();
    VarInt::write_i64(output, decimal.exponent())?;
    DecodedInt::write(
        output,
        coefficient.sign() == Sign::Negative,
        coefficient.magnitude(),
    );
    Ok(output.len() - start)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::coefficient::Coefficient;

    #[test]
    fn zero_with_zero_exponent_is_empty() -> IonResult<()> {
        let mut output = Vec::new();
        assert_eq!(encode_decimal(&mut output, &Decimal::new(0u64, 0))?, 0);
        assert!(output.is_empty());
        Ok(())
    }

    #[test]
    fn negative_zero_is_not_empty() -> IonResult<()> {
        let mut output = Vec::new();
        let length = encode_decimal(&mut output, &Decimal::negative_zero())?;
        // Exponent 0 plus a lone sign byte
        assert_eq!(length, 2);
        assert_eq!(output, vec![0b1000_0000, 0b1000_0000]);
        Ok(())
    }

    #[test]
    fn coefficient_and_exponent() -> IonResult<()> {
        let mut output = Vec::new();
        // 1.23456 = 123456 * 10^-5
        encode_decimal(&mut output, &Decimal::new(123456u64, -5))?;
        // VarInt -5, then 123456 as 3 magnitude bytes (0x01 0xE2 0x40)
        assert_eq!(output, vec![0b1100_0101, 0x01, 0xE2, 0x40]);
        Ok(())
    }

    #[test]
    fn exponent_without_coefficient_bytes() -> IonResult<()> {
        let mut output = Vec::new();
        // 0d5: the exponent is meaningful even though the coefficient is zero
        let length = encode_decimal(&mut output, &Decimal::new(Coefficient::from(0i64), 5))?;
        assert_eq!(length, 1);
        assert_eq!(output, vec![0b1000_0101]);
        Ok(())
    }
}
