use nom::branch::alt;
use nom::character::streaming::{char, one_of};
use nom::combinator::{map, opt};
use nom::sequence::{pair, preceded, terminated, tuple};

use crate::text::parse_result::{fatal_parse_error, IonParseResult};
use crate::text::parsers::numeric_support::{
    base_10_integer_digits, digits_and_underscores, stop_character, strip_underscores,
};
use crate::text::text_value::TextValue;
use crate::types::coefficient::{Coefficient, Sign};
use crate::types::decimal::Decimal;
use crate::types::integer::Int;

struct DecimalParts<'a> {
    is_negative: bool,
    whole: &'a str,
    fraction: Option<&'a str>,
    exponent: Option<(Option<char>, &'a str)>,
}

// A decimal literal is distinguished from an int by a '.' or a 'd' exponent marker (or both).
fn decimal_parts(input: &str) -> IonParseResult<'_, DecimalParts<'_>> {
    map(
        tuple((
            opt(char('-')),
            base_10_integer_digits,
            alt((
                // '.' [digits] [d exponent]
                pair(
                    map(preceded(char('.'), opt(digits_and_underscores)), Some),
                    opt(d_exponent),
                ),
                // 'd' exponent with no fractional part
                map(d_exponent, |exponent| (None, Some(exponent))),
            )),
        )),
        |(sign, whole, (fraction, exponent))| DecimalParts {
            is_negative: sign.is_some(),
            whole,
            fraction: fraction.flatten(),
            exponent,
        },
    )(input)
}

fn d_exponent(input: &str) -> IonParseResult<'_, (Option<char>, &str)> {
    preceded(one_of("dD"), pair(opt(one_of("+-")), digits_and_underscores))(input)
}

/// Matches a decimal literal: digits with a `.` and/or a `d` exponent marker.
pub(crate) fn parse_decimal(input: &str) -> IonParseResult<'_, TextValue> {
    let (remaining, parts) = terminated(decimal_parts, stop_character)(input)?;

    let whole = match strip_underscores(parts.whole) {
        Some(whole) => whole,
        None => return fatal_parse_error(input, "misplaced digit separator in decimal"),
    };
    let fraction = match parts.fraction.map(strip_underscores) {
        Some(None) => return fatal_parse_error(input, "misplaced digit separator in decimal"),
        Some(Some(fraction)) => fraction,
        None => String::new(),
    };

    let mut digits = whole;
    digits.push_str(&fraction);
    let magnitude = match Int::from_decimal_str(&digits) {
        Ok(value) => value.magnitude(),
        Err(_) => return fatal_parse_error(input, "invalid decimal coefficient"),
    };
    let sign = if parts.is_negative {
        Sign::Negative
    } else {
        Sign::Positive
    };
    let coefficient = Coefficient::new(sign, magnitude);

    let declared_exponent: i64 = match parts.exponent {
        Some((exponent_sign, exponent_digits)) => {
            let exponent_digits = match strip_underscores(exponent_digits) {
                Some(digits) => digits,
                None => {
                    return fatal_parse_error(input, "misplaced digit separator in decimal exponent")
                }
            };
            let magnitude: i64 = match exponent_digits.parse() {
                Ok(magnitude) => magnitude,
                Err(_) => return fatal_parse_error(input, "decimal exponent is out of range"),
            };
            if exponent_sign == Some('-') {
                -magnitude
            } else {
                magnitude
            }
        }
        None => 0,
    };
    let exponent = declared_exponent - fraction.len() as i64;

    Ok((remaining, TextValue::Decimal(Decimal::new(coefficient, exponent))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ion_eq::IonEq;

    fn expect_decimal(text: &str, coefficient: i64, exponent: i64) {
        match parse_decimal(text).unwrap().1 {
            TextValue::Decimal(value) => {
                let expected = Decimal::new(coefficient, exponent);
                assert!(
                    value.ion_eq(&expected),
                    "parsing {text:?} produced {value:?}, expected {expected:?}"
                );
            }
            other => panic!("expected a decimal, got {other:?}"),
        }
    }

    #[test]
    fn point_notation() {
        expect_decimal("2.5 ", 25, -1);
        expect_decimal("-2.5 ", -25, -1);
        expect_decimal("123. ", 123, 0);
        expect_decimal("0.000123 ", 123, -6);
    }

    #[test]
    fn d_notation() {
        expect_decimal("25d-1 ", 25, -1);
        expect_decimal("25D1 ", 25, 1);
        expect_decimal("123.456d-2 ", 123456, -5);
    }

    #[test]
    fn negative_zero_is_preserved() {
        match parse_decimal("-0.0 ").unwrap().1 {
            TextValue::Decimal(value) => {
                assert!(value.coefficient().is_negative_zero());
                assert_eq!(value.exponent(), -1);
            }
            other => panic!("expected a decimal, got {other:?}"),
        }
    }

    #[test]
    fn plain_integers_are_not_decimals() {
        assert!(parse_decimal("123 ").is_err());
    }

    #[test]
    fn e_marker_is_not_a_decimal() {
        assert!(parse_decimal("2.5e0 ").is_err());
    }
}
