use nom::branch::alt;
use nom::bytes::streaming::tag;
use nom::character::streaming::{char, one_of};
use nom::combinator::{map, map_res, opt, recognize};
use nom::sequence::{pair, preceded, terminated, tuple};

use crate::text::parse_result::IonParseResult;
use crate::text::parsers::numeric_support::{
    base_10_integer_digits, digits_and_underscores, stop_character, strip_underscores,
};
use crate::text::text_value::TextValue;

fn special_float(input: &str) -> IonParseResult<'_, f64> {
    alt((
        map(tag("nan"), |_| f64::NAN),
        map(tag("+inf"), |_| f64::INFINITY),
        map(tag("-inf"), |_| f64::NEG_INFINITY),
    ))(input)
}

// A float literal always carries an exponent marker: [-]digits[.digits][eE][+-]digits
fn e_notation_float(input: &str) -> IonParseResult<'_, f64> {
    map_res(
        recognize(tuple((
            opt(char('-')),
            base_10_integer_digits,
            opt(pair(char('.'), opt(digits_and_underscores))),
            one_of("eE"),
            preceded(opt(one_of("+-")), digits_and_underscores),
        ))),
        |text: &str| {
            let mut sanitized = strip_underscores(text)
                .ok_or_else(|| crate::result::decoding_error_raw(format!("invalid float: '{text}'")))?;
            // Rust's float parser requires a digit after the point; Ion does not
            sanitized = sanitized.replace(".e", ".0e").replace(".E", ".0E");
            sanitized
                .parse::<f64>()
                .map_err(|_| crate::result::decoding_error_raw(format!("invalid float: '{text}'")))
        },
    )(input)
}

/// Matches a float: `nan`, `+inf`, `-inf`, or a base-10 literal with an `e` exponent.
pub(crate) fn parse_float(input: &str) -> IonParseResult<'_, TextValue> {
    map(
        terminated(alt((e_notation_float, special_float)), stop_character),
        TextValue::Float,
    )(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expect_float(text: &str, expected: f64) {
        match parse_float(text).unwrap().1 {
            TextValue::Float(value) => {
                assert_eq!(value, expected, "parsing {text:?} produced {value}")
            }
            other => panic!("expected a float, got {other:?}"),
        }
    }

    #[test]
    fn e_notation() {
        expect_float("0e0 ", 0.0);
        expect_float("2.5e0 ", 2.5);
        expect_float("-2.5e-3 ", -0.0025);
        expect_float("1e+3 ", 1000.0);
        expect_float("1.e0 ", 1.0);
        expect_float("123_456.5e0 ", 123456.5);
    }

    #[test]
    fn specials() {
        expect_float("+inf ", f64::INFINITY);
        expect_float("-inf,", f64::NEG_INFINITY);
        match parse_float("nan ").unwrap().1 {
            TextValue::Float(value) => assert!(value.is_nan()),
            other => panic!("expected nan, got {other:?}"),
        }
    }

    #[test]
    fn bare_inf_is_not_a_float() {
        assert!(parse_float("inf ").is_err());
    }

    #[test]
    fn plain_numbers_are_not_floats() {
        assert!(parse_float("25 ").is_err());
        assert!(parse_float("2.5 ").is_err());
    }

    #[test]
    fn no_stop_character_is_an_error() {
        assert!(parse_float("1e3x ").is_err());
    }
}
