use nom::branch::alt;
use nom::bytes::streaming::{tag, take_while1};
use nom::character::streaming::char;
use nom::combinator::{map_res, opt, recognize};
use nom::sequence::{pair, terminated, tuple};

use crate::text::parse_result::IonParseResult;
use crate::text::parsers::numeric_support::{base_10_integer_digits, stop_character};
use crate::text::text_value::TextValue;
use crate::types::integer::Int;

fn base_16_integer(input: &str) -> IonParseResult<'_, Int> {
    map_res(
        recognize(tuple((
            opt(char('-')),
            alt((tag("0x"), tag("0X"))),
            take_while1(|c: char| c.is_ascii_hexdigit() || c == '_'),
        ))),
        Int::from_hex_str,
    )(input)
}

fn base_2_integer(input: &str) -> IonParseResult<'_, Int> {
    map_res(
        recognize(tuple((
            opt(char('-')),
            alt((tag("0b"), tag("0B"))),
            take_while1(|c: char| c == '0' || c == '1' || c == '_'),
        ))),
        Int::from_binary_str,
    )(input)
}

fn base_10_integer(input: &str) -> IonParseResult<'_, Int> {
    map_res(
        recognize(pair(opt(char('-')), base_10_integer_digits)),
        Int::from_decimal_str,
    )(input)
}

/// Matches an integer in any of its three radix notations. The literal must be followed by a
/// numeric stop character; `123a` is a syntax error, not an integer and a symbol.
pub(crate) fn parse_integer(input: &str) -> IonParseResult<'_, TextValue> {
    terminated(
        alt((base_16_integer, base_2_integer, base_10_integer)),
        stop_character,
    )(input)
    .map(|(rest, value)| (rest, TextValue::Int(value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expect_int(text: &str, expected: i64) {
        match parse_integer(text).unwrap().1 {
            TextValue::Int(value) => assert_eq!(value, Int::I64(expected)),
            other => panic!("expected an int, got {other:?}"),
        }
    }

    #[test]
    fn base_10() {
        expect_int("0 ", 0);
        expect_int("42 ", 42);
        expect_int("-42,", -42);
        expect_int("1_000_000 ", 1_000_000);
    }

    #[test]
    fn base_16_and_2() {
        expect_int("0x1f ", 31);
        expect_int("-0xBEEF ", -48879);
        expect_int("0b101 ", 5);
        expect_int("-0b11 ", -3);
    }

    #[test]
    fn huge_integers_take_the_arbitrary_precision_path() {
        match parse_integer("123456789123456789123456789 ").unwrap().1 {
            TextValue::Int(Int::BigInt(value)) => {
                assert_eq!(value.to_string(), "123456789123456789123456789")
            }
            other => panic!("expected a big int, got {other:?}"),
        }
    }

    #[test]
    fn numbers_need_stop_characters() {
        assert!(parse_integer("42a ").is_err());
        assert!(parse_integer("0x ").is_err());
    }

    #[test]
    fn leading_zeros_are_rejected() {
        assert!(parse_integer("007 ").is_err());
    }

    #[test]
    fn stops_at_container_delimiters() {
        let (rest, value) = parse_integer("7]").unwrap();
        assert_eq!(rest, "]");
        assert_eq!(value, TextValue::Int(Int::I64(7)));
    }
}
