use nom::branch::alt;
use nom::bytes::streaming::tag;
use nom::character::streaming::{char, satisfy};
use nom::combinator::{map, not, peek, value};
use nom::sequence::{preceded, terminated};

use crate::text::parse_result::IonParseResult;
use crate::text::parsers::symbol::is_identifier_character;
use crate::text::text_value::TextValue;
use crate::types::IonType;

// Succeeds when the next character cannot extend an identifier, confirming that a keyword
// ended where it should.
pub(crate) fn keyword_boundary(input: &str) -> IonParseResult<'_, ()> {
    value((), not(peek(satisfy(is_identifier_character))))(input)
}

fn ion_type_keyword(input: &str) -> IonParseResult<'_, IonType> {
    terminated(
        alt((
            value(IonType::Null, tag("null")),
            value(IonType::Bool, tag("bool")),
            value(IonType::Int, tag("int")),
            value(IonType::Float, tag("float")),
            value(IonType::Decimal, tag("decimal")),
            value(IonType::Timestamp, tag("timestamp")),
            value(IonType::Symbol, tag("symbol")),
            value(IonType::String, tag("string")),
            value(IonType::Clob, tag("clob")),
            value(IonType::Blob, tag("blob")),
            value(IonType::List, tag("list")),
            value(IonType::SExp, tag("sexp")),
            value(IonType::Struct, tag("struct")),
        )),
        keyword_boundary,
    )(input)
}

/// Matches `null` or any typed null (`null.bool`, `null.struct`, ...).
pub(crate) fn parse_null(input: &str) -> IonParseResult<'_, TextValue> {
    let (remaining, _) = tag("null")(input)?;
    // A '.' introduces the type qualifier; otherwise the keyword must end here
    match preceded(char('.'), ion_type_keyword)(remaining) {
        Ok((rest, ion_type)) => Ok((rest, TextValue::Null(ion_type))),
        Err(nom::Err::Incomplete(needed)) => Err(nom::Err::Incomplete(needed)),
        Err(_) => map(keyword_boundary, |_| TextValue::Null(IonType::Null))(remaining),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untyped_and_typed_nulls() {
        assert_eq!(parse_null("null ").unwrap().1, TextValue::Null(IonType::Null));
        assert_eq!(
            parse_null("null.string ").unwrap().1,
            TextValue::Null(IonType::String)
        );
        assert_eq!(
            parse_null("null.sexp ").unwrap().1,
            TextValue::Null(IonType::SExp)
        );
    }

    #[test]
    fn identifiers_that_start_with_null_are_not_nulls() {
        assert!(matches!(parse_null("nullify "), Err(nom::Err::Error(_))));
        assert!(parse_null("null.strings ").is_err());
    }

    #[test]
    fn a_null_at_the_end_of_the_buffer_is_incomplete() {
        assert!(matches!(parse_null("null"), Err(nom::Err::Incomplete(_))));
        assert!(matches!(parse_null("null."), Err(nom::Err::Incomplete(_))));
    }
}
