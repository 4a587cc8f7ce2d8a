use nom::branch::alt;
use nom::bytes::streaming::tag;
use nom::multi::many0;
use nom::sequence::preceded;

use crate::text::parse_result::{fatal_parse_error, IonParseError, IonParseResult};
use crate::text::parsers::annotations::parse_annotation;
use crate::text::parsers::blob::parse_blob;
use crate::text::parsers::boolean::parse_boolean;
use crate::text::parsers::clob::parse_clob;
use crate::text::parsers::comments::whitespace_or_comments;
use crate::text::parsers::containers::parse_container_start;
use crate::text::parsers::decimal::parse_decimal;
use crate::text::parsers::float::parse_float;
use crate::text::parsers::integer::parse_integer;
use crate::text::parsers::null::parse_null;
use crate::text::parsers::string::parse_string;
use crate::text::parsers::symbol::{identifier, parse_operator, parse_symbol};
use crate::text::parsers::timestamp::parse_timestamp;
use crate::text::text_value::{AnnotatedTextValue, TextValue};

/// Matches a single value (or container opening) in any notation. Literals that overlap
/// lexically are tried most-specific-first: keywords, then timestamps, then the numeric
/// notations in decreasing specificity, then text, lobs, containers, and finally symbols.
pub(crate) fn parse_value(input: &str) -> IonParseResult<'_, TextValue> {
    alt((
        parse_null,
        parse_boolean,
        parse_timestamp,
        parse_float,
        parse_decimal,
        parse_integer,
        parse_string,
        parse_clob,
        parse_blob,
        parse_container_start,
        parse_symbol,
    ))(input)
}

fn parse_sexp_item(input: &str) -> IonParseResult<'_, TextValue> {
    // Numbers win where the grammars overlap ("-3" is an int); otherwise a run of operator
    // characters is a symbol
    alt((parse_value, parse_operator))(input)
}

fn annotations_then<'a>(
    input: &'a str,
    value_parser: fn(&str) -> IonParseResult<'_, TextValue>,
) -> IonParseResult<'a, AnnotatedTextValue> {
    let (rest, annotations) = many0(preceded(whitespace_or_comments, parse_annotation))(input)?;
    let (rest, value) = preceded(whitespace_or_comments, value_parser)(rest)?;
    Ok((rest, AnnotatedTextValue::new(annotations, value)))
}

/// Matches a value with any number of preceding annotations.
pub(crate) fn annotated_value(input: &str) -> IonParseResult<'_, AnnotatedTextValue> {
    annotations_then(input, parse_value)
}

/// Matches an annotated value or a bare operator symbol; the grammar used directly inside
/// s-expressions.
pub(crate) fn annotated_sexp_value(input: &str) -> IonParseResult<'_, AnnotatedTextValue> {
    annotations_then(input, parse_sexp_item)
}

/// Matches a top-level `$ion_N_M` version marker: an unquoted, unannotated identifier of
/// exactly that shape. Versions other than 1.0 are unsupported and fatal.
pub(crate) fn stream_version_marker(input: &str) -> IonParseResult<'_, (u8, u8)> {
    let (rest, text) = identifier(input)?;
    let versions = match text.strip_prefix("$ion_") {
        Some(versions) => versions,
        None => return Err(nom::Err::Error(IonParseError::new(input))),
    };
    let (major_digits, minor_digits) = match versions.split_once('_') {
        Some(parts) => parts,
        None => return Err(nom::Err::Error(IonParseError::new(input))),
    };
    let all_digits = |text: &str| {
        !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit())
    };
    if !all_digits(major_digits) || !all_digits(minor_digits) {
        // Not a version pattern after all (e.g. `$ion_symbol_table`)
        return Err(nom::Err::Error(IonParseError::new(input)));
    }

    // If the marker is actually an annotation, it is not a version marker
    match preceded(whitespace_or_comments, tag::<_, _, IonParseError>("::"))(rest) {
        Ok(_) => return Err(nom::Err::Error(IonParseError::new(input))),
        Err(nom::Err::Incomplete(needed)) => return Err(nom::Err::Incomplete(needed)),
        Err(_) => {}
    }

    match (major_digits.parse::<u8>(), minor_digits.parse::<u8>()) {
        (Ok(1), Ok(0)) => Ok((rest, (1, 0))),
        (Ok(major), Ok(minor)) => fatal_parse_error(
            input,
            format!("found a version marker for unsupported Ion version {major}.{minor}"),
        ),
        _ => fatal_parse_error(input, "found an unintelligible Ion version marker"),
    }
}
