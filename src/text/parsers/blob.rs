use nom::bytes::streaming::tag;
use nom::Needed;

use crate::text::parse_result::{fatal_parse_error, IonParseResult};
use crate::text::parsers::whitespace::is_whitespace;
use crate::text::text_value::TextValue;

fn is_base64_character(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '+' | '/' | '=')
}

/// Matches a blob: base64 text (whitespace permitted) inside double braces.
pub(crate) fn parse_blob(input: &str) -> IonParseResult<'_, TextValue> {
    let (mut rest, _) = tag("{{")(input)?;
    let mut base64_text = String::new();
    loop {
        let c = match rest.chars().next() {
            Some(c) => c,
            None => return Err(nom::Err::Incomplete(Needed::Unknown)),
        };
        match c {
            '}' => {
                let (after_close, _) = match tag::<_, _, crate::text::parse_result::IonParseError>(
                    "}}",
                )(rest)
                {
                    Ok(matched) => matched,
                    Err(nom::Err::Incomplete(needed)) => return Err(nom::Err::Incomplete(needed)),
                    Err(_) => return fatal_parse_error(input, "unterminated blob"),
                };
                let bytes = match base64::decode(&base64_text) {
                    Ok(bytes) => bytes,
                    Err(error) => {
                        return fatal_parse_error(input, format!("invalid blob: {error}"))
                    }
                };
                return Ok((after_close, TextValue::Blob(bytes)));
            }
            c if is_whitespace(c) => {
                rest = &rest[c.len_utf8()..];
            }
            c if is_base64_character(c) => {
                base64_text.push(c);
                rest = &rest[1..];
            }
            _ => return fatal_parse_error(input, "invalid character in a blob"),
        }
    }
}
