use nom::Needed;

use crate::text::parse_result::{fatal_parse_error, IonParseError, IonParseResult};
use crate::text::parsers::comments::whitespace_or_comments;
use crate::text::parsers::text_support::escape_sequence;
use crate::text::text_value::TextValue;

fn incomplete<T>() -> IonParseResult<'static, T> {
    Err(nom::Err::Incomplete(Needed::Unknown))
}

// Consumes the body of a short (double-quoted) string through its closing quote.
fn short_string_body(input: &str) -> IonParseResult<'_, String> {
    let mut text = String::new();
    let mut rest = input;
    loop {
        let c = match rest.chars().next() {
            Some(c) => c,
            None => return incomplete(),
        };
        match c {
            '"' => return Ok((&rest[1..], text)),
            '\\' => {
                let (after_escape, unescaped) = escape_sequence(rest)?;
                if let Some(unescaped) = unescaped {
                    text.push(unescaped);
                }
                rest = after_escape;
            }
            c if (c as u32) < 0x20 => {
                return fatal_parse_error(
                    input,
                    "unescaped control character in a short string",
                )
            }
            c => {
                text.push(c);
                rest = &rest[c.len_utf8()..];
            }
        }
    }
}

/// Matches a short string: `"..."` with escape processing.
pub(crate) fn short_string(input: &str) -> IonParseResult<'_, String> {
    match input.chars().next() {
        Some('"') => short_string_body(&input[1..]),
        Some(_) => Err(nom::Err::Error(IonParseError::new(input))),
        None => incomplete(),
    }
}

// Consumes the body of one `'''...'''` segment after its opening delimiter, stopping at the
// first closing triple-quote.
fn long_string_segment_body(input: &str) -> IonParseResult<'_, String> {
    let mut text = String::new();
    let mut rest = input;
    loop {
        if rest.starts_with("'''") {
            return Ok((&rest[3..], text));
        }
        // A quote run shorter than three characters at the end of the buffer could still
        // grow into a terminator
        if rest.len() < 3 && !rest.is_empty() && rest.bytes().all(|b| b == b'\'') {
            return incomplete();
        }
        let c = match rest.chars().next() {
            Some(c) => c,
            None => return incomplete(),
        };
        match c {
            '\\' => {
                let (after_escape, unescaped) = escape_sequence(rest)?;
                if let Some(unescaped) = unescaped {
                    text.push(unescaped);
                }
                rest = after_escape;
            }
            // Long strings admit raw newlines and tabs; other control characters must be
            // escaped
            '\n' | '\r' | '\t' => {
                text.push(c);
                rest = &rest[c.len_utf8()..];
            }
            c if (c as u32) < 0x20 => {
                return fatal_parse_error(input, "unescaped control character in a long string")
            }
            c => {
                text.push(c);
                rest = &rest[c.len_utf8()..];
            }
        }
    }
}

fn long_string_segment(input: &str) -> IonParseResult<'_, String> {
    if input.len() < 3 {
        if "'''".starts_with(input) {
            return incomplete();
        }
        return Err(nom::Err::Error(IonParseError::new(input)));
    }
    if let Some(rest) = input.strip_prefix("'''") {
        return long_string_segment_body(rest);
    }
    Err(nom::Err::Error(IonParseError::new(input)))
}

/// Matches one or more triple-quoted segments separated by whitespace and comments; the
/// segments concatenate into a single string value.
pub(crate) fn long_string(input: &str) -> IonParseResult<'_, String> {
    let (mut rest, mut text) = long_string_segment(input)?;
    loop {
        let attempt = {
            let (after_separator, _) = whitespace_or_comments(rest)?;
            long_string_segment(after_separator)
        };
        match attempt {
            Ok((after_segment, segment)) => {
                text.push_str(&segment);
                rest = after_segment;
            }
            Err(nom::Err::Incomplete(needed)) => return Err(nom::Err::Incomplete(needed)),
            Err(_) => return Ok((rest, text)),
        }
    }
}

/// Matches a string in either of its notations.
pub(crate) fn parse_string(input: &str) -> IonParseResult<'_, TextValue> {
    match long_string(input) {
        Ok((rest, text)) => return Ok((rest, TextValue::String(text))),
        Err(nom::Err::Incomplete(needed)) => return Err(nom::Err::Incomplete(needed)),
        Err(nom::Err::Failure(error)) => return Err(nom::Err::Failure(error)),
        Err(_) => {}
    }
    let (rest, text) = short_string(input)?;
    Ok((rest, TextValue::String(text)))
}
