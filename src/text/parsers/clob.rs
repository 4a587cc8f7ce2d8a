use nom::bytes::streaming::{tag, take_while};
use nom::Needed;

use crate::text::parse_result::{fatal_parse_error, IonParseError, IonParseResult};
use crate::text::parsers::text_support::clob_escape_sequence;
use crate::text::parsers::whitespace::is_whitespace;
use crate::text::text_value::TextValue;

fn incomplete<T>() -> IonParseResult<'static, T> {
    Err(nom::Err::Incomplete(Needed::Unknown))
}

// Whitespace inside lob delimiters; comments are not recognized there.
fn lob_whitespace(input: &str) -> IonParseResult<'_, &str> {
    take_while(is_whitespace)(input)
}

fn is_printable_ascii(c: char) -> bool {
    (0x20..=0x7E).contains(&(c as u32))
}

// The body of a double-quoted clob, after the opening quote.
fn short_clob_body(input: &str) -> IonParseResult<'_, Vec<u8>> {
    let mut bytes = Vec::new();
    let mut rest = input;
    loop {
        let c = match rest.chars().next() {
            Some(c) => c,
            None => return incomplete(),
        };
        match c {
            '"' => return Ok((&rest[1..], bytes)),
            '\\' => {
                let (after_escape, byte) = clob_escape_sequence(rest)?;
                if let Some(byte) = byte {
                    bytes.push(byte);
                }
                rest = after_escape;
            }
            c if is_printable_ascii(c) => {
                bytes.push(c as u8);
                rest = &rest[1..];
            }
            _ => return fatal_parse_error(input, "clobs may only contain printable ASCII"),
        }
    }
}

// The body of one triple-quoted clob segment, after the opening delimiter.
fn long_clob_segment_body(input: &str) -> IonParseResult<'_, Vec<u8>> {
    let mut bytes = Vec::new();
    let mut rest = input;
    loop {
        if rest.starts_with("'''") {
            return Ok((&rest[3..], bytes));
        }
        if !rest.is_empty() && rest.len() < 3 && rest.bytes().all(|b| b == b'\'') {
            return incomplete();
        }
        let c = match rest.chars().next() {
            Some(c) => c,
            None => return incomplete(),
        };
        match c {
            '\\' => {
                let (after_escape, byte) = clob_escape_sequence(rest)?;
                if let Some(byte) = byte {
                    bytes.push(byte);
                }
                rest = after_escape;
            }
            '\n' | '\r' | '\t' => {
                bytes.push(c as u8);
                rest = &rest[1..];
            }
            c if is_printable_ascii(c) => {
                bytes.push(c as u8);
                rest = &rest[1..];
            }
            _ => return fatal_parse_error(input, "clobs may only contain printable ASCII"),
        }
    }
}

fn long_clob(input: &str) -> IonParseResult<'_, Vec<u8>> {
    let (rest, _) = tag("'''")(input)?;
    let (mut rest, mut bytes) = long_clob_segment_body(rest)?;
    loop {
        let attempt = {
            let (after_ws, _) = lob_whitespace(rest)?;
            tag::<_, _, IonParseError>("'''")(after_ws)
        };
        match attempt {
            Ok((after_open, _)) => {
                let (after_segment, segment) = long_clob_segment_body(after_open)?;
                bytes.extend_from_slice(&segment);
                rest = after_segment;
            }
            Err(nom::Err::Incomplete(needed)) => return Err(nom::Err::Incomplete(needed)),
            Err(_) => return Ok((rest, bytes)),
        }
    }
}

/// Matches a clob: `{{"..."}}` or one or more `'''...'''` segments inside double braces.
pub(crate) fn parse_clob(input: &str) -> IonParseResult<'_, TextValue> {
    let (rest, _) = tag("{{")(input)?;
    let (rest, _) = lob_whitespace(rest)?;
    let (rest, bytes) = match rest.chars().next() {
        Some('"') => short_clob_body(&rest[1..])?,
        Some('\'') => long_clob(rest)?,
        Some(_) => return Err(nom::Err::Error(IonParseError::new(input))),
        None => return incomplete(),
    };
    let (rest, _) = lob_whitespace(rest)?;
    let (rest, _) = tag("}}")(rest)?;
    Ok((rest, TextValue::Clob(bytes)))
}
