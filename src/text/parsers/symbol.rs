use nom::bytes::streaming::{take_while, take_while1};
use nom::character::streaming::satisfy;
use nom::combinator::recognize;
use nom::sequence::pair;
use nom::Needed;

use crate::raw_symbol_token::RawSymbolToken;
use crate::text::parse_result::{fatal_parse_error, IonParseError, IonParseResult};
use crate::text::parsers::text_support::escape_sequence;
use crate::text::text_value::TextValue;

fn incomplete<T>() -> IonParseResult<'static, T> {
    Err(nom::Err::Incomplete(Needed::Unknown))
}

pub(crate) fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

pub(crate) fn is_identifier_character(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

pub(crate) fn is_operator_character(c: char) -> bool {
    matches!(
        c,
        '!' | '#'
            | '%'
            | '&'
            | '*'
            | '+'
            | '-'
            | '.'
            | '/'
            | ';'
            | '<'
            | '='
            | '>'
            | '?'
            | '@'
            | '^'
            | '`'
            | '|'
            | '~'
    )
}

pub(crate) fn identifier(input: &str) -> IonParseResult<'_, &str> {
    recognize(pair(
        satisfy(is_identifier_start),
        take_while(is_identifier_character),
    ))(input)
}

// An unquoted symbol: an identifier, a `$N` symbol ID reference, or — if it collides with a
// keyword — not a symbol at all.
fn identifier_token(input: &str) -> IonParseResult<'_, RawSymbolToken> {
    let (rest, text) = identifier(input)?;
    if matches!(text, "null" | "true" | "false" | "nan") {
        return Err(nom::Err::Error(IonParseError::new(input)));
    }
    // `$` followed by nothing but digits refers to a symbol ID; quoting defeats this reading
    if let Some(digits) = text.strip_prefix('$') {
        if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            let sid = match digits.parse::<usize>() {
                Ok(sid) => sid,
                Err(_) => return fatal_parse_error(input, "symbol ID is out of range"),
            };
            return Ok((rest, RawSymbolToken::SymbolId(sid)));
        }
    }
    Ok((rest, RawSymbolToken::Text(text.to_string())))
}

// The body of a quoted symbol, after its opening quote. Escapes are processed; raw control
// characters (including newlines) are not allowed.
fn quoted_symbol_body(input: &str) -> IonParseResult<'_, String> {
    let mut text = String::new();
    let mut rest = input;
    loop {
        let c = match rest.chars().next() {
            Some(c) => c,
            None => return incomplete(),
        };
        match c {
            '\'' => return Ok((&rest[1..], text)),
            '\\' => {
                let (after_escape, unescaped) = escape_sequence(rest)?;
                if let Some(unescaped) = unescaped {
                    text.push(unescaped);
                }
                rest = after_escape;
            }
            c if (c as u32) < 0x20 => {
                return fatal_parse_error(input, "unescaped control character in a quoted symbol")
            }
            c => {
                text.push(c);
                rest = &rest[c.len_utf8()..];
            }
        }
    }
}

/// Matches a quoted symbol: `'...'`. The empty symbol `''` is legal. Inputs that begin a
/// triple-quoted long string are refused so that callers can try the long-string reading
/// first without ambiguity.
pub(crate) fn quoted_symbol(input: &str) -> IonParseResult<'_, RawSymbolToken> {
    // A buffer holding only quotes could still grow into a long-string delimiter; wait for
    // the next character to decide.
    if !input.is_empty() && input.len() < 3 && input.bytes().all(|b| b == b'\'') {
        return incomplete();
    }
    if input.starts_with("'''") {
        return Err(nom::Err::Error(IonParseError::new(input)));
    }
    match input.chars().next() {
        Some('\'') => {
            let (rest, text) = quoted_symbol_body(&input[1..])?;
            Ok((rest, RawSymbolToken::Text(text)))
        }
        Some(_) => Err(nom::Err::Error(IonParseError::new(input))),
        None => incomplete(),
    }
}

/// Matches a symbol token in either its quoted or unquoted notation.
pub(crate) fn symbol_token(input: &str) -> IonParseResult<'_, RawSymbolToken> {
    match quoted_symbol(input) {
        Ok(matched) => return Ok(matched),
        Err(nom::Err::Incomplete(needed)) => return Err(nom::Err::Incomplete(needed)),
        Err(nom::Err::Failure(error)) => return Err(nom::Err::Failure(error)),
        Err(_) => {}
    }
    identifier_token(input)
}

pub(crate) fn parse_symbol(input: &str) -> IonParseResult<'_, TextValue> {
    let (rest, token) = symbol_token(input)?;
    Ok((rest, TextValue::Symbol(token)))
}

/// Matches a run of operator characters, which form a single symbol token. Only legal
/// directly inside an s-expression.
pub(crate) fn parse_operator(input: &str) -> IonParseResult<'_, TextValue> {
    let (rest, text) = take_while1(is_operator_character)(input)?;
    Ok((
        rest,
        TextValue::Symbol(RawSymbolToken::Text(text.to_string())),
    ))
}
