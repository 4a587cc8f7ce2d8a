use nom::branch::alt;
use nom::bytes::streaming::take_while1;
use nom::character::streaming::{char, one_of};
use nom::combinator::{opt, peek, recognize};
use nom::sequence::pair;

use crate::text::parse_result::IonParseResult;

/// The characters that may legally follow a numeric literal (a timestamp included). Anything
/// else immediately after a number is a syntax error. The NUL sentinel never appears here
/// because the buffer always places a newline ahead of it.
pub(crate) const STOP_CHARACTERS: &str = "{}[](),\"' \t\n\r\x0B\x0C";

/// Matches (without consuming) any character that may legally follow a numeric literal.
pub(crate) fn stop_character(input: &str) -> IonParseResult<'_, char> {
    peek(one_of(STOP_CHARACTERS))(input)
}

/// One or more digits, possibly with embedded `_` separators. Separator *placement* is
/// validated later, when the matched text is converted to a value.
pub(crate) fn digits_and_underscores(input: &str) -> IonParseResult<'_, &str> {
    take_while1(|c: char| c.is_ascii_digit() || c == '_')(input)
}

/// The integer part of a base-10 literal: a lone zero, or a nonzero digit followed by any run
/// of digits and separators. A literal with a leading zero fails to parse as a number.
pub(crate) fn base_10_integer_digits(input: &str) -> IonParseResult<'_, &str> {
    alt((
        recognize(pair(one_of("123456789"), opt(digits_and_underscores))),
        recognize(char('0')),
    ))(input)
}

/// Removes `_` separators from a numeric literal, confirming that every separator sits
/// between two ASCII digits. Returns `None` for misplaced separators.
pub(crate) fn strip_underscores(text: &str) -> Option<String> {
    if !text.contains('_') {
        return Some(text.to_string());
    }
    let mut output = String::with_capacity(text.len());
    let mut previous: Option<char> = None;
    let mut characters = text.chars().peekable();
    while let Some(c) = characters.next() {
        if c == '_' {
            let previous_is_digit = previous.map(|p| p.is_ascii_digit()).unwrap_or(false);
            let next_is_digit = characters
                .peek()
                .map(|n| n.is_ascii_digit())
                .unwrap_or(false);
            if !previous_is_digit || !next_is_digit {
                return None;
            }
        } else {
            output.push(c);
        }
        previous = Some(c);
    }
    Some(output)
}
