use nom::branch::alt;
use nom::bytes::streaming::{tag, take_till, take_until};
use nom::combinator::recognize;
use nom::multi::many0_count;
use nom::sequence::{delimited, pair};

use crate::text::parse_result::IonParseResult;
use crate::text::parsers::whitespace::whitespace1;

// A `//` comment running to (but not including) the end of the line.
fn line_comment(input: &str) -> IonParseResult<'_, &str> {
    recognize(pair(tag("//"), take_till(|c| c == '\n' || c == '\r')))(input)
}

// A `/* ... */` comment. An unterminated block comment consumes the rest of the stream and
// is reported as an incomplete-input error.
fn block_comment(input: &str) -> IonParseResult<'_, &str> {
    recognize(delimited(tag("/*"), take_until("*/"), tag("*/")))(input)
}

pub(crate) fn comment(input: &str) -> IonParseResult<'_, &str> {
    alt((line_comment, block_comment))(input)
}

/// Matches any run (possibly empty) of whitespace and comments. This is the token separator
/// used everywhere outside of lobs; lob bodies admit whitespace but not comments.
pub(crate) fn whitespace_or_comments(input: &str) -> IonParseResult<'_, &str> {
    recognize(many0_count(alt((whitespace1, comment))))(input)
}
