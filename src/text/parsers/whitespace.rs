use nom::bytes::streaming::take_while1;

use crate::text::parse_result::IonParseResult;

pub(crate) fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n' | '\x0B' | '\x0C')
}

/// Matches one or more whitespace characters.
pub(crate) fn whitespace1(input: &str) -> IonParseResult<'_, &str> {
    take_while1(is_whitespace)(input)
}
