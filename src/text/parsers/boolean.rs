use nom::branch::alt;
use nom::bytes::streaming::tag;
use nom::combinator::value;
use nom::sequence::terminated;

use crate::text::parse_result::IonParseResult;
use crate::text::parsers::null::keyword_boundary;
use crate::text::text_value::TextValue;

/// Matches the keywords `true` and `false`.
pub(crate) fn parse_boolean(input: &str) -> IonParseResult<'_, TextValue> {
    terminated(
        alt((
            value(TextValue::Bool(true), tag("true")),
            value(TextValue::Bool(false), tag("false")),
        )),
        keyword_boundary,
    )(input)
}
