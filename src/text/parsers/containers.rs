use nom::branch::alt;
use nom::character::streaming::char;
use nom::combinator::value;

use crate::text::parse_result::IonParseResult;
use crate::text::text_value::TextValue;

/// Matches the opening delimiter of a list, s-expression, or struct. Lob openings (`{{`)
/// must be ruled out by the caller before this parser runs.
pub(crate) fn parse_container_start(input: &str) -> IonParseResult<'_, TextValue> {
    alt((
        value(TextValue::ListStart, char('[')),
        value(TextValue::SExpStart, char('(')),
        value(TextValue::StructStart, char('{')),
    ))(input)
}
