use nom::bytes::streaming::tag;
use nom::sequence::{preceded, terminated};

use crate::raw_symbol_token::RawSymbolToken;
use crate::text::parse_result::IonParseResult;
use crate::text::parsers::comments::whitespace_or_comments;
use crate::text::parsers::symbol::symbol_token;

/// Matches one annotation: a symbol token followed by `::`. Annotations that arrive as `$N`
/// symbol IDs are resolved against the symbol table at the system level.
pub(crate) fn parse_annotation(input: &str) -> IonParseResult<'_, RawSymbolToken> {
    terminated(symbol_token, preceded(whitespace_or_comments, tag("::")))(input)
}
