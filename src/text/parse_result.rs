use std::fmt::Display;

use nom::error::{ErrorKind, FromExternalError, ParseError};
use nom::IResult;

/// The result type shared by all of the crate's text parsers: standard `nom` plumbing with a
/// crate-specific error type that can carry a human-readable description of the problem.
pub(crate) type IonParseResult<'a, O> = IResult<&'a str, O, IonParseError<'a>>;

#[derive(Debug, PartialEq)]
pub(crate) struct IonParseError<'a> {
    input: &'a str,
    description: Option<String>,
}

impl<'a> IonParseError<'a> {
    pub fn new(input: &'a str) -> Self {
        IonParseError {
            input,
            description: None,
        }
    }

    pub fn with_description<D: Display>(mut self, description: D) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

impl<'a> ParseError<&'a str> for IonParseError<'a> {
    fn from_error_kind(input: &'a str, _kind: ErrorKind) -> Self {
        IonParseError::new(input)
    }

    fn append(_input: &'a str, _kind: ErrorKind, other: Self) -> Self {
        // Descriptions written by inner parsers are more specific; keep them
        other
    }
}

impl<'a, E: Display> FromExternalError<&'a str, E> for IonParseError<'a> {
    fn from_external_error(input: &'a str, _kind: ErrorKind, error: E) -> Self {
        IonParseError::new(input).with_description(error)
    }
}

/// Returns a fatal (`nom::Err::Failure`) parse error that aborts the surrounding `alt`
/// instead of letting another branch retry. Used once the input is unambiguously a given
/// token type but its content is malformed.
pub(crate) fn fatal_parse_error<O, D: Display>(input: &str, description: D) -> IonParseResult<'_, O> {
    Err(nom::Err::Failure(
        IonParseError::new(input).with_description(description),
    ))
}
