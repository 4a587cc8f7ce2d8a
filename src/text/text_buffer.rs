use std::io;
use std::io::BufRead;

use crate::result::{decoding_error, incomplete_data_error, IonResult};
use crate::text::parse_result::IonParseResult;

// Consumed text is compacted away once it crosses this threshold.
const COMPACTION_THRESHOLD: usize = 8192;

// The outcome of applying a parser to the currently buffered text.
enum ParseStep<O> {
    Matched(usize, O),
    NeedsMoreData,
    Failed(Option<String>),
}

/// A line-buffered character source for the text parsers.
///
/// Parsers run against the unconsumed tail of the buffer. When a parser reports
/// `Incomplete` — it reached the end of the buffered text while a token was still in
/// progress — the buffer loads another line from the data source and the parse is retried.
/// When the data source itself is exhausted, a single `"\n\u{0}"` sentinel is appended: the
/// newline terminates any token that was waiting for a stop character, and the NUL (a byte
/// that can never appear in valid Ion text) gives lookahead-driven parsers a definitive
/// "nothing follows" answer instead of an endless `Incomplete`.
pub(crate) struct TextBuffer<R: BufRead> {
    source: R,
    text: String,
    consumed: usize,
    line_number: usize,
    column: usize,
    sentinel_appended: bool,
}

impl<R: BufRead> TextBuffer<R> {
    pub fn new(source: R) -> TextBuffer<R> {
        TextBuffer {
            source,
            text: String::new(),
            consumed: 0,
            line_number: 1,
            column: 0,
            sentinel_appended: false,
        }
    }

    /// 1-based line number of the current parse position.
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// 0-based column of the current parse position.
    pub fn column(&self) -> usize {
        self.column
    }

    /// Applies `parser` to the unconsumed text, loading more input as needed, and advances
    /// past whatever the parser matched. `label` names the construct being read for error
    /// messages.
    pub fn parse<O, P>(&mut self, mut parser: P, label: &'static str) -> IonResult<O>
    where
        P: for<'a> FnMut(&'a str) -> IonParseResult<'a, O>,
    {
        loop {
            let step = {
                let remaining = &self.text[self.consumed..];
                match parser(remaining) {
                    Ok((rest, output)) => {
                        ParseStep::Matched(remaining.len() - rest.len(), output)
                    }
                    Err(nom::Err::Incomplete(_)) => ParseStep::NeedsMoreData,
                    Err(nom::Err::Error(error)) | Err(nom::Err::Failure(error)) => {
                        ParseStep::Failed(error.description().map(str::to_string))
                    }
                }
            };
            match step {
                ParseStep::Matched(length, output) => {
                    self.advance(length);
                    return Ok(output);
                }
                ParseStep::NeedsMoreData => {
                    if self.load_additional_input()? == 0 {
                        return incomplete_data_error(label, self.line_number);
                    }
                }
                ParseStep::Failed(description) => {
                    let description = description
                        .unwrap_or_else(|| format!("invalid syntax while reading {label}"));
                    return decoding_error(format!(
                        "{description} (line {}, column {})",
                        self.line_number, self.column
                    ));
                }
            }
        }
    }

    fn advance(&mut self, length: usize) {
        for c in self.text[self.consumed..self.consumed + length].chars() {
            if c == '\n' {
                self.line_number += 1;
                self.column = 0;
            } else {
                self.column += 1;
            }
        }
        self.consumed += length;
        if self.consumed > COMPACTION_THRESHOLD {
            self.text.drain(..self.consumed);
            self.consumed = 0;
        }
    }

    // Appends the next line of input to the buffer, returning the number of bytes gained.
    // At end of input, the sentinel is appended exactly once; after that, 0 is returned.
    fn load_additional_input(&mut self) -> IonResult<usize> {
        match self.source.read_line(&mut self.text) {
            Ok(0) => {
                if self.sentinel_appended {
                    Ok(0)
                } else {
                    self.sentinel_appended = true;
                    self.text.push_str("\n\u{0}");
                    Ok(2)
                }
            }
            Ok(bytes_loaded) => Ok(bytes_loaded),
            Err(error) if error.kind() == io::ErrorKind::InvalidData => {
                decoding_error("the input stream was not valid UTF-8")
            }
            Err(error) => Err(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nom::bytes::streaming::{tag, take_while1};
    use nom::combinator::map;
    use nom::sequence::terminated;

    // Parsers handed to TextBuffer::parse return owned values; the buffered text they
    // borrowed may be reallocated by the next load.
    fn digits(input: &str) -> IonParseResult<'_, String> {
        map(
            terminated(take_while1(|c: char| c.is_ascii_digit()), tag("\n")),
            str::to_string,
        )(input)
    }

    #[test]
    fn parses_across_line_loads() -> IonResult<()> {
        let mut buffer = TextBuffer::new(io::Cursor::new("12345\nabc\n"));
        let matched = buffer.parse(digits, "digits")?;
        assert_eq!(matched, "12345");
        assert_eq!(buffer.line_number(), 2);
        Ok(())
    }

    #[test]
    fn sentinel_terminates_trailing_tokens() -> IonResult<()> {
        // No trailing newline in the input; the sentinel provides one
        let mut buffer = TextBuffer::new(io::Cursor::new("777"));
        let matched = buffer.parse(digits, "digits")?;
        assert_eq!(matched, "777");
        Ok(())
    }

    #[test]
    fn exhausted_input_is_an_incomplete_error() {
        let mut buffer = TextBuffer::new(io::Cursor::new(""));
        // take_while1 can never match the sentinel-only stream
        assert!(buffer.parse(digits, "digits").is_err());
    }

    #[test]
    fn reports_line_and_column_in_errors() {
        let mut buffer = TextBuffer::new(io::Cursor::new("12\nxy\n"));
        buffer.parse(digits, "digits").unwrap();
        let error = buffer.parse(digits, "digits").unwrap_err();
        let message = error.to_string();
        assert!(message.contains("line 2"), "unexpected message: {message}");
    }
}
