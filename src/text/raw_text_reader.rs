use std::io::BufRead;

use nom::character::streaming::char;
use nom::sequence::preceded;

use crate::data_source::ToIonDataSource;
use crate::raw_reader::{RawReader, RawStreamItem};
use crate::raw_symbol_token::RawSymbolToken;
use crate::result::{decoding_error_raw, illegal_operation, IonResult};
use crate::text::parse_result::{fatal_parse_error, IonParseError, IonParseResult};
use crate::text::parsers::comments::whitespace_or_comments;
use crate::text::parsers::string::{long_string, short_string};
use crate::text::parsers::symbol::symbol_token;
use crate::text::parsers::value::{annotated_sexp_value, annotated_value, stream_version_marker};
use crate::text::text_buffer::TextBuffer;
use crate::text::text_value::{AnnotatedTextValue, TextValue};
use crate::types::decimal::Decimal;
use crate::types::integer::Int;
use crate::types::timestamp::Timestamp;
use crate::types::IonType;

// ---------------------------------------------------------------------------------------------
// Parsers for the container-sensitive grammar: what may follow a value depends on where the
// cursor is (datagram, list, s-expression, or struct).
// ---------------------------------------------------------------------------------------------

enum TopLevelItem {
    VersionMarker(u8, u8),
    Value(AnnotatedTextValue),
    EndOfStream,
}

fn top_level_item(input: &str) -> IonParseResult<'_, TopLevelItem> {
    let (rest, _) = whitespace_or_comments(input)?;
    // The NUL sentinel marks the true end of the stream; leave it unconsumed
    if rest.starts_with('\u{0}') {
        return Ok((rest, TopLevelItem::EndOfStream));
    }
    match stream_version_marker(rest) {
        Ok((rest, (major, minor))) => return Ok((rest, TopLevelItem::VersionMarker(major, minor))),
        Err(nom::Err::Incomplete(needed)) => return Err(nom::Err::Incomplete(needed)),
        Err(nom::Err::Failure(error)) => return Err(nom::Err::Failure(error)),
        Err(_) => {}
    }
    let (rest, value) = annotated_value(rest)?;
    Ok((rest, TopLevelItem::Value(value)))
}

fn list_item_first(input: &str) -> IonParseResult<'_, Option<AnnotatedTextValue>> {
    let (rest, _) = whitespace_or_comments(input)?;
    match char::<_, IonParseError>(']')(rest) {
        Ok((rest, _)) => return Ok((rest, None)),
        Err(nom::Err::Incomplete(needed)) => return Err(nom::Err::Incomplete(needed)),
        Err(_) => {}
    }
    let (rest, value) = annotated_value(rest)?;
    Ok((rest, Some(value)))
}

fn list_item_subsequent(input: &str) -> IonParseResult<'_, Option<AnnotatedTextValue>> {
    let (rest, _) = whitespace_or_comments(input)?;
    match char::<_, IonParseError>(']')(rest) {
        Ok((rest, _)) => return Ok((rest, None)),
        Err(nom::Err::Incomplete(needed)) => return Err(nom::Err::Incomplete(needed)),
        Err(_) => {}
    }
    let (rest, _) = match char::<_, IonParseError>(',')(rest) {
        Ok(matched) => matched,
        Err(nom::Err::Incomplete(needed)) => return Err(nom::Err::Incomplete(needed)),
        Err(_) => return fatal_parse_error(input, "expected ',' or ']' after a list value"),
    };
    let (rest, _) = whitespace_or_comments(rest)?;
    // A trailing comma before the closing delimiter is legal
    match char::<_, IonParseError>(']')(rest) {
        Ok((rest, _)) => return Ok((rest, None)),
        Err(nom::Err::Incomplete(needed)) => return Err(nom::Err::Incomplete(needed)),
        Err(_) => {}
    }
    let (rest, value) = annotated_value(rest)?;
    Ok((rest, Some(value)))
}

fn sexp_item(input: &str) -> IonParseResult<'_, Option<AnnotatedTextValue>> {
    let (rest, _) = whitespace_or_comments(input)?;
    match char::<_, IonParseError>(')')(rest) {
        Ok((rest, _)) => return Ok((rest, None)),
        Err(nom::Err::Incomplete(needed)) => return Err(nom::Err::Incomplete(needed)),
        Err(_) => {}
    }
    let (rest, value) = annotated_sexp_value(rest)?;
    Ok((rest, Some(value)))
}

// A field name may be an identifier, a quoted symbol, or a (short or long) string; it is
// followed by a single ':'.
fn field_name(input: &str) -> IonParseResult<'_, RawSymbolToken> {
    let (rest, token) = match long_string(input) {
        Ok((rest, text)) => (rest, RawSymbolToken::Text(text)),
        Err(nom::Err::Incomplete(needed)) => return Err(nom::Err::Incomplete(needed)),
        Err(nom::Err::Failure(error)) => return Err(nom::Err::Failure(error)),
        Err(_) => match short_string(input) {
            Ok((rest, text)) => (rest, RawSymbolToken::Text(text)),
            Err(nom::Err::Incomplete(needed)) => return Err(nom::Err::Incomplete(needed)),
            Err(nom::Err::Failure(error)) => return Err(nom::Err::Failure(error)),
            Err(_) => symbol_token(input)?,
        },
    };
    let (rest, _) = match preceded(whitespace_or_comments, char::<_, IonParseError>(':'))(rest) {
        Ok(matched) => matched,
        Err(nom::Err::Incomplete(needed)) => return Err(nom::Err::Incomplete(needed)),
        Err(_) => return fatal_parse_error(input, "expected ':' after a struct field name"),
    };
    // A second ':' would make this an annotation, which a field name cannot carry
    match char::<_, IonParseError>(':')(rest) {
        Ok(_) => fatal_parse_error(input, "a struct field name cannot be annotated"),
        Err(nom::Err::Incomplete(needed)) => Err(nom::Err::Incomplete(needed)),
        Err(_) => Ok((rest, token)),
    }
}

type StructField = (RawSymbolToken, AnnotatedTextValue);

fn struct_field_first(input: &str) -> IonParseResult<'_, Option<StructField>> {
    let (rest, _) = whitespace_or_comments(input)?;
    match char::<_, IonParseError>('}')(rest) {
        Ok((rest, _)) => return Ok((rest, None)),
        Err(nom::Err::Incomplete(needed)) => return Err(nom::Err::Incomplete(needed)),
        Err(_) => {}
    }
    let (rest, name) = field_name(rest)?;
    let (rest, value) = annotated_value(rest)?;
    Ok((rest, Some((name, value))))
}

fn struct_field_subsequent(input: &str) -> IonParseResult<'_, Option<StructField>> {
    let (rest, _) = whitespace_or_comments(input)?;
    match char::<_, IonParseError>('}')(rest) {
        Ok((rest, _)) => return Ok((rest, None)),
        Err(nom::Err::Incomplete(needed)) => return Err(nom::Err::Incomplete(needed)),
        Err(_) => {}
    }
    let (rest, _) = match char::<_, IonParseError>(',')(rest) {
        Ok(matched) => matched,
        Err(nom::Err::Incomplete(needed)) => return Err(nom::Err::Incomplete(needed)),
        Err(_) => return fatal_parse_error(input, "expected ',' or '}' after a struct field"),
    };
    let (rest, _) = whitespace_or_comments(rest)?;
    match char::<_, IonParseError>('}')(rest) {
        Ok((rest, _)) => return Ok((rest, None)),
        Err(nom::Err::Incomplete(needed)) => return Err(nom::Err::Incomplete(needed)),
        Err(_) => {}
    }
    let (rest, name) = field_name(rest)?;
    let (rest, value) = annotated_value(rest)?;
    Ok((rest, Some((name, value))))
}

// ---------------------------------------------------------------------------------------------
// The reader
// ---------------------------------------------------------------------------------------------

#[derive(Debug)]
struct ParentContainer {
    ion_type: IonType,
    // Whether any value has been parsed at this level (changes the separator grammar)
    has_yielded_value: bool,
    // Whether this container's closing delimiter has been consumed
    is_exhausted: bool,
}

/// A cursor over a text Ion stream. Scalars are decoded eagerly as they are parsed;
/// containers are traversed with [RawReader::step_in]/[RawReader::step_out], and any
/// container the caller skips past is parsed and discarded.
pub struct RawTextReader<R: BufRead> {
    buffer: TextBuffer<R>,
    ion_version: (u8, u8),
    current_item: RawStreamItem,
    current_value: Option<AnnotatedTextValue>,
    current_field_name: Option<RawSymbolToken>,
    value_consumed: bool,
    parents: Vec<ParentContainer>,
    is_eof: bool,
}

impl<R: BufRead> RawTextReader<R> {
    pub fn new<T: ToIonDataSource<DataSource = R>>(input: T) -> RawTextReader<R> {
        RawTextReader {
            buffer: TextBuffer::new(input.to_ion_data_source()),
            ion_version: (1, 0),
            current_item: RawStreamItem::Nothing,
            current_value: None,
            current_field_name: None,
            value_consumed: false,
            parents: Vec::new(),
            is_eof: false,
        }
    }

    /// 1-based line number of the reader's position in the input, for diagnostics.
    pub fn line_number(&self) -> usize {
        self.buffer.line_number()
    }

    fn nothing(&mut self) -> IonResult<RawStreamItem> {
        self.current_value = None;
        self.current_field_name = None;
        self.current_item = RawStreamItem::Nothing;
        Ok(RawStreamItem::Nothing)
    }

    fn set_current_value(
        &mut self,
        value: AnnotatedTextValue,
        field_name: Option<RawSymbolToken>,
    ) -> IonResult<RawStreamItem> {
        let item = RawStreamItem::nullable_value(value.value().ion_type(), value.value().is_null());
        self.current_item = item;
        self.current_value = Some(value);
        self.current_field_name = field_name;
        self.value_consumed = false;
        Ok(item)
    }

    // If the current value is a container that was never stepped into, its contents (and
    // closing delimiter) still sit in the input and must be parsed away.
    fn finish_unread_container(&mut self) -> IonResult<()> {
        let is_unread_container = self
            .current_value
            .as_ref()
            .map(|value| value.value().ion_type().is_container() && !value.value().is_null())
            .unwrap_or(false);
        if is_unread_container {
            self.step_in()?;
            self.step_out()?;
        }
        Ok(())
    }

    fn next_top_level(&mut self) -> IonResult<RawStreamItem> {
        if self.is_eof {
            return self.nothing();
        }
        match self.buffer.parse(top_level_item, "a top-level value")? {
            TopLevelItem::VersionMarker(major, minor) => {
                self.ion_version = (major, minor);
                self.current_value = None;
                self.current_field_name = None;
                self.current_item = RawStreamItem::VersionMarker(major, minor);
                Ok(self.current_item)
            }
            TopLevelItem::EndOfStream => {
                self.is_eof = true;
                self.nothing()
            }
            TopLevelItem::Value(value) => self.set_current_value(value, None),
        }
    }

    fn next_in_container(&mut self) -> IonResult<RawStreamItem> {
        let (ion_type, has_yielded_value, is_exhausted) = {
            let parent = self
                .parents
                .last()
                .expect("next_in_container called at the top level");
            (parent.ion_type, parent.has_yielded_value, parent.is_exhausted)
        };
        if is_exhausted {
            return self.nothing();
        }

        match ion_type {
            IonType::List => {
                let parser: fn(&str) -> IonParseResult<'_, Option<AnnotatedTextValue>> =
                    if has_yielded_value {
                        list_item_subsequent
                    } else {
                        list_item_first
                    };
                let item = self.buffer.parse(parser, "a list")?;
                self.record_sequence_item(item, None)
            }
            IonType::SExp => {
                let item = self.buffer.parse(sexp_item, "an s-expression")?;
                self.record_sequence_item(item, None)
            }
            IonType::Struct => {
                let parser: fn(&str) -> IonParseResult<'_, Option<StructField>> =
                    if has_yielded_value {
                        struct_field_subsequent
                    } else {
                        struct_field_first
                    };
                match self.buffer.parse(parser, "a struct")? {
                    Some((name, value)) => self.record_sequence_item(Some(value), Some(name)),
                    None => self.record_sequence_item(None, None),
                }
            }
            _ => illegal_operation("the parent stack held a non-container type"),
        }
    }

    fn record_sequence_item(
        &mut self,
        item: Option<AnnotatedTextValue>,
        field_name: Option<RawSymbolToken>,
    ) -> IonResult<RawStreamItem> {
        let parent = self
            .parents
            .last_mut()
            .expect("recording a value with no open container");
        match item {
            Some(value) => {
                parent.has_yielded_value = true;
                self.set_current_value(value, field_name)
            }
            None => {
                parent.is_exhausted = true;
                self.nothing()
            }
        }
    }

    // Confirms that the cursor rests on an unconsumed, non-null value of the expected type
    // and clones the value out for decoding.
    fn value_expected(&mut self, ion_type: IonType, operation: &str) -> IonResult<TextValue> {
        let value = match &self.current_value {
            Some(value) => value.value(),
            None => {
                return illegal_operation(format!(
                    "{operation} called when the reader was not positioned on a value"
                ))
            }
        };
        if value.ion_type() != ion_type {
            return illegal_operation(format!(
                "{operation} called when the current value is a(n) {}",
                value.ion_type()
            ));
        }
        if value.is_null() {
            return illegal_operation(format!("{operation} called on a null value"));
        }
        if self.value_consumed {
            return illegal_operation(format!(
                "{operation} called on a value that was already consumed"
            ));
        }
        self.value_consumed = true;
        Ok(value.clone())
    }
}

impl<R: BufRead> RawReader for RawTextReader<R> {
    fn ion_version(&self) -> (u8, u8) {
        self.ion_version
    }

    fn next(&mut self) -> IonResult<RawStreamItem> {
        self.finish_unread_container()?;
        self.current_value = None;
        self.current_field_name = None;
        self.value_consumed = false;
        if self.parents.is_empty() {
            self.next_top_level()
        } else {
            self.next_in_container()
        }
    }

    fn current(&self) -> RawStreamItem {
        self.current_item
    }

    fn ion_type(&self) -> Option<IonType> {
        self.current_value
            .as_ref()
            .map(|value| value.value().ion_type())
    }

    fn is_null(&self) -> bool {
        self.current_value
            .as_ref()
            .map(|value| value.value().is_null())
            .unwrap_or(false)
    }

    fn annotations(&self) -> &[RawSymbolToken] {
        self.current_value
            .as_ref()
            .map(|value| value.annotations())
            .unwrap_or(&[])
    }

    fn field_name(&self) -> Option<&RawSymbolToken> {
        self.current_field_name.as_ref()
    }

    fn read_null(&mut self) -> IonResult<IonType> {
        match self.current_value.as_ref().map(|value| value.value()) {
            Some(TextValue::Null(ion_type)) => Ok(*ion_type),
            Some(_) => illegal_operation("read_null called on a non-null value"),
            None => {
                illegal_operation("read_null called when the reader was not positioned on a value")
            }
        }
    }

    fn read_bool(&mut self) -> IonResult<bool> {
        match self.value_expected(IonType::Bool, "read_bool")? {
            TextValue::Bool(value) => Ok(value),
            _ => unreachable!("value_expected checked the type"),
        }
    }

    fn read_i64(&mut self) -> IonResult<i64> {
        let value = self.read_int()?;
        value
            .as_i64()
            .ok_or_else(|| decoding_error_raw(format!("integer {value} is too large for an i64")))
    }

    fn read_int(&mut self) -> IonResult<Int> {
        match self.value_expected(IonType::Int, "read_int")? {
            TextValue::Int(value) => Ok(value),
            _ => unreachable!("value_expected checked the type"),
        }
    }

    fn read_f32(&mut self) -> IonResult<f32> {
        Ok(self.read_f64()? as f32)
    }

    fn read_f64(&mut self) -> IonResult<f64> {
        match self.value_expected(IonType::Float, "read_f64")? {
            TextValue::Float(value) => Ok(value),
            _ => unreachable!("value_expected checked the type"),
        }
    }

    fn read_decimal(&mut self) -> IonResult<Decimal> {
        match self.value_expected(IonType::Decimal, "read_decimal")? {
            TextValue::Decimal(value) => Ok(value),
            _ => unreachable!("value_expected checked the type"),
        }
    }

    fn read_string(&mut self) -> IonResult<String> {
        match self.value_expected(IonType::String, "read_string")? {
            TextValue::String(value) => Ok(value),
            _ => unreachable!("value_expected checked the type"),
        }
    }

    fn read_symbol(&mut self) -> IonResult<RawSymbolToken> {
        match self.value_expected(IonType::Symbol, "read_symbol")? {
            TextValue::Symbol(value) => Ok(value),
            _ => unreachable!("value_expected checked the type"),
        }
    }

    fn read_blob(&mut self) -> IonResult<Vec<u8>> {
        match self.value_expected(IonType::Blob, "read_blob")? {
            TextValue::Blob(value) => Ok(value),
            _ => unreachable!("value_expected checked the type"),
        }
    }

    fn read_clob(&mut self) -> IonResult<Vec<u8>> {
        match self.value_expected(IonType::Clob, "read_clob")? {
            TextValue::Clob(value) => Ok(value),
            _ => unreachable!("value_expected checked the type"),
        }
    }

    fn read_timestamp(&mut self) -> IonResult<Timestamp> {
        match self.value_expected(IonType::Timestamp, "read_timestamp")? {
            TextValue::Timestamp(value) => Ok(value),
            _ => unreachable!("value_expected checked the type"),
        }
    }

    fn step_in(&mut self) -> IonResult<()> {
        let value = match &self.current_value {
            Some(value) => value.value(),
            None => {
                return illegal_operation(
                    "step_in called when the reader was not positioned on a value",
                )
            }
        };
        if !value.ion_type().is_container() {
            return illegal_operation(format!("cannot step into a(n) {}", value.ion_type()));
        }
        if value.is_null() {
            return illegal_operation("cannot step into a null container");
        }
        self.parents.push(ParentContainer {
            ion_type: value.ion_type(),
            has_yielded_value: false,
            is_exhausted: false,
        });
        self.current_value = None;
        self.current_field_name = None;
        self.current_item = RawStreamItem::Nothing;
        Ok(())
    }

    fn step_out(&mut self) -> IonResult<()> {
        if self.parents.is_empty() {
            return illegal_operation("cannot step out of the top level");
        }
        // Consume any remaining children (and the closing delimiter)
        while !self
            .parents
            .last()
            .expect("parent stack emptied mid-step_out")
            .is_exhausted
        {
            self.next()?;
        }
        self.parents.pop();
        self.current_value = None;
        self.current_field_name = None;
        self.current_item = RawStreamItem::Nothing;
        Ok(())
    }

    fn parent_type(&self) -> Option<IonType> {
        self.parents.last().map(|parent| parent.ion_type)
    }

    fn depth(&self) -> usize {
        self.parents.len()
    }
}
