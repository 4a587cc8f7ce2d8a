use std::fmt::{Display, Formatter};
use std::io;
use std::io::{BufReader, Read};

use delegate::delegate;

use crate::binary::constants::v1_0::IVM;
use crate::binary::raw_binary_reader::RawBinaryReader;
use crate::catalog::Catalog;
use crate::data_source::ToIonDataSource;
use crate::raw_reader::RawReader;
use crate::raw_symbol_token::RawSymbolToken;
use crate::result::{decoding_error, decoding_error_raw, illegal_operation, IonResult};
use crate::symbol::Symbol;
use crate::symbol_table::SymbolTable;
use crate::system_reader::{SystemReader, SystemStreamItem};
use crate::text::raw_text_reader::RawTextReader;
use crate::types::decimal::Decimal;
use crate::types::integer::Int;
use crate::types::timestamp::Timestamp;
use crate::types::IonType;

/// Configures and constructs new instances of [Reader].
pub struct ReaderBuilder {
    catalog: Option<Box<dyn Catalog>>,
}

impl ReaderBuilder {
    /// Constructs a [ReaderBuilder] pre-populated with common default settings.
    pub fn new() -> ReaderBuilder {
        ReaderBuilder { catalog: None }
    }

    /// Supplies a catalog that the reader will consult when the stream imports shared
    /// symbol tables.
    pub fn with_catalog(mut self, catalog: Box<dyn Catalog>) -> ReaderBuilder {
        self.catalog = Some(catalog);
        self
    }

    /// Applies the specified settings to a new instance of `Reader`. This process involves
    /// reading some data from the beginning of `input` to detect whether its content is
    /// text or binary Ion. If this read operation fails, `build` will return an `Err`
    /// describing the problem it encountered.
    pub fn build<'a, I>(self, input: I) -> IonResult<Reader<'a>>
    where
        I: ToIonDataSource,
        I::DataSource: 'a,
    {
        // Convert the provided input into an implementation of `BufRead`
        let mut input = input.to_ion_data_source();
        // Stack-allocated buffer to hold the first four bytes from input
        let mut header: [u8; 4] = [0u8; 4];

        // Read up to four bytes of input. This has to be done somewhat manually. Convenience
        // functions like `read_exact` will return an error if the input doesn't contain the
        // correct number of bytes, and there are legal Ion streams that have fewer than four
        // bytes in them. (For example, the stream `1 `.)
        let mut total_bytes_read = 0usize;
        while total_bytes_read < IVM.len() {
            let bytes_read = input.read(&mut header[total_bytes_read..])?;
            // If `bytes_read` is zero, we reached the end of the file before we could get
            // all four bytes. That means this isn't a (valid) binary stream. We'll assume
            // it's text.
            if bytes_read == 0 {
                // `header` is a stack-allocated buffer that won't outlive this function
                // call. Only part of it is populated, so make an owned copy of the bytes
                // that can move into the reader.
                let owned_header = Vec::from(&header[..total_bytes_read]);
                // The file was too short to be binary Ion. Construct a text Reader.
                return self.make_text_reader(owned_header, input);
            }
            total_bytes_read += bytes_read;
        }

        // If we've reached this point, we successfully read 4 bytes from the file into
        // `header`. Match against `header` to see if it contains the Ion 1.0 version marker.
        match header {
            [0xE0, 0x01, 0x00, 0xEA] => {
                // Binary Ion v1.0
                self.make_binary_reader(header.to_vec(), input)
            }
            [0xE0, major, minor, 0xEA] => {
                // Binary Ion v{major}.{minor}
                decoding_error(format!(
                    "cannot read Ion v{major}.{minor}; only v1.0 is supported"
                ))
            }
            _ => {
                // It's not binary, assume it's text
                self.make_text_reader(header.to_vec(), input)
            }
        }
    }

    fn make_text_reader<'a, D: 'a + io::BufRead>(
        self,
        header: Vec<u8>,
        input: D,
    ) -> IonResult<Reader<'a>> {
        let full_input = BufReader::new(io::Cursor::new(header).chain(input));
        let raw_reader: Box<dyn RawReader + 'a> = Box::new(RawTextReader::new(full_input));
        Ok(self.wrap_raw_reader(raw_reader))
    }

    fn make_binary_reader<'a, D: 'a + io::BufRead>(
        self,
        header: Vec<u8>,
        input: D,
    ) -> IonResult<Reader<'a>> {
        let full_input = BufReader::new(io::Cursor::new(header).chain(input));
        let raw_reader: Box<dyn RawReader + 'a> = Box::new(RawBinaryReader::new(full_input));
        Ok(self.wrap_raw_reader(raw_reader))
    }

    fn wrap_raw_reader<'a>(self, raw_reader: Box<dyn RawReader + 'a>) -> Reader<'a> {
        match self.catalog {
            Some(catalog) => UserReader::new(SystemReader::with_catalog(raw_reader, catalog)),
            None => UserReader::new(SystemReader::new(raw_reader)),
        }
    }
}

impl Default for ReaderBuilder {
    fn default() -> Self {
        ReaderBuilder::new()
    }
}

/// A Reader that uses dynamic dispatch to abstract over the format (text or binary) being
/// read by an underlying [RawReader].
pub type Reader<'a> = UserReader<Box<dyn RawReader + 'a>>;

/// Stream components that an application-level [Reader] encounters: user values, with all
/// of the stream's encoding artifacts (version markers and symbol tables) already handled.
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum StreamItem {
    /// A non-null Ion value and its corresponding Ion data type.
    Value(IonType),
    /// A null Ion value and its corresponding Ion data type.
    Null(IonType),
    /// Indicates that the reader is not positioned over a value.
    Nothing,
}

impl Display for StreamItem {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        use StreamItem::*;
        match self {
            Value(ion_type) => write!(f, "{ion_type}"),
            Null(ion_type) => write!(f, "null.{ion_type}"),
            Nothing => Ok(()),
        }
    }
}

/// A streaming Ion reader that resolves symbol IDs into their corresponding text.
///
/// UserReader itself is format-agnostic; all format-specific logic is handled by the
/// wrapped [RawReader] implementation.
pub struct UserReader<R: RawReader> {
    system_reader: SystemReader<R>,
}

impl<R: RawReader> UserReader<R> {
    pub(crate) fn new(system_reader: SystemReader<R>) -> UserReader<R> {
        UserReader { system_reader }
    }

    /// Constructs a user-level reader directly over a raw reader, with no catalog.
    pub fn wrapping(raw_reader: R) -> UserReader<R> {
        UserReader::new(SystemReader::new(raw_reader))
    }

    /// The symbol table currently in scope. Advancing the reader past a symbol table
    /// control value or a version marker changes the table's contents.
    pub fn symbol_table(&self) -> &SymbolTable {
        self.system_reader.symbol_table()
    }

    /// Advances the reader to the next user-level value, processing any system-level
    /// constructs (version markers, symbol tables) encountered along the way.
    // v-- Clippy complains that `next` resembles `Iterator::next()`
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> IonResult<StreamItem> {
        use SystemStreamItem::*;
        loop {
            match self.system_reader.next()? {
                VersionMarker(_, _) | SymbolTableValue(_) | SymbolTableNull(_) => {
                    // Encoding artifacts; the user reader moves on to the next stream item
                }
                Value(ion_type) => return Ok(StreamItem::Value(ion_type)),
                Null(ion_type) => return Ok(StreamItem::Null(ion_type)),
                Nothing => return Ok(StreamItem::Nothing),
            }
        }
    }

    fn resolve_token(&self, token: &RawSymbolToken) -> IonResult<Symbol> {
        match token {
            RawSymbolToken::Text(text) => Ok(Symbol::owned(text.as_str())),
            RawSymbolToken::SymbolId(sid) => self
                .symbol_table()
                .symbol_for(*sid)
                .cloned()
                .ok_or_else(|| {
                    decoding_error_raw(format!(
                        "symbol ID ${sid} is beyond the end of the symbol table (max ${})",
                        self.symbol_table().max_id()
                    ))
                }),
        }
    }

    /// If the current value is a field within a struct, returns its resolved field name.
    pub fn field_name(&self) -> IonResult<Symbol> {
        match self.system_reader.field_name() {
            Some(token) => self.resolve_token(token),
            None => illegal_operation("field_name is only defined inside a struct"),
        }
    }

    /// The current value's annotations, resolved against the symbol table.
    pub fn annotations(&self) -> IonResult<Vec<Symbol>> {
        self.system_reader
            .annotations()
            .iter()
            .map(|token| self.resolve_token(token))
            .collect()
    }

    /// Returns true if any of the current value's annotations has the given text.
    pub fn has_annotation(&self, name: &str) -> IonResult<bool> {
        for token in self.system_reader.annotations() {
            if self.resolve_token(token)?.text() == Some(name) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Reads the current value as a symbol, resolving any symbol ID against the symbol
    /// table.
    pub fn read_symbol(&mut self) -> IonResult<Symbol> {
        let token = self.system_reader.read_symbol()?;
        self.resolve_token(&token)
    }

    delegate! {
        to self.system_reader {
            pub fn ion_version(&self) -> (u8, u8);
            pub fn ion_type(&self) -> Option<IonType>;
            pub fn is_null(&self) -> bool;
            pub fn read_null(&mut self) -> IonResult<IonType>;
            pub fn read_bool(&mut self) -> IonResult<bool>;
            pub fn read_i64(&mut self) -> IonResult<i64>;
            pub fn read_int(&mut self) -> IonResult<Int>;
            pub fn read_f32(&mut self) -> IonResult<f32>;
            pub fn read_f64(&mut self) -> IonResult<f64>;
            pub fn read_decimal(&mut self) -> IonResult<Decimal>;
            pub fn read_string(&mut self) -> IonResult<String>;
            pub fn read_blob(&mut self) -> IonResult<Vec<u8>>;
            pub fn read_clob(&mut self) -> IonResult<Vec<u8>>;
            pub fn read_timestamp(&mut self) -> IonResult<Timestamp>;
            pub fn step_in(&mut self) -> IonResult<()>;
            pub fn step_out(&mut self) -> IonResult<()>;
            pub fn parent_type(&self) -> Option<IonType>;
            pub fn depth(&self) -> usize;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::StreamItem::Value;

    const BINARY_EXAMPLE_STREAM: &[u8] = &[
        0xE0, 0x01, 0x00, 0xEA, // Ion 1.0 version marker
        // $ion_symbol_table::{symbols: ["foo", "bar", "baz"]}
        0xEE, // Var len annotations
        0x92, // Annotations + value length: 18 bytes
        0x81, // Annotations length: 1
        0x83, // Annotation 3 ('$ion_symbol_table')
        0xDE, // Var len struct
        0x8E, // Length: 14 bytes
        0x87, // Field ID 7 ('symbols')
        0xBC, // 12-byte list
        0x83, 0x66, 0x6F, 0x6F, // "foo"
        0x83, 0x62, 0x61, 0x72, // "bar"
        0x83, 0x62, 0x61, 0x7A, // "baz"
        // {foo: 1, bar: 2, baz: 3}
        0xD9, // 9-byte struct
        0x8A, // Field ID 10
        0x21, 0x01, // 1
        0x8B, // Field ID 11
        0x21, 0x02, // 2
        0x8C, // Field ID 12
        0x21, 0x03, // 3
    ];

    #[test]
    fn symbols_resolve_through_the_local_table() -> IonResult<()> {
        let mut reader = ReaderBuilder::new().build(BINARY_EXAMPLE_STREAM)?;
        assert_eq!(reader.next()?, Value(IonType::Struct));
        reader.step_in()?;

        assert_eq!(reader.next()?, Value(IonType::Int));
        assert_eq!(reader.field_name()?, "foo");
        assert_eq!(reader.read_i64()?, 1);

        assert_eq!(reader.next()?, Value(IonType::Int));
        assert_eq!(reader.field_name()?, "bar");
        assert_eq!(reader.read_i64()?, 2);

        assert_eq!(reader.next()?, Value(IonType::Int));
        assert_eq!(reader.field_name()?, "baz");
        assert_eq!(reader.read_i64()?, 3);

        assert_eq!(reader.next()?, StreamItem::Nothing);
        reader.step_out()?;
        assert_eq!(reader.next()?, StreamItem::Nothing);
        Ok(())
    }

    #[test]
    fn format_detection_picks_text_for_short_streams() -> IonResult<()> {
        let mut reader = ReaderBuilder::new().build("1 ")?;
        assert_eq!(reader.next()?, Value(IonType::Int));
        assert_eq!(reader.read_i64()?, 1);
        Ok(())
    }

    #[test]
    fn format_detection_picks_text_for_utf8_streams() -> IonResult<()> {
        let mut reader = ReaderBuilder::new().build("{a: [1, 2]} ")?;
        assert_eq!(reader.next()?, Value(IonType::Struct));
        Ok(())
    }

    #[test]
    fn unsupported_binary_versions_are_rejected() {
        let result = ReaderBuilder::new().build(&[0xE0u8, 0x02, 0x00, 0xEA][..]);
        assert!(result.is_err());
    }

    #[test]
    fn text_symbol_ids_resolve_against_stream_tables() -> IonResult<()> {
        let mut reader =
            ReaderBuilder::new().build("$ion_symbol_table::{symbols: [\"foo\"]} $10 ")?;
        assert_eq!(reader.next()?, Value(IonType::Symbol));
        assert_eq!(reader.read_symbol()?, "foo");
        Ok(())
    }

    #[test]
    fn out_of_range_symbol_ids_are_errors() -> IonResult<()> {
        let mut reader = ReaderBuilder::new().build("$99 ")?;
        assert_eq!(reader.next()?, Value(IonType::Symbol));
        assert!(reader.read_symbol().is_err());
        Ok(())
    }

    #[test]
    fn annotations_resolve_to_text() -> IonResult<()> {
        let mut reader = ReaderBuilder::new()
            .build("$ion_symbol_table::{symbols: [\"degrees\"]} $10::30 ")?;
        assert_eq!(reader.next()?, Value(IonType::Int));
        assert!(reader.has_annotation("degrees")?);
        let annotations = reader.annotations()?;
        assert_eq!(annotations.len(), 1);
        assert_eq!(annotations[0], "degrees");
        Ok(())
    }
}
