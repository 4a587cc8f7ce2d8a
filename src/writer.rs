use std::io::Write;

use crate::binary::raw_binary_writer::RawBinaryWriter;
use crate::constants::v1_0::system_symbol_ids;
use crate::raw_symbol_token::RawSymbolToken;
use crate::result::IonResult;
use crate::shared_symbol_table::SharedSymbolTable;
use crate::symbol_table::{SymbolTable, TableImport};
use crate::text::raw_text_writer::{RawTextWriter, RawTextWriterBuilder};
use crate::types::decimal::Decimal;
use crate::types::integer::Int;
use crate::types::timestamp::Timestamp;
use crate::types::IonType;

/// The functionality required to serialize a stream of Ion values, independent of the
/// encoding being produced. Field names and annotations are set ahead of a value and
/// consumed by the next `write_*` call; containers are delimited with
/// [IonWriter::step_in]/[IonWriter::step_out].
pub trait IonWriter {
    type Output;

    /// The (major, minor) Ion version this writer emits.
    fn ion_version(&self) -> (u8, u8);

    /// Sets the field name for the next value written. Only meaningful between values when
    /// the writer is positioned inside a struct.
    fn set_field_name<A: Into<RawSymbolToken>>(&mut self, name: A);

    /// Sets the annotations that will adorn the next value written.
    fn set_annotations<I>(&mut self, annotations: I)
    where
        I: IntoIterator,
        I::Item: Into<RawSymbolToken>;

    fn write_null(&mut self, ion_type: IonType) -> IonResult<()>;
    fn write_bool(&mut self, value: bool) -> IonResult<()>;
    fn write_i64(&mut self, value: i64) -> IonResult<()>;
    fn write_int(&mut self, value: &Int) -> IonResult<()>;
    fn write_f32(&mut self, value: f32) -> IonResult<()>;
    fn write_f64(&mut self, value: f64) -> IonResult<()>;
    fn write_decimal(&mut self, value: &Decimal) -> IonResult<()>;
    fn write_timestamp(&mut self, value: &Timestamp) -> IonResult<()>;
    fn write_symbol<A: Into<RawSymbolToken>>(&mut self, value: A) -> IonResult<()>;
    fn write_string<S: AsRef<str>>(&mut self, value: S) -> IonResult<()>;
    fn write_clob<B: AsRef<[u8]>>(&mut self, value: B) -> IonResult<()>;
    fn write_blob<B: AsRef<[u8]>>(&mut self, value: B) -> IonResult<()>;

    fn step_in(&mut self, container_type: IonType) -> IonResult<()>;
    fn step_out(&mut self) -> IonResult<()>;
    fn parent_type(&self) -> Option<IonType>;
    fn depth(&self) -> usize;

    /// Writes any buffered data (preceded, where required, by the encoding constructs that
    /// data depends on) to the output sink. The stream remains open.
    fn flush(&mut self) -> IonResult<()>;

    /// Flushes and seals the current stream. A writer may continue to be used afterwards;
    /// subsequent values belong to a fresh stream with a fresh symbol table.
    fn finish(&mut self) -> IonResult<()>;

    fn output(&self) -> &Self::Output;
    fn output_mut(&mut self) -> &mut Self::Output;
}

// Installs the configured shared imports into a fresh local table.
fn install_imports(symbol_table: &mut SymbolTable, imports: &[SharedSymbolTable]) {
    for shared in imports {
        for symbol in shared.symbols() {
            symbol_table.add_symbol(symbol.clone());
        }
        symbol_table.record_import(TableImport::new(
            shared.name(),
            shared.version(),
            shared.len(),
        ));
    }
}

/// An application-level binary writer: resolves symbol text to symbol IDs, growing a local
/// symbol table as new text appears, and emits that table ahead of the values that depend
/// on it whenever the stream is flushed.
pub struct BinaryWriter<W: Write> {
    raw_writer: RawBinaryWriter<W>,
    symbol_table: SymbolTable,
    imports: Vec<SharedSymbolTable>,
    // Table length already covered by an emitted symbol table
    symbols_flushed: usize,
    // Whether the current stream segment has emitted any symbol table yet
    table_emitted: bool,
}

impl<W: Write> BinaryWriter<W> {
    pub fn new(sink: W) -> BinaryWriter<W> {
        BinaryWriter::with_imports(sink, Vec::new())
    }

    /// Creates a writer whose local symbol table begins with the given shared imports. The
    /// emitted symbol table will reference the imports by (name, version, max_id).
    pub fn with_imports(sink: W, imports: Vec<SharedSymbolTable>) -> BinaryWriter<W> {
        let mut symbol_table = SymbolTable::new();
        install_imports(&mut symbol_table, &imports);
        let symbols_flushed = symbol_table.len();
        BinaryWriter {
            raw_writer: RawBinaryWriter::new(sink),
            symbol_table,
            imports,
            symbols_flushed,
            table_emitted: false,
        }
    }

    pub fn symbol_table(&self) -> &SymbolTable {
        &self.symbol_table
    }

    fn resolve(&mut self, token: RawSymbolToken) -> usize {
        match token {
            RawSymbolToken::SymbolId(sid) => sid,
            RawSymbolToken::Text(text) => self.symbol_table.intern(text),
        }
    }

    // Encodes the symbol table control value that must precede the buffered user values:
    // either a fresh table (imports plus all local symbols) or an append to the table the
    // stream has already seen.
    fn encode_symbol_table(&mut self) -> IonResult<Vec<u8>> {
        let mut scratch = RawBinaryWriter::new(Vec::new());
        scratch.omit_version_marker();
        scratch.set_annotation_ids([system_symbol_ids::ION_SYMBOL_TABLE]);
        scratch.step_in(IonType::Struct)?;

        if self.table_emitted {
            scratch.set_field_id(system_symbol_ids::IMPORTS);
            scratch.write_symbol_id(system_symbol_ids::ION_SYMBOL_TABLE)?;
        } else if !self.symbol_table.imports().is_empty() {
            scratch.set_field_id(system_symbol_ids::IMPORTS);
            scratch.step_in(IonType::List)?;
            for import in self.symbol_table.imports() {
                scratch.step_in(IonType::Struct)?;
                scratch.set_field_id(system_symbol_ids::NAME);
                scratch.write_string(import.name())?;
                scratch.set_field_id(system_symbol_ids::VERSION);
                scratch.write_i64(import.version() as i64)?;
                scratch.set_field_id(system_symbol_ids::MAX_ID);
                scratch.write_i64(import.max_id() as i64)?;
                scratch.step_out()?;
            }
            scratch.step_out()?;
        }

        let new_symbols = self.symbol_table.symbols_tail(self.symbols_flushed);
        if !new_symbols.is_empty() {
            scratch.set_field_id(system_symbol_ids::SYMBOLS);
            scratch.step_in(IonType::List)?;
            for symbol in new_symbols {
                match symbol.text() {
                    Some(text) => scratch.write_string(text)?,
                    None => scratch.write_null(IonType::Null)?,
                }
            }
            scratch.step_out()?;
        }

        scratch.step_out()?;
        scratch.flush()?;
        Ok(scratch.into_output())
    }
}

impl<W: Write> IonWriter for BinaryWriter<W> {
    type Output = W;

    fn ion_version(&self) -> (u8, u8) {
        (1, 0)
    }

    fn set_field_name<A: Into<RawSymbolToken>>(&mut self, name: A) {
        let sid = self.resolve(name.into());
        self.raw_writer.set_field_id(sid);
    }

    fn set_annotations<I>(&mut self, annotations: I)
    where
        I: IntoIterator,
        I::Item: Into<RawSymbolToken>,
    {
        let sids: Vec<usize> = annotations
            .into_iter()
            .map(|annotation| self.resolve(annotation.into()))
            .collect();
        self.raw_writer.set_annotation_ids(sids);
    }

    fn write_null(&mut self, ion_type: IonType) -> IonResult<()> {
        self.raw_writer.write_null(ion_type)
    }

    fn write_bool(&mut self, value: bool) -> IonResult<()> {
        self.raw_writer.write_bool(value)
    }

    fn write_i64(&mut self, value: i64) -> IonResult<()> {
        self.raw_writer.write_i64(value)
    }

    fn write_int(&mut self, value: &Int) -> IonResult<()> {
        self.raw_writer.write_int(value)
    }

    fn write_f32(&mut self, value: f32) -> IonResult<()> {
        self.raw_writer.write_f32(value)
    }

    fn write_f64(&mut self, value: f64) -> IonResult<()> {
        self.raw_writer.write_f64(value)
    }

    fn write_decimal(&mut self, value: &Decimal) -> IonResult<()> {
        self.raw_writer.write_decimal(value)
    }

    fn write_timestamp(&mut self, value: &Timestamp) -> IonResult<()> {
        self.raw_writer.write_timestamp(value)
    }

    fn write_symbol<A: Into<RawSymbolToken>>(&mut self, value: A) -> IonResult<()> {
        let sid = self.resolve(value.into());
        self.raw_writer.write_symbol_id(sid)
    }

    fn write_string<S: AsRef<str>>(&mut self, value: S) -> IonResult<()> {
        self.raw_writer.write_string(value)
    }

    fn write_clob<B: AsRef<[u8]>>(&mut self, value: B) -> IonResult<()> {
        self.raw_writer.write_clob(value)
    }

    fn write_blob<B: AsRef<[u8]>>(&mut self, value: B) -> IonResult<()> {
        self.raw_writer.write_blob(value)
    }

    fn step_in(&mut self, container_type: IonType) -> IonResult<()> {
        self.raw_writer.step_in(container_type)
    }

    fn step_out(&mut self) -> IonResult<()> {
        self.raw_writer.step_out()
    }

    fn parent_type(&self) -> Option<IonType> {
        self.raw_writer.parent_type()
    }

    fn depth(&self) -> usize {
        self.raw_writer.depth()
    }

    fn flush(&mut self) -> IonResult<()> {
        let new_symbol_count = self.symbol_table.len() - self.symbols_flushed;
        let needs_table = new_symbol_count > 0
            || (!self.table_emitted && !self.symbol_table.imports().is_empty());
        let preamble = if needs_table {
            self.encode_symbol_table()?
        } else {
            Vec::new()
        };
        self.raw_writer.flush_with_preamble(&preamble)?;
        self.symbols_flushed = self.symbol_table.len();
        if needs_table {
            self.table_emitted = true;
        }
        Ok(())
    }

    fn finish(&mut self) -> IonResult<()> {
        self.flush()?;
        self.raw_writer.finish()?;
        // The next stream starts over: fresh table, but the configured imports persist
        self.symbol_table.reset();
        install_imports(&mut self.symbol_table, &self.imports);
        self.symbols_flushed = self.symbol_table.len();
        self.table_emitted = false;
        Ok(())
    }

    fn output(&self) -> &W {
        self.raw_writer.output()
    }

    fn output_mut(&mut self) -> &mut W {
        self.raw_writer.output_mut()
    }
}

/// An application-level text writer. Symbol text is written inline, so no local symbols
/// ever need to be declared; a symbol table control value is only emitted when the writer
/// was configured with shared imports, so that symbol IDs referencing those imports can be
/// resolved by readers.
pub struct TextWriter<W: Write> {
    raw_writer: RawTextWriter<W>,
    imports: Vec<SharedSymbolTable>,
    stream_prefix_written: bool,
}

impl<W: Write> TextWriter<W> {
    pub fn new(raw_writer: RawTextWriter<W>) -> TextWriter<W> {
        TextWriter::with_imports(raw_writer, Vec::new())
    }

    pub fn with_imports(
        raw_writer: RawTextWriter<W>,
        imports: Vec<SharedSymbolTable>,
    ) -> TextWriter<W> {
        TextWriter {
            raw_writer,
            imports,
            stream_prefix_written: false,
        }
    }

    // Emits the version marker and import declarations ahead of the stream's first value.
    fn ensure_stream_prefix(&mut self) -> IonResult<()> {
        if self.stream_prefix_written {
            return Ok(());
        }
        self.stream_prefix_written = true;
        if self.imports.is_empty() {
            return Ok(());
        }
        self.raw_writer.write_ion_version_marker()?;
        self.raw_writer
            .set_annotations([RawSymbolToken::SymbolId(system_symbol_ids::ION_SYMBOL_TABLE)]);
        self.raw_writer.step_in(IonType::Struct)?;
        self.raw_writer.set_field_name("imports");
        self.raw_writer.step_in(IonType::List)?;
        for import in &self.imports {
            self.raw_writer.step_in(IonType::Struct)?;
            self.raw_writer.set_field_name("name");
            self.raw_writer.write_string(import.name())?;
            self.raw_writer.set_field_name("version");
            self.raw_writer.write_i64(import.version() as i64)?;
            self.raw_writer.set_field_name("max_id");
            self.raw_writer.write_i64(import.len() as i64)?;
            self.raw_writer.step_out()?;
        }
        self.raw_writer.step_out()?;
        self.raw_writer.step_out()?;
        Ok(())
    }
}

impl<W: Write> IonWriter for TextWriter<W> {
    type Output = W;

    fn ion_version(&self) -> (u8, u8) {
        (1, 0)
    }

    fn set_field_name<A: Into<RawSymbolToken>>(&mut self, name: A) {
        self.raw_writer.set_field_name(name);
    }

    fn set_annotations<I>(&mut self, annotations: I)
    where
        I: IntoIterator,
        I::Item: Into<RawSymbolToken>,
    {
        self.raw_writer.set_annotations(annotations);
    }

    fn write_null(&mut self, ion_type: IonType) -> IonResult<()> {
        self.ensure_stream_prefix()?;
        self.raw_writer.write_null(ion_type)
    }

    fn write_bool(&mut self, value: bool) -> IonResult<()> {
        self.ensure_stream_prefix()?;
        self.raw_writer.write_bool(value)
    }

    fn write_i64(&mut self, value: i64) -> IonResult<()> {
        self.ensure_stream_prefix()?;
        self.raw_writer.write_i64(value)
    }

    fn write_int(&mut self, value: &Int) -> IonResult<()> {
        self.ensure_stream_prefix()?;
        self.raw_writer.write_int(value)
    }

    fn write_f32(&mut self, value: f32) -> IonResult<()> {
        self.ensure_stream_prefix()?;
        self.raw_writer.write_f32(value)
    }

    fn write_f64(&mut self, value: f64) -> IonResult<()> {
        self.ensure_stream_prefix()?;
        self.raw_writer.write_f64(value)
    }

    fn write_decimal(&mut self, value: &Decimal) -> IonResult<()> {
        self.ensure_stream_prefix()?;
        self.raw_writer.write_decimal(value)
    }

    fn write_timestamp(&mut self, value: &Timestamp) -> IonResult<()> {
        self.ensure_stream_prefix()?;
        self.raw_writer.write_timestamp(value)
    }

    fn write_symbol<A: Into<RawSymbolToken>>(&mut self, value: A) -> IonResult<()> {
        self.ensure_stream_prefix()?;
        self.raw_writer.write_symbol(value)
    }

    fn write_string<S: AsRef<str>>(&mut self, value: S) -> IonResult<()> {
        self.ensure_stream_prefix()?;
        self.raw_writer.write_string(value)
    }

    fn write_clob<B: AsRef<[u8]>>(&mut self, value: B) -> IonResult<()> {
        self.ensure_stream_prefix()?;
        self.raw_writer.write_clob(value)
    }

    fn write_blob<B: AsRef<[u8]>>(&mut self, value: B) -> IonResult<()> {
        self.ensure_stream_prefix()?;
        self.raw_writer.write_blob(value)
    }

    fn step_in(&mut self, container_type: IonType) -> IonResult<()> {
        self.ensure_stream_prefix()?;
        self.raw_writer.step_in(container_type)
    }

    fn step_out(&mut self) -> IonResult<()> {
        self.raw_writer.step_out()
    }

    fn parent_type(&self) -> Option<IonType> {
        self.raw_writer.parent_type()
    }

    fn depth(&self) -> usize {
        self.raw_writer.depth()
    }

    fn flush(&mut self) -> IonResult<()> {
        self.raw_writer.flush()
    }

    fn finish(&mut self) -> IonResult<()> {
        self.raw_writer.flush()?;
        self.stream_prefix_written = false;
        Ok(())
    }

    fn output(&self) -> &W {
        self.raw_writer.output()
    }

    fn output_mut(&mut self) -> &mut W {
        self.raw_writer.output_mut()
    }
}

/// The flavor of text output a [WriterBuilder] produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextKind {
    Compact,
    Pretty,
    Json,
}

/// The serialization format a [WriterBuilder] produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Binary,
    Text(TextKind),
}

/// Configures and constructs [Writer] instances.
pub struct WriterBuilder {
    format: Format,
    imports: Vec<SharedSymbolTable>,
}

impl WriterBuilder {
    pub fn new(format: Format) -> WriterBuilder {
        WriterBuilder {
            format,
            imports: Vec::new(),
        }
    }

    pub fn binary() -> WriterBuilder {
        WriterBuilder::new(Format::Binary)
    }

    pub fn text() -> WriterBuilder {
        WriterBuilder::new(Format::Text(TextKind::Compact))
    }

    pub fn pretty() -> WriterBuilder {
        WriterBuilder::new(Format::Text(TextKind::Pretty))
    }

    /// Shared tables whose symbols should be available (and declared) in the output stream.
    pub fn with_shared_imports(mut self, imports: Vec<SharedSymbolTable>) -> WriterBuilder {
        self.imports = imports;
        self
    }

    pub fn build<W: Write>(self, sink: W) -> IonResult<Writer<W>> {
        let writer = match self.format {
            Format::Binary => Writer::Binary(BinaryWriter::with_imports(sink, self.imports)),
            Format::Text(kind) => {
                let raw_builder = match kind {
                    TextKind::Compact => RawTextWriterBuilder::new(),
                    TextKind::Pretty => RawTextWriterBuilder::pretty(),
                    TextKind::Json => RawTextWriterBuilder::json(),
                };
                Writer::Text(TextWriter::with_imports(
                    raw_builder.build(sink)?,
                    self.imports,
                ))
            }
        };
        Ok(writer)
    }
}

/// A writer over either encoding, selected at construction time by a [WriterBuilder].
pub enum Writer<W: Write> {
    Binary(BinaryWriter<W>),
    Text(TextWriter<W>),
}

impl<W: Write> IonWriter for Writer<W> {
    type Output = W;

    fn ion_version(&self) -> (u8, u8) {
        match self {
            Writer::Binary(writer) => writer.ion_version(),
            Writer::Text(writer) => writer.ion_version(),
        }
    }

    fn set_field_name<A: Into<RawSymbolToken>>(&mut self, name: A) {
        match self {
            Writer::Binary(writer) => writer.set_field_name(name),
            Writer::Text(writer) => writer.set_field_name(name),
        }
    }

    fn set_annotations<I>(&mut self, annotations: I)
    where
        I: IntoIterator,
        I::Item: Into<RawSymbolToken>,
    {
        match self {
            Writer::Binary(writer) => writer.set_annotations(annotations),
            Writer::Text(writer) => writer.set_annotations(annotations),
        }
    }

    fn write_null(&mut self, ion_type: IonType) -> IonResult<()> {
        match self {
            Writer::Binary(writer) => writer.write_null(ion_type),
            Writer::Text(writer) => writer.write_null(ion_type),
        }
    }

    fn write_bool(&mut self, value: bool) -> IonResult<()> {
        match self {
            Writer::Binary(writer) => writer.write_bool(value),
            Writer::Text(writer) => writer.write_bool(value),
        }
    }

    fn write_i64(&mut self, value: i64) -> IonResult<()> {
        match self {
            Writer::Binary(writer) => writer.write_i64(value),
            Writer::Text(writer) => writer.write_i64(value),
        }
    }

    fn write_int(&mut self, value: &Int) -> IonResult<()> {
        match self {
            Writer::Binary(writer) => writer.write_int(value),
            Writer::Text(writer) => writer.write_int(value),
        }
    }

    fn write_f32(&mut self, value: f32) -> IonResult<()> {
        match self {
            Writer::Binary(writer) => writer.write_f32(value),
            Writer::Text(writer) => writer.write_f32(value),
        }
    }

    fn write_f64(&mut self, value: f64) -> IonResult<()> {
        match self {
            Writer::Binary(writer) => writer.write_f64(value),
            Writer::Text(writer) => writer.write_f64(value),
        }
    }

    fn write_decimal(&mut self, value: &Decimal) -> IonResult<()> {
        match self {
            Writer::Binary(writer) => writer.write_decimal(value),
            Writer::Text(writer) => writer.write_decimal(value),
        }
    }

    fn write_timestamp(&mut self, value: &Timestamp) -> IonResult<()> {
        match self {
            Writer::Binary(writer) => writer.write_timestamp(value),
            Writer::Text(writer) => writer.write_timestamp(value),
        }
    }

    fn write_symbol<A: Into<RawSymbolToken>>(&mut self, value: A) -> IonResult<()> {
        match self {
            Writer::Binary(writer) => writer.write_symbol(value),
            Writer::Text(writer) => writer.write_symbol(value),
        }
    }

    fn write_string<S: AsRef<str>>(&mut self, value: S) -> IonResult<()> {
        match self {
            Writer::Binary(writer) => writer.write_string(value),
            Writer::Text(writer) => writer.write_string(value),
        }
    }

    fn write_clob<B: AsRef<[u8]>>(&mut self, value: B) -> IonResult<()> {
        match self {
            Writer::Binary(writer) => writer.write_clob(value),
            Writer::Text(writer) => writer.write_clob(value),
        }
    }

    fn write_blob<B: AsRef<[u8]>>(&mut self, value: B) -> IonResult<()> {
        match self {
            Writer::Binary(writer) => writer.write_blob(value),
            Writer::Text(writer) => writer.write_blob(value),
        }
    }

    fn step_in(&mut self, container_type: IonType) -> IonResult<()> {
        match self {
            Writer::Binary(writer) => writer.step_in(container_type),
            Writer::Text(writer) => writer.step_in(container_type),
        }
    }

    fn step_out(&mut self) -> IonResult<()> {
        match self {
            Writer::Binary(writer) => writer.step_out(),
            Writer::Text(writer) => writer.step_out(),
        }
    }

    fn parent_type(&self) -> Option<IonType> {
        match self {
            Writer::Binary(writer) => writer.parent_type(),
            Writer::Text(writer) => writer.parent_type(),
        }
    }

    fn depth(&self) -> usize {
        match self {
            Writer::Binary(writer) => writer.depth(),
            Writer::Text(writer) => writer.depth(),
        }
    }

    fn flush(&mut self) -> IonResult<()> {
        match self {
            Writer::Binary(writer) => writer.flush(),
            Writer::Text(writer) => writer.flush(),
        }
    }

    fn finish(&mut self) -> IonResult<()> {
        match self {
            Writer::Binary(writer) => writer.finish(),
            Writer::Text(writer) => writer.finish(),
        }
    }

    fn output(&self) -> &W {
        match self {
            Writer::Binary(writer) => writer.output(),
            Writer::Text(writer) => writer.output(),
        }
    }

    fn output_mut(&mut self) -> &mut W {
        match self {
            Writer::Binary(writer) => writer.output_mut(),
            Writer::Text(writer) => writer.output_mut(),
        }
    }
}
