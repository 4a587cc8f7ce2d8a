use delegate::delegate;

use crate::catalog::Catalog;
use crate::constants::v1_0::system_symbol_ids;
use crate::raw_reader::{RawReader, RawStreamItem};
use crate::raw_symbol_token::RawSymbolToken;
use crate::result::{decoding_error, IonResult};
use crate::symbol::Symbol;
use crate::symbol_table::{SymbolTable, TableImport};
use crate::types::decimal::Decimal;
use crate::types::integer::Int;
use crate::types::timestamp::Timestamp;
use crate::types::IonType;

/// Stream elements that a [SystemReader] surfaces. Encoding artifacts (version markers and
/// symbol table values) are reported rather than hidden, but their side effects have already
/// been applied by the time they are returned.
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum SystemStreamItem {
    /// An Ion version marker, either the literal marker or a symbol value equivalent to one.
    VersionMarker(u8, u8),
    /// A symbol table control value that has been read and applied.
    SymbolTableValue(IonType),
    /// A null value bearing the symbol table annotation; it has no effect on the stream.
    SymbolTableNull(IonType),
    /// A non-null user value.
    Value(IonType),
    /// A null user value.
    Null(IonType),
    /// The end of the current container or stream.
    Nothing,
}

// The pieces of one `{name, version, max_id}` import descriptor.
#[derive(Debug, Default)]
struct ImportDescriptor {
    name: Option<String>,
    version: Option<usize>,
    max_id: Option<usize>,
}

/// Wraps a [RawReader], resolving the system-level constructs it encounters: version markers
/// reset the symbol table, symbol table control values grow or replace it (consulting the
/// catalog for shared imports), and faux version markers are recognized. The current
/// [SymbolTable] is available to callers at every point in the stream.
pub struct SystemReader<R: RawReader> {
    raw_reader: R,
    symbol_table: SymbolTable,
    catalog: Option<Box<dyn Catalog>>,
    // A symbol value that was consumed from the raw reader while checking for a faux
    // version marker; handed back out by the next read_symbol call.
    pending_symbol: Option<RawSymbolToken>,
}

impl<R: RawReader> SystemReader<R> {
    pub fn new(raw_reader: R) -> SystemReader<R> {
        SystemReader {
            raw_reader,
            symbol_table: SymbolTable::new(),
            catalog: None,
            pending_symbol: None,
        }
    }

    pub fn with_catalog(raw_reader: R, catalog: Box<dyn Catalog>) -> SystemReader<R> {
        SystemReader {
            catalog: Some(catalog),
            ..SystemReader::new(raw_reader)
        }
    }

    pub fn symbol_table(&self) -> &SymbolTable {
        &self.symbol_table
    }

    pub fn next(&mut self) -> IonResult<SystemStreamItem> {
        self.pending_symbol = None;
        loop {
            match self.raw_reader.next()? {
                RawStreamItem::VersionMarker(major, minor) => {
                    self.symbol_table.reset();
                    return Ok(SystemStreamItem::VersionMarker(major, minor));
                }
                RawStreamItem::Value(IonType::Struct)
                    if self.raw_reader.depth() == 0 && self.has_symbol_table_annotation() =>
                {
                    self.read_symbol_table()?;
                    return Ok(SystemStreamItem::SymbolTableValue(IonType::Struct));
                }
                RawStreamItem::Null(IonType::Struct)
                    if self.raw_reader.depth() == 0 && self.has_symbol_table_annotation() =>
                {
                    return Ok(SystemStreamItem::SymbolTableNull(IonType::Struct));
                }
                RawStreamItem::Value(IonType::Symbol)
                    if self.raw_reader.depth() == 0
                        && self.raw_reader.annotations().is_empty() =>
                {
                    // An unannotated top-level symbol equivalent to `$ion_1_0` is a no-op
                    // marker and is passed over silently
                    let token = self.raw_reader.read_symbol()?;
                    if token.matches(system_symbol_ids::ION_1_0, "$ion_1_0") {
                        continue;
                    }
                    self.pending_symbol = Some(token);
                    return Ok(SystemStreamItem::Value(IonType::Symbol));
                }
                RawStreamItem::Value(ion_type) => {
                    return Ok(SystemStreamItem::Value(ion_type))
                }
                RawStreamItem::Null(ion_type) => return Ok(SystemStreamItem::Null(ion_type)),
                RawStreamItem::Nothing => return Ok(SystemStreamItem::Nothing),
            }
        }
    }

    fn has_symbol_table_annotation(&self) -> bool {
        self.raw_reader
            .annotations()
            .first()
            .map(|token| token.matches(system_symbol_ids::ION_SYMBOL_TABLE, "$ion_symbol_table"))
            .unwrap_or(false)
    }

    // Reads a `$ion_symbol_table::{...}` control struct and applies it to the current table.
    fn read_symbol_table(&mut self) -> IonResult<()> {
        let mut is_append = false;
        let mut import_descriptors: Option<Vec<ImportDescriptor>> = None;
        let mut new_symbols: Vec<Symbol> = Vec::new();

        self.raw_reader.step_in()?;
        loop {
            let item = self.raw_reader.next()?;
            if item == RawStreamItem::Nothing {
                break;
            }
            let field = match self.raw_reader.field_name() {
                Some(token) => token.clone(),
                None => continue,
            };
            if field.matches(system_symbol_ids::IMPORTS, "imports") {
                match item {
                    RawStreamItem::Value(IonType::Symbol) => {
                        // `imports: $ion_symbol_table` appends to the table already in scope
                        let token = self.raw_reader.read_symbol()?;
                        if token
                            .matches(system_symbol_ids::ION_SYMBOL_TABLE, "$ion_symbol_table")
                        {
                            is_append = true;
                        }
                    }
                    RawStreamItem::Value(IonType::List) => {
                        import_descriptors = Some(self.read_import_descriptors()?);
                    }
                    // Any other value in the imports field has no defined meaning; skip it
                    _ => {}
                }
            } else if field.matches(system_symbol_ids::SYMBOLS, "symbols") {
                if let RawStreamItem::Value(IonType::List) = item {
                    self.raw_reader.step_in()?;
                    loop {
                        match self.raw_reader.next()? {
                            RawStreamItem::Value(IonType::String) => {
                                new_symbols.push(Symbol::owned(self.raw_reader.read_string()?));
                            }
                            RawStreamItem::Nothing => break,
                            // Non-string entries still claim a SID, but with unknown text
                            _ => new_symbols.push(Symbol::unknown_text()),
                        }
                    }
                    self.raw_reader.step_out()?;
                }
                // A malformed symbols field contributes nothing
            }
        }
        self.raw_reader.step_out()?;

        if !is_append {
            self.symbol_table.reset();
            if let Some(descriptors) = import_descriptors {
                for descriptor in descriptors {
                    self.apply_import(descriptor)?;
                }
            }
        }
        for symbol in new_symbols {
            self.symbol_table.add_symbol(symbol);
        }
        Ok(())
    }

    fn read_import_descriptors(&mut self) -> IonResult<Vec<ImportDescriptor>> {
        let mut descriptors = Vec::new();
        self.raw_reader.step_in()?;
        loop {
            match self.raw_reader.next()? {
                RawStreamItem::Value(IonType::Struct) => {
                    let mut descriptor = ImportDescriptor::default();
                    self.raw_reader.step_in()?;
                    loop {
                        let item = self.raw_reader.next()?;
                        if item == RawStreamItem::Nothing {
                            break;
                        }
                        let field = match self.raw_reader.field_name() {
                            Some(token) => token.clone(),
                            None => continue,
                        };
                        match item {
                            RawStreamItem::Value(IonType::String)
                                if field.matches(system_symbol_ids::NAME, "name") =>
                            {
                                descriptor.name = Some(self.raw_reader.read_string()?);
                            }
                            RawStreamItem::Value(IonType::Int)
                                if field.matches(system_symbol_ids::VERSION, "version") =>
                            {
                                descriptor.version =
                                    usize::try_from(self.raw_reader.read_i64()?).ok();
                            }
                            RawStreamItem::Value(IonType::Int)
                                if field.matches(system_symbol_ids::MAX_ID, "max_id") =>
                            {
                                descriptor.max_id =
                                    usize::try_from(self.raw_reader.read_i64()?).ok();
                            }
                            _ => {}
                        }
                    }
                    self.raw_reader.step_out()?;
                    descriptors.push(descriptor);
                }
                RawStreamItem::Nothing => break,
                // Non-struct entries in an import list have no meaning
                _ => {}
            }
        }
        self.raw_reader.step_out()?;
        Ok(descriptors)
    }

    fn apply_import(&mut self, descriptor: ImportDescriptor) -> IonResult<()> {
        let name = match descriptor.name {
            Some(name) if !name.is_empty() => name,
            // A descriptor without a usable name is ignored
            _ => return Ok(()),
        };
        if name == "$ion" {
            // The system table is always implicitly imported
            return Ok(());
        }
        let version = descriptor.version.filter(|v| *v >= 1).unwrap_or(1);

        let resolved = self.catalog.as_ref().and_then(|catalog| {
            catalog
                .get_table_with_version(&name, version)
                .or_else(|| catalog.get_table(&name))
        });
        let symbol_count = match resolved {
            Some(table) => {
                let count = descriptor.max_id.unwrap_or(table.len());
                for index in 0..count {
                    let symbol = table
                        .symbols()
                        .get(index)
                        .cloned()
                        .unwrap_or_else(Symbol::unknown_text);
                    self.symbol_table.add_symbol(symbol);
                }
                count
            }
            None => {
                // Without the table itself, max_id is the only way to keep SIDs aligned
                let count = match descriptor.max_id {
                    Some(count) => count,
                    None => {
                        return decoding_error(format!(
                            "symbol table import of '{name}' (not found in the catalog) \
                             requires a max_id"
                        ))
                    }
                };
                for _ in 0..count {
                    self.symbol_table.add_placeholder();
                }
                count
            }
        };
        self.symbol_table
            .record_import(TableImport::new(name, version, symbol_count));
        Ok(())
    }

    pub fn read_symbol(&mut self) -> IonResult<RawSymbolToken> {
        if let Some(token) = self.pending_symbol.take() {
            return Ok(token);
        }
        self.raw_reader.read_symbol()
    }

    delegate! {
        to self.raw_reader {
            pub fn ion_version(&self) -> (u8, u8);
            pub fn current(&self) -> RawStreamItem;
            pub fn ion_type(&self) -> Option<IonType>;
            pub fn is_null(&self) -> bool;
            pub fn annotations(&self) -> &[RawSymbolToken];
            pub fn field_name(&self) -> Option<&RawSymbolToken>;
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
    use crate::catalog::MapCatalog;
    use crate::shared_symbol_table::SharedSymbolTable;
    use crate::text::raw_text_reader::RawTextReader;

    fn system_reader_for(
        text: &str,
    ) -> SystemReader<RawTextReader<std::io::Cursor<&[u8]>>> {
        SystemReader::new(RawTextReader::new(text.as_bytes()))
    }

    #[test]
    fn local_symbols_are_installed() -> IonResult<()> {
        let mut reader =
            system_reader_for("$ion_symbol_table::{symbols: [\"foo\", \"bar\"]} foo");
        assert_eq!(
            reader.next()?,
            SystemStreamItem::SymbolTableValue(IonType::Struct)
        );
        assert_eq!(reader.symbol_table().text_for(10), Some("foo"));
        assert_eq!(reader.symbol_table().text_for(11), Some("bar"));
        assert_eq!(reader.next()?, SystemStreamItem::Value(IonType::Symbol));
        Ok(())
    }

    #[test]
    fn appending_preserves_existing_symbols() -> IonResult<()> {
        let mut reader = system_reader_for(
            "$ion_symbol_table::{symbols: [\"one\"]} \
             $ion_symbol_table::{imports: $ion_symbol_table, symbols: [\"two\"]}",
        );
        reader.next()?;
        reader.next()?;
        assert_eq!(reader.symbol_table().text_for(10), Some("one"));
        assert_eq!(reader.symbol_table().text_for(11), Some("two"));
        Ok(())
    }

    #[test]
    fn a_fresh_table_replaces_the_previous_one() -> IonResult<()> {
        let mut reader = system_reader_for(
            "$ion_symbol_table::{symbols: [\"one\"]} \
             $ion_symbol_table::{symbols: [\"two\"]}",
        );
        reader.next()?;
        reader.next()?;
        assert_eq!(reader.symbol_table().text_for(10), Some("two"));
        assert!(!reader.symbol_table().sid_is_valid(11));
        Ok(())
    }

    #[test]
    fn non_string_symbol_entries_become_placeholders() -> IonResult<()> {
        let mut reader =
            system_reader_for("$ion_symbol_table::{symbols: [\"a\", null, 7, \"b\"]} 0");
        reader.next()?;
        let table = reader.symbol_table();
        assert_eq!(table.text_for(10), Some("a"));
        assert_eq!(table.text_for(11), None);
        assert_eq!(table.text_for(12), None);
        assert_eq!(table.text_for(13), Some("b"));
        Ok(())
    }

    #[test]
    fn imports_resolve_through_the_catalog() -> IonResult<()> {
        let mut catalog = MapCatalog::new();
        catalog.insert_table(
            SharedSymbolTable::new(
                "zoo",
                1,
                vec![Symbol::owned("cat"), Symbol::owned("dog")],
            )
            .unwrap(),
        );
        let raw_reader = RawTextReader::new(
            "$ion_symbol_table::{imports: [{name: \"zoo\", version: 1, max_id: 2}], \
             symbols: [\"local\"]} 0"
                .as_bytes(),
        );
        let mut reader = SystemReader::with_catalog(raw_reader, Box::new(catalog));
        reader.next()?;
        let table = reader.symbol_table();
        assert_eq!(table.text_for(10), Some("cat"));
        assert_eq!(table.text_for(11), Some("dog"));
        assert_eq!(table.text_for(12), Some("local"));
        assert_eq!(table.imports().len(), 1);
        assert_eq!(table.imports()[0].name(), "zoo");
        Ok(())
    }

    #[test]
    fn missing_imports_reserve_placeholder_sids() -> IonResult<()> {
        let mut reader = system_reader_for(
            "$ion_symbol_table::{imports: [{name: \"lost\", version: 1, max_id: 3}], \
             symbols: [\"local\"]} 0",
        );
        reader.next()?;
        let table = reader.symbol_table();
        assert_eq!(table.text_for(10), None);
        assert_eq!(table.text_for(11), None);
        assert_eq!(table.text_for(12), None);
        assert_eq!(table.text_for(13), Some("local"));
        Ok(())
    }

    #[test]
    fn missing_import_without_max_id_is_an_error() {
        let mut reader = system_reader_for(
            "$ion_symbol_table::{imports: [{name: \"lost\", version: 1}]} 0",
        );
        assert!(reader.next().is_err());
    }

    #[test]
    fn faux_version_markers_are_skipped() -> IonResult<()> {
        let mut reader = system_reader_for("'$ion_1_0' 5");
        assert_eq!(reader.next()?, SystemStreamItem::Value(IonType::Int));
        Ok(())
    }

    #[test]
    fn pending_symbols_can_still_be_read() -> IonResult<()> {
        let mut reader = system_reader_for("some_symbol");
        assert_eq!(reader.next()?, SystemStreamItem::Value(IonType::Symbol));
        assert_eq!(
            reader.read_symbol()?,
            RawSymbolToken::Text("some_symbol".to_string())
        );
        Ok(())
    }

    #[test]
    fn version_markers_reset_the_table() -> IonResult<()> {
        let mut reader =
            system_reader_for("$ion_symbol_table::{symbols: [\"gone\"]} $ion_1_0 0");
        reader.next()?;
        assert!(reader.symbol_table().sid_is_valid(10));
        assert_eq!(reader.next()?, SystemStreamItem::VersionMarker(1, 0));
        assert!(!reader.symbol_table().sid_is_valid(10));
        Ok(())
    }

    #[test]
    fn annotated_null_struct_has_no_effect() -> IonResult<()> {
        let mut reader = system_reader_for("$ion_symbol_table::null.struct 5");
        assert_eq!(
            reader.next()?,
            SystemStreamItem::SymbolTableNull(IonType::Struct)
        );
        assert_eq!(reader.next()?, SystemStreamItem::Value(IonType::Int));
        Ok(())
    }
}
