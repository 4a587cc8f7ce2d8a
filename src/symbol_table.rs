use std::collections::HashMap;

use crate::constants::v1_0;
use crate::symbol::Symbol;
use crate::types::SymbolId;

/// Records that a contiguous range of SIDs was imported from a shared table. Retained so
/// that writers can re-serialize the imports when they emit a symbol table of their own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableImport {
    name: String,
    version: usize,
    max_id: usize,
}

impl TableImport {
    pub fn new<S: Into<String>>(name: S, version: usize, max_id: usize) -> TableImport {
        TableImport {
            name: name.into(),
            version,
            max_id,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> usize {
        self.version
    }

    /// The number of SIDs this import contributes to the local table.
    pub fn max_id(&self) -> usize {
        self.max_id
    }
}

/// The symbol table in scope at a given point in a stream: the system symbols, any imported
/// shared-table ranges, and locally defined symbols, flattened into one SID-indexed list.
///
/// SID zero is reserved for symbols with unknown text. A symbol's text may also be unknown
/// when it was imported from a shared table that the catalog could not supply.
pub struct SymbolTable {
    symbols_by_id: Vec<Symbol>,
    ids_by_text: HashMap<Symbol, SymbolId>,
    imports: Vec<TableImport>,
}

impl SymbolTable {
    pub fn new() -> SymbolTable {
        let mut symbol_table = SymbolTable {
            symbols_by_id: Vec::with_capacity(v1_0::SYSTEM_SYMBOLS.len()),
            ids_by_text: HashMap::new(),
            imports: Vec::new(),
        };
        symbol_table.initialize();
        symbol_table
    }

    fn initialize(&mut self) {
        // SID zero has no text by definition
        self.symbols_by_id.push(Symbol::unknown_text());
        for text in v1_0::SYSTEM_SYMBOLS.iter().skip(1) {
            self.add_symbol(Symbol::owned(*text));
        }
    }

    /// Discards every import and local symbol, returning the table to its system state.
    pub fn reset(&mut self) {
        self.symbols_by_id.clear();
        self.ids_by_text.clear();
        self.imports.clear();
        self.initialize();
    }

    /// Adds `text` to the table, returning its new SID. If the text is already present,
    /// no symbol is added and the existing (lowest) SID is returned.
    pub fn intern<I: Into<String>>(&mut self, text: I) -> SymbolId {
        let symbol = Symbol::owned(text.into());
        if let Some(sid) = self.ids_by_text.get(&symbol) {
            return *sid;
        }
        self.add_symbol(symbol)
    }

    /// Appends a symbol (which may have unknown text) to the end of the table,
    /// unconditionally taking the next SID.
    pub(crate) fn add_symbol(&mut self, symbol: Symbol) -> SymbolId {
        let sid = self.symbols_by_id.len();
        if symbol.text().is_some() {
            // Lookups return the lowest SID with matching text, so only the first
            // occurrence lands in the map
            self.ids_by_text.entry(symbol.clone()).or_insert(sid);
        }
        self.symbols_by_id.push(symbol);
        sid
    }

    /// Appends a symbol with unknown text, reserving its SID.
    pub(crate) fn add_placeholder(&mut self) -> SymbolId {
        self.add_symbol(Symbol::unknown_text())
    }

    pub(crate) fn record_import(&mut self, import: TableImport) {
        self.imports.push(import);
    }

    /// The imports whose symbol ranges precede this table's local symbols, in SID order.
    pub fn imports(&self) -> &[TableImport] {
        &self.imports
    }

    /// If defined, returns the lowest SID associated with `text`.
    pub fn sid_for<A: AsRef<str>>(&self, text: &A) -> Option<SymbolId> {
        self.ids_by_text.get(text.as_ref()).copied()
    }

    /// If `sid` is in range and its symbol has known text, returns that text.
    pub fn text_for(&self, sid: SymbolId) -> Option<&str> {
        self.symbols_by_id.get(sid)?.text()
    }

    /// If `sid` is in range, returns its symbol (which may have unknown text).
    pub fn symbol_for(&self, sid: SymbolId) -> Option<&Symbol> {
        self.symbols_by_id.get(sid)
    }

    /// Returns true if `sid` is a valid index into this table.
    pub fn sid_is_valid(&self, sid: SymbolId) -> bool {
        sid < self.symbols_by_id.len()
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols_by_id
    }

    /// The symbols whose SIDs are `start` and above.
    pub fn symbols_tail(&self, start: usize) -> &[Symbol] {
        &self.symbols_by_id[start..]
    }

    /// The number of entries in the table, SID zero included.
    pub fn len(&self) -> usize {
        self.symbols_by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        false // the system symbols are always present
    }

    /// The highest SID in the table.
    pub fn max_id(&self) -> SymbolId {
        self.symbols_by_id.len() - 1
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        SymbolTable::new()
    }
}
