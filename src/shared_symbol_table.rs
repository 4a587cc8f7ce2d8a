use crate::result::{decoding_error, IonResult};
use crate::symbol::Symbol;

/// A named, versioned table of symbols intended to be imported by many streams. Entries may
/// have unknown text; they still occupy a SID slot so that later entries keep their
/// positions.
#[derive(Debug, Clone, PartialEq)]
pub struct SharedSymbolTable {
    name: String,
    version: usize,
    symbols: Vec<Symbol>,
}

impl SharedSymbolTable {
    pub fn new<S: Into<String>>(
        name: S,
        version: usize,
        symbols: Vec<Symbol>,
    ) -> IonResult<SharedSymbolTable> {
        let name = name.into();
        if name.is_empty() {
            return decoding_error("a shared symbol table must have a non-empty name");
        }
        if version < 1 {
            return decoding_error("a shared symbol table's version must be at least 1");
        }
        Ok(SharedSymbolTable {
            name,
            version,
            symbols,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> usize {
        self.version
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}
