use std::collections::{BTreeMap, HashMap};

use crate::shared_symbol_table::SharedSymbolTable;

/// A registry of [SharedSymbolTable]s that readers consult when a stream imports a table by
/// `(name, version)`.
pub trait Catalog {
    /// Returns the highest version of the table with the given name, if any version of it
    /// is present.
    fn get_table(&self, name: &str) -> Option<&SharedSymbolTable>;

    /// Returns the table with exactly the given name and version.
    fn get_table_with_version(&self, name: &str, version: usize)
        -> Option<&SharedSymbolTable>;
}

/// A [Catalog] backed by an in-memory map.
pub struct MapCatalog {
    tables_by_name: HashMap<String, BTreeMap<usize, SharedSymbolTable>>,
}

impl MapCatalog {
    pub fn new() -> MapCatalog {
        MapCatalog {
            tables_by_name: HashMap::new(),
        }
    }

    pub fn insert_table(&mut self, table: SharedSymbolTable) {
        self.tables_by_name
            .entry(table.name().to_string())
            .or_insert_with(BTreeMap::new)
            .insert(table.version(), table);
    }
}

impl Default for MapCatalog {
    fn default() -> Self {
        MapCatalog::new()
    }
}

impl Catalog for MapCatalog {
    fn get_table(&self, name: &str) -> Option<&SharedSymbolTable> {
        let versions = self.tables_by_name.get(name)?;
        versions.values().next_back()
    }

    fn get_table_with_version(
        &self,
        name: &str,
        version: usize,
    ) -> Option<&SharedSymbolTable> {
        self.tables_by_name.get(name)?.get(&version)
    }
}
