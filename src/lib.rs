//! A streaming, cursor-based implementation of the [Amazon Ion][spec] data format,
//! supporting both the self-describing binary encoding and the human-readable text
//! encoding.
//!
//! Reading is driven by a cursor: [Reader::next] advances to the next value at the current
//! depth, `read_*` methods decode the current scalar, and [Reader::step_in] /
//! [Reader::step_out] move the cursor across container boundaries. Writing mirrors this
//! shape on [IonWriter]. Symbol tables — the machinery that lets the binary encoding
//! replace strings with small integers — are managed transparently by the application-level
//! reader and writer, and shared tables can be supplied through a [Catalog].
//!
//! ```
//! use ion_cursor::{IonType, IonResult, ReaderBuilder, StreamItem};
//!
//! fn main() -> IonResult<()> {
//!     let mut reader = ReaderBuilder::new().build("{greeting: \"hello\"} ")?;
//!     assert_eq!(reader.next()?, StreamItem::Value(IonType::Struct));
//!     reader.step_in()?;
//!     assert_eq!(reader.next()?, StreamItem::Value(IonType::String));
//!     assert_eq!(reader.field_name()?, "greeting");
//!     assert_eq!(reader.read_string()?, "hello");
//!     reader.step_out()?;
//!     Ok(())
//! }
//! ```
//!
//! [spec]: https://amazon-ion.github.io/ion-docs/

pub mod binary;
pub mod catalog;
pub(crate) mod constants;
pub mod data_source;
mod ion_eq;
pub mod raw_reader;
mod raw_symbol_token;
pub mod reader;
pub mod result;
mod shared_symbol_table;
mod symbol;
pub mod symbol_table;
pub mod system_reader;
pub mod text;
pub mod types;
mod utf8;
pub mod writer;

pub use crate::binary::raw_binary_reader::RawBinaryReader;
pub use crate::binary::raw_binary_writer::RawBinaryWriter;
pub use crate::catalog::{Catalog, MapCatalog};
pub use crate::data_source::{IonDataSource, ToIonDataSource};
pub use crate::ion_eq::IonEq;
pub use crate::raw_reader::{RawReader, RawStreamItem};
pub use crate::raw_symbol_token::RawSymbolToken;
pub use crate::reader::{Reader, ReaderBuilder, StreamItem, UserReader};
pub use crate::result::{IonError, IonResult};
pub use crate::shared_symbol_table::SharedSymbolTable;
pub use crate::symbol::Symbol;
pub use crate::symbol_table::{SymbolTable, TableImport};
pub use crate::system_reader::{SystemReader, SystemStreamItem};
pub use crate::text::raw_text_reader::RawTextReader;
pub use crate::text::raw_text_writer::{RawTextWriter, RawTextWriterBuilder};
pub use crate::types::coefficient::{Coefficient, Sign};
pub use crate::types::decimal::Decimal;
pub use crate::types::integer::{Int, UInt};
pub use crate::types::timestamp::{Precision, Timestamp};
pub use crate::types::{IonType, SymbolId};
pub use crate::writer::{
    BinaryWriter, Format, IonWriter, TextKind, TextWriter, Writer, WriterBuilder,
};
