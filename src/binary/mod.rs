//! The binary Ion 1.0 encoding: type-descriptor parsing and emission, variable-length
//! integer primitives, and the cursor-style raw reader and writer built on them.

pub(crate) mod constants;
pub(crate) mod decimal;
pub(crate) mod header;
pub(crate) mod int;
pub mod raw_binary_reader;
pub mod raw_binary_writer;
pub(crate) mod timestamp;
pub(crate) mod type_code;
pub(crate) mod uint;
pub(crate) mod var_int;
pub(crate) mod var_uint;

pub use raw_binary_reader::RawBinaryReader;
pub use raw_binary_writer::RawBinaryWriter;
