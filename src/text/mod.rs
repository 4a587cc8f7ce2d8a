//! The text Ion encoding: a family of streaming `nom` parsers that recognize one token
//! family each, a line-buffered character source they pull from, and the raw reader and
//! writer assembled from them.

pub(crate) mod parse_result;
pub(crate) mod parsers;
pub mod raw_text_reader;
pub mod raw_text_writer;
pub(crate) mod text_buffer;
pub(crate) mod text_value;

pub use raw_text_reader::RawTextReader;
pub use raw_text_writer::{RawTextWriter, RawTextWriterBuilder};
