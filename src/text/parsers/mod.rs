//! One module per token family, mirroring the sub-type taxonomy of the text grammar. Each
//! parser recognizes its token with streaming semantics: reaching the end of the buffered
//! input mid-token surfaces as `Incomplete`, prompting the reader to load more text and
//! retry.

pub(crate) mod annotations;
pub(crate) mod blob;
pub(crate) mod boolean;
pub(crate) mod clob;
pub(crate) mod comments;
pub(crate) mod containers;
pub(crate) mod decimal;
pub(crate) mod float;
pub(crate) mod integer;
pub(crate) mod null;
pub(crate) mod numeric_support;
pub(crate) mod string;
pub(crate) mod symbol;
pub(crate) mod text_support;
pub(crate) mod timestamp;
pub(crate) mod value;
pub(crate) mod whitespace;
