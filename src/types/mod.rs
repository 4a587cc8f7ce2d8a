//! The value types that make up the Ion data model.

pub mod coefficient;
pub mod decimal;
pub mod integer;
pub mod timestamp;

use std::fmt;

pub use coefficient::{Coefficient, Sign};
pub use decimal::Decimal;
pub use integer::{Int, UInt};
pub use timestamp::{Precision, Timestamp};

/// A symbol ID (SID): an index into a symbol table. SID zero is reserved for symbols whose
/// text is unknown.
pub type SymbolId = usize;

/// Represents the Ion data type of a given value. To learn more about each data type,
/// read [the Ion Data Model](https://amazon-ion.github.io/ion-docs/docs/spec.html#the-ion-data-model)
/// section of the spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IonType {
    Null,
    Bool,
    Int,
    Float,
    Decimal,
    Timestamp,
    Symbol,
    String,
    Clob,
    Blob,
    List,
    SExp,
    Struct,
}

impl fmt::Display for IonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                IonType::Null => "null",
                IonType::Bool => "bool",
                IonType::Int => "int",
                IonType::Float => "float",
                IonType::Decimal => "decimal",
                IonType::Timestamp => "timestamp",
                IonType::Symbol => "symbol",
                IonType::String => "string",
                IonType::Clob => "clob",
                IonType::Blob => "blob",
                IonType::List => "list",
                IonType::SExp => "sexp",
                IonType::Struct => "struct",
            }
        )
    }
}

impl IonType {
    pub fn is_container(&self) -> bool {
        matches!(self, IonType::List | IonType::SExp | IonType::Struct)
    }
}
