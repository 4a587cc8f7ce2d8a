use crate::raw_symbol_token::RawSymbolToken;
use crate::types::decimal::Decimal;
use crate::types::integer::Int;
use crate::types::timestamp::Timestamp;
use crate::types::IonType;

/// A value (or the opening delimiter of a container) recognized in the text encoding.
/// Scalars are fully decoded by the parsers — escape sequences processed, literals converted —
/// so the reader's accessors can simply hand them out.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TextValue {
    Null(IonType),
    Bool(bool),
    Int(Int),
    Float(f64),
    Decimal(Decimal),
    Timestamp(Timestamp),
    String(String),
    Symbol(RawSymbolToken),
    Clob(Vec<u8>),
    Blob(Vec<u8>),
    ListStart,
    SExpStart,
    StructStart,
}

impl TextValue {
    pub fn ion_type(&self) -> IonType {
        match self {
            TextValue::Null(ion_type) => *ion_type,
            TextValue::Bool(_) => IonType::Bool,
            TextValue::Int(_) => IonType::Int,
            TextValue::Float(_) => IonType::Float,
            TextValue::Decimal(_) => IonType::Decimal,
            TextValue::Timestamp(_) => IonType::Timestamp,
            TextValue::String(_) => IonType::String,
            TextValue::Symbol(_) => IonType::Symbol,
            TextValue::Clob(_) => IonType::Clob,
            TextValue::Blob(_) => IonType::Blob,
            TextValue::ListStart => IonType::List,
            TextValue::SExpStart => IonType::SExp,
            TextValue::StructStart => IonType::Struct,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, TextValue::Null(_))
    }
}

/// A [TextValue] together with the annotations that preceded it.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct AnnotatedTextValue {
    annotations: Vec<RawSymbolToken>,
    value: TextValue,
}

impl AnnotatedTextValue {
    pub fn new(annotations: Vec<RawSymbolToken>, value: TextValue) -> Self {
        AnnotatedTextValue { annotations, value }
    }

    pub fn value(&self) -> &TextValue {
        &self.value
    }

    pub fn annotations(&self) -> &[RawSymbolToken] {
        &self.annotations
    }
}
