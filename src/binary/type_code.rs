use std::convert::TryFrom;

use crate::result::{decoding_error_raw, IonError};
use crate::types::IonType;

/// Represents the possible types that can appear in the high nibble of a binary Ion type
/// descriptor byte. Not every type code corresponds to an [IonType]: type code 0 doubles as
/// NOP padding, type code 14 introduces either an annotation wrapper or an Ion version
/// marker, and type code 15 is reserved.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub(crate) enum IonTypeCode {
    NullOrNop,       // 0
    Boolean,         // 1
    PositiveInteger, // 2
    NegativeInteger, // 3
    Float,           // 4
    Decimal,         // 5
    Timestamp,       // 6
    Symbol,          // 7
    String,          // 8
    Clob,            // 9
    Blob,            // 10
    List,            // 11
    SExpression,     // 12
    Struct,          // 13
    AnnotationOrIvm, // 14
    Reserved,        // 15
}

impl IonTypeCode {
    /// The [IonType] this type code represents, if any.
    pub fn as_ion_type(&self) -> Option<IonType> {
        use IonTypeCode::*;
        let ion_type = match self {
            NullOrNop => IonType::Null,
            Boolean => IonType::Bool,
            PositiveInteger | NegativeInteger => IonType::Int,
            Float => IonType::Float,
            Decimal => IonType::Decimal,
            Timestamp => IonType::Timestamp,
            Symbol => IonType::Symbol,
            String => IonType::String,
            Clob => IonType::Clob,
            Blob => IonType::Blob,
            List => IonType::List,
            SExpression => IonType::SExp,
            Struct => IonType::Struct,
            AnnotationOrIvm | Reserved => return None,
        };
        Some(ion_type)
    }

    /// The high nibble this type code occupies in a type descriptor byte.
    pub fn to_nibble(self) -> u8 {
        use IonTypeCode::*;
        match self {
            NullOrNop => 0,
            Boolean => 1,
            PositiveInteger => 2,
            NegativeInteger => 3,
            Float => 4,
            Decimal => 5,
            Timestamp => 6,
            Symbol => 7,
            String => 8,
            Clob => 9,
            Blob => 10,
            List => 11,
            SExpression => 12,
            Struct => 13,
            AnnotationOrIvm => 14,
            Reserved => 15,
        }
    }
}

impl TryFrom<u8> for IonTypeCode {
    type Error = IonError;

    fn try_from(nibble: u8) -> Result<Self, Self::Error> {
        use IonTypeCode::*;
        let type_code = match nibble {
            0 => NullOrNop,
            1 => Boolean,
            2 => PositiveInteger,
            3 => NegativeInteger,
            4 => Float,
            5 => Decimal,
            6 => Timestamp,
            7 => Symbol,
            8 => String,
            9 => Clob,
            10 => Blob,
            11 => List,
            12 => SExpression,
            13 => Struct,
            14 => AnnotationOrIvm,
            15 => Reserved,
            _ => {
                return Err(decoding_error_raw(format!(
                    "{nibble} is not a valid header nibble"
                )))
            }
        };
        Ok(type_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nibble_round_trip() {
        for nibble in 0..=15u8 {
            let type_code = IonTypeCode::try_from(nibble).unwrap();
            assert_eq!(type_code.to_nibble(), nibble);
        }
        assert!(IonTypeCode::try_from(16).is_err());
    }
}
