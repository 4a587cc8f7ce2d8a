use std::convert::TryFrom;

use crate::binary::type_code::IonTypeCode;
use crate::result::IonResult;
use crate::types::IonType;

/// A decoded type descriptor byte: the high-nibble type code and the low-nibble length code.
/// Interpreting the length code (inline length, trailing `VarUInt`, null, NOP, or the special
/// bool/sorted-struct cases) is the reader's job; the header only separates the nibbles.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub(crate) struct Header {
    pub ion_type_code: IonTypeCode,
    pub length_code: u8,
}

impl Header {
    pub fn from_byte(byte: u8) -> IonResult<Header> {
        let ion_type_code = IonTypeCode::try_from(byte >> 4)?;
        Ok(Header {
            ion_type_code,
            length_code: byte & 0b0000_1111,
        })
    }

    pub fn ion_type(&self) -> Option<IonType> {
        self.ion_type_code.as_ion_type()
    }

    pub fn is_null(&self) -> bool {
        self.length_code == crate::binary::constants::v1_0::LENGTH_CODE_NULL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_the_nibbles() -> IonResult<()> {
        let header = Header::from_byte(0x21)?;
        assert_eq!(header.ion_type_code, IonTypeCode::PositiveInteger);
        assert_eq!(header.length_code, 1);
        assert_eq!(header.ion_type(), Some(IonType::Int));
        assert!(!header.is_null());

        let header = Header::from_byte(0x8F)?;
        assert_eq!(header.ion_type_code, IonTypeCode::String);
        assert!(header.is_null());
        Ok(())
    }
}
