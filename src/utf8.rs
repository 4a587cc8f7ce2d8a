use crate::result::{decoding_error, IonResult};

/// An incremental UTF-8 validator.
///
/// String payloads in a binary stream can be larger than the reader's transfer buffer, which
/// means a multi-byte code point can be split across two consecutive reads. The validator
/// carries the number of continuation bytes still owed by the current code point across calls
/// to [Utf8Validator::validate], so feeding it a byte sequence in any number of chunks produces
/// the same verdict as feeding it the whole sequence at once.
#[derive(Debug, Default)]
pub(crate) struct Utf8Validator {
    // Continuation bytes still expected for the in-progress code point
    bytes_needed: u8,
    // The leading byte of the in-progress code point; used to reject overlong encodings,
    // surrogates, and values beyond U+10FFFF at the first continuation byte
    lead_byte: u8,
    // Whether the next continuation byte is the first one following the lead byte
    at_first_continuation: bool,
    // Total number of bytes validated so far, for error messages
    bytes_validated: usize,
}

impl Utf8Validator {
    pub fn new() -> Self {
        Utf8Validator::default()
    }

    /// Validates the next chunk of a (possibly split) byte sequence.
    pub fn validate(&mut self, bytes: &[u8]) -> IonResult<()> {
        for byte in bytes.iter().copied() {
            self.step(byte)?;
            self.bytes_validated += 1;
        }
        Ok(())
    }

    /// Confirms that the sequence did not end in the middle of a code point.
    pub fn finish(&self) -> IonResult<()> {
        if self.bytes_needed > 0 {
            return decoding_error(format!(
                "invalid UTF-8: input ended {} byte(s) into an incomplete code point",
                self.bytes_validated
            ));
        }
        Ok(())
    }

    fn step(&mut self, byte: u8) -> IonResult<()> {
        if self.bytes_needed == 0 {
            self.bytes_needed = match byte {
                0x00..=0x7F => return Ok(()),
                0xC2..=0xDF => 1,
                0xE0..=0xEF => 2,
                0xF0..=0xF4 => 3,
                // 0x80..=0xBF: orphaned continuation byte
                // 0xC0..=0xC1, 0xF5..=0xFF: always-invalid lead bytes
                _ => return self.invalid(byte),
            };
            self.lead_byte = byte;
            self.at_first_continuation = true;
            return Ok(());
        }

        // The first continuation byte has a narrowed legal range for some lead bytes; this is
        // what rejects overlong encodings (E0 80.., F0 80..), UTF-16 surrogates (ED A0..), and
        // code points above U+10FFFF (F4 90..).
        let (low, high) = if self.at_first_continuation {
            match self.lead_byte {
                0xE0 => (0xA0, 0xBF),
                0xED => (0x80, 0x9F),
                0xF0 => (0x90, 0xBF),
                0xF4 => (0x80, 0x8F),
                _ => (0x80, 0xBF),
            }
        } else {
            (0x80, 0xBF)
        };

        if byte < low || byte > high {
            return self.invalid(byte);
        }
        self.at_first_continuation = false;
        self.bytes_needed -= 1;
        Ok(())
    }

    fn invalid(&self, byte: u8) -> IonResult<()> {
        decoding_error(format!(
            "invalid UTF-8: unexpected byte {:#04x} at offset {}",
            byte, self.bytes_validated
        ))
    }
}
