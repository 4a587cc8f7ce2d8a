use smallvec::SmallVec;

use crate::binary::constants::v1_0::{LENGTH_CODE_NULL, LENGTH_CODE_VAR_UINT};
use crate::binary::header::Header;
use crate::binary::int::DecodedInt;
use crate::binary::type_code::IonTypeCode;
use crate::binary::uint::DecodedUInt;
use crate::binary::var_int::VarInt;
use crate::binary::var_uint::VarUInt;
use crate::data_source::{IonDataSource, ToIonDataSource};
use crate::raw_reader::{RawReader, RawStreamItem};
use crate::raw_symbol_token::RawSymbolToken;
use crate::result::{
    decoding_error, decoding_error_raw, illegal_operation, incomplete_data_error, IonResult,
};
use crate::types::decimal::Decimal;
use crate::types::integer::Int;
use crate::types::timestamp::Timestamp;
use crate::types::IonType;
use crate::utf8::Utf8Validator;

// String payloads are pulled from the data source in bounded chunks, each of which is run
// through the incremental UTF-8 validator before the next is requested.
const STRING_TRANSFER_CHUNK: usize = 4096;

// A fully decoded value header: everything the cursor knows about the value it rests on
// before the payload itself is consumed.
#[derive(Debug)]
struct EncodedValue {
    ion_type: IonType,
    header: Header,
    is_null: bool,
    field_name: Option<RawSymbolToken>,
    annotations: SmallVec<[RawSymbolToken; 2]>,
    value_length: usize,
    // Absolute stream position one past the last payload byte
    value_end: usize,
}

#[derive(Debug)]
struct ContainerFrame {
    ion_type: IonType,
    // Absolute stream position at which this container's payload ends
    end_position: usize,
}

/// A cursor over a binary Ion stream. Each call to [RawReader::next] decodes one type
/// descriptor (and its length and annotation bookkeeping) at the current depth; payloads are
/// only decoded when a `read_*` method asks for them, and unread payloads are skipped on the
/// following `next`.
pub struct RawBinaryReader<R: IonDataSource> {
    data_source: R,
    // Absolute number of bytes consumed from the data source
    bytes_read: usize,
    ion_version: (u8, u8),
    current_item: RawStreamItem,
    value: Option<EncodedValue>,
    value_consumed: bool,
    parents: Vec<ContainerFrame>,
}

impl<R: IonDataSource> RawBinaryReader<R> {
    pub fn new<T: ToIonDataSource<DataSource = R>>(input: T) -> RawBinaryReader<R> {
        RawBinaryReader {
            data_source: input.to_ion_data_source(),
            bytes_read: 0,
            ion_version: (1, 0),
            current_item: RawStreamItem::Nothing,
            value: None,
            value_consumed: false,
            parents: Vec::new(),
        }
    }

    fn in_struct(&self) -> bool {
        matches!(
            self.parents.last(),
            Some(ContainerFrame {
                ion_type: IonType::Struct,
                ..
            })
        )
    }

    // Consumes any bytes of the previous value's payload that were never read.
    fn skip_unread_value_bytes(&mut self) -> IonResult<()> {
        if let Some(value) = &self.value {
            if value.value_end > self.bytes_read {
                let bytes_to_skip = value.value_end - self.bytes_read;
                self.data_source.skip_bytes(bytes_to_skip)?;
                self.bytes_read += bytes_to_skip;
            }
        }
        self.value = None;
        self.value_consumed = false;
        Ok(())
    }

    fn at_end_of_parent(&self) -> bool {
        self.parents
            .last()
            .map(|parent| self.bytes_read >= parent.end_position)
            .unwrap_or(false)
    }

    fn nothing(&mut self) -> IonResult<RawStreamItem> {
        self.value = None;
        self.current_item = RawStreamItem::Nothing;
        Ok(RawStreamItem::Nothing)
    }

    // Confirms that a value of the given length would not run past the end of the innermost
    // open container.
    fn check_fits_in_parent(&self, length: usize, label: &'static str) -> IonResult<()> {
        if let Some(parent) = self.parents.last() {
            if self.bytes_read + length > parent.end_position {
                return incomplete_data_error(label, self.bytes_read);
            }
        }
        Ok(())
    }

    fn read_var_uint(&mut self) -> IonResult<VarUInt> {
        let var_uint = VarUInt::read(&mut self.data_source)?;
        self.bytes_read += var_uint.size_in_bytes();
        Ok(var_uint)
    }

    // Resolves a header's length code into a byte count, reading a trailing VarUInt length
    // field if the length code calls for one.
    fn read_standard_length(&mut self, length_code: u8) -> IonResult<usize> {
        match length_code {
            LENGTH_CODE_VAR_UINT => Ok(self.read_var_uint()?.value()),
            code => Ok(code as usize),
        }
    }

    fn read_value_header(
        &mut self,
        field_name: Option<RawSymbolToken>,
        annotations: SmallVec<[RawSymbolToken; 2]>,
        header: Header,
    ) -> IonResult<EncodedValue> {
        use IonTypeCode::*;
        let ion_type = header
            .ion_type()
            .expect("the caller screens out non-value type codes");

        let mut is_null = false;
        let length = match header.ion_type_code {
            Boolean => match header.length_code {
                0 | 1 => 0,
                LENGTH_CODE_NULL => {
                    is_null = true;
                    0
                }
                code => {
                    return decoding_error(format!("{code} is not a valid length code for a bool"))
                }
            },
            Struct if header.length_code == 1 => {
                // A sorted struct always carries an explicit length, which must be non-zero
                let length = self.read_var_uint()?.value();
                if length < 1 {
                    return decoding_error("a sorted struct must declare a length of at least 1");
                }
                length
            }
            _ if header.is_null() => {
                is_null = true;
                0
            }
            Float => {
                let length = self.read_standard_length(header.length_code)?;
                if !matches!(length, 0 | 4 | 8) {
                    return decoding_error(format!(
                        "{length} is not a valid length for a float; expected 0, 4, or 8"
                    ));
                }
                length
            }
            _ => self.read_standard_length(header.length_code)?,
        };

        self.check_fits_in_parent(length, "a value")?;
        Ok(EncodedValue {
            ion_type,
            header,
            is_null,
            field_name,
            annotations,
            value_length: length,
            value_end: self.bytes_read + length,
        })
    }

    fn read_annotated_value(
        &mut self,
        field_name: Option<RawSymbolToken>,
        wrapper_header: Header,
    ) -> IonResult<EncodedValue> {
        let wrapper_length = match wrapper_header.length_code {
            // The smallest possible wrapper is an annotations length, one annotation SID,
            // and a wrapped type descriptor: three bytes.
            0..=2 => {
                return decoding_error("an annotation wrapper must enclose at least three bytes")
            }
            LENGTH_CODE_NULL => return decoding_error("an annotation wrapper cannot be null"),
            code => self.read_standard_length(code)?,
        };
        self.check_fits_in_parent(wrapper_length, "an annotation wrapper")?;
        let wrapper_end = self.bytes_read + wrapper_length;

        let annotations_length = self.read_var_uint()?.value();
        if annotations_length < 1 {
            return decoding_error("an annotation wrapper must contain at least one annotation");
        }
        let annotations_end = self.bytes_read + annotations_length;
        let mut annotations = SmallVec::new();
        while self.bytes_read < annotations_end {
            let sid = self.read_var_uint()?;
            annotations.push(RawSymbolToken::SymbolId(sid.value()));
        }
        if self.bytes_read != annotations_end {
            return decoding_error(
                "annotation symbol IDs overran the wrapper's declared annotations length",
            );
        }

        let header_byte = match self.data_source.next_byte()? {
            Some(byte) => byte,
            None => return incomplete_data_error("an annotated value", self.bytes_read),
        };
        self.bytes_read += 1;
        let header = Header::from_byte(header_byte)?;
        match header.ion_type_code {
            IonTypeCode::AnnotationOrIvm => {
                return decoding_error("an annotation wrapper may not wrap another annotation wrapper")
            }
            IonTypeCode::NullOrNop if header.length_code != LENGTH_CODE_NULL => {
                return decoding_error("an annotation wrapper may not wrap NOP padding")
            }
            IonTypeCode::Reserved => {
                return decoding_error("found a value with the reserved type code (15)")
            }
            _ => {}
        }

        let value = self.read_value_header(field_name, annotations, header)?;
        // The wrapper's length must agree exactly with the end of the value it wraps
        if value.value_end != wrapper_end {
            return decoding_error(
                "the declared length of an annotation wrapper disagrees with its wrapped value",
            );
        }
        Ok(value)
    }

    fn set_current_value(&mut self, value: EncodedValue) -> IonResult<RawStreamItem> {
        let item = RawStreamItem::nullable_value(value.ion_type, value.is_null);
        self.current_item = item;
        self.value = Some(value);
        self.value_consumed = false;
        Ok(item)
    }

    // Verifies that the cursor rests on an unconsumed, non-null value of the expected type
    // and returns its payload length and length code.
    fn value_expected(&self, ion_type: IonType, operation: &str) -> IonResult<(usize, u8)> {
        let value = match &self.value {
            Some(value) => value,
            None => {
                return illegal_operation(format!(
                    "{operation} called when the reader was not positioned on a value"
                ))
            }
        };
        if value.ion_type != ion_type {
            return illegal_operation(format!(
                "{operation} called when the current value is a(n) {}",
                value.ion_type
            ));
        }
        if value.is_null {
            return illegal_operation(format!("{operation} called on a null value"));
        }
        if self.value_consumed {
            return illegal_operation(format!(
                "{operation} called on a value whose payload was already consumed"
            ));
        }
        Ok((value.value_length, value.header.length_code))
    }

    fn mark_consumed(&mut self, length: usize) {
        self.bytes_read += length;
        self.value_consumed = true;
    }

    fn read_lob_bytes(&mut self, ion_type: IonType, operation: &str) -> IonResult<Vec<u8>> {
        let (length, _) = self.value_expected(ion_type, operation)?;
        let mut bytes = vec![0u8; length];
        self.data_source.read_exact_or_eof(&mut bytes)?;
        self.mark_consumed(length);
        Ok(bytes)
    }
}

impl<R: IonDataSource> RawReader for RawBinaryReader<R> {
    fn ion_version(&self) -> (u8, u8) {
        self.ion_version
    }

    fn next(&mut self) -> IonResult<RawStreamItem> {
        self.skip_unread_value_bytes()?;
        if self.at_end_of_parent() {
            return self.nothing();
        }

        loop {
            // Inside a struct, every value (including NOP padding) is preceded by a VarUInt
            // field name SID.
            let field_name = if self.in_struct() {
                let sid = self.read_var_uint()?;
                Some(RawSymbolToken::SymbolId(sid.value()))
            } else {
                None
            };

            let header_byte = match self.data_source.next_byte()? {
                Some(byte) => {
                    self.bytes_read += 1;
                    byte
                }
                None => {
                    if self.parents.is_empty() && field_name.is_none() {
                        return self.nothing();
                    }
                    return incomplete_data_error("a type descriptor", self.bytes_read);
                }
            };

            // A 0xE0 at the top level begins an Ion version marker
            if self.parents.is_empty() && header_byte == 0xE0 {
                let mut ivm_tail = [0u8; 3];
                self.data_source.read_exact_or_eof(&mut ivm_tail)?;
                self.bytes_read += 3;
                return match ivm_tail {
                    [0x01, 0x00, 0xEA] => {
                        self.ion_version = (1, 0);
                        self.value = None;
                        self.current_item = RawStreamItem::VersionMarker(1, 0);
                        Ok(self.current_item)
                    }
                    [major, minor, 0xEA] => decoding_error(format!(
                        "found an Ion version marker for unsupported version v{major}.{minor}"
                    )),
                    _ => decoding_error("found a 0xE0 byte that did not begin a version marker"),
                };
            }

            let header = Header::from_byte(header_byte)?;
            match header.ion_type_code {
                IonTypeCode::NullOrNop if header.length_code != LENGTH_CODE_NULL => {
                    // NOP padding: skip it and keep looking for a value
                    let pad_length = self.read_standard_length(header.length_code)?;
                    self.check_fits_in_parent(pad_length, "NOP padding")?;
                    self.data_source.skip_bytes(pad_length)?;
                    self.bytes_read += pad_length;
                    if self.at_end_of_parent() {
                        return self.nothing();
                    }
                }
                IonTypeCode::AnnotationOrIvm => {
                    let value = self.read_annotated_value(field_name, header)?;
                    return self.set_current_value(value);
                }
                IonTypeCode::Reserved => {
                    return decoding_error("found a value with the reserved type code (15)")
                }
                _ => {
                    let value =
                        self.read_value_header(field_name, SmallVec::new(), header)?;
                    return self.set_current_value(value);
                }
            }
        }
    }

    fn current(&self) -> RawStreamItem {
        self.current_item
    }

    fn ion_type(&self) -> Option<IonType> {
        self.value.as_ref().map(|value| value.ion_type)
    }

    fn is_null(&self) -> bool {
        self.value
            .as_ref()
            .map(|value| value.is_null)
            .unwrap_or(false)
    }

    fn annotations(&self) -> &[RawSymbolToken] {
        self.value
            .as_ref()
            .map(|value| value.annotations.as_slice())
            .unwrap_or(&[])
    }

    fn field_name(&self) -> Option<&RawSymbolToken> {
        self.value.as_ref().and_then(|value| value.field_name.as_ref())
    }

    fn read_null(&mut self) -> IonResult<IonType> {
        match &self.value {
            Some(value) if value.is_null => Ok(value.ion_type),
            Some(_) => illegal_operation("read_null called on a non-null value"),
            None => illegal_operation("read_null called when the reader was not positioned on a value"),
        }
    }

    fn read_bool(&mut self) -> IonResult<bool> {
        let (_, length_code) = self.value_expected(IonType::Bool, "read_bool")?;
        self.value_consumed = true;
        Ok(length_code == 1)
    }

    fn read_i64(&mut self) -> IonResult<i64> {
        let value = self.read_int()?;
        value
            .as_i64()
            .ok_or_else(|| decoding_error_raw(format!("integer {value} is too large for an i64")))
    }

    fn read_int(&mut self) -> IonResult<Int> {
        let (length, _) = self.value_expected(IonType::Int, "read_int")?;
        let is_negative = matches!(
            self.value.as_ref().unwrap().header.ion_type_code,
            IonTypeCode::NegativeInteger
        );
        let magnitude = DecodedUInt::read(&mut self.data_source, length)?.into_value();
        self.mark_consumed(length);
        if is_negative && magnitude.is_zero() {
            return decoding_error("found a negative int with a zero magnitude");
        }
        Ok(Int::from_uint_magnitude(magnitude, is_negative))
    }

    fn read_f32(&mut self) -> IonResult<f32> {
        Ok(self.read_f64()? as f32)
    }

    fn read_f64(&mut self) -> IonResult<f64> {
        let (length, _) = self.value_expected(IonType::Float, "read_f64")?;
        let value = match length {
            0 => 0.0f64,
            4 => {
                let mut bytes = [0u8; 4];
                self.data_source.read_exact_or_eof(&mut bytes)?;
                f32::from_be_bytes(bytes) as f64
            }
            8 => {
                let mut bytes = [0u8; 8];
                self.data_source.read_exact_or_eof(&mut bytes)?;
                f64::from_be_bytes(bytes)
            }
            // Unreachable: the header decoder rejects other float lengths
            other => {
                return decoding_error(format!("{other} is not a valid length for a float"))
            }
        };
        self.mark_consumed(length);
        Ok(value)
    }

    fn read_decimal(&mut self) -> IonResult<Decimal> {
        let (length, _) = self.value_expected(IonType::Decimal, "read_decimal")?;
        if length == 0 {
            self.mark_consumed(0);
            return Ok(Decimal::new(0u64, 0));
        }
        let exponent = VarInt::read(&mut self.data_source)?;
        let coefficient_length = length.checked_sub(exponent.size_in_bytes()).ok_or_else(|| {
            decoding_error_raw("a decimal's exponent overran the end of the value")
        })?;
        let coefficient = DecodedInt::read(&mut self.data_source, coefficient_length)?;
        self.mark_consumed(length);
        if coefficient.is_negative_zero() {
            return Ok(Decimal::negative_zero_with_exponent(exponent.value()));
        }
        Ok(Decimal::new(coefficient.into_value(), exponent.value()))
    }

    fn read_string(&mut self) -> IonResult<String> {
        let (length, _) = self.value_expected(IonType::String, "read_string")?;
        let mut bytes = Vec::with_capacity(length.min(STRING_TRANSFER_CHUNK));
        let mut validator = Utf8Validator::new();
        let mut remaining = length;
        while remaining > 0 {
            let chunk = remaining.min(STRING_TRANSFER_CHUNK);
            let start = bytes.len();
            bytes.resize(start + chunk, 0);
            self.data_source.read_exact_or_eof(&mut bytes[start..])?;
            validator.validate(&bytes[start..])?;
            remaining -= chunk;
        }
        validator.finish()?;
        self.mark_consumed(length);
        // The validator has vetted every byte; this conversion cannot fail
        String::from_utf8(bytes).map_err(|_| decoding_error_raw("invalid UTF-8 in a string"))
    }

    fn read_symbol(&mut self) -> IonResult<RawSymbolToken> {
        let (length, _) = self.value_expected(IonType::Symbol, "read_symbol")?;
        let sid = DecodedUInt::read(&mut self.data_source, length)?.into_value();
        self.mark_consumed(length);
        let sid = sid
            .as_u64()
            .ok_or_else(|| decoding_error_raw("found a symbol ID too large to resolve"))?;
        Ok(RawSymbolToken::SymbolId(sid as usize))
    }

    fn read_blob(&mut self) -> IonResult<Vec<u8>> {
        self.read_lob_bytes(IonType::Blob, "read_blob")
    }

    fn read_clob(&mut self) -> IonResult<Vec<u8>> {
        self.read_lob_bytes(IonType::Clob, "read_clob")
    }

    fn read_timestamp(&mut self) -> IonResult<Timestamp> {
        let (length, _) = self.value_expected(IonType::Timestamp, "read_timestamp")?;

        let offset = VarInt::read(&mut self.data_source)?;
        let mut remaining = length.checked_sub(offset.size_in_bytes()).ok_or_else(|| {
            decoding_error_raw("a timestamp's offset overran the end of the value")
        })?;

        let read_field = |data_source: &mut R, remaining: &mut usize| -> IonResult<Option<u64>> {
            if *remaining == 0 {
                return Ok(None);
            }
            let field = VarUInt::read(data_source)?;
            *remaining = remaining.checked_sub(field.size_in_bytes()).ok_or_else(|| {
                decoding_error_raw("a timestamp field overran the end of the value")
            })?;
            Ok(Some(field.value() as u64))
        };

        let year = match read_field(&mut self.data_source, &mut remaining)? {
            Some(year) => year,
            None => return decoding_error("a timestamp must declare a year"),
        };
        let month = read_field(&mut self.data_source, &mut remaining)?;
        let day = read_field(&mut self.data_source, &mut remaining)?;
        let hour = read_field(&mut self.data_source, &mut remaining)?;
        let minute = match (hour, read_field(&mut self.data_source, &mut remaining)?) {
            (Some(_), Some(minute)) => Some(minute),
            (Some(_), None) => {
                return decoding_error("a timestamp with an hour must also declare a minute")
            }
            (None, _) => None,
        };
        let second = read_field(&mut self.data_source, &mut remaining)?;

        // Any remaining bytes encode fractional seconds
        let fraction = if remaining > 0 {
            let exponent = VarInt::read(&mut self.data_source)?;
            let coefficient_length =
                remaining.checked_sub(exponent.size_in_bytes()).ok_or_else(|| {
                    decoding_error_raw("a timestamp's fraction overran the end of the value")
                })?;
            let coefficient = DecodedInt::read(&mut self.data_source, coefficient_length)?;
            if coefficient.is_negative_zero() {
                Some(Decimal::negative_zero_with_exponent(exponent.value()))
            } else {
                Some(Decimal::new(coefficient.into_value(), exponent.value()))
            }
        } else {
            None
        };
        self.mark_consumed(length);

        let mut builder = Timestamp::with_year(year as u32);
        if let Some(month) = month {
            builder = builder.with_month(month as u32);
            if let Some(day) = day {
                builder = builder.with_day(day as u32);
                if let (Some(hour), Some(minute)) = (hour, minute) {
                    builder = builder.with_hour_and_minute(hour as u32, minute as u32);
                    if let Some(second) = second {
                        builder = builder.with_second(second as u32);
                        if let Some(fraction) = fraction {
                            builder = builder.with_fractional_seconds(fraction);
                        }
                    } else if fraction.is_some() {
                        return decoding_error(
                            "a timestamp fraction requires whole seconds",
                        );
                    }
                }
            }
        }

        if offset.is_negative_zero() {
            builder.build_at_unknown_offset()
        } else {
            let offset_minutes = i32::try_from(offset.value()).map_err(|_| {
                decoding_error_raw("a timestamp offset was too large to represent")
            })?;
            builder.build_at_offset(offset_minutes)
        }
    }

    fn step_in(&mut self) -> IonResult<()> {
        let value = match &self.value {
            Some(value) => value,
            None => {
                return illegal_operation(
                    "step_in called when the reader was not positioned on a value",
                )
            }
        };
        if !value.ion_type.is_container() {
            return illegal_operation(format!("cannot step into a(n) {}", value.ion_type));
        }
        if value.is_null {
            return illegal_operation("cannot step into a null container");
        }
        self.parents.push(ContainerFrame {
            ion_type: value.ion_type,
            end_position: value.value_end,
        });
        self.value = None;
        self.current_item = RawStreamItem::Nothing;
        Ok(())
    }

    fn step_out(&mut self) -> IonResult<()> {
        let parent = match self.parents.pop() {
            Some(parent) => parent,
            None => return illegal_operation("cannot step out of the top level"),
        };
        if parent.end_position > self.bytes_read {
            let bytes_to_skip = parent.end_position - self.bytes_read;
            self.data_source.skip_bytes(bytes_to_skip)?;
            self.bytes_read += bytes_to_skip;
        }
        self.value = None;
        self.value_consumed = false;
        self.current_item = RawStreamItem::Nothing;
        Ok(())
    }

    fn parent_type(&self) -> Option<IonType> {
        self.parents.last().map(|parent| parent.ion_type)
    }

    fn depth(&self) -> usize {
        self.parents.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary::constants::v1_0::IVM;
    use crate::raw_reader::RawStreamItem::*;

    fn reader_for(bytes: &[u8]) -> RawBinaryReader<std::io::Cursor<Vec<u8>>> {
        let mut data = Vec::new();
        data.extend_from_slice(&IVM);
        data.extend_from_slice(bytes);
        let mut reader = RawBinaryReader::new(data);
        assert_eq!(reader.next().unwrap(), VersionMarker(1, 0));
        reader
    }

    #[test]
    fn read_a_single_int() -> IonResult<()> {
        let mut reader = reader_for(&[0x21, 0x05]);
        assert_eq!(reader.next()?, Value(IonType::Int));
        assert_eq!(reader.read_i64()?, 5);
        assert_eq!(reader.next()?, Nothing);
        // End-of-stream is sticky
        assert_eq!(reader.next()?, Nothing);
        Ok(())
    }

    #[test]
    fn read_negative_int_and_overflow_behavior() -> IonResult<()> {
        // -5, then a 9-byte integer that cannot fit in an i64
        let mut reader = reader_for(&[
            0x31, 0x05, // -5
            0x29, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // 2^64
        ]);
        assert_eq!(reader.next()?, Value(IonType::Int));
        assert_eq!(reader.read_i64()?, -5);
        assert_eq!(reader.next()?, Value(IonType::Int));
        let value = reader.read_int()?;
        assert_eq!(
            value,
            Int::from_decimal_str("18446744073709551616").unwrap()
        );
        Ok(())
    }

    #[test]
    fn negative_zero_int_is_rejected() -> IonResult<()> {
        let mut reader = reader_for(&[0x30]);
        assert_eq!(reader.next()?, Value(IonType::Int));
        assert!(reader.read_int().is_err());
        Ok(())
    }

    #[test]
    fn read_typed_nulls() -> IonResult<()> {
        let mut reader = reader_for(&[0x0F, 0x2F, 0xBF]);
        assert_eq!(reader.next()?, Null(IonType::Null));
        assert_eq!(reader.read_null()?, IonType::Null);
        assert_eq!(reader.next()?, Null(IonType::Int));
        assert_eq!(reader.read_null()?, IonType::Int);
        assert_eq!(reader.next()?, Null(IonType::List));
        assert!(reader.step_in().is_err());
        Ok(())
    }

    #[test]
    fn read_bools() -> IonResult<()> {
        let mut reader = reader_for(&[0x10, 0x11, 0x1F]);
        assert_eq!(reader.next()?, Value(IonType::Bool));
        assert!(!reader.read_bool()?);
        assert_eq!(reader.next()?, Value(IonType::Bool));
        assert!(reader.read_bool()?);
        assert_eq!(reader.next()?, Null(IonType::Bool));
        assert!(reader.read_bool().is_err());
        Ok(())
    }

    #[test]
    fn invalid_bool_length_code() -> IonResult<()> {
        let mut reader = reader_for(&[0x12]);
        assert!(reader.next().is_err());
        Ok(())
    }

    #[test]
    fn read_floats() -> IonResult<()> {
        let mut reader = reader_for(&[
            0x40, // 0e0
            0x48, 0x40, 0x09, 0x21, 0xFB, 0x54, 0x44, 0x2D, 0x18, // ~pi
        ]);
        assert_eq!(reader.next()?, Value(IonType::Float));
        assert_eq!(reader.read_f64()?, 0.0);
        assert_eq!(reader.next()?, Value(IonType::Float));
        assert!((reader.read_f64()? - std::f64::consts::PI).abs() < 1e-15);
        Ok(())
    }

    #[test]
    fn read_decimal_value() -> IonResult<()> {
        // 1.23456: exponent -5, coefficient 123456
        let mut reader = reader_for(&[0x54, 0xC5, 0x01, 0xE2, 0x40]);
        assert_eq!(reader.next()?, Value(IonType::Decimal));
        let value = reader.read_decimal()?;
        assert_eq!(value, Decimal::new(123456u64, -5));
        Ok(())
    }

    #[test]
    fn read_string_and_symbol() -> IonResult<()> {
        let mut reader = reader_for(&[
            0x83, 0x66, 0x6F, 0x6F, // "foo"
            0x71, 0x0A, // symbol $10
        ]);
        assert_eq!(reader.next()?, Value(IonType::String));
        assert_eq!(reader.read_string()?, "foo");
        // Payload can only be consumed once
        assert!(reader.read_string().is_err());
        assert_eq!(reader.next()?, Value(IonType::Symbol));
        assert_eq!(reader.read_symbol()?, RawSymbolToken::SymbolId(10));
        Ok(())
    }

    #[test]
    fn invalid_utf8_in_string() -> IonResult<()> {
        let mut reader = reader_for(&[0x82, 0xFF, 0xFE]);
        assert_eq!(reader.next()?, Value(IonType::String));
        assert!(reader.read_string().is_err());
        Ok(())
    }

    #[test]
    fn nested_lists() -> IonResult<()> {
        // [[1, 2, 3], [4, 5]]
        let mut reader = reader_for(&[
            0xBC, // outer list, 12 bytes
            0xB6, 0x21, 0x01, 0x21, 0x02, 0x21, 0x03, // [1, 2, 3]
            0xB4, 0x21, 0x04, 0x21, 0x05, // [4, 5]
        ]);
        assert_eq!(reader.next()?, Value(IonType::List));
        reader.step_in()?;

        assert_eq!(reader.next()?, Value(IonType::List));
        reader.step_in()?;
        let mut values = Vec::new();
        while let Value(IonType::Int) = reader.next()? {
            values.push(reader.read_i64()?);
        }
        assert_eq!(values, vec![1, 2, 3]);
        reader.step_out()?;

        assert_eq!(reader.next()?, Value(IonType::List));
        reader.step_in()?;
        let mut values = Vec::new();
        while let Value(IonType::Int) = reader.next()? {
            values.push(reader.read_i64()?);
        }
        assert_eq!(values, vec![4, 5]);
        reader.step_out()?;

        assert_eq!(reader.next()?, Nothing);
        reader.step_out()?;
        assert_eq!(reader.next()?, Nothing);
        Ok(())
    }

    #[test]
    fn step_out_skips_unread_values() -> IonResult<()> {
        // [1, 2, 3] 42
        let mut reader = reader_for(&[
            0xB6, 0x21, 0x01, 0x21, 0x02, 0x21, 0x03, // [1, 2, 3]
            0x21, 0x2A, // 42
        ]);
        assert_eq!(reader.next()?, Value(IonType::List));
        reader.step_in()?;
        assert_eq!(reader.next()?, Value(IonType::Int));
        // Step out without reading anything else
        reader.step_out()?;
        assert_eq!(reader.next()?, Value(IonType::Int));
        assert_eq!(reader.read_i64()?, 42);
        Ok(())
    }

    #[test]
    fn struct_fields_carry_symbol_ids() -> IonResult<()> {
        // {$4: "a"} using field SID 4 ('name')
        let mut reader = reader_for(&[0xD3, 0x84, 0x81, 0x61]);
        assert_eq!(reader.next()?, Value(IonType::Struct));
        reader.step_in()?;
        assert_eq!(reader.next()?, Value(IonType::String));
        assert_eq!(reader.field_name(), Some(&RawSymbolToken::SymbolId(4)));
        assert_eq!(reader.read_string()?, "a");
        assert_eq!(reader.next()?, Nothing);
        reader.step_out()?;
        Ok(())
    }

    #[test]
    fn annotations_are_exposed() -> IonResult<()> {
        // $10::7
        let mut reader = reader_for(&[0xE4, 0x81, 0x8A, 0x21, 0x07]);
        assert_eq!(reader.next()?, Value(IonType::Int));
        assert_eq!(reader.annotations(), &[RawSymbolToken::SymbolId(10)]);
        assert_eq!(reader.read_i64()?, 7);
        Ok(())
    }

    #[test]
    fn annotation_wrapper_length_mismatch_is_rejected() -> IonResult<()> {
        // Wrapper claims 5 bytes but the wrapped int only reaches 4
        let mut reader = reader_for(&[0xE5, 0x81, 0x8A, 0x21, 0x07, 0x21, 0x08]);
        assert!(reader.next().is_err());
        Ok(())
    }

    #[test]
    fn nested_annotation_wrappers_are_rejected() -> IonResult<()> {
        let mut reader = reader_for(&[0xE6, 0x81, 0x8A, 0xE4, 0x81, 0x8B, 0x21, 0x07]);
        assert!(reader.next().is_err());
        Ok(())
    }

    #[test]
    fn empty_annotation_list_is_rejected() -> IonResult<()> {
        let mut reader = reader_for(&[0xE3, 0x80, 0x21, 0x07]);
        assert!(reader.next().is_err());
        Ok(())
    }

    #[test]
    fn nop_padding_is_invisible() -> IonResult<()> {
        // One byte of NOP, then 5, then a 3-byte NOP, then 6
        let mut reader = reader_for(&[0x00, 0x21, 0x05, 0x02, 0x00, 0x00, 0x21, 0x06]);
        assert_eq!(reader.next()?, Value(IonType::Int));
        assert_eq!(reader.read_i64()?, 5);
        assert_eq!(reader.next()?, Value(IonType::Int));
        assert_eq!(reader.read_i64()?, 6);
        assert_eq!(reader.next()?, Nothing);
        Ok(())
    }

    #[test]
    fn nop_padding_at_end_of_container() -> IonResult<()> {
        // [1, <2-byte NOP>]
        let mut reader = reader_for(&[0xB4, 0x21, 0x01, 0x01, 0x00]);
        assert_eq!(reader.next()?, Value(IonType::List));
        reader.step_in()?;
        assert_eq!(reader.next()?, Value(IonType::Int));
        assert_eq!(reader.read_i64()?, 1);
        assert_eq!(reader.next()?, Nothing);
        reader.step_out()?;
        Ok(())
    }

    #[test]
    fn value_overrunning_its_container_is_rejected() -> IonResult<()> {
        // A list claiming 2 bytes whose only element claims 3
        let mut reader = reader_for(&[0xB2, 0x23, 0x01, 0x02, 0x03]);
        assert_eq!(reader.next()?, Value(IonType::List));
        reader.step_in()?;
        assert!(reader.next().is_err());
        Ok(())
    }

    #[test]
    fn timestamp_with_unknown_offset() -> IonResult<()> {
        // 2020-01-01T00:00:00-00:00
        let mut reader = reader_for(&[
            0x68, 0xC0, 0x0F, 0xE4, 0x81, 0x81, 0x80, 0x80, 0x80,
        ]);
        assert_eq!(reader.next()?, Value(IonType::Timestamp));
        let value = reader.read_timestamp()?;
        assert_eq!(value.offset_minutes(), None);
        assert_eq!(value.year(), 2020);
        assert_eq!(value.second(), 0);
        Ok(())
    }

    #[test]
    fn lone_e0_is_not_a_version_marker() {
        let mut data = Vec::new();
        data.extend_from_slice(&IVM);
        data.extend_from_slice(&[0xE0, 0x02, 0x00, 0xEA]);
        let mut reader = RawBinaryReader::new(data);
        assert_eq!(reader.next().unwrap(), VersionMarker(1, 0));
        assert!(reader.next().is_err());
    }

    #[test]
    fn scratch_buffer_is_not_required_for_simple_reads() -> IonResult<()> {
        // Confirms the reader works over a BufReader with a tiny internal buffer
        let mut data = Vec::new();
        data.extend_from_slice(&IVM);
        data.extend_from_slice(&[0x85, 0x68, 0x65, 0x6C, 0x6C, 0x6F]); // "hello"
        let mut reader =
            RawBinaryReader::new(std::io::BufReader::with_capacity(2, std::io::Cursor::new(data)));
        assert_eq!(reader.next()?, VersionMarker(1, 0));
        assert_eq!(reader.next()?, Value(IonType::String));
        assert_eq!(reader.read_string()?, "hello");
        Ok(())
    }
}
