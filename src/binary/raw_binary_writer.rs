use std::io::Write;

use smallvec::SmallVec;

use crate::binary::constants::v1_0::{IVM, LENGTH_CODE_VAR_UINT, MAX_INLINE_LENGTH};
use crate::binary::decimal::encode_decimal;
use crate::binary::timestamp::encode_timestamp;
use crate::binary::type_code::IonTypeCode;
use crate::binary::var_uint::VarUInt;
use crate::result::{encoding_error, illegal_operation, IonResult};
use crate::types::decimal::Decimal;
use crate::types::integer::{Int, UInt};
use crate::types::timestamp::Timestamp;
use crate::types::{IonType, SymbolId};

// Appends a type descriptor byte (and, for lengths beyond the inline maximum, a VarUInt
// length field) to the buffer.
fn write_type_descriptor(
    buffer: &mut Vec<u8>,
    type_code: IonTypeCode,
    length: usize,
) -> IonResult<()> {
    let nibble = type_code.to_nibble();
    if length <= MAX_INLINE_LENGTH {
        buffer.push(nibble << 4 | length as u8);
    } else {
        buffer.push(nibble << 4 | LENGTH_CODE_VAR_UINT);
        VarUInt::write_u64(buffer, length as u64)?;
    }
    Ok(())
}

// Appends a scalar header and its big-endian magnitude payload.
fn write_uint_payload(
    buffer: &mut Vec<u8>,
    type_code: IonTypeCode,
    magnitude: u64,
) -> IonResult<()> {
    let leading_empty_bytes = (magnitude.leading_zeros() / 8) as usize;
    let bytes = &magnitude.to_be_bytes()[leading_empty_bytes..];
    write_type_descriptor(buffer, type_code, bytes.len())?;
    buffer.extend_from_slice(bytes);
    Ok(())
}

#[derive(Debug)]
struct ContainerFrame {
    ion_type: IonType,
    body: Vec<u8>,
    // The field name and annotations that were pending when the container was opened;
    // they belong to the container itself and are applied when it closes.
    field_id: Option<SymbolId>,
    annotations: SmallVec<[SymbolId; 2]>,
}

/// Writes the binary Ion 1.0 encoding to an [io::Write](std::io::Write) sink.
///
/// Container bodies are buffered in memory until [RawBinaryWriter::step_out] is called, at
/// which point the finished body's length is known and the container's type descriptor and
/// length prefix can be emitted ahead of it. Completed top-level values accumulate until
/// [RawBinaryWriter::flush], which writes the Ion version marker (when one is owed) followed
/// by the buffered values.
///
/// This writer works exclusively in symbol IDs; resolving text to SIDs (and emitting the
/// symbol table that defines them) is the application-level writer's job.
pub struct RawBinaryWriter<W: Write> {
    output: W,
    // Completed top-level values awaiting a flush
    top_level: Vec<u8>,
    containers: Vec<ContainerFrame>,
    // Recycled value buffers, kept to curb per-value allocation
    spare_buffers: Vec<Vec<u8>>,
    field_id: Option<SymbolId>,
    annotations: SmallVec<[SymbolId; 2]>,
    ivm_needed: bool,
}

impl<W: Write> RawBinaryWriter<W> {
    pub fn new(output: W) -> RawBinaryWriter<W> {
        RawBinaryWriter {
            output,
            top_level: Vec::new(),
            containers: Vec::new(),
            spare_buffers: Vec::new(),
            field_id: None,
            annotations: SmallVec::new(),
            ivm_needed: true,
        }
    }

    /// Sets the field name (as a symbol ID) for the next value written. Only legal between
    /// values when the writer is positioned inside a struct.
    pub fn set_field_id(&mut self, field_id: SymbolId) {
        self.field_id = Some(field_id);
    }

    /// Sets the annotations (as symbol IDs) that will wrap the next value written.
    pub fn set_annotation_ids<I: IntoIterator<Item = SymbolId>>(&mut self, annotation_ids: I) {
        self.annotations.clear();
        self.annotations.extend(annotation_ids);
    }

    pub fn depth(&self) -> usize {
        self.containers.len()
    }

    pub fn parent_type(&self) -> Option<IonType> {
        self.containers.last().map(|frame| frame.ion_type)
    }

    fn in_struct(&self) -> bool {
        self.parent_type() == Some(IonType::Struct)
    }

    fn checkout_buffer(&mut self) -> Vec<u8> {
        let mut buffer = self.spare_buffers.pop().unwrap_or_default();
        buffer.clear();
        buffer
    }

    fn recycle_buffer(&mut self, buffer: Vec<u8>) {
        self.spare_buffers.push(buffer);
    }

    // Encodes one scalar into a checked-out buffer and routes it through value emission.
    fn write_scalar<F>(&mut self, encode_fn: F) -> IonResult<()>
    where
        F: FnOnce(&mut Vec<u8>) -> IonResult<()>,
    {
        let mut value_buffer = self.checkout_buffer();
        encode_fn(&mut value_buffer)?;
        let field_id = self.field_id.take();
        let annotations = std::mem::take(&mut self.annotations);
        self.emit_value(value_buffer, field_id, annotations)
    }

    // Wraps an encoded value in its annotation wrapper (if any), prefixes its field name
    // (when inside a struct), and appends the result to the innermost open body.
    fn emit_value(
        &mut self,
        value_buffer: Vec<u8>,
        field_id: Option<SymbolId>,
        annotations: SmallVec<[SymbolId; 2]>,
    ) -> IonResult<()> {
        match (self.in_struct(), field_id) {
            (true, None) => {
                return encoding_error("a value written inside a struct requires a field name")
            }
            (false, Some(_)) => {
                return encoding_error("a field name can only be set inside a struct")
            }
            _ => {}
        }

        let final_buffer = if annotations.is_empty() {
            value_buffer
        } else {
            let mut sid_buffer = self.checkout_buffer();
            for annotation_id in &annotations {
                VarUInt::write_u64(&mut sid_buffer, *annotation_id as u64)?;
            }
            let mut annotations_length_field = self.checkout_buffer();
            VarUInt::write_u64(&mut annotations_length_field, sid_buffer.len() as u64)?;

            let wrapper_length =
                annotations_length_field.len() + sid_buffer.len() + value_buffer.len();
            let mut wrapped = self.checkout_buffer();
            write_type_descriptor(&mut wrapped, IonTypeCode::AnnotationOrIvm, wrapper_length)?;
            wrapped.extend_from_slice(&annotations_length_field);
            wrapped.extend_from_slice(&sid_buffer);
            wrapped.extend_from_slice(&value_buffer);

            self.recycle_buffer(annotations_length_field);
            self.recycle_buffer(sid_buffer);
            self.recycle_buffer(value_buffer);
            wrapped
        };

        let target = match self.containers.last_mut() {
            Some(frame) => &mut frame.body,
            None => &mut self.top_level,
        };
        if let Some(field_id) = field_id {
            VarUInt::write_u64(target, field_id as u64)?;
        }
        target.extend_from_slice(&final_buffer);
        self.recycle_buffer(final_buffer);
        Ok(())
    }

    pub fn write_null(&mut self, ion_type: IonType) -> IonResult<()> {
        self.write_scalar(|buffer| {
            let byte: u8 = match ion_type {
                IonType::Null => 0x0F,
                IonType::Bool => 0x1F,
                IonType::Int => 0x2F,
                IonType::Float => 0x4F,
                IonType::Decimal => 0x5F,
                IonType::Timestamp => 0x6F,
                IonType::Symbol => 0x7F,
                IonType::String => 0x8F,
                IonType::Clob => 0x9F,
                IonType::Blob => 0xAF,
                IonType::List => 0xBF,
                IonType::SExp => 0xCF,
                IonType::Struct => 0xDF,
            };
            buffer.push(byte);
            Ok(())
        })
    }

    pub fn write_bool(&mut self, value: bool) -> IonResult<()> {
        self.write_scalar(|buffer| {
            buffer.push(if value { 0x11 } else { 0x10 });
            Ok(())
        })
    }

    pub fn write_i64(&mut self, value: i64) -> IonResult<()> {
        self.write_scalar(|buffer| {
            let type_code = if value < 0 {
                IonTypeCode::NegativeInteger
            } else {
                IonTypeCode::PositiveInteger
            };
            write_uint_payload(buffer, type_code, value.unsigned_abs())
        })
    }

    pub fn write_int(&mut self, value: &Int) -> IonResult<()> {
        if let Int::I64(value) = value {
            return self.write_i64(*value);
        }
        self.write_scalar(|buffer| {
            let type_code = if value.is_negative() {
                IonTypeCode::NegativeInteger
            } else {
                IonTypeCode::PositiveInteger
            };
            match value.magnitude() {
                UInt::U64(magnitude) => write_uint_payload(buffer, type_code, magnitude),
                UInt::BigUInt(magnitude) => {
                    let bytes = magnitude.to_bytes_be();
                    write_type_descriptor(buffer, type_code, bytes.len())?;
                    buffer.extend_from_slice(&bytes);
                    Ok(())
                }
            }
        })
    }

    pub fn write_f32(&mut self, value: f32) -> IonResult<()> {
        self.write_scalar(|buffer| {
            if value == 0f32 && value.is_sign_positive() {
                buffer.push(0x40);
                return Ok(());
            }
            buffer.push(0x44);
            buffer.extend_from_slice(&value.to_be_bytes());
            Ok(())
        })
    }

    pub fn write_f64(&mut self, value: f64) -> IonResult<()> {
        self.write_scalar(|buffer| {
            if value == 0f64 && value.is_sign_positive() {
                buffer.push(0x40);
                return Ok(());
            }
            buffer.push(0x48);
            buffer.extend_from_slice(&value.to_be_bytes());
            Ok(())
        })
    }

    pub fn write_decimal(&mut self, value: &Decimal) -> IonResult<()> {
        self.write_scalar(|buffer| {
            let mut body = Vec::new();
            encode_decimal(&mut body, value)?;
            write_type_descriptor(buffer, IonTypeCode::Decimal, body.len())?;
            buffer.extend_from_slice(&body);
            Ok(())
        })
    }

    pub fn write_timestamp(&mut self, value: &Timestamp) -> IonResult<()> {
        self.write_scalar(|buffer| {
            let mut body = Vec::new();
            encode_timestamp(&mut body, value)?;
            write_type_descriptor(buffer, IonTypeCode::Timestamp, body.len())?;
            buffer.extend_from_slice(&body);
            Ok(())
        })
    }

    pub fn write_symbol_id(&mut self, symbol_id: SymbolId) -> IonResult<()> {
        self.write_scalar(|buffer| {
            write_uint_payload(buffer, IonTypeCode::Symbol, symbol_id as u64)
        })
    }

    pub fn write_string<S: AsRef<str>>(&mut self, value: S) -> IonResult<()> {
        let text = value.as_ref();
        self.write_scalar(|buffer| {
            write_type_descriptor(buffer, IonTypeCode::String, text.len())?;
            buffer.extend_from_slice(text.as_bytes());
            Ok(())
        })
    }

    pub fn write_clob<B: AsRef<[u8]>>(&mut self, value: B) -> IonResult<()> {
        let bytes = value.as_ref();
        self.write_scalar(|buffer| {
            write_type_descriptor(buffer, IonTypeCode::Clob, bytes.len())?;
            buffer.extend_from_slice(bytes);
            Ok(())
        })
    }

    pub fn write_blob<B: AsRef<[u8]>>(&mut self, value: B) -> IonResult<()> {
        let bytes = value.as_ref();
        self.write_scalar(|buffer| {
            write_type_descriptor(buffer, IonTypeCode::Blob, bytes.len())?;
            buffer.extend_from_slice(bytes);
            Ok(())
        })
    }

    /// Opens a list, s-expression, or struct. Subsequent values are buffered as the
    /// container's body until the matching [RawBinaryWriter::step_out].
    pub fn step_in(&mut self, container_type: IonType) -> IonResult<()> {
        if !container_type.is_container() {
            return illegal_operation(format!("cannot step into a(n) {container_type}"));
        }
        match (self.in_struct(), self.field_id.is_some()) {
            (true, false) => {
                return encoding_error("a container opened inside a struct requires a field name")
            }
            (false, true) => {
                return encoding_error("a field name can only be set inside a struct")
            }
            _ => {}
        }
        let body = self.checkout_buffer();
        let frame = ContainerFrame {
            ion_type: container_type,
            body,
            field_id: self.field_id.take(),
            annotations: std::mem::take(&mut self.annotations),
        };
        self.containers.push(frame);
        Ok(())
    }

    /// Closes the innermost open container: measures its buffered body, emits its type
    /// descriptor and length, and splices the result into the enclosing body.
    pub fn step_out(&mut self) -> IonResult<()> {
        let frame = match self.containers.pop() {
            Some(frame) => frame,
            None => return illegal_operation("cannot step out of the top level"),
        };
        let type_code = match frame.ion_type {
            IonType::List => IonTypeCode::List,
            IonType::SExp => IonTypeCode::SExpression,
            IonType::Struct => IonTypeCode::Struct,
            _ => unreachable!("only containers are pushed onto the writer's stack"),
        };

        let mut value_buffer = self.checkout_buffer();
        if frame.ion_type == IonType::Struct && frame.body.len() == 1 {
            // A struct descriptor with an inline length of 1 means "sorted struct"; a
            // one-byte body must use the VarUInt length form instead.
            value_buffer.push(type_code.to_nibble() << 4 | LENGTH_CODE_VAR_UINT);
            VarUInt::write_u64(&mut value_buffer, 1)?;
        } else {
            write_type_descriptor(&mut value_buffer, type_code, frame.body.len())?;
        }
        value_buffer.extend_from_slice(&frame.body);
        self.recycle_buffer(frame.body);
        self.emit_value(value_buffer, frame.field_id, frame.annotations)
    }

    /// Writes the version marker (if one is owed) and all buffered top-level values to the
    /// output sink. Only legal at the top level.
    pub fn flush(&mut self) -> IonResult<()> {
        self.flush_with_preamble(&[])
    }

    /// Like [RawBinaryWriter::flush], but splices `preamble` between the version marker and
    /// the buffered values. The application-level writer uses this to place an encoded
    /// symbol table ahead of the values that depend on it.
    pub(crate) fn flush_with_preamble(&mut self, preamble: &[u8]) -> IonResult<()> {
        if !self.containers.is_empty() {
            return illegal_operation("flush called while a container was still open");
        }
        if self.ivm_needed {
            self.output.write_all(&IVM)?;
            self.ivm_needed = false;
        }
        self.output.write_all(preamble)?;
        self.output.write_all(&self.top_level)?;
        self.top_level.clear();
        self.output.flush()?;
        Ok(())
    }

    /// Suppresses the version marker this writer would otherwise emit ahead of its next
    /// flush. Used when the encoded output will be embedded in another stream.
    pub(crate) fn omit_version_marker(&mut self) {
        self.ivm_needed = false;
    }

    /// Consumes the writer, returning the output sink.
    pub fn into_output(self) -> W {
        self.output
    }

    /// Flushes buffered data and seals the stream: if more values are written afterwards,
    /// they will be preceded by a fresh version marker.
    pub fn finish(&mut self) -> IonResult<()> {
        self.flush()?;
        self.ivm_needed = true;
        Ok(())
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    pub fn output_mut(&mut self) -> &mut W {
        &mut self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn written_by<F>(write_fn: F) -> Vec<u8>
    where
        F: FnOnce(&mut RawBinaryWriter<&mut Vec<u8>>) -> IonResult<()>,
    {
        let mut output = Vec::new();
        let mut writer = RawBinaryWriter::new(&mut output);
        write_fn(&mut writer).expect("write failed");
        writer.flush().expect("flush failed");
        drop(writer);
        output
    }

    #[test]
    fn single_int_with_version_marker() {
        let bytes = written_by(|writer| writer.write_i64(5));
        assert_eq!(bytes, vec![0xE0, 0x01, 0x00, 0xEA, 0x21, 0x05]);
    }

    #[test]
    fn negative_int_and_zero() {
        let bytes = written_by(|writer| {
            writer.write_i64(-5)?;
            writer.write_i64(0)
        });
        assert_eq!(bytes, vec![0xE0, 0x01, 0x00, 0xEA, 0x31, 0x05, 0x20]);
    }

    #[test]
    fn nulls_bools_and_floats() {
        let bytes = written_by(|writer| {
            writer.write_null(IonType::String)?;
            writer.write_bool(true)?;
            writer.write_f64(0.0)
        });
        assert_eq!(bytes, vec![0xE0, 0x01, 0x00, 0xEA, 0x8F, 0x11, 0x40]);
    }

    #[test]
    fn negative_zero_float_is_not_compacted() {
        let bytes = written_by(|writer| writer.write_f64(-0.0));
        assert_eq!(
            bytes,
            vec![0xE0, 0x01, 0x00, 0xEA, 0x48, 0x80, 0, 0, 0, 0, 0, 0, 0]
        );
    }

    #[test]
    fn string_and_symbol() {
        let bytes = written_by(|writer| {
            writer.write_string("foo")?;
            writer.write_symbol_id(10)
        });
        assert_eq!(
            bytes,
            vec![0xE0, 0x01, 0x00, 0xEA, 0x83, 0x66, 0x6F, 0x6F, 0x71, 0x0A]
        );
    }

    #[test]
    fn nested_lists() {
        // [[1, 2, 3], [4, 5]]
        let bytes = written_by(|writer| {
            writer.step_in(IonType::List)?;
            writer.step_in(IonType::List)?;
            writer.write_i64(1)?;
            writer.write_i64(2)?;
            writer.write_i64(3)?;
            writer.step_out()?;
            writer.step_in(IonType::List)?;
            writer.write_i64(4)?;
            writer.write_i64(5)?;
            writer.step_out()?;
            writer.step_out()
        });
        assert_eq!(
            bytes,
            vec![
                0xE0, 0x01, 0x00, 0xEA, //
                0xBC, // outer list, 12 bytes
                0xB6, 0x21, 0x01, 0x21, 0x02, 0x21, 0x03, // [1, 2, 3]
                0xB4, 0x21, 0x04, 0x21, 0x05, // [4, 5]
            ]
        );
    }

    #[test]
    fn struct_fields_require_names() {
        let mut output = Vec::new();
        let mut writer = RawBinaryWriter::new(&mut output);
        writer.step_in(IonType::Struct).unwrap();
        assert!(writer.write_i64(1).is_err());
    }

    #[test]
    fn field_names_are_rejected_outside_structs() {
        let mut output = Vec::new();
        let mut writer = RawBinaryWriter::new(&mut output);
        writer.set_field_id(4);
        assert!(writer.write_i64(1).is_err());
    }

    #[test]
    fn struct_with_fields() {
        // {$4: "a", $5: 1}
        let bytes = written_by(|writer| {
            writer.step_in(IonType::Struct)?;
            writer.set_field_id(4);
            writer.write_string("a")?;
            writer.set_field_id(5);
            writer.write_i64(1)?;
            writer.step_out()
        });
        assert_eq!(
            bytes,
            vec![
                0xE0, 0x01, 0x00, 0xEA, //
                0xD6, 0x84, 0x81, 0x61, 0x85, 0x21, 0x01,
            ]
        );
    }

    #[test]
    fn annotated_value() {
        // $10::7
        let bytes = written_by(|writer| {
            writer.set_annotation_ids([10]);
            writer.write_i64(7)
        });
        assert_eq!(
            bytes,
            vec![0xE0, 0x01, 0x00, 0xEA, 0xE4, 0x81, 0x8A, 0x21, 0x07]
        );
    }

    #[test]
    fn annotated_container() {
        // $10::[1]
        let bytes = written_by(|writer| {
            writer.set_annotation_ids([10]);
            writer.step_in(IonType::List)?;
            writer.write_i64(1)?;
            writer.step_out()
        });
        assert_eq!(
            bytes,
            vec![0xE0, 0x01, 0x00, 0xEA, 0xE5, 0x81, 0x8A, 0xB2, 0x21, 0x01]
        );
    }

    #[test]
    fn long_container_uses_a_varuint_length() {
        let bytes = written_by(|writer| {
            writer.step_in(IonType::List)?;
            for _ in 0..7 {
                writer.write_i64(1)?;
            }
            writer.step_out()
        });
        // 7 two-byte ints = 14 bytes of body, which exceeds the inline maximum of 13
        assert_eq!(bytes[4], 0xBE);
        assert_eq!(bytes[5], 0x8E);
        assert_eq!(bytes.len(), 4 + 2 + 14);
    }

    #[test]
    fn finish_starts_a_new_stream() -> IonResult<()> {
        let mut output = Vec::new();
        let mut writer = RawBinaryWriter::new(&mut output);
        writer.write_i64(1)?;
        writer.finish()?;
        writer.write_i64(2)?;
        writer.flush()?;
        drop(writer);
        assert_eq!(
            output,
            vec![
                0xE0, 0x01, 0x00, 0xEA, 0x21, 0x01, //
                0xE0, 0x01, 0x00, 0xEA, 0x21, 0x02,
            ]
        );
        Ok(())
    }

    #[test]
    fn flush_inside_a_container_is_rejected() {
        let mut output = Vec::new();
        let mut writer = RawBinaryWriter::new(&mut output);
        writer.step_in(IonType::List).unwrap();
        assert!(writer.flush().is_err());
    }
}
