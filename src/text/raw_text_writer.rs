use std::io::Write;

use crate::raw_symbol_token::RawSymbolToken;
use crate::result::{encoding_error, illegal_operation, IonResult};
use crate::text::parsers::symbol::{is_identifier_character, is_identifier_start};
use crate::types::decimal::Decimal;
use crate::types::integer::Int;
use crate::types::timestamp::Timestamp;
use crate::types::IonType;

/// Configures and constructs [RawTextWriter] instances.
pub struct RawTextWriterBuilder {
    pretty_print: bool,
    indent_with_tabs: bool,
    indent_size: usize,
    escape_all_non_ascii: bool,
    compact_floats: bool,
    json_downconvert: bool,
}

impl RawTextWriterBuilder {
    /// Compact output: top-level values separated by newlines, containers on one line.
    pub fn new() -> RawTextWriterBuilder {
        RawTextWriterBuilder {
            pretty_print: false,
            indent_with_tabs: false,
            indent_size: 2,
            escape_all_non_ascii: false,
            compact_floats: false,
            json_downconvert: false,
        }
    }

    /// Human-oriented output: each container child on its own indented line.
    pub fn pretty() -> RawTextWriterBuilder {
        RawTextWriterBuilder {
            pretty_print: true,
            ..RawTextWriterBuilder::new()
        }
    }

    pub fn with_indent_size(mut self, indent_size: usize) -> Self {
        self.indent_size = indent_size;
        self
    }

    pub fn with_tabs(mut self) -> Self {
        self.indent_with_tabs = true;
        self
    }

    /// Escapes every character outside the printable ASCII range, producing 7-bit-clean
    /// output.
    pub fn with_all_non_ascii_escaped(mut self) -> Self {
        self.escape_all_non_ascii = true;
        self
    }

    /// Emits an `f64` through its `f32` representation when the round trip is lossless.
    pub fn with_compact_floats(mut self) -> Self {
        self.compact_floats = true;
        self
    }

    /// Down-converts the stream to JSON: annotations are dropped, typed nulls become
    /// `null`, s-expressions become arrays, and symbols, timestamps, and lobs become
    /// strings.
    pub fn json() -> RawTextWriterBuilder {
        RawTextWriterBuilder {
            json_downconvert: true,
            ..RawTextWriterBuilder::new()
        }
    }

    pub fn build<W: Write>(self, sink: W) -> IonResult<RawTextWriter<W>> {
        Ok(RawTextWriter {
            output: sink,
            pretty_print: self.pretty_print,
            indent_with_tabs: self.indent_with_tabs,
            indent_size: self.indent_size,
            escape_all_non_ascii: self.escape_all_non_ascii,
            compact_floats: self.compact_floats,
            json_downconvert: self.json_downconvert,
            containers: Vec::new(),
            field_name: None,
            annotations: Vec::new(),
            top_level_count: 0,
        })
    }
}

impl Default for RawTextWriterBuilder {
    fn default() -> Self {
        RawTextWriterBuilder::new()
    }
}

#[derive(Debug)]
struct TextContainerFrame {
    ion_type: IonType,
    child_count: usize,
}

/// Writes the text Ion encoding (or its JSON down-conversion) to an
/// [io::Write](std::io::Write) sink.
pub struct RawTextWriter<W: Write> {
    output: W,
    pretty_print: bool,
    indent_with_tabs: bool,
    indent_size: usize,
    escape_all_non_ascii: bool,
    compact_floats: bool,
    json_downconvert: bool,
    containers: Vec<TextContainerFrame>,
    field_name: Option<RawSymbolToken>,
    annotations: Vec<RawSymbolToken>,
    top_level_count: usize,
}

impl<W: Write> RawTextWriter<W> {
    pub fn set_field_name<S: Into<RawSymbolToken>>(&mut self, name: S) {
        self.field_name = Some(name.into());
    }

    pub fn set_annotations<I>(&mut self, annotations: I)
    where
        I: IntoIterator,
        I::Item: Into<RawSymbolToken>,
    {
        self.annotations.clear();
        self.annotations
            .extend(annotations.into_iter().map(Into::into));
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

    fn indentation(&self, depth: usize) -> String {
        if self.indent_with_tabs {
            "\t".repeat(depth)
        } else {
            " ".repeat(depth * self.indent_size)
        }
    }

    // Renders a symbol token the way its position requires: bare identifiers stay bare,
    // everything else is quoted. JSON renders every token as a double-quoted string.
    fn render_symbol_token(&self, token: &RawSymbolToken, rendered: &mut String) {
        match token {
            RawSymbolToken::SymbolId(sid) => {
                if self.json_downconvert {
                    rendered.push('"');
                    rendered.push_str(&format!("${sid}"));
                    rendered.push('"');
                } else {
                    rendered.push_str(&format!("${sid}"));
                }
            }
            RawSymbolToken::Text(text) => {
                if self.json_downconvert {
                    rendered.push('"');
                    self.escape_text(text, '"', rendered);
                    rendered.push('"');
                } else if symbol_needs_quotes(text) {
                    rendered.push('\'');
                    self.escape_text(text, '\'', rendered);
                    rendered.push('\'');
                } else {
                    rendered.push_str(text);
                }
            }
        }
    }

    fn escape_text(&self, text: &str, quote: char, rendered: &mut String) {
        for c in text.chars() {
            match c {
                '\n' => rendered.push_str("\\n"),
                '\r' => rendered.push_str("\\r"),
                '\t' => rendered.push_str("\\t"),
                '\\' => rendered.push_str("\\\\"),
                c if c == quote => {
                    rendered.push('\\');
                    rendered.push(c);
                }
                c if (c as u32) < 0x20 => {
                    if self.json_downconvert {
                        rendered.push_str(&format!("\\u{:04x}", c as u32));
                    } else {
                        rendered.push_str(&format!("\\x{:02x}", c as u32));
                    }
                }
                c if (c as u32) > 0x7E && (self.escape_all_non_ascii || self.json_downconvert) => {
                    self.escape_non_ascii(c, rendered);
                }
                c => rendered.push(c),
            }
        }
    }

    fn escape_non_ascii(&self, c: char, rendered: &mut String) {
        let code_point = c as u32;
        if code_point <= 0xFFFF {
            rendered.push_str(&format!("\\u{code_point:04x}"));
        } else if self.json_downconvert {
            // JSON has no 8-digit escape; use a surrogate pair
            let bits = code_point - 0x10000;
            let high = 0xD800 + (bits >> 10);
            let low = 0xDC00 + (bits & 0x3FF);
            rendered.push_str(&format!("\\u{high:04x}\\u{low:04x}"));
        } else {
            rendered.push_str(&format!("\\U{code_point:08x}"));
        }
    }

    // Writes everything that precedes a value's own text: the separator from the previous
    // sibling, pretty-print indentation, the field name, and the annotations.
    fn write_value_prefix(&mut self) -> IonResult<()> {
        let depth = self.containers.len();
        match self.containers.last() {
            None => {
                if self.field_name.is_some() {
                    return encoding_error("a field name can only be set inside a struct");
                }
                if self.top_level_count > 0 {
                    writeln!(self.output)?;
                }
                self.top_level_count += 1;
            }
            Some(frame) => {
                let separator = match frame.ion_type {
                    IonType::List | IonType::Struct => ",",
                    _ => "",
                };
                if frame.child_count > 0 {
                    write!(self.output, "{separator}")?;
                    if !self.pretty_print {
                        write!(self.output, " ")?;
                    }
                }
                if self.pretty_print {
                    writeln!(self.output)?;
                    let indentation = self.indentation(depth);
                    write!(self.output, "{indentation}")?;
                }
                self.containers
                    .last_mut()
                    .expect("parent frame checked above")
                    .child_count += 1;
            }
        }

        match (self.in_struct(), self.field_name.take()) {
            (true, Some(name)) => {
                let mut rendered = String::new();
                if self.json_downconvert {
                    self.render_symbol_token(&name, &mut rendered);
                } else if let RawSymbolToken::Text(text) = &name {
                    if symbol_needs_quotes(text) {
                        rendered.push('\'');
                        self.escape_text(text, '\'', &mut rendered);
                        rendered.push('\'');
                    } else {
                        rendered.push_str(text);
                    }
                } else {
                    self.render_symbol_token(&name, &mut rendered);
                }
                write!(self.output, "{rendered}: ")?;
            }
            (true, None) => {
                return encoding_error("a value written inside a struct requires a field name")
            }
            (false, Some(_)) => {
                return encoding_error("a field name can only be set inside a struct")
            }
            (false, None) => {}
        }

        let annotations = std::mem::take(&mut self.annotations);
        if !self.json_downconvert {
            for annotation in &annotations {
                let mut rendered = String::new();
                self.render_symbol_token(annotation, &mut rendered);
                write!(self.output, "{rendered}::")?;
            }
        }
        Ok(())
    }

    fn emit_value(&mut self, rendered: &str) -> IonResult<()> {
        self.write_value_prefix()?;
        write!(self.output, "{rendered}")?;
        Ok(())
    }

    pub fn write_null(&mut self, ion_type: IonType) -> IonResult<()> {
        let rendered = if self.json_downconvert {
            "null".to_string()
        } else {
            match ion_type {
                IonType::Null => "null".to_string(),
                other => format!("null.{other}"),
            }
        };
        self.emit_value(&rendered)
    }

    pub fn write_bool(&mut self, value: bool) -> IonResult<()> {
        self.emit_value(if value { "true" } else { "false" })
    }

    pub fn write_i64(&mut self, value: i64) -> IonResult<()> {
        self.emit_value(&value.to_string())
    }

    pub fn write_int(&mut self, value: &Int) -> IonResult<()> {
        self.emit_value(&value.to_string())
    }

    pub fn write_f32(&mut self, value: f32) -> IonResult<()> {
        self.write_float_text(value as f64, true)
    }

    pub fn write_f64(&mut self, value: f64) -> IonResult<()> {
        let narrowed = self.compact_floats && (value as f32) as f64 == value;
        self.write_float_text(value, narrowed)
    }

    fn write_float_text(&mut self, value: f64, narrowed: bool) -> IonResult<()> {
        let rendered = if value.is_nan() {
            if self.json_downconvert {
                "null".to_string()
            } else {
                "nan".to_string()
            }
        } else if value.is_infinite() {
            if self.json_downconvert {
                "null".to_string()
            } else if value.is_sign_positive() {
                "+inf".to_string()
            } else {
                "-inf".to_string()
            }
        } else if narrowed {
            format!("{:e}", value as f32)
        } else {
            format!("{value:e}")
        };
        self.emit_value(&rendered)
    }

    pub fn write_decimal(&mut self, value: &Decimal) -> IonResult<()> {
        let rendered = if self.json_downconvert {
            // "123." and "123d5" are not JSON numbers; coefficient-e-exponent always is
            format!("{}e{}", value.coefficient(), value.exponent())
        } else {
            value.to_string()
        };
        self.emit_value(&rendered)
    }

    pub fn write_timestamp(&mut self, value: &Timestamp) -> IonResult<()> {
        let rendered = if self.json_downconvert {
            format!("\"{value}\"")
        } else {
            value.to_string()
        };
        self.emit_value(&rendered)
    }

    pub fn write_symbol<S: Into<RawSymbolToken>>(&mut self, value: S) -> IonResult<()> {
        let token = value.into();
        let mut rendered = String::new();
        self.render_symbol_token(&token, &mut rendered);
        self.emit_value(&rendered)
    }

    pub fn write_string<S: AsRef<str>>(&mut self, value: S) -> IonResult<()> {
        let mut rendered = String::new();
        rendered.push('"');
        self.escape_text(value.as_ref(), '"', &mut rendered);
        rendered.push('"');
        self.emit_value(&rendered)
    }

    pub fn write_clob<B: AsRef<[u8]>>(&mut self, value: B) -> IonResult<()> {
        let bytes = value.as_ref();
        let rendered = if self.json_downconvert {
            format!("\"{}\"", base64::encode(bytes))
        } else {
            let mut rendered = String::from("{{\"");
            for byte in bytes {
                match byte {
                    b'\n' => rendered.push_str("\\n"),
                    b'\r' => rendered.push_str("\\r"),
                    b'\t' => rendered.push_str("\\t"),
                    b'"' => rendered.push_str("\\\""),
                    b'\\' => rendered.push_str("\\\\"),
                    0x20..=0x7E => rendered.push(*byte as char),
                    other => rendered.push_str(&format!("\\x{other:02x}")),
                }
            }
            rendered.push_str("\"}}");
            rendered
        };
        self.emit_value(&rendered)
    }

    pub fn write_blob<B: AsRef<[u8]>>(&mut self, value: B) -> IonResult<()> {
        let encoded = base64::encode(value.as_ref());
        let rendered = if self.json_downconvert {
            format!("\"{encoded}\"")
        } else {
            format!("{{{{{encoded}}}}}")
        };
        self.emit_value(&rendered)
    }

    pub fn step_in(&mut self, container_type: IonType) -> IonResult<()> {
        let opening = match container_type {
            IonType::List => "[",
            IonType::SExp if self.json_downconvert => "[",
            IonType::SExp => "(",
            IonType::Struct => "{",
            other => return illegal_operation(format!("cannot step into a(n) {other}")),
        };
        self.write_value_prefix()?;
        write!(self.output, "{opening}")?;
        self.containers.push(TextContainerFrame {
            ion_type: container_type,
            child_count: 0,
        });
        Ok(())
    }

    pub fn step_out(&mut self) -> IonResult<()> {
        let frame = match self.containers.pop() {
            Some(frame) => frame,
            None => return illegal_operation("cannot step out of the top level"),
        };
        let closing = match frame.ion_type {
            IonType::List => "]",
            IonType::SExp if self.json_downconvert => "]",
            IonType::SExp => ")",
            _ => "}",
        };
        if self.pretty_print && frame.child_count > 0 {
            writeln!(self.output)?;
            let indentation = self.indentation(self.containers.len());
            write!(self.output, "{indentation}")?;
        }
        write!(self.output, "{closing}")?;
        Ok(())
    }

    /// Emits a literal `$ion_1_0` version marker as its own top-level token. Only legal at
    /// the top level, with no pending field name or annotations.
    pub fn write_ion_version_marker(&mut self) -> IonResult<()> {
        if !self.containers.is_empty() || self.field_name.is_some() || !self.annotations.is_empty()
        {
            return illegal_operation("a version marker can only be written between top-level values");
        }
        if self.top_level_count > 0 {
            writeln!(self.output)?;
        }
        self.top_level_count += 1;
        write!(self.output, "$ion_1_0")?;
        Ok(())
    }

    pub fn flush(&mut self) -> IonResult<()> {
        if !self.containers.is_empty() {
            return illegal_operation("flush called while a container was still open");
        }
        self.output.flush()?;
        Ok(())
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    pub fn output_mut(&mut self) -> &mut W {
        &mut self.output
    }
}

// A symbol can be written without quotes if it is a non-keyword identifier that would not be
// mistaken for a symbol ID reference or an Ion version marker.
fn symbol_needs_quotes(text: &str) -> bool {
    if matches!(text, "" | "null" | "true" | "false" | "nan") {
        return true;
    }
    let mut characters = text.chars();
    let first = characters.next().expect("emptiness checked above");
    if !is_identifier_start(first) {
        return true;
    }
    if !characters.all(is_identifier_character) {
        return true;
    }
    // `$123` would read back as a symbol ID rather than text
    if text.starts_with('$') && text[1..].bytes().all(|b| b.is_ascii_digit()) {
        return true;
    }
    // `$ion_1_0` (and friends) would read back as version markers
    text.starts_with("$ion_")
}
