//! End-to-end exercises: reading a stream, re-encoding it through either writer, and
//! confirming that the value sequence survives the trip.

use ion_cursor::{
    Decimal, Int, IonResult, IonType, IonWriter, RawSymbolToken, Reader, ReaderBuilder,
    StreamItem, Timestamp, Writer, WriterBuilder,
};

/// An owned tree of Ion values used to compare streams. Floats are compared by bit pattern
/// (so `nan` and `-0e0` survive), decimals by coefficient and exponent (so `1.0` and `1.00`
/// stay distinct), and symbols by resolved text (`None` = unknown text).
#[derive(Debug, PartialEq)]
enum TestValue {
    Null(IonType),
    Bool(bool),
    Int(Int),
    Float(u64),
    Decimal(String, i64),
    Timestamp(Timestamp),
    Symbol(Option<String>),
    String(String),
    Clob(Vec<u8>),
    Blob(Vec<u8>),
    List(Vec<TestElement>),
    SExp(Vec<TestElement>),
    Struct(Vec<(Option<String>, TestElement)>),
}

#[derive(Debug, PartialEq)]
struct TestElement {
    annotations: Vec<Option<String>>,
    value: TestValue,
}

fn read_all(reader: &mut Reader<'_>) -> IonResult<Vec<TestElement>> {
    let mut elements = Vec::new();
    while let Some(element) = read_element(reader)? {
        elements.push(element);
    }
    Ok(elements)
}

fn read_element(reader: &mut Reader<'_>) -> IonResult<Option<TestElement>> {
    let item = reader.next()?;
    if item == StreamItem::Nothing {
        return Ok(None);
    }
    Ok(Some(read_positioned_element(reader, item)?))
}

// Reads the element the reader is already positioned on.
fn read_positioned_element(
    reader: &mut Reader<'_>,
    item: StreamItem,
) -> IonResult<TestElement> {
    let annotations = reader
        .annotations()?
        .iter()
        .map(|symbol| symbol.text().map(str::to_string))
        .collect();
    let value = match item {
        StreamItem::Null(_) => TestValue::Null(reader.read_null()?),
        StreamItem::Value(IonType::Bool) => TestValue::Bool(reader.read_bool()?),
        StreamItem::Value(IonType::Int) => TestValue::Int(reader.read_int()?),
        StreamItem::Value(IonType::Float) => TestValue::Float(reader.read_f64()?.to_bits()),
        StreamItem::Value(IonType::Decimal) => {
            let decimal = reader.read_decimal()?;
            TestValue::Decimal(decimal.coefficient().to_string(), decimal.exponent())
        }
        StreamItem::Value(IonType::Timestamp) => {
            TestValue::Timestamp(reader.read_timestamp()?)
        }
        StreamItem::Value(IonType::Symbol) => {
            TestValue::Symbol(reader.read_symbol()?.text().map(str::to_string))
        }
        StreamItem::Value(IonType::String) => TestValue::String(reader.read_string()?),
        StreamItem::Value(IonType::Clob) => TestValue::Clob(reader.read_clob()?),
        StreamItem::Value(IonType::Blob) => TestValue::Blob(reader.read_blob()?),
        StreamItem::Value(IonType::List) => {
            reader.step_in()?;
            let children = read_all_children(reader)?;
            reader.step_out()?;
            TestValue::List(children)
        }
        StreamItem::Value(IonType::SExp) => {
            reader.step_in()?;
            let children = read_all_children(reader)?;
            reader.step_out()?;
            TestValue::SExp(children)
        }
        StreamItem::Value(IonType::Struct) => {
            reader.step_in()?;
            let mut fields = Vec::new();
            loop {
                let child_item = reader.next()?;
                if child_item == StreamItem::Nothing {
                    break;
                }
                let name = reader.field_name()?.text().map(str::to_string);
                let element = read_positioned_element(reader, child_item)?;
                fields.push((name, element));
            }
            reader.step_out()?;
            TestValue::Struct(fields)
        }
        StreamItem::Value(IonType::Null) | StreamItem::Nothing => {
            unreachable!("caller only passes positioned value items")
        }
    };
    Ok(TestElement { annotations, value })
}

fn read_all_children(reader: &mut Reader<'_>) -> IonResult<Vec<TestElement>> {
    let mut children = Vec::new();
    loop {
        let item = reader.next()?;
        if item == StreamItem::Nothing {
            return Ok(children);
        }
        children.push(read_positioned_element(reader, item)?);
    }
}

fn write_all<W: std::io::Write>(
    writer: &mut Writer<W>,
    elements: &[TestElement],
) -> IonResult<()> {
    for element in elements {
        write_element(writer, element)?;
    }
    writer.flush()
}

fn symbol_token(text: &Option<String>) -> RawSymbolToken {
    match text {
        Some(text) => RawSymbolToken::Text(text.clone()),
        None => RawSymbolToken::SymbolId(0),
    }
}

fn write_element<W: std::io::Write>(
    writer: &mut Writer<W>,
    element: &TestElement,
) -> IonResult<()> {
    if !element.annotations.is_empty() {
        writer.set_annotations(element.annotations.iter().map(symbol_token));
    }
    match &element.value {
        TestValue::Null(ion_type) => writer.write_null(*ion_type),
        TestValue::Bool(value) => writer.write_bool(*value),
        TestValue::Int(value) => writer.write_int(value),
        TestValue::Float(bits) => writer.write_f64(f64::from_bits(*bits)),
        TestValue::Decimal(coefficient, exponent) => {
            let decimal = if let Some(magnitude) = coefficient.strip_prefix('-') {
                if magnitude.bytes().all(|b| b == b'0') {
                    Decimal::negative_zero_with_exponent(*exponent)
                } else {
                    let value = Int::from_decimal_str(coefficient).expect("test coefficient");
                    Decimal::new(value, *exponent)
                }
            } else {
                let value = Int::from_decimal_str(coefficient).expect("test coefficient");
                Decimal::new(value, *exponent)
            };
            writer.write_decimal(&decimal)
        }
        TestValue::Timestamp(value) => writer.write_timestamp(value),
        TestValue::Symbol(text) => writer.write_symbol(symbol_token(text)),
        TestValue::String(value) => writer.write_string(value),
        TestValue::Clob(bytes) => writer.write_clob(bytes),
        TestValue::Blob(bytes) => writer.write_blob(bytes),
        TestValue::List(children) => {
            writer.step_in(IonType::List)?;
            for child in children {
                write_element(writer, child)?;
            }
            writer.step_out()
        }
        TestValue::SExp(children) => {
            writer.step_in(IonType::SExp)?;
            for child in children {
                write_element(writer, child)?;
            }
            writer.step_out()
        }
        TestValue::Struct(fields) => {
            writer.step_in(IonType::Struct)?;
            for (name, child) in fields {
                writer.set_field_name(symbol_token(name));
                write_element(writer, child)?;
            }
            writer.step_out()
        }
    }
}

fn elements_of_text(text: &str) -> Vec<TestElement> {
    let mut reader = ReaderBuilder::new()
        .build(text.to_string())
        .expect("reader construction failed");
    read_all(&mut reader).expect("reading the text corpus failed")
}

fn elements_of_bytes(bytes: Vec<u8>) -> Vec<TestElement> {
    let mut reader = ReaderBuilder::new()
        .build(bytes)
        .expect("reader construction failed");
    read_all(&mut reader).expect("reading the binary stream failed")
}

const CORPUS: &str = r#"
null
null.int
null.struct
true
false
0
-1
42
8123123123123123123123123123123123
-8123123123123123123123123123123123
0x7f
0b101
0e0
2.5e0
-2.5e-3
nan
+inf
-inf
0.
1.0
1.00
-0.0
123.456d-2
123d5
2021T
2021-02T
2021-02-03
2021-02-03T04:05Z
2021-02-03T04:05:06-08:00
2021-02-03T04:05:06.789-00:00
a_symbol
'a quoted symbol'
$0
""
"a string"
"strings with \"escapes\"\n and é accents"
'''long ''' '''strings'''
{{aGVsbG8gd29ybGQ=}}
{{"a clob"}}
[]
[1, 2, [3, 4], "five"]
()
(+ 1 (- 2 3))
{}
{a: 1, 'b c': two::2, "d": [true]}
degrees::30
several::annotations::{nested: present::true}
"#;

#[test]
fn text_values_survive_a_binary_round_trip() -> IonResult<()> {
    let original = elements_of_text(CORPUS);
    assert!(original.len() > 40);

    let mut binary_output = Vec::new();
    let mut writer = WriterBuilder::binary().build(&mut binary_output)?;
    write_all(&mut writer, &original)?;
    drop(writer);

    let reread = elements_of_bytes(binary_output);
    assert_eq!(original, reread);
    Ok(())
}

#[test]
fn text_values_survive_a_text_round_trip() -> IonResult<()> {
    let original = elements_of_text(CORPUS);

    let mut text_output = Vec::new();
    let mut writer = WriterBuilder::text().build(&mut text_output)?;
    write_all(&mut writer, &original)?;
    drop(writer);

    let rendered = String::from_utf8(text_output).expect("text output was not UTF-8");
    let reread = elements_of_text(&rendered);
    assert_eq!(original, reread);
    Ok(())
}

#[test]
fn pretty_output_reads_back_identically() -> IonResult<()> {
    let original = elements_of_text(CORPUS);

    let mut text_output = Vec::new();
    let mut writer = WriterBuilder::pretty().build(&mut text_output)?;
    write_all(&mut writer, &original)?;
    drop(writer);

    let rendered = String::from_utf8(text_output).expect("text output was not UTF-8");
    let reread = elements_of_text(&rendered);
    assert_eq!(original, reread);
    Ok(())
}

#[test]
fn binary_then_text_then_binary_is_stable() -> IonResult<()> {
    // text -> binary
    let original = elements_of_text(CORPUS);
    let mut binary_output = Vec::new();
    let mut writer = WriterBuilder::binary().build(&mut binary_output)?;
    write_all(&mut writer, &original)?;
    drop(writer);

    // binary -> text
    let from_binary = elements_of_bytes(binary_output);
    let mut text_output = Vec::new();
    let mut writer = WriterBuilder::text().build(&mut text_output)?;
    write_all(&mut writer, &from_binary)?;
    drop(writer);

    // text -> values again
    let rendered = String::from_utf8(text_output).expect("text output was not UTF-8");
    let final_elements = elements_of_text(&rendered);
    assert_eq!(original, final_elements);
    Ok(())
}

// A one-value binary stream: the version marker followed by the int 5.
#[test]
fn minimal_binary_stream_round_trips_exactly() -> IonResult<()> {
    let input: &[u8] = &[0xE0, 0x01, 0x00, 0xEA, 0x21, 0x05];
    let mut reader = ReaderBuilder::new().build(input)?;
    assert_eq!(reader.next()?, StreamItem::Value(IonType::Int));
    assert_eq!(reader.read_i64()?, 5);
    assert_eq!(reader.next()?, StreamItem::Nothing);

    let mut output = Vec::new();
    let mut writer = WriterBuilder::binary().build(&mut output)?;
    writer.write_i64(5)?;
    writer.flush()?;
    drop(writer);
    assert_eq!(output, input);
    Ok(())
}

#[test]
fn symbols_declared_in_stream_tables_resolve() -> IonResult<()> {
    let mut reader = ReaderBuilder::new()
        .build("'$ion_symbol_table'::{symbols:[\"foo\"]} foo $10 ")?;
    assert_eq!(reader.next()?, StreamItem::Value(IonType::Symbol));
    assert_eq!(reader.read_symbol()?, "foo");
    assert_eq!(reader.symbol_table().sid_for(&"foo"), Some(10));
    // $10 refers to the same text
    assert_eq!(reader.next()?, StreamItem::Value(IonType::Symbol));
    assert_eq!(reader.read_symbol()?, "foo");
    Ok(())
}

#[test]
fn decimal_exponent_notation_normalizes() -> IonResult<()> {
    let mut reader = ReaderBuilder::new().build("123.456d-2 ")?;
    assert_eq!(reader.next()?, StreamItem::Value(IonType::Decimal));
    let decimal = reader.read_decimal()?;
    assert_eq!(decimal.coefficient().to_string(), "123456");
    assert_eq!(decimal.exponent(), -5);

    let mut output = Vec::new();
    let mut writer = WriterBuilder::text().build(&mut output)?;
    writer.write_decimal(&decimal)?;
    writer.flush()?;
    drop(writer);
    assert_eq!(String::from_utf8(output).unwrap(), "1.23456");
    Ok(())
}

#[test]
fn timestamp_offsets_distinguish_equality_from_instant_equality() -> IonResult<()> {
    let mut reader =
        ReaderBuilder::new().build("2020-01-01T00:00:00Z 2020-01-01T00:00:00-00:00 ")?;
    reader.next()?;
    let in_utc = reader.read_timestamp()?;
    reader.next()?;
    let at_unknown_offset = reader.read_timestamp()?;

    assert_eq!(in_utc.offset_minutes(), Some(0));
    assert_eq!(at_unknown_offset.offset_minutes(), None);
    assert_ne!(in_utc, at_unknown_offset);
    assert!(in_utc.instant_equals(&at_unknown_offset));
    Ok(())
}

#[test]
fn symbol_tables_are_invisible_to_the_user_reader() -> IonResult<()> {
    let mut reader =
        ReaderBuilder::new().build("$ion_symbol_table::{symbols:[\"a\",\"b\"]} 42 ")?;
    // The control struct is consumed without surfacing
    assert_eq!(reader.next()?, StreamItem::Value(IonType::Int));
    assert_eq!(reader.read_i64()?, 42);
    assert_eq!(reader.next()?, StreamItem::Nothing);
    Ok(())
}

#[test]
fn nested_binary_lists_walk_correctly() -> IonResult<()> {
    let input: &[u8] = &[
        0xE0, 0x01, 0x00, 0xEA, // IVM
        0xBC, // list, 12 bytes
        0xB6, 0x21, 0x01, 0x21, 0x02, 0x21, 0x03, // [1, 2, 3]
        0xB4, 0x21, 0x04, 0x21, 0x05, // [4, 5]
    ];
    let mut reader = ReaderBuilder::new().build(input)?;
    assert_eq!(reader.next()?, StreamItem::Value(IonType::List));
    reader.step_in()?;

    let mut sublist_lengths = Vec::new();
    loop {
        match reader.next()? {
            StreamItem::Value(IonType::List) => {
                reader.step_in()?;
                let mut count = 0;
                while let StreamItem::Value(IonType::Int) = reader.next()? {
                    reader.read_i64()?;
                    count += 1;
                }
                reader.step_out()?;
                sublist_lengths.push(count);
            }
            StreamItem::Nothing => break,
            other => panic!("unexpected stream item: {other:?}"),
        }
    }
    assert_eq!(sublist_lengths, vec![3, 2]);
    reader.step_out()?;
    assert_eq!(reader.next()?, StreamItem::Nothing);
    Ok(())
}

#[test]
fn eof_is_idempotent_in_both_encodings() -> IonResult<()> {
    let mut text_reader = ReaderBuilder::new().build("1 ")?;
    text_reader.next()?;
    for _ in 0..3 {
        assert_eq!(text_reader.next()?, StreamItem::Nothing);
    }

    let mut binary_reader =
        ReaderBuilder::new().build(&[0xE0u8, 0x01, 0x00, 0xEA, 0x21, 0x01][..])?;
    binary_reader.next()?;
    for _ in 0..3 {
        assert_eq!(binary_reader.next()?, StreamItem::Nothing);
    }
    Ok(())
}

#[test]
fn json_downconversion_is_plain_json() -> IonResult<()> {
    use ion_cursor::{Format, TextKind};

    let elements = elements_of_text("a::{b: [1, 2.5e0, sym, '''text''', 2021T]} ");
    let mut output = Vec::new();
    let mut writer = WriterBuilder::new(Format::Text(TextKind::Json)).build(&mut output)?;
    write_all(&mut writer, &elements)?;
    drop(writer);
    let rendered = String::from_utf8(output).unwrap();
    assert_eq!(
        rendered,
        "{\"b\": [1, 2.5e0, \"sym\", \"text\", \"2021T\"]}"
    );
    Ok(())
}

#[test]
fn unknown_text_symbols_round_trip() -> IonResult<()> {
    let elements = elements_of_text("$0 {$0: $0} ");
    assert_eq!(elements.len(), 2);

    let mut output = Vec::new();
    let mut writer = WriterBuilder::binary().build(&mut output)?;
    write_all(&mut writer, &elements)?;
    drop(writer);
    let reread = elements_of_bytes(output);
    assert_eq!(elements, reread);
    Ok(())
}
