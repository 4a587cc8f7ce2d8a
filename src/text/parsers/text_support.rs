use nom::Needed;

use crate::text::parse_result::{fatal_parse_error, IonParseError, IonParseResult};

// The longest escape body: 'U' plus eight hex digits.
fn incomplete<T>() -> IonParseResult<'static, T> {
    Err(nom::Err::Incomplete(Needed::Unknown))
}

fn simple_escape_value(c: char) -> Option<char> {
    let value = match c {
        'n' => '\n',
        't' => '\t',
        'r' => '\r',
        '\\' => '\\',
        '"' => '"',
        '\'' => '\'',
        '/' => '/',
        '?' => '?',
        '0' => '\u{0}',
        'a' => '\u{7}',
        'b' => '\u{8}',
        'f' => '\u{c}',
        'v' => '\u{b}',
        _ => return None,
    };
    Some(value)
}

// Reads `digits` hex digits starting at byte offset `start`, returning the decoded value and
// the remaining input.
fn hex_digits(input: &str, start: usize, digits: usize) -> IonParseResult<'_, u32> {
    if input.len() < start + digits {
        return incomplete();
    }
    let hex_text = match input.get(start..start + digits) {
        Some(text) if text.bytes().all(|b| b.is_ascii_hexdigit()) => text,
        _ => return fatal_parse_error(input, "invalid digits in hex escape sequence"),
    };
    let value = u32::from_str_radix(hex_text, 16)
        .expect("hex digits were validated above");
    Ok((&input[start + digits..], value))
}

/// Parses one escape sequence (including its leading backslash) in a string or symbol,
/// returning the character it produces. Line-continuation escapes (`\` followed by a line
/// terminator) produce `None`.
pub(crate) fn escape_sequence(input: &str) -> IonParseResult<'_, Option<char>> {
    let mut characters = input.char_indices();
    match characters.next() {
        Some((_, '\\')) => {}
        Some(_) => return Err(nom::Err::Error(IonParseError::new(input))),
        None => return incomplete(),
    }
    let (offset, command) = match characters.next() {
        Some(pair) => pair,
        None => return incomplete(),
    };
    let body_start = offset + command.len_utf8();

    if let Some(value) = simple_escape_value(command) {
        return Ok((&input[body_start..], Some(value)));
    }
    match command {
        'x' => {
            let (rest, value) = hex_digits(input, body_start, 2)?;
            // \xHH names the code point U+00HH, which is always a valid char
            Ok((rest, Some(char::from_u32(value).expect("code point below 0x100"))))
        }
        'u' => {
            let (rest, value) = hex_digits(input, body_start, 4)?;
            match value {
                0xD800..=0xDBFF => {
                    // A high surrogate must be immediately followed by an escaped low
                    // surrogate; together they name one code point.
                    if rest.len() < 2 {
                        return incomplete();
                    }
                    if !rest.starts_with("\\u") {
                        return fatal_parse_error(
                            input,
                            "an escaped high surrogate must be followed by a low surrogate",
                        );
                    }
                    let after_slash_u = input.len() - rest.len() + 2;
                    let (rest, low) = hex_digits(input, after_slash_u, 4)?;
                    if !(0xDC00..=0xDFFF).contains(&low) {
                        return fatal_parse_error(
                            input,
                            "an escaped high surrogate must be followed by a low surrogate",
                        );
                    }
                    let code_point = 0x10000 + ((value - 0xD800) << 10) + (low - 0xDC00);
                    match char::from_u32(code_point) {
                        Some(c) => Ok((rest, Some(c))),
                        None => fatal_parse_error(input, "invalid escaped surrogate pair"),
                    }
                }
                0xDC00..=0xDFFF => {
                    fatal_parse_error(input, "an escaped low surrogate must follow a high surrogate")
                }
                _ => Ok((
                    rest,
                    Some(char::from_u32(value).expect("non-surrogate BMP code point")),
                )),
            }
        }
        'U' => {
            let (rest, value) = hex_digits(input, body_start, 8)?;
            match char::from_u32(value) {
                Some(c) => Ok((rest, Some(c))),
                None => fatal_parse_error(
                    input,
                    format!("\\U escape names an invalid code point: {value:#x}"),
                ),
            }
        }
        // Escaped line terminators splice the line back together, producing nothing
        '\n' => Ok((&input[body_start..], None)),
        '\r' => {
            let rest = &input[body_start..];
            if rest.is_empty() {
                // The next byte decides whether this is \<CR> or \<CRLF>
                incomplete()
            } else if let Some(rest) = rest.strip_prefix('\n') {
                Ok((rest, None))
            } else {
                Ok((rest, None))
            }
        }
        other => fatal_parse_error(input, format!("invalid escape sequence '\\{other}'")),
    }
}

/// Parses one escape sequence in a clob, where escapes must name single bytes. Returns
/// `None` for line continuations.
pub(crate) fn clob_escape_sequence(input: &str) -> IonParseResult<'_, Option<u8>> {
    let mut characters = input.char_indices();
    match characters.next() {
        Some((_, '\\')) => {}
        Some(_) => return Err(nom::Err::Error(IonParseError::new(input))),
        None => return incomplete(),
    }
    let (offset, command) = match characters.next() {
        Some(pair) => pair,
        None => return incomplete(),
    };
    let body_start = offset + command.len_utf8();

    if let Some(value) = simple_escape_value(command) {
        return Ok((&input[body_start..], Some(value as u8)));
    }
    match command {
        'x' => {
            let (rest, value) = hex_digits(input, body_start, 2)?;
            Ok((rest, Some(value as u8)))
        }
        'u' | 'U' => fatal_parse_error(input, "Unicode escapes are not legal in a clob"),
        '\n' => Ok((&input[body_start..], None)),
        '\r' => {
            let rest = &input[body_start..];
            if rest.is_empty() {
                incomplete()
            } else if let Some(rest) = rest.strip_prefix('\n') {
                Ok((rest, None))
            } else {
                Ok((rest, None))
            }
        }
        other => fatal_parse_error(input, format!("invalid escape sequence '\\{other}'")),
    }
}
