//! Record codec
//!
//! Encoding and decoding of transaction log lines.
//!
//! ## Line Format
//! ```text
//! <id>\t<type>\t<"key">\t<"value">\n
//! ```
//! - `id`: decimal u64
//! - `type`: `1` = Delete, `2` = Put
//! - key and value are double-quoted with backslash escapes, so tabs and
//!   newlines inside them never break the framing. Back-quoted raw strings
//!   are accepted on read.

use crate::error::{KvError, Result};

use super::{Event, EventType};

/// Separator between the four fields of a record
pub const FIELD_SEPARATOR: char = '\t';

// =============================================================================
// Record Encoding/Decoding
// =============================================================================

/// Encode an event as one newline-terminated log line
///
/// Trailing whitespace of the value is trimmed before writing.
pub fn encode_event(event: &Event) -> String {
    format!(
        "{}{sep}{}{sep}{}{sep}{}\n",
        event.id,
        event.kind.code(),
        quote(&event.key),
        quote(event.value.trim_end()),
        sep = FIELD_SEPARATOR,
    )
}

/// Decode one log line (without its line terminator)
///
/// `line_no` is only used to locate the failure in the returned error.
pub fn decode_event(line: &str, line_no: u64) -> Result<Event> {
    let malformed = |reason: String| KvError::MalformedRecord {
        line: line_no,
        reason,
    };

    let (id_field, rest) = line
        .split_once(FIELD_SEPARATOR)
        .ok_or_else(|| malformed("missing event type".to_string()))?;
    let id: u64 = id_field
        .parse()
        .map_err(|e| malformed(format!("invalid ID {:?}: {}", id_field, e)))?;

    let (kind_field, rest) = rest
        .split_once(FIELD_SEPARATOR)
        .ok_or_else(|| malformed("missing key".to_string()))?;
    let kind = kind_field
        .parse::<u8>()
        .ok()
        .and_then(EventType::from_code)
        .ok_or_else(|| malformed(format!("unknown event type {:?}", kind_field)))?;

    let (key, rest) = parse_quoted(rest).map_err(malformed)?;
    let rest = rest
        .strip_prefix(FIELD_SEPARATOR)
        .ok_or_else(|| malformed("missing value".to_string()))?;
    let (value, rest) = parse_quoted(rest).map_err(malformed)?;

    if !rest.is_empty() {
        return Err(malformed(format!("unexpected trailing data {:?}", rest)));
    }
    if key.is_empty() {
        return Err(malformed("empty key".to_string()));
    }

    Ok(Event {
        id,
        kind,
        key,
        value,
    })
}

// =============================================================================
// Quoted Strings
// =============================================================================

/// Double-quote a string, escaping quotes, backslashes and non-printables
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\x07' => out.push_str("\\a"),
            '\x08' => out.push_str("\\b"),
            '\x0c' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\x0b' => out.push_str("\\v"),
            c if is_printable(c) => out.push(c),
            c if (c as u32) < 0x80 => out.push_str(&format!("\\x{:02x}", c as u32)),
            c if (c as u32) < 0x10000 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push_str(&format!("\\U{:08x}", c as u32)),
        }
    }
    out.push('"');
    out
}

/// Parse a quoted string at the start of `input`
///
/// Returns the decoded string and the unconsumed remainder.
pub fn parse_quoted(input: &str) -> std::result::Result<(String, &str), String> {
    match input.chars().next() {
        Some('"') => parse_interpreted(&input[1..]),
        Some('`') => {
            let body = &input[1..];
            let end = body
                .find('`')
                .ok_or_else(|| "unterminated raw string".to_string())?;
            Ok((body[..end].to_string(), &body[end + 1..]))
        }
        Some(c) => Err(format!("expected quoted string, found {:?}", c)),
        None => Err("expected quoted string, found end of line".to_string()),
    }
}

/// Body of a double-quoted string, after the opening quote
fn parse_interpreted(body: &str) -> std::result::Result<(String, &str), String> {
    // \x and octal escapes produce raw bytes, so decode into bytes first
    let mut bytes: Vec<u8> = Vec::with_capacity(body.len());
    let mut chars = body.char_indices();

    while let Some((i, c)) = chars.next() {
        match c {
            '"' => {
                let decoded = String::from_utf8(bytes)
                    .map_err(|_| "quoted string is not valid UTF-8".to_string())?;
                return Ok((decoded, &body[i + 1..]));
            }
            '\\' => {
                let (_, escape) = chars
                    .next()
                    .ok_or_else(|| "unterminated escape sequence".to_string())?;
                match escape {
                    'a' => bytes.push(0x07),
                    'b' => bytes.push(0x08),
                    'f' => bytes.push(0x0c),
                    'n' => bytes.push(b'\n'),
                    'r' => bytes.push(b'\r'),
                    't' => bytes.push(b'\t'),
                    'v' => bytes.push(0x0b),
                    '\\' => bytes.push(b'\\'),
                    '"' => bytes.push(b'"'),
                    'x' => bytes.push(take_digits(&mut chars, 2, 16)? as u8),
                    'u' => push_char(&mut bytes, take_digits(&mut chars, 4, 16)?)?,
                    'U' => push_char(&mut bytes, take_digits(&mut chars, 8, 16)?)?,
                    '0'..='7' => {
                        let high = escape.to_digit(8).unwrap_or(0);
                        let low = take_digits(&mut chars, 2, 8)?;
                        let value = high * 64 + low;
                        if value > 0xff {
                            return Err(format!("octal escape \\{:o} out of range", value));
                        }
                        bytes.push(value as u8);
                    }
                    other => return Err(format!("unknown escape sequence \\{}", other)),
                }
            }
            '\n' => return Err("newline inside quoted string".to_string()),
            c => {
                let mut buf = [0u8; 4];
                bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            }
        }
    }

    Err("unterminated quoted string".to_string())
}

fn take_digits(
    chars: &mut std::str::CharIndices<'_>,
    count: usize,
    radix: u32,
) -> std::result::Result<u32, String> {
    let mut value = 0u32;
    for _ in 0..count {
        let digit = chars
            .next()
            .and_then(|(_, c)| c.to_digit(radix))
            .ok_or_else(|| format!("escape needs {} base-{} digits", count, radix))?;
        value = value * radix + digit;
    }
    Ok(value)
}

fn push_char(bytes: &mut Vec<u8>, code: u32) -> std::result::Result<(), String> {
    let c = char::from_u32(code).ok_or_else(|| format!("invalid code point U+{:X}", code))?;
    let mut buf = [0u8; 4];
    bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
    Ok(())
}

fn is_printable(c: char) -> bool {
    c == ' ' || !(c.is_control() || c.is_whitespace())
}
