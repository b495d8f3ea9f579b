//! Quoting rules for variable values.
//!
//! `upsd` sends values as double-quoted strings with C-style backslash
//! escapes, e.g. `VAR ups1 ups.mfr "American Power Conversion"`.

use thiserror::Error;

/// Errors produced while unquoting a value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnquoteError {
    /// Value is not wrapped in double quotes.
    #[error("value is not double-quoted")]
    MissingQuotes,

    /// Unescaped quote or newline inside the value.
    #[error("unescaped {0:?} inside quoted value")]
    Unescaped(char),

    /// Unknown escape sequence.
    #[error("invalid escape sequence '\\{0}'")]
    InvalidEscape(char),

    /// Escape sequence cut short by the end of the value.
    #[error("truncated escape sequence")]
    TruncatedEscape,

    /// Numeric escape outside the allowed range.
    #[error("escape value out of range: {0}")]
    OutOfRange(String),

    /// Decoded bytes are not valid UTF-8.
    #[error("value is not valid UTF-8")]
    InvalidUtf8,
}

/// Remove the surrounding quotes from `input` and resolve its escapes.
///
/// Accepts `\a \b \f \n \r \t \v \\ \"`, `\xHH`, three-digit octal `\ooo`,
/// `\uHHHH` and `\UHHHHHHHH`.
///
/// # Examples
///
/// ```
/// use nut_exporter::protocol::unquote;
///
/// assert_eq!(unquote(r#""Back-UPS \"ES\" 700""#).unwrap(), r#"Back-UPS "ES" 700"#);
/// assert!(unquote("100").is_err());
/// ```
pub fn unquote(input: &str) -> Result<String, UnquoteError> {
    let body = input
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .ok_or(UnquoteError::MissingQuotes)?;

    // Fast path: nothing to resolve.
    if !body.contains(['\\', '"', '\n']) {
        return Ok(body.to_string());
    }

    let mut out: Vec<u8> = Vec::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        match c {
            '"' | '\n' => return Err(UnquoteError::Unescaped(c)),
            '\\' => {
                let escape = chars.next().ok_or(UnquoteError::TruncatedEscape)?;
                match escape {
                    'a' => out.push(0x07),
                    'b' => out.push(0x08),
                    'f' => out.push(0x0c),
                    'n' => out.push(b'\n'),
                    'r' => out.push(b'\r'),
                    't' => out.push(b'\t'),
                    'v' => out.push(0x0b),
                    '\\' => out.push(b'\\'),
                    '"' => out.push(b'"'),
                    'x' => {
                        let byte = take_radix(&mut chars, 2, 16)?;
                        out.push(byte as u8);
                    }
                    '0'..='7' => {
                        let rest = take_radix(&mut chars, 2, 8)?;
                        let value = (escape as u32 - '0' as u32) * 64 + rest;
                        if value > 0xff {
                            return Err(UnquoteError::OutOfRange(format!("\\{escape}{rest:02o}")));
                        }
                        out.push(value as u8);
                    }
                    'u' | 'U' => {
                        let digits = if escape == 'u' { 4 } else { 8 };
                        let code = take_radix(&mut chars, digits, 16)?;
                        let decoded = char::from_u32(code)
                            .ok_or_else(|| UnquoteError::OutOfRange(format!("U+{code:X}")))?;
                        push_char(&mut out, decoded);
                    }
                    other => return Err(UnquoteError::InvalidEscape(other)),
                }
            }
            other => push_char(&mut out, other),
        }
    }

    String::from_utf8(out).map_err(|_| UnquoteError::InvalidUtf8)
}

/// Wrap `value` in double quotes, escaping backslashes, quotes and control
/// characters so that [`unquote`] restores it.
pub fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_ascii_control() => out.push_str(&format!("\\x{:02x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn take_radix(
    chars: &mut std::str::Chars<'_>,
    count: usize,
    radix: u32,
) -> Result<u32, UnquoteError> {
    let mut value = 0u32;
    for _ in 0..count {
        let c = chars.next().ok_or(UnquoteError::TruncatedEscape)?;
        let digit = c.to_digit(radix).ok_or(UnquoteError::InvalidEscape(c))?;
        value = value * radix + digit;
    }
    Ok(value)
}

fn push_char(out: &mut Vec<u8>, c: char) {
    let mut buf = [0u8; 4];
    out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
}
