//! Literal rules for strings, integers and floats.
//!
//! The lexer only classifies a run of characters; everything here decides
//! whether the run is well formed and converts it.

use crate::error::{Error, Result, USAGE_ESCAPE, USAGE_FLOAT_RANGE, USAGE_INTEGER_RANGE};
use std::num::IntErrorKind;

const SPECIAL_FLOATS: &[&str] = &["nan", "+nan", "-nan", "inf", "+inf", "-inf"];

/// Every `_` must follow a hex digit, and the text must end in one.
fn underscores_ok(s: &str) -> bool {
    if SPECIAL_FLOATS.contains(&s) {
        return true;
    }
    let mut accept = false;
    for c in s.chars() {
        if c == '_' && !accept {
            return false;
        }
        accept = c.is_ascii_hexdigit();
    }
    accept
}

/// A `.` must be followed by a digit.
fn periods_ok(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes
        .iter()
        .enumerate()
        .filter(|(_, &b)| b == b'.')
        .all(|(i, _)| bytes.get(i + 1).map_or(false, u8::is_ascii_digit))
}

fn has_leading_zero(s: &str) -> bool {
    let b = s.as_bytes();
    if b.len() > 1 && b[0] == b'0' && !matches!(b[1], b'b' | b'o' | b'x') {
        return true;
    }
    b.len() > 2 && matches!(b[0], b'+' | b'-') && b[1] == b'0'
}

fn digits_ok(digits: &str, radix: u32) -> bool {
    let unsigned = match radix {
        10 => digits.strip_prefix(['+', '-']).unwrap_or(digits),
        _ => digits,
    };
    !unsigned.is_empty() && unsigned.chars().all(|c| c.is_digit(radix))
}

/// Parses an integer literal (`+99`, `1_000`, `0xdead_beef`, `0o755`, `0b1010`).
pub(crate) fn parse_integer(text: &str) -> Result<i64> {
    if !underscores_ok(text) {
        return Err(Error::literal(format!(
            "invalid use of '_' in integer {text:?}: underscores must be surrounded by digits"
        )));
    }
    if has_leading_zero(text) {
        return Err(Error::literal(format!(
            "invalid integer {text:?}: leading zeros are not allowed"
        )));
    }

    let cleaned = text.replace('_', "");
    let (radix, digits) = match cleaned.get(..2) {
        Some("0x") => (16, &cleaned[2..]),
        Some("0o") => (8, &cleaned[2..]),
        Some("0b") => (2, &cleaned[2..]),
        _ => (10, cleaned.as_str()),
    };
    if !digits_ok(digits, radix) {
        return Err(Error::literal(format!("invalid integer {text:?}")));
    }

    match i64::from_str_radix(digits, radix) {
        Ok(n) => Ok(n),
        Err(e) if matches!(e.kind(), IntErrorKind::PosOverflow | IntErrorKind::NegOverflow) => {
            Err(Error::literal(format!("{text} is out of range for i64"))
                .with_usage_text(USAGE_INTEGER_RANGE))
        }
        Err(e) => Err(Error::bug(format!(
            "expected integer value, but got {text:?}: {e}"
        ))),
    }
}

/// `sign? digits ('.' digits)? ([eE] sign? digits)?`
fn float_grammar_ok(s: &str) -> bool {
    let b = s.as_bytes();
    let digits_from = |i: usize| b[i..].iter().take_while(|c| c.is_ascii_digit()).count();

    let mut i = usize::from(matches!(b.first(), Some(b'+' | b'-')));
    let n = digits_from(i);
    if n == 0 {
        return false;
    }
    i += n;
    if b.get(i) == Some(&b'.') {
        i += 1;
        let n = digits_from(i);
        if n == 0 {
            return false;
        }
        i += n;
    }
    if matches!(b.get(i), Some(b'e' | b'E')) {
        i += 1;
        if matches!(b.get(i), Some(b'+' | b'-')) {
            i += 1;
        }
        let n = digits_from(i);
        if n == 0 {
            return false;
        }
        i += n;
    }
    i == b.len()
}

/// Parses a float literal, including `inf` and `nan` in all their signs.
pub(crate) fn parse_float(text: &str) -> Result<f64> {
    match text {
        "nan" | "+nan" => return Ok(f64::NAN),
        "-nan" => return Ok(-f64::NAN),
        "inf" | "+inf" => return Ok(f64::INFINITY),
        "-inf" => return Ok(f64::NEG_INFINITY),
        _ => {}
    }

    if text.split(['.', 'e', 'E']).any(|part| !underscores_ok(part)) {
        return Err(Error::literal(format!(
            "invalid float {text:?}: underscores must be surrounded by digits"
        )));
    }
    if !periods_ok(text) {
        return Err(Error::literal(format!(
            "invalid float {text:?}: '.' must be followed by one or more digits"
        )));
    }
    let integral = text.split(['.', 'e', 'E']).next().unwrap_or(text);
    if has_leading_zero(integral) {
        return Err(Error::literal(format!(
            "invalid float {text:?}: leading zeros are not allowed"
        )));
    }

    let cleaned = text.replace('_', "");
    if !float_grammar_ok(&cleaned) {
        return Err(Error::literal(format!("invalid float {text:?}")));
    }
    match cleaned.parse::<f64>() {
        Ok(f) if f.is_infinite() => Err(Error::literal(format!(
            "{text} is out of range for f64"
        ))
        .with_usage_text(USAGE_FLOAT_RANGE)),
        Ok(f) => Ok(f),
        Err(e) => Err(Error::bug(format!(
            "expected float value, but got {text:?}: {e}"
        ))),
    }
}

/// Removes a newline immediately following the opening delimiter.
pub(crate) fn strip_leading_newline(s: &str) -> &str {
    s.strip_prefix("\r\n")
        .or_else(|| s.strip_prefix('\n'))
        .unwrap_or(s)
}

/// Removes line-ending backslashes along with the whitespace and newlines
/// that follow them, up to the next non-whitespace character.
pub(crate) fn strip_escaped_newlines(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = String::with_capacity(s.len());
    let mut last = 0;
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'\\' {
            i += 1;
            continue;
        }
        if bytes.get(i + 1) == Some(&b'\\') {
            i += 2;
            continue;
        }
        let mut j = i + 1;
        while matches!(bytes.get(j), Some(b' ' | b'\t')) {
            j += 1;
        }
        let at_newline = match bytes.get(j) {
            Some(b'\n') => true,
            Some(b'\r') => bytes.get(j + 1) == Some(&b'\n'),
            _ => false,
        };
        if !at_newline {
            i += 1;
            continue;
        }
        while matches!(bytes.get(j), Some(b' ' | b'\t' | b'\n' | b'\r')) {
            j += 1;
        }
        out.push_str(&s[last..i]);
        last = j;
        i = j;
    }
    out.push_str(&s[last..]);
    out
}

fn invalid_escape(c: Option<char>) -> Error {
    let shown = c.map_or_else(|| "end of string".to_string(), |c| format!("{c:?}"));
    Error::literal(format!(
        "invalid escape character {shown}; only the following escape characters are allowed: \
         \\b, \\t, \\n, \\f, \\r, \\\", \\\\, \\uXXXX, and \\UXXXXXXXX"
    ))
    .with_usage_text(USAGE_ESCAPE)
}

fn hex_escape(chars: &mut std::str::Chars<'_>, len: usize, kind: char) -> Result<char> {
    let hex: String = chars.by_ref().take(len).collect();
    if hex.len() != len || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(Error::literal(format!(
            "invalid escape sequence \\{kind}{hex}: expected {len} hexadecimal digits"
        ))
        .with_usage_text(USAGE_ESCAPE));
    }
    let code = u32::from_str_radix(&hex, 16).map_err(|e| Error::bug(e.to_string()))?;
    char::from_u32(code).ok_or_else(|| {
        Error::literal(format!(
            "escaped character '\\{kind}{hex}' is not a valid Unicode scalar value"
        ))
    })
}

/// Replaces escape sequences in the body of a basic string.
///
/// `\e` and `\xHH` are only recognized when `extended` is set.
pub(crate) fn unescape(s: &str, extended: bool) -> Result<String> {
    if !s.contains('\\') {
        return Ok(s.to_string());
    }
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let escaped = match chars.next() {
            Some('b') => '\u{8}',
            Some('t') => '\t',
            Some('n') => '\n',
            Some('f') => '\u{c}',
            Some('r') => '\r',
            Some('"') => '"',
            Some('\\') => '\\',
            Some('e') if extended => '\u{1b}',
            Some('x') if extended => hex_escape(&mut chars, 2, 'x')?,
            Some('u') => hex_escape(&mut chars, 4, 'u')?,
            Some('U') => hex_escape(&mut chars, 8, 'U')?,
            other => return Err(invalid_escape(other)),
        };
        out.push(escaped);
    }
    Ok(out)
}
