//! Error types for TOML parsing, decoding and encoding.
//!
//! Every failure surfaces as a single [`Error`]. The error carries a short
//! message (its [`ErrorKind`]), an optional block of usage guidance, the
//! [`Position`] of the offending bytes, the last key path that was completed
//! before the failure, and the original document text so that an annotated
//! excerpt can be produced on demand.
//!
//! ## Error Categories
//!
//! - **Lexical errors**: control characters, unterminated strings or tables
//! - **Structural errors**: duplicate keys, conflicting table definitions
//! - **Literal errors**: malformed numbers, datetimes or escape sequences
//! - **Type mismatches**: the document value does not fit the destination
//! - **Range errors**: the value does not fit the destination's width
//!
//! ## Rendering
//!
//! ```rust
//! let err = tomldec::parse("a = 1\na = 2").unwrap_err();
//!
//! // Message only.
//! assert_eq!(
//!     err.to_string(),
//!     r#"toml: line 2 (last key "a"): Key 'a' has already been defined."#
//! );
//!
//! // Message with the surrounding source lines.
//! assert!(err.with_position().contains("2 | a = 2"));
//! ```

use crate::key::Key;
use crate::position::{expand_tab, Position};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

pub(crate) const USAGE_INTEGER_RANGE: &str = "\
This number is too large; this may be an error in the TOML, but it can also be a
bug in the program that uses too small of an integer.

The maximum and minimum values are:

    size   │ lowest         │ highest
    ───────┼────────────────┼──────────────
    i8     │ -128           │ 127
    i16    │ -32,768        │ 32,767
    i32    │ -2,147,483,648 │ 2,147,483,647
    i64    │ -9.2 × 10¹⁷    │ 9.2 × 10¹⁷
    u8     │ 0              │ 255
    u16    │ 0              │ 65,535
    u32    │ 0              │ 4,294,967,295
    u64    │ 0              │ 1.8 × 10¹⁸

Integers in a TOML document are always 64-bit signed values.
";

pub(crate) const USAGE_FLOAT_RANGE: &str = "\
Floats are 64-bit IEEE-754 values. A destination of type f32 holds values up to
±3.4028235 × 10³⁸, and integers assigned to a float destination must lie within
±2²⁴ (f32) or ±2⁵³ (f64) to be represented exactly.
";

pub(crate) const USAGE_DATETIME: &str = "\
A TOML datetime must be in one of the following formats:

    2006-01-02T15:04:05Z07:00   Date and time, with timezone.
    2006-01-02T15:04:05         Date and time, but without timezone.
    2006-01-02                  Date without a time or timezone.
    15:04:05                    Just a time, without any timezone.

Seconds may optionally have a fraction, up to nanosecond precision:

    15:04:05.123
    15:04:05.856018510

Every numeric field must be written with its leading zeros.
";

pub(crate) const USAGE_DURATION: &str = "\
A duration must be given as a string of numbers, each followed by a unit, as in
\"5m\" or \"1h30m\". Numbers may contain a fraction (\"1.5h\").

Valid units are:

    ns           nanoseconds (billionth of a second)
    us, µs, μs   microseconds (millionth of a second)
    ms           milliseconds (thousands of a second)
    s            seconds
    m            minutes
    h            hours

An integer value is read as a number of nanoseconds.
";

pub(crate) const USAGE_ESCAPE: &str = "\
Only the following escape sequences are allowed in basic strings:

    \\b  \\t  \\n  \\f  \\r  \\\"  \\\\  \\uXXXX  \\UXXXXXXXX

The extended dialect additionally allows \\e and \\xHH.
";

pub(crate) const USAGE_ENCODING: &str = "\
TOML documents must be encoded as UTF-8. A NULL byte or invalid UTF-8 sequence
usually means the file was saved as UTF-16 or another legacy encoding.
";

/// The category and short message of an [`Error`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ErrorKind {
    /// The document could not be tokenized.
    #[error("{0}")]
    Lex(String),

    /// Duplicate or conflicting keys, malformed headers, unexpected tokens.
    #[error("{0}")]
    Structure(String),

    /// A malformed or out-of-range literal.
    #[error("{0}")]
    Literal(String),

    /// The document value cannot be assigned to the destination type.
    #[error("incompatible types: TOML value has type {found}; destination has type {expected}")]
    TypeMismatch { found: String, expected: String },

    /// The value does not fit the destination's representable range.
    #[error("{value} is out of range for {target}")]
    Range { value: String, target: String },

    /// Keys in the document that the destination never consumed.
    #[error(
        "strict mode: fields in the document are missing in the target struct: {}",
        join_keys(.0)
    )]
    UnknownKeys(Vec<Key>),

    /// Message raised by a `Deserialize`/`Serialize` implementation.
    #[error("{0}")]
    Custom(String),

    /// Failure reading from or writing to an I/O stream.
    #[error("IO error: {0}")]
    Io(String),

    /// An internal invariant was violated.
    #[error("BUG: {0}")]
    Bug(String),
}

fn join_keys(keys: &[Key]) -> String {
    keys.iter()
        .map(|k| k.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone)]
struct ErrorImpl {
    kind: ErrorKind,
    usage: Option<&'static str>,
    position: Option<Position>,
    last_key: Option<Key>,
    input: Option<Arc<str>>,
}

/// The error type for every operation in this crate.
///
/// `Display` renders the message only (prefixed with the line number and the
/// last key when known). Use [`Error::with_position`] or
/// [`Error::with_usage`] for an excerpt of the document.
#[derive(Clone, Error)]
pub struct Error {
    inner: Box<ErrorImpl>,
}

impl Error {
    fn new(kind: ErrorKind) -> Self {
        Error {
            inner: Box::new(ErrorImpl {
                kind,
                usage: None,
                position: None,
                last_key: None,
                input: None,
            }),
        }
    }

    /// Creates a lexical error.
    pub fn lex(msg: impl Into<String>) -> Self {
        Error::new(ErrorKind::Lex(msg.into()))
    }

    /// Creates a structural error (duplicate keys, bad headers, ...).
    pub fn structure(msg: impl Into<String>) -> Self {
        Error::new(ErrorKind::Structure(msg.into()))
    }

    /// Creates a literal error (bad number, datetime or escape).
    pub fn literal(msg: impl Into<String>) -> Self {
        Error::new(ErrorKind::Literal(msg.into()))
    }

    /// Creates a type mismatch error.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tomldec::Error;
    ///
    /// let err = Error::type_mismatch("string", "u8");
    /// assert!(err.to_string().contains("destination has type u8"));
    /// ```
    pub fn type_mismatch(found: impl Into<String>, expected: impl Into<String>) -> Self {
        Error::new(ErrorKind::TypeMismatch {
            found: found.into(),
            expected: expected.into(),
        })
    }

    /// Creates a range error.
    pub fn range(value: impl fmt::Display, target: impl Into<String>) -> Self {
        Error::new(ErrorKind::Range {
            value: value.to_string(),
            target: target.into(),
        })
    }

    /// Creates a custom error with a display message.
    pub fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::new(ErrorKind::Custom(msg.to_string()))
    }

    /// Creates an I/O error.
    pub fn io(msg: &str) -> Self {
        Error::new(ErrorKind::Io(msg.to_string()))
    }

    pub(crate) fn bug(msg: impl Into<String>) -> Self {
        Error::new(ErrorKind::Bug(msg.into()))
    }

    pub(crate) fn unknown_keys(keys: Vec<Key>) -> Self {
        Error::new(ErrorKind::UnknownKeys(keys))
    }

    pub(crate) fn with_usage_text(mut self, usage: &'static str) -> Self {
        self.inner.usage = Some(usage);
        self
    }

    pub(crate) fn at(mut self, position: Position, input: &Arc<str>) -> Self {
        self.inner.position = Some(position);
        self.inner.input = Some(Arc::clone(input));
        self
    }

    pub(crate) fn in_key(mut self, key: &Key) -> Self {
        if self.inner.last_key.is_none() && !key.is_empty() {
            self.inner.last_key = Some(key.clone());
        }
        self
    }

    /// `true` once a key path or position has been attached.
    pub(crate) fn is_located(&self) -> bool {
        self.inner.last_key.is_some() || self.inner.position.is_some()
    }

    /// The category and message.
    #[must_use]
    pub fn kind(&self) -> &ErrorKind {
        &self.inner.kind
    }

    /// The short message, without position or key information.
    #[must_use]
    pub fn message(&self) -> String {
        self.inner.kind.to_string()
    }

    /// Long-form guidance for this class of error, if there is any.
    #[must_use]
    pub fn usage(&self) -> Option<&str> {
        self.inner.usage
    }

    /// Where in the document the error occurred.
    #[must_use]
    pub fn position(&self) -> Option<Position> {
        self.inner.position
    }

    /// The last key that was completed before the error.
    #[must_use]
    pub fn last_key(&self) -> Option<&Key> {
        self.inner.last_key.as_ref()
    }

    /// `true` for range errors raised while decoding or reading a literal.
    #[must_use]
    pub fn is_range(&self) -> bool {
        match &self.inner.kind {
            ErrorKind::Range { .. } => true,
            ErrorKind::Literal(_) => matches!(
                self.inner.usage,
                Some(USAGE_INTEGER_RANGE) | Some(USAGE_FLOAT_RANGE)
            ),
            _ => false,
        }
    }

    /// Renders the message together with the offending line, two lines of
    /// leading context and a caret marker.
    ///
    /// Falls back to the plain message when no position is known.
    #[must_use]
    pub fn with_position(&self) -> String {
        let (Some(pos), Some(input)) = (self.inner.position, self.inner.input.as_deref()) else {
            return self.to_string();
        };
        let lines: Vec<&str> = input.split('\n').collect();
        let msg = self.message();

        let mut out = String::new();
        if pos.len <= 1 {
            out.push_str(&format!(
                "toml: error: {}\n\nAt line {}, column {}:\n\n",
                msg, pos.line, pos.column
            ));
        } else {
            out.push_str(&format!(
                "toml: error: {}\n\nAt line {}, column {}-{}:\n\n",
                msg,
                pos.line,
                pos.column,
                pos.column + pos.len - 1
            ));
        }

        let line_at = |n: usize| lines.get(n - 1).map(|l| l.trim_end_matches('\r'));
        for n in pos.line.saturating_sub(2).max(1)..pos.line {
            if let Some(line) = line_at(n) {
                out.push_str(&format!("{:>7} | {}\n", n, expand_tab(line)));
            }
        }
        let current = line_at(pos.line).unwrap_or("");
        let expanded = expand_tab(current);
        let prefix: String = current.chars().take(pos.column.saturating_sub(1)).collect();
        let indent = expand_tab(&prefix).chars().count();
        out.push_str(&format!("{:>7} | {}\n", pos.line, expanded));
        out.push_str(&format!(
            "{:10}{}{}\n",
            "",
            " ".repeat(indent),
            "^".repeat(pos.len.max(1))
        ));
        out
    }

    /// Like [`Error::with_position`], followed by the usage guidance.
    #[must_use]
    pub fn with_usage(&self) -> String {
        match self.inner.usage {
            Some(usage) => format!("{}\nError help:\n\n{}", self.with_position(), usage),
            None => self.with_position(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = &self.inner;
        match (inner.position, &inner.last_key) {
            (Some(pos), Some(key)) => write!(
                f,
                "toml: line {} (last key {:?}): {}",
                pos.line,
                key.to_string(),
                inner.kind
            ),
            (Some(pos), None) => write!(f, "toml: line {}: {}", pos.line, inner.kind),
            (None, Some(key)) => write!(f, "toml: (last key {:?}): {}", key.to_string(), inner.kind),
            (None, None) => write!(f, "toml: {}", inner.kind),
        }
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Error")
            .field("kind", &self.inner.kind)
            .field("position", &self.inner.position)
            .field("last_key", &self.inner.last_key)
            .finish()
    }
}

impl serde::ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::new(ErrorKind::Custom(msg.to_string()))
    }
}

impl serde::de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::new(ErrorKind::Custom(msg.to_string()))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    fn input(s: &str) -> Arc<str> {
        Arc::from(s)
    }

    #[test]
    fn test_display_without_position() {
        let err = Error::structure("something broke");
        assert_eq!(err.to_string(), "toml: something broke");
    }

    #[test]
    fn test_display_with_key_and_line() {
        let doc = input("a = 1\nb = 2\n");
        let err = Error::literal("bad")
            .at(Position::resolve(&doc, 10, 1), &doc)
            .in_key(&Key::from(vec!["b"]));
        assert_eq!(err.to_string(), r#"toml: line 2 (last key "b"): bad"#);
    }

    #[test]
    fn test_in_key_keeps_first_key() {
        let err = Error::custom("x")
            .in_key(&Key::from(vec!["inner"]))
            .in_key(&Key::from(vec!["outer"]));
        assert_eq!(err.last_key().map(|k| k.to_string()), Some("inner".into()));
    }

    #[test]
    fn test_with_position_excerpt() {
        let doc = input("x = 1\ny = 2\nz = nope\n");
        let err = Error::structure("bad value").at(Position::resolve(&doc, 16, 4), &doc);
        let rendered = err.with_position();
        assert!(rendered.contains("At line 3, column 5-8:"));
        assert!(rendered.contains("      1 | x = 1"));
        assert!(rendered.contains("      3 | z = nope"));
        assert!(rendered.lines().any(|l| l.trim_end() == format!("{:14}^^^^", "")));
    }

    #[test]
    fn test_with_position_expands_tabs() {
        let doc = input("\tk = @\n");
        let err = Error::lex("unexpected").at(Position::resolve(&doc, 5, 1), &doc);
        let rendered = err.with_position();
        let caret = rendered.lines().last().unwrap();
        // Tab expands to 8 columns, then "k = " is 4 more.
        assert_eq!(caret.find('^'), Some(10 + 12));
    }

    #[test]
    fn test_with_usage_appends_help() {
        let doc = input("n = 99999999999999999999\n");
        let err = Error::literal("out of range")
            .with_usage_text(USAGE_INTEGER_RANGE)
            .at(Position::resolve(&doc, 4, 20), &doc);
        assert!(err.with_usage().contains("Error help:"));
        assert!(err.is_range());
    }

    #[test]
    fn test_literal_overflow_is_range() {
        let err = crate::parse("f = 1e400").unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Literal(_)));
        assert!(err.is_range());
        let err = crate::parse("i = 99999999999999999999").unwrap_err();
        assert!(err.is_range());
        assert!(!crate::parse("f = 1e_4").unwrap_err().is_range());
    }

    #[test]
    fn test_unknown_keys_message() {
        let err = Error::unknown_keys(vec![Key::from(vec!["a", "b"]), Key::from(vec!["c"])]);
        assert!(err.to_string().ends_with("target struct: a.b, c"));
    }
}
