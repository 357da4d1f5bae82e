//! Tokenizer.
//!
//! The lexer walks the whole document once and produces a flat token list
//! for the parser. It tracks just enough context (top level, key, value,
//! array, inline table) to know which characters are allowed where; it
//! classifies number-like runs but leaves their validation to
//! [`crate::literal`].
//!
//! When the lexer fails, the tokens produced so far are kept together with
//! the error. The parser consumes them first, so a structural problem that
//! precedes the lexical one is reported first, and the lexical error picks
//! up the last key the parser completed.

use crate::error::{Error, Result};
use crate::position::Position;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TokenKind {
    TableStart,
    TableEnd,
    ArrayTableStart,
    ArrayTableEnd,
    KeyStart,
    KeyEnd,
    BareKey,
    String,
    RawString,
    MultilineString,
    RawMultilineString,
    Bool,
    Integer,
    Float,
    Datetime,
    ArrayStart,
    ArrayEnd,
    InlineTableStart,
    InlineTableEnd,
    Comment,
}

/// Byte range `start..end` in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn to(self, other: Span) -> Span {
        Span {
            start: self.start,
            end: other.end,
        }
    }
}

/// A token. For strings `text` is the body between the delimiters, for
/// comments the text after `#`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub span: Span,
}

pub(crate) struct Tokens<'a> {
    pub tokens: Vec<Token<'a>>,
    pub error: Option<Error>,
}

pub(crate) fn tokenize<'a>(input: &'a str, source: &Arc<str>) -> Tokens<'a> {
    let mut lexer = Lexer {
        input,
        bytes: input.as_bytes(),
        pos: 0,
        tokens: Vec::new(),
        source,
    };
    let error = lexer.run().err();
    Tokens {
        tokens: lexer.tokens,
        error,
    }
}

fn is_control(b: u8) -> bool {
    (b < 0x20 && b != b'\t') || b == 0x7f
}

fn is_bare_key_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'-'
}

fn is_value_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'+' | b'-' | b'.' | b':') || b >= 0x80
}

fn is_full_date(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() == 10
        && b.iter().enumerate().all(|(i, c)| match i {
            4 | 7 => *c == b'-',
            _ => c.is_ascii_digit(),
        })
}

/// Decides what a bare value run looks like. `None` means it is not a value
/// at all (most likely an unquoted string).
fn classify(text: &str) -> Option<TokenKind> {
    match text {
        "true" | "false" => return Some(TokenKind::Bool),
        "inf" | "+inf" | "-inf" | "nan" | "+nan" | "-nan" => return Some(TokenKind::Float),
        _ => {}
    }
    let b = text.as_bytes();
    if text.contains(':') || (b.len() >= 5 && b[..4].iter().all(u8::is_ascii_digit) && b[4] == b'-') {
        return Some(TokenKind::Datetime);
    }
    match b.first() {
        Some(c) if c.is_ascii_digit() || matches!(c, b'+' | b'-' | b'.') => {}
        _ => return None,
    }
    if text.starts_with("0x") || text.starts_with("0o") || text.starts_with("0b") {
        Some(TokenKind::Integer)
    } else if b.iter().any(|c| matches!(c, b'.' | b'e' | b'E')) {
        Some(TokenKind::Float)
    } else {
        Some(TokenKind::Integer)
    }
}

struct Lexer<'a, 's> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
    tokens: Vec<Token<'a>>,
    source: &'s Arc<str>,
}

impl<'a, 's> Lexer<'a, 's> {
    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_at(&self, n: usize) -> Option<u8> {
        self.bytes.get(self.pos + n).copied()
    }

    fn starts_with(&self, s: &str) -> bool {
        self.bytes[self.pos..].starts_with(s.as_bytes())
    }

    fn current_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn push(&mut self, kind: TokenKind, start: usize, end: usize, text: &'a str) {
        self.tokens.push(Token {
            kind,
            text,
            span: Span { start, end },
        });
    }

    fn push_delim(&mut self, kind: TokenKind, start: usize, end: usize) {
        self.push(kind, start, end, "");
    }

    fn error(&self, msg: impl Into<String>, start: usize, len: usize) -> Error {
        Error::lex(msg).at(Position::resolve(self.input, start, len), self.source)
    }

    /// Error for the character at the current position.
    fn unexpected(&self, expected: &str) -> Error {
        match self.current_char() {
            Some(c) => self.error(
                format!("{expected}, but got {c:?} instead"),
                self.pos,
                c.len_utf8(),
            ),
            None => self.error(format!("unexpected EOF; {expected}"), self.pos, 1),
        }
    }

    fn bare_cr(&self) -> Error {
        self.error("expected a newline ('\\n') after a carriage return ('\\r')", self.pos, 1)
    }

    fn run(&mut self) -> Result<()> {
        loop {
            self.skip_blank()?;
            match self.peek() {
                None => return Ok(()),
                Some(b'#') => self.comment()?,
                Some(b'[') => {
                    self.table_header()?;
                    self.end_of_line()?;
                }
                Some(_) => {
                    self.key_value()?;
                    self.end_of_line()?;
                }
            }
        }
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t')) {
            self.pos += 1;
        }
    }

    /// Skips whitespace and newlines.
    fn skip_blank(&mut self) -> Result<()> {
        loop {
            match self.peek() {
                Some(b' ' | b'\t' | b'\n') => self.pos += 1,
                Some(b'\r') if self.peek_at(1) == Some(b'\n') => self.pos += 2,
                Some(b'\r') => return Err(self.bare_cr()),
                _ => return Ok(()),
            }
        }
    }

    /// Skips whitespace, newlines and comments inside an array.
    fn skip_array_blank(&mut self) -> Result<()> {
        loop {
            self.skip_blank()?;
            if self.peek() != Some(b'#') {
                return Ok(());
            }
            self.comment()?;
        }
    }

    fn skip_inline_ws(&mut self) -> Result<()> {
        self.skip_ws();
        match self.peek() {
            Some(b'\n' | b'\r' | b'#') => Err(self.error(
                "newlines are not allowed within inline tables",
                self.pos,
                1,
            )),
            _ => Ok(()),
        }
    }

    fn end_of_line(&mut self) -> Result<()> {
        self.skip_ws();
        match self.peek() {
            None => Ok(()),
            Some(b'\n') => {
                self.pos += 1;
                Ok(())
            }
            Some(b'\r') if self.peek_at(1) == Some(b'\n') => {
                self.pos += 2;
                Ok(())
            }
            Some(b'\r') => Err(self.bare_cr()),
            Some(b'#') => self.comment(),
            Some(_) => Err(self.unexpected(
                "expected a top-level item to end with a newline, comment, or EOF",
            )),
        }
    }

    fn comment(&mut self) -> Result<()> {
        let start = self.pos;
        self.pos += 1;
        loop {
            match self.peek() {
                None | Some(b'\n') => break,
                Some(b'\r') if self.peek_at(1) == Some(b'\n') => break,
                Some(b'\r') => return Err(self.bare_cr()),
                Some(b) if is_control(b) => {
                    return Err(self.error(
                        format!("control characters are not allowed in comments: 0x{b:02x}"),
                        self.pos,
                        1,
                    ))
                }
                Some(_) => self.pos += 1,
            }
        }
        let text = &self.input[start + 1..self.pos];
        self.push(TokenKind::Comment, start, self.pos, text);
        Ok(())
    }

    fn table_header(&mut self) -> Result<()> {
        let start = self.pos;
        let array = self.peek_at(1) == Some(b'[');
        let (open, close, end) = if array {
            (TokenKind::ArrayTableStart, "]]", TokenKind::ArrayTableEnd)
        } else {
            (TokenKind::TableStart, "]", TokenKind::TableEnd)
        };
        self.pos += close.len();
        self.push_delim(open, start, self.pos);

        self.key_path()?;
        if !self.starts_with(close) {
            return Err(self.unexpected(&format!("expected '{close}' to close the table name")));
        }
        let close_start = self.pos;
        self.pos += close.len();
        self.push_delim(end, close_start, self.pos);
        Ok(())
    }

    /// One or more key segments separated by dots.
    fn key_path(&mut self) -> Result<()> {
        loop {
            self.skip_ws();
            self.key_segment()?;
            self.skip_ws();
            if self.peek() != Some(b'.') {
                return Ok(());
            }
            self.pos += 1;
        }
    }

    fn key_segment(&mut self) -> Result<()> {
        let start = self.pos;
        match self.peek() {
            Some(b'"') if self.starts_with("\"\"\"") => Err(self.error(
                "multi-line strings are not allowed as keys",
                start,
                3,
            )),
            Some(b'\'') if self.starts_with("'''") => Err(self.error(
                "multi-line strings are not allowed as keys",
                start,
                3,
            )),
            Some(b'"') => self.basic_string(),
            Some(b'\'') => self.literal_string(),
            Some(b) if is_bare_key_byte(b) => {
                while self.peek().map_or(false, is_bare_key_byte) {
                    self.pos += 1;
                }
                let text = &self.input[start..self.pos];
                self.push(TokenKind::BareKey, start, self.pos, text);
                Ok(())
            }
            _ => Err(self.unexpected("expected a key")),
        }
    }

    fn key_separator(&mut self) -> Result<()> {
        if self.peek() != Some(b'=') {
            return Err(self.unexpected("expected key separator '='"));
        }
        self.push_delim(TokenKind::KeyEnd, self.pos, self.pos + 1);
        self.pos += 1;
        self.skip_ws();
        Ok(())
    }

    fn key_value(&mut self) -> Result<()> {
        self.push_delim(TokenKind::KeyStart, self.pos, self.pos);
        self.key_path()?;
        self.key_separator()?;
        self.value()
    }

    fn value(&mut self) -> Result<()> {
        match self.peek() {
            Some(b'"') if self.starts_with("\"\"\"") => self.multiline_string(b'"'),
            Some(b'\'') if self.starts_with("'''") => self.multiline_string(b'\''),
            Some(b'"') => self.basic_string(),
            Some(b'\'') => self.literal_string(),
            Some(b'[') => self.array(),
            Some(b'{') => self.inline_table(),
            _ => self.bare_value(),
        }
    }

    fn scan_value_run(&mut self) {
        while self.peek().map_or(false, is_value_byte) {
            self.pos += 1;
        }
    }

    fn bare_value(&mut self) -> Result<()> {
        let start = self.pos;
        self.scan_value_run();
        // "1979-05-27 07:32:00" is one datetime.
        if is_full_date(&self.input[start..self.pos])
            && self.peek() == Some(b' ')
            && self.peek_at(1).map_or(false, |b| b.is_ascii_digit())
            && self.peek_at(2).map_or(false, |b| b.is_ascii_digit())
            && self.peek_at(3) == Some(b':')
        {
            self.pos += 1;
            self.scan_value_run();
        }

        let text = &self.input[start..self.pos];
        if text.is_empty() {
            return Err(self.unexpected("expected a value"));
        }
        match classify(text) {
            Some(kind) => {
                self.push(kind, start, self.pos, text);
                Ok(())
            }
            None => Err(self.error(
                format!("expected a value but found {text:?} instead; strings must be quoted"),
                start,
                text.len(),
            )),
        }
    }

    /// `"..."`, for both keys and values.
    fn basic_string(&mut self) -> Result<()> {
        let start = self.pos;
        self.pos += 1;
        loop {
            match self.peek() {
                None => {
                    return Err(self.error("unexpected EOF; expected '\"'", start, 1));
                }
                Some(b'"') => {
                    let text = &self.input[start + 1..self.pos];
                    self.pos += 1;
                    self.push(TokenKind::String, start, self.pos, text);
                    return Ok(());
                }
                Some(b'\\') => {
                    self.pos += 1;
                    if !matches!(self.peek(), None | Some(b'\n' | b'\r')) {
                        self.pos += 1;
                    }
                }
                Some(b'\n' | b'\r') => {
                    return Err(self.error("strings cannot contain newlines", self.pos, 1));
                }
                Some(b) if is_control(b) => return Err(self.string_control(b)),
                Some(_) => self.pos += 1,
            }
        }
    }

    /// `'...'`, for both keys and values.
    fn literal_string(&mut self) -> Result<()> {
        let start = self.pos;
        self.pos += 1;
        loop {
            match self.peek() {
                None => {
                    return Err(self.error("unexpected EOF; expected \"'\"", start, 1));
                }
                Some(b'\'') => {
                    let text = &self.input[start + 1..self.pos];
                    self.pos += 1;
                    self.push(TokenKind::RawString, start, self.pos, text);
                    return Ok(());
                }
                Some(b'\n' | b'\r') => {
                    return Err(self.error("strings cannot contain newlines", self.pos, 1));
                }
                Some(b) if is_control(b) => return Err(self.string_control(b)),
                Some(_) => self.pos += 1,
            }
        }
    }

    fn string_control(&self, b: u8) -> Error {
        self.error(
            format!("control characters are not allowed in strings: 0x{b:02x}"),
            self.pos,
            1,
        )
    }

    /// `"""..."""` or `'''...'''`. Up to two quotes directly before the
    /// closing delimiter belong to the body.
    fn multiline_string(&mut self, quote: u8) -> Result<()> {
        let basic = quote == b'"';
        let start = self.pos;
        self.pos += 3;
        let body_start = self.pos;
        loop {
            match self.peek() {
                None => {
                    let delim = if basic { "\"\"\"" } else { "'''" };
                    return Err(self.error(format!("unexpected EOF; expected {delim:?}"), start, 3));
                }
                Some(b'\\') if basic => {
                    self.pos += 1;
                    if !matches!(self.peek(), None | Some(b'\n' | b'\r')) {
                        self.pos += 1;
                    }
                }
                Some(b) if b == quote
                    && self.peek_at(1) == Some(quote)
                    && self.peek_at(2) == Some(quote) =>
                {
                    let mut n = 3;
                    while n < 5 && self.peek_at(n) == Some(quote) {
                        n += 1;
                    }
                    let body_end = self.pos + n - 3;
                    let text = &self.input[body_start..body_end];
                    self.pos += n;
                    let kind = if basic {
                        TokenKind::MultilineString
                    } else {
                        TokenKind::RawMultilineString
                    };
                    self.push(kind, start, self.pos, text);
                    return Ok(());
                }
                Some(b'\n') => self.pos += 1,
                Some(b'\r') if self.peek_at(1) == Some(b'\n') => self.pos += 2,
                Some(b'\r') => return Err(self.bare_cr()),
                Some(b) if is_control(b) => return Err(self.string_control(b)),
                Some(_) => self.pos += 1,
            }
        }
    }

    fn array(&mut self) -> Result<()> {
        self.push_delim(TokenKind::ArrayStart, self.pos, self.pos + 1);
        self.pos += 1;
        loop {
            self.skip_array_blank()?;
            if self.peek() == Some(b']') {
                break;
            }
            if self.peek().is_none() {
                return Err(self.unexpected("expected ']'"));
            }
            self.value()?;
            self.skip_array_blank()?;
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b']') => break,
                _ => {
                    return Err(self.unexpected(
                        "expected a comma (',') or array terminator (']')",
                    ))
                }
            }
        }
        self.push_delim(TokenKind::ArrayEnd, self.pos, self.pos + 1);
        self.pos += 1;
        Ok(())
    }

    fn inline_table(&mut self) -> Result<()> {
        self.push_delim(TokenKind::InlineTableStart, self.pos, self.pos + 1);
        self.pos += 1;
        self.skip_inline_ws()?;
        if self.peek() != Some(b'}') {
            loop {
                self.push_delim(TokenKind::KeyStart, self.pos, self.pos);
                self.key_path()?;
                self.key_separator()?;
                self.value()?;
                self.skip_inline_ws()?;
                match self.peek() {
                    Some(b',') => {
                        let comma = self.pos;
                        self.pos += 1;
                        self.skip_inline_ws()?;
                        if self.peek() == Some(b'}') {
                            return Err(self.error(
                                "trailing commas are not allowed in inline tables",
                                comma,
                                1,
                            ));
                        }
                    }
                    Some(b'}') => break,
                    _ => {
                        return Err(self.unexpected(
                            "expected a comma (',') or inline table terminator ('}')",
                        ))
                    }
                }
            }
        }
        self.push_delim(TokenKind::InlineTableEnd, self.pos, self.pos + 1);
        self.pos += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(input: &str) -> Tokens<'_> {
        let source: Arc<str> = Arc::from(input);
        tokenize(input, &source)
    }

    fn kinds(input: &str) -> Vec<TokenKind> {
        let tokens = lex(input);
        assert!(tokens.error.is_none(), "unexpected error: {:?}", tokens.error);
        tokens.tokens.iter().map(|t| t.kind).collect()
    }

    fn lex_error(input: &str) -> String {
        lex(input)
            .error
            .map(|e| e.message())
            .unwrap_or_else(|| panic!("expected an error for {input:?}"))
    }

    #[test]
    fn test_key_value_tokens() {
        use TokenKind::*;
        assert_eq!(
            kinds("a.\"b c\" = 'x' # done\n"),
            vec![KeyStart, BareKey, String, KeyEnd, RawString, Comment]
        );
    }

    #[test]
    fn test_table_headers() {
        use TokenKind::*;
        assert_eq!(
            kinds("[ a . b ]\n[[c]]"),
            vec![TableStart, BareKey, BareKey, TableEnd, ArrayTableStart, BareKey, ArrayTableEnd]
        );
    }

    #[test]
    fn test_value_classification() {
        assert_eq!(classify("true"), Some(TokenKind::Bool));
        assert_eq!(classify("-inf"), Some(TokenKind::Float));
        assert_eq!(classify("1979-05-27"), Some(TokenKind::Datetime));
        assert_eq!(classify("07:32:00"), Some(TokenKind::Datetime));
        assert_eq!(classify("0x1e"), Some(TokenKind::Integer));
        assert_eq!(classify("1e5"), Some(TokenKind::Float));
        assert_eq!(classify("-12"), Some(TokenKind::Integer));
        assert_eq!(classify("hello"), None);
    }

    #[test]
    fn test_datetime_with_space() {
        let tokens = lex("d = 1979-05-27 07:32:00Z\n");
        let dt = tokens.tokens.last().unwrap();
        assert_eq!(dt.kind, TokenKind::Datetime);
        assert_eq!(dt.text, "1979-05-27 07:32:00Z");
    }

    #[test]
    fn test_multiline_strings() {
        let tokens = lex("s = \"\"\"\none \"two\"\"\"\"\"\nr = '''x''''");
        assert!(tokens.error.is_none());
        let bodies: Vec<_> = tokens
            .tokens
            .iter()
            .filter(|t| matches!(t.kind, TokenKind::MultilineString | TokenKind::RawMultilineString))
            .map(|t| t.text)
            .collect();
        assert_eq!(bodies, vec!["\none \"two\"\"", "x'"]);
    }

    #[test]
    fn test_arrays_span_lines_with_comments() {
        use TokenKind::*;
        assert_eq!(
            kinds("a = [\n  1, # one\n  2,\n]"),
            vec![KeyStart, BareKey, KeyEnd, ArrayStart, Integer, Comment, Integer, ArrayEnd]
        );
    }

    #[test]
    fn test_inline_table_tokens() {
        use TokenKind::*;
        assert_eq!(
            kinds("t = { x = 1, y.z = \"s\" }"),
            vec![
                KeyStart, BareKey, KeyEnd, InlineTableStart, KeyStart, BareKey, KeyEnd, Integer,
                KeyStart, BareKey, BareKey, KeyEnd, String, InlineTableEnd
            ]
        );
    }

    #[test]
    fn test_lexical_errors() {
        assert!(lex_error("a = \"open").contains("unexpected EOF"));
        assert!(lex_error("a = \"x\ny\"").contains("newlines"));
        assert!(lex_error("a = \"\u{1}\"").contains("control characters"));
        assert!(lex_error("# bell \u{7}").contains("control characters are not allowed in comments"));
        assert!(lex_error("a = 1\rb = 2").contains("carriage return"));
        assert!(lex_error("[table").contains("expected ']'"));
        assert!(lex_error("t = {a = 1,\n}").contains("newlines are not allowed"));
        assert!(lex_error("t = {a = 1,}").contains("trailing commas"));
        assert!(lex_error("a = hello").contains("strings must be quoted"));
        assert!(lex_error("a = 1 b = 2").contains("end with a newline"));
        assert!(lex_error("a b = 1").contains("key separator"));
        assert!(lex_error("a = [1 2]").contains("comma"));
        assert!(lex_error("\"\"\"key\"\"\" = 1").contains("multi-line strings"));
    }

    #[test]
    fn test_tokens_before_error_are_kept() {
        let tokens = lex("a = 1\nb = \"open");
        assert!(tokens.error.is_some());
        assert_eq!(tokens.tokens.len(), 7);
    }

    #[test]
    fn test_error_position() {
        let err = lex("a = 1\nb = @").error.unwrap();
        let pos = err.position().unwrap();
        assert_eq!((pos.line, pos.column), (2, 5));
    }
}
