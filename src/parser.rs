//! Builds the document tree from the token stream.
//!
//! The parser keeps one piece of persistent state besides the tree: the
//! active context, the key path of the last `[table]` or `[[array]]`
//! header. Key assignments are resolved relative to it.
//!
//! Every table path carries a definition state. Tables that only exist
//! because a deeper key needed them are implicit; a header may
//! declare such a table once, after which it is concrete. Concrete tables
//! created by an assignment (inline tables) are sealed: neither headers nor
//! dotted keys may add to them.

use crate::datetime::Datetime;
use crate::document::Document;
use crate::error::{Error, Result, USAGE_ENCODING};
use crate::key::Key;
use crate::lexer::{tokenize, Span, Token, TokenKind};
use crate::literal::{
    parse_float, parse_integer, strip_escaped_newlines, strip_leading_newline, unescape,
};
use crate::meta::{MetaData, ValueType};
use crate::options::ParseOptions;
use crate::position::Position;
use crate::{Table, Value};
use log::{debug, trace};
use std::collections::HashMap;
use std::sync::Arc;

const BOM: char = '\u{feff}';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    /// `[table]` or `[[array]]`.
    Header,
    /// `key = value`.
    Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyState {
    Implicit,
    Concrete(Origin),
}

/// Why a key path could not be followed to a table.
enum Conflict {
    NotTable(Key, ValueType),
    Sealed(Key),
    Missing(Key),
}

impl Conflict {
    fn into_error(self) -> Error {
        match self {
            Conflict::NotTable(key, found) => Error::structure(format!(
                "Key '{key}' was already created as {} and cannot be used as a table.",
                article(found)
            )),
            Conflict::Sealed(key) => Error::structure(format!(
                "Key '{key}' is an inline table and cannot be extended."
            )),
            Conflict::Missing(key) => {
                Error::bug(format!("table '{key}' disappeared while its value was read"))
            }
        }
    }
}

fn article(t: ValueType) -> String {
    let name = t.describe();
    match name.as_bytes().first() {
        Some(b'a' | b'e' | b'i' | b'o' | b'u') => format!("an {name}"),
        _ => format!("a {name}"),
    }
}

/// Follows `path` down from `table`, whose own path is `base`.
///
/// Missing segments become implicit tables when `create` is set. Arrays of
/// tables are entered through their last element.
fn walk<'t>(
    table: &'t mut Table,
    base: &Key,
    path: &[String],
    states: &mut HashMap<Key, KeyState>,
    create: bool,
) -> std::result::Result<&'t mut Table, Conflict> {
    let mut current = table;
    let mut key = base.clone();
    for segment in path {
        key.push(segment.clone());
        if !current.contains_key(segment) {
            if !create {
                return Err(Conflict::Missing(key));
            }
            current.insert(segment.clone(), Value::Table(Table::new()));
            states.insert(key.clone(), KeyState::Implicit);
        }
        let sealed = states.get(&key) == Some(&KeyState::Concrete(Origin::Value));
        current = match current.get_mut(segment) {
            Some(Value::Table(_)) if sealed => return Err(Conflict::Sealed(key)),
            Some(Value::Table(t)) => t,
            Some(Value::ArrayOfTables(ts)) => match ts.last_mut() {
                Some(t) => t,
                None => return Err(Conflict::NotTable(key, ValueType::ArrayHash)),
            },
            Some(other) => return Err(Conflict::NotTable(key, other.value_type())),
            None => return Err(Conflict::Missing(key)),
        };
    }
    Ok(current)
}

/// Attaches a position (unless the error already has one) and the last key.
fn locate(err: Error, source: &Arc<str>, span: Span, last_key: &Key) -> Error {
    let err = if err.position().is_some() {
        err
    } else {
        err.at(Position::resolve(source, span.start, span.len()), source)
    };
    err.in_key(last_key)
}

/// Parses a document held in a string.
pub(crate) fn parse_str(input: &str, options: &ParseOptions) -> Result<Document> {
    let input = input.strip_prefix(BOM).unwrap_or(input);
    let source: Arc<str> = Arc::from(input);
    if let Some(at) = input.find('\0') {
        return Err(null_bytes().at(Position::resolve(input, at, 1), &source));
    }

    let tokens = tokenize(input, &source);
    let parser = Parser {
        tokens: tokens.tokens,
        pos: 0,
        lex_error: tokens.error,
        extended: options.extended,
        root: Table::new(),
        meta: MetaData::new(Arc::clone(&source)),
        states: HashMap::new(),
        context: Key::new(),
        last_key: Key::new(),
        source,
    };
    parser.run()
}

/// Parses raw bytes, which must be UTF-8 (an optional BOM is skipped).
pub(crate) fn parse_bytes(bytes: &[u8], options: &ParseOptions) -> Result<Document> {
    let bytes = bytes.strip_prefix(b"\xef\xbb\xbf").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(input) => parse_str(input, options),
        Err(e) => {
            let lossy: Arc<str> = Arc::from(String::from_utf8_lossy(bytes).as_ref());
            let at = e.valid_up_to();
            let err = if bytes.contains(&0) {
                null_bytes()
            } else {
                Error::lex(format!("invalid UTF-8 byte at position {at}"))
                    .with_usage_text(USAGE_ENCODING)
            };
            Err(err.at(Position::resolve(&lossy, at, 1), &lossy))
        }
    }
}

fn null_bytes() -> Error {
    Error::lex("files cannot contain NULL bytes; probably using UTF-16; TOML files must be UTF-8")
        .with_usage_text(USAGE_ENCODING)
}

struct Parser<'a> {
    tokens: Vec<Token<'a>>,
    pos: usize,
    lex_error: Option<Error>,
    extended: bool,
    root: Table,
    meta: MetaData,
    states: HashMap<Key, KeyState>,
    context: Key,
    last_key: Key,
    source: Arc<str>,
}

impl<'a> Parser<'a> {
    fn run(mut self) -> Result<Document> {
        while let Some(token) = self.next() {
            match token.kind {
                TokenKind::Comment => {}
                TokenKind::TableStart => self.table_header(token, false)?,
                TokenKind::ArrayTableStart => self.table_header(token, true)?,
                TokenKind::KeyStart => self.key_value()?,
                _ => return Err(self.unexpected(token, "expected a key or a table header")),
            }
        }
        if let Some(err) = self.lex_error.take() {
            return Err(err.in_key(&self.last_key));
        }

        debug!(
            "parsed {} keys, {} top-level entries",
            self.meta.keys().len(),
            self.root.len()
        );
        Ok(Document::new(self.root, self.meta))
    }

    fn next(&mut self) -> Option<Token<'a>> {
        let token = self.tokens.get(self.pos).copied();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// The next token of a construct the lexer started.
    fn expect(&mut self) -> Result<Token<'a>> {
        match self.next() {
            Some(token) => Ok(token),
            // The lexer stopped inside a construct; its error explains why.
            None => Err(match self.lex_error.take() {
                Some(err) => err.in_key(&self.last_key),
                None => Error::bug("token stream ended inside a construct"),
            }),
        }
    }

    fn peek_span(&self) -> Span {
        self.tokens.get(self.pos).map_or(
            Span {
                start: self.source.len(),
                end: self.source.len(),
            },
            |t| t.span,
        )
    }

    fn unexpected(&self, token: Token<'_>, msg: &str) -> Error {
        self.error_at(Error::structure(msg), token.span)
    }

    fn error_at(&self, err: Error, span: Span) -> Error {
        locate(err, &self.source, span, &self.last_key)
    }

    /// Reads key segments up to (and including) a token of kind `end`.
    fn key_segments(&mut self, end: TokenKind) -> Result<(Vec<String>, Span)> {
        let mut segments = Vec::new();
        let mut span: Option<Span> = None;
        loop {
            let token = self.expect()?;
            let segment = match token.kind {
                kind if kind == end => break,
                TokenKind::BareKey | TokenKind::RawString => token.text.to_string(),
                TokenKind::String => unescape(token.text, self.extended)
                    .map_err(|e| self.error_at(e, token.span))?,
                _ => return Err(self.unexpected(token, "expected a key")),
            };
            segments.push(segment);
            span = Some(span.map_or(token.span, |s| s.to(token.span)));
        }
        match span {
            Some(span) => Ok((segments, span)),
            None => Err(Error::bug("key without segments")),
        }
    }

    fn table_header(&mut self, open: Token<'a>, array: bool) -> Result<()> {
        let end = if array {
            TokenKind::ArrayTableEnd
        } else {
            TokenKind::TableEnd
        };
        let (segments, span) = self.key_segments(end)?;
        let key = Key::from(segments);
        self.last_key = key.clone();

        let Some((name, parent)) = key.segments().split_last() else {
            return Err(Error::bug("empty table header"));
        };
        let table = match walk(&mut self.root, &Key::new(), parent, &mut self.states, true) {
            Ok(t) => t,
            Err(c) => return Err(locate(c.into_error(), &self.source, span, &self.last_key)),
        };

        let state = self.states.get(&key).copied();
        match table.get_mut(name) {
            None => {
                let fresh = if array {
                    Value::ArrayOfTables(vec![Table::new()])
                } else {
                    Value::Table(Table::new())
                };
                table.insert(name.clone(), fresh);
            }
            Some(Value::ArrayOfTables(tables)) if array => {
                tables.push(Table::new());
                // Paths beneath belong to the previous element.
                self.states
                    .retain(|k, _| !(k.len() > key.len() && k.starts_with(&key)));
            }
            Some(Value::Table(_)) if !array && state == Some(KeyState::Implicit) => {}
            Some(_) => {
                let msg = if array {
                    format!("Key '{key}' was already created and cannot be used as an array.")
                } else {
                    format!("Key '{key}' has already been defined.")
                };
                return Err(locate(Error::structure(msg), &self.source, span, &self.last_key));
            }
        }

        self.states.insert(key.clone(), KeyState::Concrete(Origin::Header));
        let value_type = if array {
            ValueType::ArrayHash
        } else {
            ValueType::Hash
        };
        let position = Position::resolve(&self.source, open.span.start, 1);
        self.meta.push_key(key.clone());
        self.meta.set_type(key.clone(), value_type, position);
        trace!("context {} -> {key}", self.context);
        self.context = key;
        Ok(())
    }

    /// `k1.k2 = value`, relative to the active context.
    fn key_value(&mut self) -> Result<()> {
        let context = self.context.clone();
        let mut root = std::mem::take(&mut self.root);
        let result = self.assign(&mut root, &Key::new(), &context);
        self.root = root;
        result
    }

    /// Reads one `key = value` pair into `table`.
    ///
    /// `table` lives at `base`, and the key is relative to `relative_to`.
    /// Top-level assignments pass the root and the active context; inline
    /// tables pass their own key for both.
    fn assign(&mut self, table: &mut Table, base: &Key, relative_to: &Key) -> Result<()> {
        let (segments, span) = self.key_segments(TokenKind::KeyEnd)?;
        let full = relative_to.join(&segments);
        self.last_key = full.clone();

        let skip = base.len();
        let Some((name, parent)) = full.segments()[skip..].split_last() else {
            return Err(Error::bug("empty key"));
        };
        if let Err(c) = walk(table, base, parent, &mut self.states, true) {
            return Err(locate(c.into_error(), &self.source, span, &self.last_key));
        }

        let value_span = self.peek_span();
        let value = self.value(&full)?;

        let target = match walk(table, base, parent, &mut self.states, false) {
            Ok(t) => t,
            Err(c) => return Err(locate(c.into_error(), &self.source, span, &self.last_key)),
        };
        if target.contains_key(name) {
            let err = Error::structure(format!("Key '{full}' has already been defined."));
            return Err(locate(err, &self.source, span, &self.last_key));
        }
        let value_type = value.value_type();
        target.insert(name.clone(), value);

        self.states.insert(full.clone(), KeyState::Concrete(Origin::Value));
        let position = Position::resolve(&self.source, value_span.start, value_span.len());
        self.meta.push_key(full.clone());
        self.meta.set_type(full, value_type, position);
        Ok(())
    }

    fn value(&mut self, key: &Key) -> Result<Value> {
        let token = self.expect()?;
        let literal = |r: Result<Value>| r.map_err(|e| locate(e, &self.source, token.span, key));
        match token.kind {
            TokenKind::String => literal(unescape(token.text, self.extended).map(Value::String)),
            TokenKind::RawString => Ok(Value::String(token.text.to_string())),
            TokenKind::MultilineString => {
                let body = strip_escaped_newlines(strip_leading_newline(token.text));
                literal(unescape(&body, self.extended).map(Value::String))
            }
            TokenKind::RawMultilineString => {
                Ok(Value::String(strip_leading_newline(token.text).to_string()))
            }
            TokenKind::Bool => Ok(Value::Boolean(token.text == "true")),
            TokenKind::Integer => literal(parse_integer(token.text).map(Value::Integer)),
            TokenKind::Float => literal(parse_float(token.text).map(Value::Float)),
            TokenKind::Datetime => {
                literal(Datetime::parse(token.text, self.extended).map(Value::Datetime))
            }
            TokenKind::ArrayStart => self.array(key),
            TokenKind::InlineTableStart => self.inline_table(key),
            _ => Err(self.unexpected(token, "expected a value")),
        }
    }

    fn array(&mut self, key: &Key) -> Result<Value> {
        let mut items = Vec::new();
        loop {
            match self.tokens.get(self.pos).map(|t| t.kind) {
                Some(TokenKind::ArrayEnd) => {
                    self.pos += 1;
                    return Ok(Value::Array(items));
                }
                Some(TokenKind::Comment) => self.pos += 1,
                Some(_) => items.push(self.value(key)?),
                None => {
                    self.expect()?;
                }
            }
        }
    }

    fn inline_table(&mut self, key: &Key) -> Result<Value> {
        let mut table = Table::new();
        loop {
            let token = self.expect()?;
            match token.kind {
                TokenKind::InlineTableEnd => return Ok(Value::Table(table)),
                TokenKind::KeyStart => self.assign(&mut table, key, key)?,
                _ => return Err(self.unexpected(token, "expected a key or '}'")),
            }
        }
    }
}
