//! # tomldec
//!
//! A TOML parser that remembers what it saw, and a Serde decoder that
//! remembers what it used.
//!
//! ## Key Features
//!
//! - **Order-preserving tree**: tables keep the order in which keys were
//!   written
//! - **Key metadata**: every defined key is registered with its kind of
//!   value and the line and column of its definition
//! - **Undecoded keys**: after decoding, [`MetaData::undecoded`] lists the
//!   keys the destination type never consumed
//! - **Type-directed decoding**: integers are range-checked against the
//!   destination width, strings never turn into numbers
//! - **Deferred decoding**: [`Primitive`] captures a node and decodes it
//!   later, once its shape is known
//! - **Located errors**: every error carries the last key, and where
//!   possible a caret-annotated excerpt of the input
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! tomldec = "0.1"
//! serde = { version = "1.0", features = ["derive"] }
//! ```
//!
//! ### Decoding
//!
//! ```rust
//! use serde::Deserialize;
//!
//! #[derive(Deserialize, Debug)]
//! struct Config {
//!     title: String,
//!     database: Database,
//! }
//!
//! #[derive(Deserialize, Debug)]
//! struct Database {
//!     ports: Vec<u16>,
//!     enabled: bool,
//! }
//!
//! let input = r#"
//! title = "TOML Example"
//!
//! [database]
//! ports = [8000, 8001, 8002]
//! enabled = true
//! connection_max = 5000
//! "#;
//!
//! let (config, meta) = tomldec::decode::<Config>(input).unwrap();
//! assert_eq!(config.database.ports, vec![8000, 8001, 8002]);
//!
//! // `connection_max` is in the document but not in `Database`.
//! let unused: Vec<String> = meta.undecoded().iter().map(ToString::to_string).collect();
//! assert_eq!(unused, vec!["database.connection_max"]);
//! ```
//!
//! ### Inspecting a Document
//!
//! ```rust
//! use tomldec::ValueType;
//!
//! let doc = tomldec::parse("[[fruit]]\nname = \"apple\"\n[[fruit]]\nname = \"banana\"").unwrap();
//! assert_eq!(doc.meta().type_of(&["fruit"]), Some(ValueType::ArrayHash));
//! assert_eq!(doc.meta().position_of(&["fruit", "name"]).unwrap().line, 4);
//! ```
//!
//! ### Errors
//!
//! ```rust
//! #[derive(serde::Deserialize, Debug)]
//! struct Limits {
//!     max: u8,
//! }
//!
//! let err = tomldec::from_str::<Limits>("max = 500").unwrap_err();
//! assert_eq!(err.to_string(), "toml: line 1 (last key \"max\"): 500 is out of range for u8");
//! println!("{}", err.with_usage());
//! ```
//!
//! See the [`syntax`] module for the accepted grammar and the extended
//! dialect.

pub mod datetime;
pub mod de;
mod document;
mod duration;
pub mod error;
pub mod hook;
pub mod key;
mod lexer;
mod literal;
pub mod map;
pub mod meta;
pub mod options;
mod parser;
mod position;
mod primitive;
pub mod ser;
pub mod syntax;
pub mod value;

pub use datetime::Datetime;
pub use document::Document;
pub use error::{Error, ErrorKind, Result};
pub use hook::{Custom, FromToml, NumberString, Text};
pub use key::Key;
pub use map::Table;
pub use meta::{KeyInfo, MetaData, ValueType};
pub use options::{DecodeOptions, EncodeOptions, ParseOptions};
pub use position::Position;
pub use primitive::Primitive;
pub use ser::ValueSerializer;
pub use value::Value;

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io;

/// Parses a TOML document.
///
/// # Examples
///
/// ```rust
/// let doc = tomldec::parse("a.b = 1\n[c]").unwrap();
/// assert!(doc.meta().is_defined(&["a", "b"]));
/// assert_eq!(doc.meta().type_name(&["c"]), Some("Hash"));
/// ```
///
/// # Errors
///
/// Returns an error for malformed input, invalid literals, and keys that
/// are defined twice or used both as a value and as a table.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn parse(input: &str) -> Result<Document> {
    parse_with_options(input, ParseOptions::default())
}

/// Parses a TOML document with custom options.
///
/// # Examples
///
/// ```rust
/// use tomldec::ParseOptions;
///
/// let input = "color = \"\\e[31m\"";
/// assert!(tomldec::parse(input).is_err());
///
/// let doc = tomldec::parse_with_options(input, ParseOptions::new().extended(true)).unwrap();
/// assert_eq!(doc.table().get("color").and_then(|v| v.as_str()), Some("\u{1b}[31m"));
/// ```
///
/// # Errors
///
/// See [`parse`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn parse_with_options(input: &str, options: ParseOptions) -> Result<Document> {
    parser::parse_str(input, &options)
}

/// Parses a document and decodes it into `T`, returning the key metadata
/// alongside.
///
/// # Examples
///
/// ```rust
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct Point { x: i32, y: i32 }
///
/// let (point, meta) = tomldec::decode::<Point>("x = 1\ny = 2\nz = 3").unwrap();
/// assert_eq!((point.x, point.y), (1, 2));
/// assert!(meta.is_decoded(&["x"]));
/// assert_eq!(meta.undecoded().len(), 1);
/// ```
///
/// # Errors
///
/// Returns parse errors and decode errors.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn decode<T: DeserializeOwned>(input: &str) -> Result<(T, MetaData)> {
    Decoder::new().decode(input)
}

/// Deserialize an instance of type `T` from a string of TOML text.
///
/// # Examples
///
/// ```rust
/// use serde::Deserialize;
///
/// #[derive(Deserialize, PartialEq, Debug)]
/// struct Point { x: i32, y: i32 }
///
/// let point: Point = tomldec::from_str("x = 1\ny = 2").unwrap();
/// assert_eq!(point, Point { x: 1, y: 2 });
/// ```
///
/// # Errors
///
/// Returns an error if the input is not valid TOML or does not fit `T`.
/// Error messages include the line and the last key.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_str<T: DeserializeOwned>(s: &str) -> Result<T> {
    decode(s).map(|(value, _)| value)
}

/// Deserialize an instance of type `T` from bytes of TOML text.
///
/// The bytes must be UTF-8; a leading byte order mark is skipped.
///
/// # Examples
///
/// ```rust
/// use serde::Deserialize;
///
/// #[derive(Deserialize, PartialEq, Debug)]
/// struct Point { x: i32, y: i32 }
///
/// let point: Point = tomldec::from_slice(b"x = 1\ny = 2").unwrap();
/// assert_eq!(point, Point { x: 1, y: 2 });
///
/// assert!(tomldec::from_slice::<Point>(b"x = \"\xff\"").is_err());
/// ```
///
/// # Errors
///
/// Returns an error if the bytes are not valid UTF-8, not valid TOML, or
/// do not fit `T`.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_slice<T: DeserializeOwned>(v: &[u8]) -> Result<T> {
    let mut doc = parser::parse_bytes(v, &ParseOptions::default())?;
    doc.decode()
}

/// Deserialize an instance of type `T` from an I/O stream of TOML.
///
/// # Examples
///
/// ```rust
/// use serde::Deserialize;
/// use std::io::Cursor;
///
/// #[derive(Deserialize, PartialEq, Debug)]
/// struct Point { x: i32, y: i32 }
///
/// let point: Point = tomldec::from_reader(Cursor::new(b"x = 1\ny = 2")).unwrap();
/// assert_eq!(point, Point { x: 1, y: 2 });
/// ```
///
/// # Errors
///
/// Returns an error if reading fails, or as [`from_slice`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_reader<R, T>(mut reader: R) -> Result<T>
where
    R: io::Read,
    T: DeserializeOwned,
{
    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .map_err(|e| Error::io(&e.to_string()))?;
    from_slice(&bytes)
}

/// Parses and decodes with configurable options.
///
/// # Examples
///
/// ```rust
/// use serde::Deserialize;
/// use tomldec::Decoder;
///
/// #[derive(Debug, Deserialize)]
/// struct Server { host: String }
///
/// let err = Decoder::new()
///     .deny_unknown_keys(true)
///     .decode::<Server>("host = \"a\"\nprot = 80")
///     .unwrap_err();
/// assert_eq!(err.position().unwrap().line, 2);
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct Decoder {
    options: DecodeOptions,
}

impl Decoder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_options(options: DecodeOptions) -> Self {
        Decoder { options }
    }

    /// Fail when the document holds keys the destination never consumed.
    #[must_use]
    pub fn deny_unknown_keys(mut self, deny: bool) -> Self {
        self.options.deny_unknown_keys = deny;
        self
    }

    /// Accept the extended dialect, see [`ParseOptions::extended`].
    #[must_use]
    pub fn extended(mut self, extended: bool) -> Self {
        self.options.parse.extended = extended;
        self
    }

    /// Parses `input` and decodes it into `T`.
    ///
    /// # Errors
    ///
    /// Returns parse errors, decode errors, and in strict mode an
    /// [`ErrorKind::UnknownKeys`] error located at the first unused key.
    pub fn decode<T: DeserializeOwned>(&self, input: &str) -> Result<(T, MetaData)> {
        let mut doc = parser::parse_str(input, &self.options.parse)?;
        let value = doc.decode_strict(self.options.deny_unknown_keys)?;
        let (_, meta) = doc.into_parts();
        Ok((value, meta))
    }
}

/// Serialize any `T: Serialize` to a TOML document.
///
/// `T` must serialize as a table: a struct, a map, or a [`Table`].
///
/// # Examples
///
/// ```rust
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Point { x: i32, y: i32 }
///
/// let text = tomldec::to_string(&Point { x: 1, y: 2 }).unwrap();
/// assert_eq!(text, "x = 1\ny = 2\n");
/// ```
///
/// # Errors
///
/// Returns an error if `T` is not a table, or contains values TOML cannot
/// express (unit, integers beyond `i64`, `None` inside arrays).
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string<T>(value: &T) -> Result<String>
where
    T: ?Sized + Serialize,
{
    to_string_with_options(value, EncodeOptions::default())
}

/// Serialize any `T: Serialize` to a TOML document with custom options.
///
/// # Errors
///
/// See [`to_string`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string_with_options<T>(value: &T, options: EncodeOptions) -> Result<String>
where
    T: ?Sized + Serialize,
{
    let value = to_value(value)?;
    ser::encode_document(&value, &options)
}

/// Convert any `T: Serialize` to a [`Value`].
///
/// # Examples
///
/// ```rust
/// use tomldec::Value;
///
/// let value = tomldec::to_value(&vec![1, 2]).unwrap();
/// assert_eq!(value, Value::Array(vec![Value::Integer(1), Value::Integer(2)]));
/// ```
///
/// # Errors
///
/// Returns an error if `value` cannot be represented in TOML.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_value<T>(value: &T) -> Result<Value>
where
    T: ?Sized + Serialize,
{
    value
        .serialize(ValueSerializer)?
        .ok_or_else(|| Error::custom("TOML has no null value; cannot encode None"))
}

/// Serialize any `T: Serialize` as TOML to a writer.
///
/// # Examples
///
/// ```rust
/// use std::collections::BTreeMap;
///
/// let mut buffer = Vec::new();
/// tomldec::to_writer(&mut buffer, &BTreeMap::from([("answer", 42)])).unwrap();
/// assert_eq!(buffer, b"answer = 42\n");
/// ```
///
/// # Errors
///
/// Returns an error if encoding fails or writing to the writer fails.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_writer<W, T>(mut writer: W, value: &T) -> Result<()>
where
    W: io::Write,
    T: ?Sized + Serialize,
{
    let text = to_string(value)?;
    writer
        .write_all(text.as_bytes())
        .map_err(|e| Error::io(&e.to_string()))?;
    Ok(())
}
