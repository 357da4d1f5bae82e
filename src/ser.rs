//! Encoding Rust values as TOML.
//!
//! Encoding happens in two steps. [`ValueSerializer`] turns any
//! `T: Serialize` into a [`Value`] tree, then the tree is written out as a
//! document: plain keys first, then one `[section]` per nested table and one
//! `[[section]]` per element of an array of tables.
//!
//! Sequences whose elements are all tables become arrays of tables. A
//! [`Value::Array`] taken from a parsed document stays a static array, so
//! encoding a parsed document and parsing the output yields the same tree.
//!
//! `None` fields are left out. TOML has no null, so unit values and `None`
//! inside arrays are errors.

use crate::datetime::DATETIME_TOKEN;
use crate::key::{is_bare, write_quoted};
use crate::options::EncodeOptions;
use crate::value::ARRAY_TOKEN;
use crate::{Datetime, Error, Key, Result, Table, Value};
use serde::ser::{self, Serialize};
use std::fmt::{self, Write};

/// A serializer that builds a [`Value`] instead of text.
///
/// `Ok(None)` stands for a value that is absent, such as `Option::None`.
/// Tables drop such entries; everywhere else they are errors.
///
/// # Examples
///
/// ```rust
/// use serde::Serialize;
/// use tomldec::Value;
///
/// #[derive(Serialize)]
/// struct Point {
///     x: i32,
///     y: Option<i32>,
/// }
///
/// let value = tomldec::to_value(&Point { x: 1, y: None }).unwrap();
/// let table = value.as_table().unwrap();
/// assert_eq!(table.get("x"), Some(&Value::Integer(1)));
/// assert!(table.get("y").is_none());
/// ```
pub struct ValueSerializer;

fn present(value: Option<Value>, what: &str) -> Result<Value> {
    value.ok_or_else(|| {
        Error::custom(format!("TOML has no null value; {what} cannot be missing"))
    })
}

impl ser::Serializer for ValueSerializer {
    type Ok = Option<Value>;
    type Error = Error;

    type SerializeSeq = SerializeVec;
    type SerializeTuple = SerializeVec;
    type SerializeTupleStruct = SerializeVec;
    type SerializeTupleVariant = SerializeVec;
    type SerializeMap = SerializeTable;
    type SerializeStruct = SerializeTable;
    type SerializeStructVariant = SerializeTable;

    fn serialize_bool(self, v: bool) -> Result<Option<Value>> {
        Ok(Some(Value::Boolean(v)))
    }

    fn serialize_i8(self, v: i8) -> Result<Option<Value>> {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_i16(self, v: i16) -> Result<Option<Value>> {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_i32(self, v: i32) -> Result<Option<Value>> {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_i64(self, v: i64) -> Result<Option<Value>> {
        Ok(Some(Value::Integer(v)))
    }

    fn serialize_i128(self, v: i128) -> Result<Option<Value>> {
        i64::try_from(v)
            .map(|i| Some(Value::Integer(i)))
            .map_err(|_| Error::range(v, "TOML integer"))
    }

    fn serialize_u8(self, v: u8) -> Result<Option<Value>> {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_u16(self, v: u16) -> Result<Option<Value>> {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_u32(self, v: u32) -> Result<Option<Value>> {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_u64(self, v: u64) -> Result<Option<Value>> {
        i64::try_from(v)
            .map(|i| Some(Value::Integer(i)))
            .map_err(|_| Error::range(v, "TOML integer"))
    }

    fn serialize_u128(self, v: u128) -> Result<Option<Value>> {
        i64::try_from(v)
            .map(|i| Some(Value::Integer(i)))
            .map_err(|_| Error::range(v, "TOML integer"))
    }

    fn serialize_f32(self, v: f32) -> Result<Option<Value>> {
        self.serialize_f64(f64::from(v))
    }

    fn serialize_f64(self, v: f64) -> Result<Option<Value>> {
        Ok(Some(Value::Float(v)))
    }

    fn serialize_char(self, v: char) -> Result<Option<Value>> {
        Ok(Some(Value::String(v.to_string())))
    }

    fn serialize_str(self, v: &str) -> Result<Option<Value>> {
        Ok(Some(Value::String(v.to_string())))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Option<Value>> {
        let vec = v.iter().map(|&b| Value::Integer(i64::from(b))).collect();
        Ok(Some(Value::Array(vec)))
    }

    fn serialize_none(self) -> Result<Option<Value>> {
        Ok(None)
    }

    fn serialize_some<T>(self, value: &T) -> Result<Option<Value>>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Option<Value>> {
        Err(Error::custom("TOML has no null value; unit cannot be encoded"))
    }

    fn serialize_unit_struct(self, name: &'static str) -> Result<Option<Value>> {
        Err(Error::custom(format!(
            "TOML has no null value; unit struct {name} cannot be encoded"
        )))
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Option<Value>> {
        Ok(Some(Value::String(variant.to_string())))
    }

    fn serialize_newtype_struct<T>(self, name: &'static str, value: &T) -> Result<Option<Value>>
    where
        T: ?Sized + Serialize,
    {
        match name {
            DATETIME_TOKEN => match value.serialize(self)? {
                Some(Value::String(text)) => {
                    Datetime::parse(&text, true).map(|dt| Some(Value::Datetime(dt)))
                }
                other => Err(Error::bug(format!("datetime serialized as {other:?}"))),
            },
            ARRAY_TOKEN => match value.serialize(self)? {
                Some(Value::ArrayOfTables(ts)) => {
                    Ok(Some(Value::Array(ts.into_iter().map(Value::Table).collect())))
                }
                other => Ok(other),
            },
            _ => value.serialize(self),
        }
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Option<Value>>
    where
        T: ?Sized + Serialize,
    {
        let inner = present(value.serialize(ValueSerializer)?, "enum variant content")?;
        let mut table = Table::new();
        table.insert(variant.to_string(), inner);
        Ok(Some(Value::Table(table)))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SerializeVec> {
        Ok(SerializeVec {
            vec: Vec::with_capacity(len.unwrap_or(0)),
            variant: None,
        })
    }

    fn serialize_tuple(self, len: usize) -> Result<SerializeVec> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(self, _name: &'static str, len: usize) -> Result<SerializeVec> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SerializeVec> {
        Ok(SerializeVec {
            vec: Vec::with_capacity(len),
            variant: Some(variant),
        })
    }

    fn serialize_map(self, len: Option<usize>) -> Result<SerializeTable> {
        Ok(SerializeTable {
            table: Table::with_capacity(len.unwrap_or(0)),
            next_key: None,
            variant: None,
        })
    }

    fn serialize_struct(self, _name: &'static str, len: usize) -> Result<SerializeTable> {
        self.serialize_map(Some(len))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SerializeTable> {
        Ok(SerializeTable {
            table: Table::with_capacity(len),
            next_key: None,
            variant: Some(variant),
        })
    }
}

/// Wraps `value` as `{ variant = value }` when serializing an enum variant.
fn wrap_variant(variant: Option<&'static str>, value: Value) -> Value {
    match variant {
        Some(name) => {
            let mut table = Table::new();
            table.insert(name.to_string(), value);
            Value::Table(table)
        }
        None => value,
    }
}

#[doc(hidden)]
pub struct SerializeVec {
    vec: Vec<Value>,
    variant: Option<&'static str>,
}

impl SerializeVec {
    fn push<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let element = present(value.serialize(ValueSerializer)?, "array elements")?;
        self.vec.push(element);
        Ok(())
    }

    fn finish(self) -> Option<Value> {
        let all_tables = !self.vec.is_empty() && self.vec.iter().all(Value::is_table);
        let value = if all_tables {
            let tables = self
                .vec
                .into_iter()
                .filter_map(|v| match v {
                    Value::Table(t) => Some(t),
                    _ => None,
                })
                .collect();
            Value::ArrayOfTables(tables)
        } else {
            Value::Array(self.vec)
        };
        Some(wrap_variant(self.variant, value))
    }
}

impl ser::SerializeSeq for SerializeVec {
    type Ok = Option<Value>;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Option<Value>> {
        Ok(self.finish())
    }
}

impl ser::SerializeTuple for SerializeVec {
    type Ok = Option<Value>;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Option<Value>> {
        Ok(self.finish())
    }
}

impl ser::SerializeTupleStruct for SerializeVec {
    type Ok = Option<Value>;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Option<Value>> {
        Ok(self.finish())
    }
}

impl ser::SerializeTupleVariant for SerializeVec {
    type Ok = Option<Value>;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Option<Value>> {
        Ok(self.finish())
    }
}

#[doc(hidden)]
pub struct SerializeTable {
    table: Table,
    next_key: Option<String>,
    variant: Option<&'static str>,
}

impl SerializeTable {
    fn entry<T>(&mut self, key: String, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        if let Some(value) = value.serialize(ValueSerializer)? {
            self.table.insert(key, value);
        }
        Ok(())
    }

    fn finish(self) -> Option<Value> {
        Some(wrap_variant(self.variant, Value::Table(self.table)))
    }
}

impl ser::SerializeMap for SerializeTable {
    type Ok = Option<Value>;
    type Error = Error;

    fn serialize_key<T>(&mut self, key: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let key = match key.serialize(ValueSerializer)? {
            Some(Value::String(s)) => s,
            Some(Value::Integer(i)) => i.to_string(),
            Some(Value::Boolean(b)) => b.to_string(),
            Some(other) => {
                return Err(Error::type_mismatch(other.type_name(), "string table key"));
            }
            None => return Err(Error::custom("table keys cannot be missing")),
        };
        self.next_key = Some(key);
        Ok(())
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let key = self
            .next_key
            .take()
            .ok_or_else(|| Error::bug("serialize_value called before serialize_key"))?;
        self.entry(key, value)
    }

    fn end(self) -> Result<Option<Value>> {
        Ok(self.finish())
    }
}

impl ser::SerializeStruct for SerializeTable {
    type Ok = Option<Value>;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.entry(key.to_string(), value)
    }

    fn end(self) -> Result<Option<Value>> {
        Ok(self.finish())
    }
}

impl ser::SerializeStructVariant for SerializeTable {
    type Ok = Option<Value>;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.entry(key.to_string(), value)
    }

    fn end(self) -> Result<Option<Value>> {
        Ok(self.finish())
    }
}

/// Formats a float so that it reads back as a TOML float.
///
/// Whole numbers keep a fractional part (`2.0`); infinities and NaN use
/// TOML's `inf` and `nan` spellings.
pub(crate) fn format_float(f: f64) -> String {
    if f.is_nan() {
        if f.is_sign_negative() { "-nan" } else { "nan" }.to_string()
    } else if f.is_infinite() {
        if f > 0.0 { "inf" } else { "-inf" }.to_string()
    } else {
        format!("{f:?}")
    }
}

fn write_key(out: &mut impl Write, key: &str) -> fmt::Result {
    if is_bare(key) {
        out.write_str(key)
    } else {
        write_quoted(out, key)
    }
}

fn write_inline_table(out: &mut impl Write, table: &Table) -> fmt::Result {
    if table.is_empty() {
        return out.write_str("{}");
    }
    out.write_str("{ ")?;
    for (i, (k, v)) in table.iter().enumerate() {
        if i > 0 {
            out.write_str(", ")?;
        }
        write_key(out, k)?;
        out.write_str(" = ")?;
        write_inline(out, v)?;
    }
    out.write_str(" }")
}

/// Writes `value` in the notation used on the right-hand side of `=`.
pub(crate) fn write_inline(out: &mut impl Write, value: &Value) -> fmt::Result {
    match value {
        Value::String(s) => write_quoted(out, s),
        Value::Integer(i) => write!(out, "{i}"),
        Value::Float(f) => out.write_str(&format_float(*f)),
        Value::Boolean(b) => write!(out, "{b}"),
        Value::Datetime(dt) => write!(out, "{dt}"),
        Value::Array(arr) => {
            out.write_str("[")?;
            for (i, element) in arr.iter().enumerate() {
                if i > 0 {
                    out.write_str(", ")?;
                }
                write_inline(out, element)?;
            }
            out.write_str("]")
        }
        Value::Table(t) => write_inline_table(out, t),
        Value::ArrayOfTables(ts) => {
            out.write_str("[")?;
            for (i, t) in ts.iter().enumerate() {
                if i > 0 {
                    out.write_str(", ")?;
                }
                write_inline_table(out, t)?;
            }
            out.write_str("]")
        }
    }
}

/// Writes a table tree as a TOML document.
struct Encoder<'a> {
    out: String,
    options: &'a EncodeOptions,
}

impl<'a> Encoder<'a> {
    fn new(options: &'a EncodeOptions) -> Self {
        Encoder {
            out: String::new(),
            options,
        }
    }

    fn pad(&mut self, path: &Key) {
        let width = self.options.indent * path.len().saturating_sub(1);
        self.out.extend(std::iter::repeat(' ').take(width));
    }

    fn header(&mut self, path: &Key, array: bool) -> fmt::Result {
        if !self.out.is_empty() {
            self.out.push('\n');
        }
        self.pad(path);
        let (open, close) = if array { ("[[", "]]") } else { ("[", "]") };
        writeln!(self.out, "{open}{path}{close}")
    }

    /// Writes the plain keys of `table`, then its `[table]` sections, then its
    /// `[[array]]` sections.
    fn section(&mut self, path: &Key, table: &Table) -> fmt::Result {
        for (k, v) in table.iter() {
            if v.is_table() || v.is_array_of_tables() {
                continue;
            }
            self.pad(path);
            write_key(&mut self.out, k)?;
            self.out.push_str(" = ");
            write_inline(&mut self.out, v)?;
            self.out.push('\n');
        }

        for (k, v) in table.iter() {
            let Value::Table(t) = v else { continue };
            let child = path.child(k.as_str());
            // Parents holding only sections are created implicitly.
            let implicit =
                !t.is_empty() && t.values().all(|v| v.is_table() || v.is_array_of_tables());
            if !implicit {
                self.header(&child, false)?;
            }
            self.section(&child, t)?;
        }

        for (k, v) in table.iter() {
            let Value::ArrayOfTables(ts) = v else { continue };
            let child = path.child(k.as_str());
            for t in ts {
                self.header(&child, true)?;
                self.section(&child, t)?;
            }
        }
        Ok(())
    }
}

/// Writes `value`, which must be a table, as a document.
pub(crate) fn encode_document(value: &Value, options: &EncodeOptions) -> Result<String> {
    let Value::Table(table) = value else {
        return Err(Error::custom(format!(
            "only a table can be encoded as a TOML document, found {}",
            value.type_name()
        )));
    };
    let mut encoder = Encoder::new(options);
    encoder.section(&Key::new(), table).map_err(Error::custom)?;
    log::debug!("encoded {} top-level keys into {} bytes", table.len(), encoder.out.len());
    Ok(encoder.out)
}
