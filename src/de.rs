//! Decoding the document tree into Rust types.
//!
//! This module provides the [`serde::Deserializer`] that walks a parsed
//! [`Table`] and drives a destination's `Deserialize` implementation.
//!
//! ## Overview
//!
//! - **Type-directed**: the destination decides what it asks for, and the
//!   document value must fit (`"abc"` never becomes an integer)
//! - **Range checked**: integers are checked against the destination width
//! - **Key tracking**: every key the destination consumes is recorded in
//!   [`MetaData`], so unused keys can be reported afterwards
//! - **Lenient field names**: a key that matches no field exactly is matched
//!   case-insensitively, unless another key in the same table matches that
//!   field exactly
//!
//! ## Usage
//!
//! ```rust
//! use serde::Deserialize;
//!
//! #[derive(Deserialize, Debug, PartialEq)]
//! struct Limits {
//!     #[serde(rename = "U8")]
//!     small: u8,
//!     i: i32,
//! }
//!
//! let limits: Limits = tomldec::from_str("U8 = 1\nI = -1").unwrap();
//! assert_eq!(limits, Limits { small: 1, i: -1 });
//!
//! let err = tomldec::from_str::<Limits>("U8 = 500\nI = 1").unwrap_err();
//! assert!(err.is_range());
//! ```

use crate::datetime::{Datetime, DATETIME_FIELD, DATETIME_TOKEN};
use crate::duration::parse_duration;
use crate::error::{Error, Result, USAGE_FLOAT_RANGE, USAGE_INTEGER_RANGE};
use crate::hook::{CUSTOM_TOKEN, NUMBER_STRING_TOKEN, TEXT_TOKEN};
use crate::key::Key;
use crate::meta::{MetaData, ValueType};
use crate::primitive::PRIMITIVE_TOKEN;
use crate::ser::format_float;
use crate::value::{ARRAY_OF_TABLES_FIELD, VALUE_TOKEN};
use crate::{Table, Value};
use log::{debug, trace};
use serde::de::value::{MapDeserializer, SeqDeserializer, StringDeserializer};
use serde::de::{
    self, DeserializeOwned, DeserializeSeed, IntoDeserializer, MapAccess, SeqAccess, Visitor,
};
use serde::forward_to_deserialize_any;
use std::collections::HashSet;

/// Largest integer magnitudes that convert to floats without loss.
const F32_EXACT: u64 = 1 << 24;
const F64_EXACT: u64 = 1 << 53;

/// A borrowed view of one document node.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Src<'a> {
    Str(&'a str),
    Int(i64),
    Float(f64),
    Bool(bool),
    Datetime(&'a Datetime),
    Array(&'a [Value]),
    Table(&'a Table),
    Tables(&'a [Table]),
}

impl<'a> From<&'a Value> for Src<'a> {
    fn from(value: &'a Value) -> Self {
        match value {
            Value::String(s) => Src::Str(s),
            Value::Integer(i) => Src::Int(*i),
            Value::Float(f) => Src::Float(*f),
            Value::Boolean(b) => Src::Bool(*b),
            Value::Datetime(dt) => Src::Datetime(dt),
            Value::Array(items) => Src::Array(items),
            Value::Table(t) => Src::Table(t),
            Value::ArrayOfTables(ts) => Src::Tables(ts),
        }
    }
}

impl<'a> Src<'a> {
    fn value_type(&self) -> ValueType {
        match self {
            Src::Str(_) => ValueType::String,
            Src::Int(_) => ValueType::Integer,
            Src::Float(_) => ValueType::Float,
            Src::Bool(_) => ValueType::Bool,
            Src::Datetime(_) => ValueType::Datetime,
            Src::Array(_) => ValueType::Array,
            Src::Table(_) => ValueType::Hash,
            Src::Tables(_) => ValueType::ArrayHash,
        }
    }

    fn mismatch(&self, expected: &str) -> Error {
        Error::type_mismatch(self.value_type().describe(), expected)
    }

    /// Elements of an array or an array of tables.
    fn elements(&self) -> Option<Vec<Src<'a>>> {
        match *self {
            Src::Array(items) => Some(items.iter().map(Src::from).collect()),
            Src::Tables(tables) => Some(tables.iter().map(Src::Table).collect()),
            _ => None,
        }
    }
}

/// Decodes `src`, found at `path`, into `T`.
pub(crate) fn decode_with<T: DeserializeOwned>(
    src: Src<'_>,
    meta: &mut MetaData,
    path: Key,
) -> Result<T> {
    let result = T::deserialize(ValueDeserializer::new(src, &mut *meta, path.clone()));
    result.map_err(|e| meta.locate(e, &path))
}

/// Decodes a root table, optionally failing on keys `T` never consumed.
pub(crate) fn decode_table<T: DeserializeOwned>(
    table: &Table,
    meta: &mut MetaData,
    deny_unknown_keys: bool,
) -> Result<T> {
    let value = decode_with(Src::Table(table), meta, Key::new())?;

    let undecoded = meta.undecoded();
    debug!(
        "decoded {} of {} keys",
        meta.keys().len() - undecoded.len(),
        meta.keys().len()
    );
    if deny_unknown_keys && !undecoded.is_empty() {
        let mut seen = HashSet::new();
        let unique: Vec<Key> = undecoded
            .into_iter()
            .filter(|k| seen.insert(k.clone()))
            .collect();
        let first = unique.first().cloned().unwrap_or_default();
        return Err(meta.locate(Error::unknown_keys(unique), &first));
    }
    Ok(value)
}

/// Pairs each entry of `table` with the struct field it decodes into.
///
/// Exact names win. Otherwise a key takes the first field that matches it
/// case-insensitively, as long as no key in the table names that field
/// exactly and no earlier key has taken it.
fn match_fields<'a>(table: &'a Table, fields: &'static [&'static str]) -> Vec<Entry<'a>> {
    let mut claimed: HashSet<&str> = HashSet::new();
    let mut entries = Vec::with_capacity(table.len());
    for (key, value) in table {
        let name = if fields.contains(&key.as_str()) {
            key.as_str()
        } else {
            let folded = key.to_lowercase();
            let field = fields.iter().copied().find(|f| {
                f.to_lowercase() == folded && !table.contains_key(f) && !claimed.contains(f)
            });
            match field {
                Some(f) => {
                    claimed.insert(f);
                    f
                }
                None => key.as_str(),
            }
        };
        entries.push(Entry {
            name,
            key,
            src: Src::from(value),
        });
    }
    entries
}

struct Entry<'a> {
    /// Name presented to the destination.
    name: &'a str,
    /// Key in the document.
    key: &'a str,
    src: Src<'a>,
}

fn plain_entries(table: &Table) -> Vec<Entry<'_>> {
    table
        .iter()
        .map(|(key, value)| Entry {
            name: key,
            key,
            src: Src::from(value),
        })
        .collect()
}

fn range_error(value: impl std::fmt::Display, target: &str) -> Error {
    Error::range(value, target).with_usage_text(USAGE_INTEGER_RANGE)
}

/// Type-directed deserializer for one node. Marks `path` as decoded when the
/// destination consumes it.
pub(crate) struct ValueDeserializer<'a, 'm> {
    src: Src<'a>,
    meta: &'m mut MetaData,
    path: Key,
}

impl<'a, 'm> ValueDeserializer<'a, 'm> {
    pub(crate) fn new(src: Src<'a>, meta: &'m mut MetaData, path: Key) -> Self {
        ValueDeserializer { src, meta, path }
    }

    fn mark(&mut self) {
        self.meta.mark_decoded(&self.path);
    }

    fn integer(&self, target: &str) -> Result<i64> {
        match self.src {
            Src::Int(i) => Ok(i),
            _ => Err(self.src.mismatch(target)),
        }
    }

    fn table_access(self, entries: Vec<Entry<'a>>) -> TableAccess<'a, 'm> {
        TableAccess {
            entries: entries.into_iter(),
            pending: None,
            meta: self.meta,
            path: self.path,
        }
    }

    fn array_access(self, items: Vec<Src<'a>>) -> ArrayAccess<'a, 'm> {
        ArrayAccess {
            items: items.into_iter(),
            meta: self.meta,
            path: self.path,
        }
    }
}

macro_rules! deserialize_integer {
    ($method:ident, $ty:ty, $visit:ident) => {
        fn $method<V>(mut self, visitor: V) -> Result<V::Value>
        where
            V: Visitor<'de>,
        {
            self.mark();
            let n = self.integer(stringify!($ty))?;
            let narrowed = <$ty>::try_from(n).map_err(|_| range_error(n, stringify!($ty)))?;
            visitor.$visit(narrowed)
        }
    };
}

impl<'de, 'a, 'm> de::Deserializer<'de> for ValueDeserializer<'a, 'm> {
    type Error = Error;

    /// Open destinations receive the node as it is. Only this key is
    /// marked, nothing beneath it.
    fn deserialize_any<V>(mut self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.mark();
        Raw::plain(self.src).deserialize_any(visitor)
    }

    fn deserialize_bool<V>(mut self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.mark();
        match self.src {
            Src::Bool(b) => visitor.visit_bool(b),
            _ => Err(self.src.mismatch("bool")),
        }
    }

    deserialize_integer!(deserialize_i8, i8, visit_i8);
    deserialize_integer!(deserialize_i16, i16, visit_i16);
    deserialize_integer!(deserialize_i32, i32, visit_i32);
    deserialize_integer!(deserialize_i64, i64, visit_i64);
    deserialize_integer!(deserialize_i128, i128, visit_i128);
    deserialize_integer!(deserialize_u8, u8, visit_u8);
    deserialize_integer!(deserialize_u16, u16, visit_u16);
    deserialize_integer!(deserialize_u32, u32, visit_u32);
    deserialize_integer!(deserialize_u64, u64, visit_u64);
    deserialize_integer!(deserialize_u128, u128, visit_u128);

    fn deserialize_f32<V>(mut self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.mark();
        match self.src {
            Src::Float(f) if f.abs() > f64::from(f32::MAX) => {
                Err(Error::range(f, "f32").with_usage_text(USAGE_FLOAT_RANGE))
            }
            Src::Float(f) => visitor.visit_f32(f as f32),
            Src::Int(i) if i.unsigned_abs() >= F32_EXACT => Err(Error::range(
                i,
                "f32 (outside safely representable integer range)",
            )
            .with_usage_text(USAGE_FLOAT_RANGE)),
            Src::Int(i) => visitor.visit_f32(i as f32),
            _ => Err(self.src.mismatch("f32")),
        }
    }

    fn deserialize_f64<V>(mut self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.mark();
        match self.src {
            Src::Float(f) => visitor.visit_f64(f),
            Src::Int(i) if i.unsigned_abs() >= F64_EXACT => Err(Error::range(
                i,
                "f64 (outside safely representable integer range)",
            )
            .with_usage_text(USAGE_FLOAT_RANGE)),
            Src::Int(i) => visitor.visit_f64(i as f64),
            _ => Err(self.src.mismatch("f64")),
        }
    }

    fn deserialize_char<V>(mut self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.mark();
        match self.src {
            Src::Str(s) => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => visitor.visit_char(c),
                    _ => Err(Error::custom(format!(
                        "expected a single character, but got {s:?}"
                    ))),
                }
            }
            _ => Err(self.src.mismatch("char")),
        }
    }

    fn deserialize_str<V>(mut self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.mark();
        match self.src {
            Src::Str(s) => visitor.visit_str(s),
            // chrono's types deserialize from their RFC 3339 text.
            Src::Datetime(dt) => visitor.visit_string(dt.to_string()),
            _ => Err(self.src.mismatch("string")),
        }
    }

    fn deserialize_string<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.deserialize_str(visitor)
    }

    fn deserialize_bytes<V>(mut self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        match self.src {
            Src::Str(s) => {
                self.mark();
                visitor.visit_bytes(s.as_bytes())
            }
            _ => self.deserialize_seq(visitor),
        }
    }

    fn deserialize_byte_buf<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.deserialize_bytes(visitor)
    }

    /// A present key is always `Some`; TOML has no null.
    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_some(self)
    }

    fn deserialize_unit<V>(self, _visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        Err(self.src.mismatch("unit"))
    }

    fn deserialize_unit_struct<V>(self, name: &'static str, _visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        Err(self.src.mismatch(name))
    }

    fn deserialize_newtype_struct<V>(mut self, name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        match name {
            VALUE_TOKEN => {
                self.mark();
                visitor.visit_newtype_struct(Raw::tagged(self.src))
            }
            DATETIME_TOKEN => {
                self.mark();
                match self.src {
                    Src::Datetime(dt) => visitor.visit_string(dt.to_string()),
                    Src::Str(s) => visitor.visit_str(s),
                    _ => Err(self.src.mismatch("datetime")),
                }
            }
            PRIMITIVE_TOKEN => {
                self.mark();
                visitor.visit_newtype_struct(PrimitiveParts {
                    src: self.src,
                    path: self.path,
                })
            }
            CUSTOM_TOKEN => {
                let ValueDeserializer { src, meta, path } = self;
                let value = visitor.visit_newtype_struct(Raw::plain(src))?;
                meta.mark_subtree(&path);
                Ok(value)
            }
            TEXT_TOKEN => {
                self.mark();
                let text = match self.src {
                    Src::Str(s) => s.to_string(),
                    Src::Int(i) => i.to_string(),
                    Src::Float(f) => format_float(f),
                    Src::Bool(b) => b.to_string(),
                    Src::Datetime(dt) => dt.to_string(),
                    _ => return Err(self.src.mismatch("text")),
                };
                let text: StringDeserializer<Error> = text.into_deserializer();
                visitor.visit_newtype_struct(text)
            }
            NUMBER_STRING_TOKEN => {
                self.mark();
                match self.src {
                    Src::Int(i) => visitor.visit_i64(i),
                    Src::Float(f) => visitor.visit_f64(f),
                    Src::Str(s) => visitor.visit_str(s),
                    _ => Err(self.src.mismatch("number")),
                }
            }
            _ => visitor.visit_newtype_struct(self),
        }
    }

    fn deserialize_seq<V>(mut self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.mark();
        match self.src.elements() {
            Some(items) => visitor.visit_seq(self.array_access(items)),
            None => Err(self.src.mismatch("sequence")),
        }
    }

    fn deserialize_tuple<V>(self, len: usize, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        match self.src.elements() {
            Some(items) if items.len() != len => Err(Error::type_mismatch(
                format!("array of length {}", items.len()),
                format!("array of length {len}"),
            )),
            _ => self.deserialize_seq(visitor),
        }
    }

    fn deserialize_tuple_struct<V>(
        self,
        _name: &'static str,
        len: usize,
        visitor: V,
    ) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.deserialize_tuple(len, visitor)
    }

    fn deserialize_map<V>(mut self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.mark();
        match self.src {
            Src::Table(table) => visitor.visit_map(self.table_access(plain_entries(table))),
            _ => Err(self.src.mismatch("map")),
        }
    }

    fn deserialize_struct<V>(
        mut self,
        name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.mark();
        match self.src {
            Src::Str(s) if is_duration(name, fields) => {
                let d = parse_duration(s)?;
                visitor.visit_seq(SeqDeserializer::<_, Error>::new(
                    [d.as_secs(), u64::from(d.subsec_nanos())].into_iter(),
                ))
            }
            Src::Int(nanos) if is_duration(name, fields) => {
                let nanos = u64::try_from(nanos).map_err(|_| {
                    Error::range(nanos, "duration (negative durations are not allowed)")
                })?;
                let secs = nanos / 1_000_000_000;
                let subsec = nanos % 1_000_000_000;
                visitor.visit_seq(SeqDeserializer::<_, Error>::new([secs, subsec].into_iter()))
            }
            Src::Table(table) => visitor.visit_map(self.table_access(match_fields(table, fields))),
            _ => Err(self.src.mismatch(name)),
        }
    }

    fn deserialize_enum<V>(
        mut self,
        name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.mark();
        match self.src {
            Src::Str(s) => visitor.visit_enum(s.into_deserializer()),
            Src::Table(table) if table.len() == 1 => match table.iter().next() {
                Some((variant, value)) => visitor.visit_enum(TableEnum {
                    variant,
                    inner: ValueDeserializer::new(
                        Src::from(value),
                        self.meta,
                        self.path.child(variant.as_str()),
                    ),
                }),
                None => Err(Error::bug("single-entry table without entries")),
            },
            Src::Table(_) => Err(Error::custom(format!(
                "expected a table with exactly one entry for enum {name}"
            ))),
            _ => Err(self.src.mismatch(name)),
        }
    }

    fn deserialize_identifier<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.deserialize_str(visitor)
    }

    /// Skipped values are not marked as decoded.
    fn deserialize_ignored_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_unit()
    }
}

fn is_duration(name: &str, fields: &[&str]) -> bool {
    name == "Duration" && fields == ["secs", "nanos"]
}

struct TableAccess<'a, 'm> {
    entries: std::vec::IntoIter<Entry<'a>>,
    pending: Option<(Key, Src<'a>)>,
    meta: &'m mut MetaData,
    path: Key,
}

impl<'de, 'a, 'm> MapAccess<'de> for TableAccess<'a, 'm> {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: DeserializeSeed<'de>,
    {
        let Some(entry) = self.entries.next() else {
            return Ok(None);
        };
        let path = self.path.child(entry.key);
        trace!("decoding {path}");
        let key = seed
            .deserialize(KeyDeserializer(entry.name))
            .map_err(|e| self.meta.locate(e, &path))?;
        self.pending = Some((path, entry.src));
        Ok(Some(key))
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: DeserializeSeed<'de>,
    {
        let Some((path, src)) = self.pending.take() else {
            return Err(Error::bug("value requested before its key"));
        };
        let result = seed.deserialize(ValueDeserializer::new(src, &mut *self.meta, path.clone()));
        result.map_err(|e| self.meta.locate(e, &path))
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.entries.len())
    }
}

struct ArrayAccess<'a, 'm> {
    items: std::vec::IntoIter<Src<'a>>,
    meta: &'m mut MetaData,
    path: Key,
}

impl<'de, 'a, 'm> SeqAccess<'de> for ArrayAccess<'a, 'm> {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>>
    where
        T: DeserializeSeed<'de>,
    {
        let Some(src) = self.items.next() else {
            return Ok(None);
        };
        let result = seed.deserialize(ValueDeserializer::new(
            src,
            &mut *self.meta,
            self.path.clone(),
        ));
        result.map(Some).map_err(|e| self.meta.locate(e, &self.path))
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.items.len())
    }
}

struct TableEnum<'a, 'm> {
    variant: &'a str,
    inner: ValueDeserializer<'a, 'm>,
}

impl<'de, 'a, 'm> de::EnumAccess<'de> for TableEnum<'a, 'm> {
    type Error = Error;
    type Variant = ValueDeserializer<'a, 'm>;

    fn variant_seed<V>(self, seed: V) -> Result<(V::Value, Self::Variant)>
    where
        V: DeserializeSeed<'de>,
    {
        let variant = seed.deserialize(KeyDeserializer(self.variant))?;
        Ok((variant, self.inner))
    }
}

impl<'de, 'a, 'm> de::VariantAccess<'de> for ValueDeserializer<'a, 'm> {
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        Err(self.src.mismatch("unit variant"))
    }

    fn newtype_variant_seed<T>(self, seed: T) -> Result<T::Value>
    where
        T: DeserializeSeed<'de>,
    {
        seed.deserialize(self)
    }

    fn tuple_variant<V>(self, len: usize, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        de::Deserializer::deserialize_tuple(self, len, visitor)
    }

    fn struct_variant<V>(self, fields: &'static [&'static str], visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        de::Deserializer::deserialize_struct(self, "", fields, visitor)
    }
}

fn key_error(target: &str) -> Error {
    Error::type_mismatch("string", format!("{target} (map key must be string-like)"))
}

macro_rules! reject_key {
    ($($method:ident => $target:literal),* $(,)?) => {
        $(
            fn $method<V>(self, _visitor: V) -> Result<V::Value>
            where
                V: Visitor<'de>,
            {
                Err(key_error($target))
            }
        )*
    };
}

/// Table keys, presented to the destination as strings.
struct KeyDeserializer<'a>(&'a str);

impl<'de, 'a> de::Deserializer<'de> for KeyDeserializer<'a> {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_str(self.0)
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_some(self)
    }

    fn deserialize_newtype_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_enum(self.0.into_deserializer())
    }

    reject_key! {
        deserialize_bool => "bool",
        deserialize_i8 => "i8",
        deserialize_i16 => "i16",
        deserialize_i32 => "i32",
        deserialize_i64 => "i64",
        deserialize_i128 => "i128",
        deserialize_u8 => "u8",
        deserialize_u16 => "u16",
        deserialize_u32 => "u32",
        deserialize_u64 => "u64",
        deserialize_u128 => "u128",
        deserialize_f32 => "f32",
        deserialize_f64 => "f64",
        deserialize_unit => "unit",
        deserialize_seq => "sequence",
        deserialize_map => "map",
    }

    fn deserialize_unit_struct<V>(self, name: &'static str, _visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        Err(key_error(name))
    }

    fn deserialize_tuple<V>(self, _len: usize, _visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        Err(key_error("tuple"))
    }

    fn deserialize_tuple_struct<V>(
        self,
        name: &'static str,
        _len: usize,
        _visitor: V,
    ) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        Err(key_error(name))
    }

    fn deserialize_struct<V>(
        self,
        name: &'static str,
        _fields: &'static [&'static str],
        _visitor: V,
    ) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        Err(key_error(name))
    }

    forward_to_deserialize_any! {
        char str string bytes byte_buf identifier ignored_any
    }
}

/// Presents a node without type checks or key tracking.
///
/// Inside a [`Value`] request (`tagged`), datetimes and arrays of tables are
/// wrapped in single-entry maps so that `Value`'s visitor can tell them
/// apart from strings and static arrays.
struct Raw<'a> {
    src: Src<'a>,
    tagged: bool,
}

impl<'a> Raw<'a> {
    fn plain(src: Src<'a>) -> Self {
        Raw { src, tagged: false }
    }

    fn tagged(src: Src<'a>) -> Self {
        Raw { src, tagged: true }
    }
}

impl<'de, 'a> de::Deserializer<'de> for Raw<'a> {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        match self.src {
            Src::Str(s) => visitor.visit_str(s),
            Src::Int(i) => visitor.visit_i64(i),
            Src::Float(f) => visitor.visit_f64(f),
            Src::Bool(b) => visitor.visit_bool(b),
            Src::Datetime(dt) if self.tagged => visitor.visit_map(MapDeserializer::<_, Error>::new(
                std::iter::once((DATETIME_FIELD, dt.to_string())),
            )),
            Src::Datetime(dt) => visitor.visit_string(dt.to_string()),
            Src::Array(items) => visitor.visit_seq(RawSeq {
                items: items.iter().map(Src::from).collect::<Vec<_>>().into_iter(),
            }),
            Src::Tables(tables) if self.tagged => visitor.visit_map(RawMap {
                entries: vec![(ARRAY_OF_TABLES_FIELD, Src::Tables(tables))].into_iter(),
                pending: None,
            }),
            Src::Tables(tables) => visitor.visit_seq(RawSeq {
                items: tables.iter().map(Src::Table).collect::<Vec<_>>().into_iter(),
            }),
            Src::Table(table) => visitor.visit_map(RawMap {
                entries: table
                    .iter()
                    .map(|(k, v)| (k.as_str(), Src::from(v)))
                    .collect::<Vec<_>>()
                    .into_iter(),
                pending: None,
            }),
        }
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_some(self)
    }

    fn deserialize_newtype_struct<V>(self, name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        if name == VALUE_TOKEN {
            visitor.visit_newtype_struct(Raw::tagged(self.src))
        } else {
            visitor.visit_newtype_struct(self)
        }
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit unit_struct seq tuple tuple_struct map struct enum
        identifier ignored_any
    }
}

struct RawSeq<'a> {
    items: std::vec::IntoIter<Src<'a>>,
}

impl<'de, 'a> SeqAccess<'de> for RawSeq<'a> {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>>
    where
        T: DeserializeSeed<'de>,
    {
        match self.items.next() {
            Some(src) => seed.deserialize(Raw::plain(src)).map(Some),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.items.len())
    }
}

struct RawMap<'a> {
    entries: std::vec::IntoIter<(&'a str, Src<'a>)>,
    pending: Option<Src<'a>>,
}

impl<'de, 'a> MapAccess<'de> for RawMap<'a> {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: DeserializeSeed<'de>,
    {
        match self.entries.next() {
            Some((key, src)) => {
                self.pending = Some(src);
                seed.deserialize(KeyDeserializer(key)).map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: DeserializeSeed<'de>,
    {
        match self.pending.take() {
            Some(src) => seed.deserialize(Raw::plain(src)),
            None => Err(Error::bug("value requested before its key")),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.entries.len())
    }
}

/// Hands a [`crate::Primitive`] its key path and node as a two-element
/// sequence.
struct PrimitiveParts<'a> {
    src: Src<'a>,
    path: Key,
}

impl<'de, 'a> de::Deserializer<'de> for PrimitiveParts<'a> {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_seq(PartsSeq {
            src: self.src,
            path: Some(self.path),
            done: false,
        })
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf option unit unit_struct newtype_struct seq tuple
        tuple_struct map struct enum identifier ignored_any
    }
}

struct PartsSeq<'a> {
    src: Src<'a>,
    path: Option<Key>,
    done: bool,
}

impl<'de, 'a> SeqAccess<'de> for PartsSeq<'a> {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>>
    where
        T: DeserializeSeed<'de>,
    {
        if let Some(path) = self.path.take() {
            let segments = path.segments().iter().map(String::as_str);
            return seed
                .deserialize(SeqDeserializer::<_, Error>::new(segments))
                .map(Some);
        }
        if self.done {
            return Ok(None);
        }
        self.done = true;
        seed.deserialize(Raw::plain(self.src)).map(Some)
    }
}
