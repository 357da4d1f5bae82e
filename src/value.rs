//! Dynamic value representation for TOML documents.
//!
//! [`Value`] is the node type of the document tree produced by
//! [`crate::parse`]. It is also a valid destination when decoding: a field of
//! type `Value` receives the document node unchanged.
//!
//! ## Creating Values
//!
//! ```rust
//! use tomldec::{Table, Value};
//!
//! let boolean = Value::from(true);
//! let number = Value::from(42);
//! let text = Value::from("hello");
//! let list = Value::from(vec![Value::from(1), Value::from(2)]);
//!
//! let mut table = Table::new();
//! table.insert("answer".into(), number);
//! let table = Value::from(table);
//! assert!(table.is_table());
//! ```
//!
//! ## Extracting Values
//!
//! ```rust
//! use tomldec::Value;
//!
//! let value = Value::from(42);
//! assert_eq!(value.as_integer(), Some(42));
//!
//! let n = i64::try_from(value).unwrap();
//! assert_eq!(n, 42);
//! ```

use crate::datetime::DATETIME_FIELD;
use crate::meta::ValueType;
use crate::{Datetime, Table};
use serde::de::{self, Deserialize, Deserializer, Visitor};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use std::fmt;

/// Newtype name under which [`Value`] asks a deserializer for a verbatim node.
pub(crate) const VALUE_TOKEN: &str = "$__tomldec_private_Value";

/// Newtype name under which a static array serializes, so the encoder keeps
/// arrays of inline tables inline.
pub(crate) const ARRAY_TOKEN: &str = "$__tomldec_private_Array";

/// Map key that tags an array of tables inside an untyped tree.
pub(crate) const ARRAY_OF_TABLES_FIELD: &str = "$__tomldec_private_array_of_tables";

/// A TOML value.
///
/// `Array` holds static arrays written with `[ ... ]` (including arrays of
/// inline tables). `ArrayOfTables` holds the elements of a `[[header]]`
/// sequence.
///
/// # Examples
///
/// ```rust
/// use tomldec::Value;
///
/// let doc = tomldec::parse("list = [1, 2]\n[[item]]\n[[item]]").unwrap();
/// assert!(doc.table().get("list").map_or(false, Value::is_array));
/// assert!(doc.table().get("item").map_or(false, Value::is_array_of_tables));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Datetime(Datetime),
    Array(Vec<Value>),
    Table(Table),
    ArrayOfTables(Vec<Table>),
}

impl Value {
    /// The registry classification of this value.
    #[must_use]
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::String(_) => ValueType::String,
            Value::Integer(_) => ValueType::Integer,
            Value::Float(_) => ValueType::Float,
            Value::Boolean(_) => ValueType::Bool,
            Value::Datetime(_) => ValueType::Datetime,
            Value::Array(_) => ValueType::Array,
            Value::Table(_) => ValueType::Hash,
            Value::ArrayOfTables(_) => ValueType::ArrayHash,
        }
    }

    /// A human-readable name for the kind of value, used in error messages.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.value_type().describe()
    }

    #[inline]
    #[must_use]
    pub const fn is_str(&self) -> bool {
        matches!(self, Value::String(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_integer(&self) -> bool {
        matches!(self, Value::Integer(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_float(&self) -> bool {
        matches!(self, Value::Float(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_bool(&self) -> bool {
        matches!(self, Value::Boolean(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_datetime(&self) -> bool {
        matches!(self, Value::Datetime(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_table(&self) -> bool {
        matches!(self, Value::Table(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_array_of_tables(&self) -> bool {
        matches!(self, Value::ArrayOfTables(_))
    }

    /// If the value is a string, returns a reference to it.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tomldec::Value;
    ///
    /// assert_eq!(Value::from("hello").as_str(), Some("hello"));
    /// assert_eq!(Value::from(42).as_str(), None);
    /// ```
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// If the value is a float, returns it. Integers are not converted.
    #[inline]
    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_datetime(&self) -> Option<&Datetime> {
        match self {
            Value::Datetime(dt) => Some(dt),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(arr) => Some(arr),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Value::Table(t) => Some(t),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_array_of_tables(&self) -> Option<&Vec<Table>> {
        match self {
            Value::ArrayOfTables(ts) => Some(ts),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    /// Writes the value in inline TOML notation.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        crate::ser::write_inline(f, self)
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::String(s) => serializer.serialize_str(s),
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::Boolean(b) => serializer.serialize_bool(*b),
            Value::Datetime(dt) => dt.serialize(serializer),
            Value::Array(arr) => serializer.serialize_newtype_struct(ARRAY_TOKEN, arr),
            Value::Table(t) => t.serialize(serializer),
            Value::ArrayOfTables(ts) => {
                let mut seq = serializer.serialize_seq(Some(ts.len()))?;
                for t in ts {
                    seq.serialize_element(t)?;
                }
                seq.end()
            }
        }
    }
}

impl Serialize for Table {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (k, v) in self.iter() {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("any valid TOML value")
    }

    fn visit_bool<E>(self, value: bool) -> Result<Value, E> {
        Ok(Value::Boolean(value))
    }

    fn visit_i64<E>(self, value: i64) -> Result<Value, E> {
        Ok(Value::Integer(value))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Value, E> {
        i64::try_from(value)
            .map(Value::Integer)
            .map_err(|_| E::custom(format!("{value} is out of range for i64")))
    }

    fn visit_f64<E>(self, value: f64) -> Result<Value, E> {
        Ok(Value::Float(value))
    }

    fn visit_str<E>(self, value: &str) -> Result<Value, E> {
        Ok(Value::String(value.to_string()))
    }

    fn visit_string<E>(self, value: String) -> Result<Value, E> {
        Ok(Value::String(value))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Value, E> {
        Err(E::custom("TOML has no null value"))
    }

    fn visit_some<D>(self, deserializer: D) -> Result<Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        Deserialize::deserialize(deserializer)
    }

    fn visit_newtype_struct<D>(self, deserializer: D) -> Result<Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(self)
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Value, A::Error>
    where
        A: de::SeqAccess<'de>,
    {
        let mut vec = Vec::new();
        while let Some(elem) = seq.next_element()? {
            vec.push(elem);
        }
        Ok(Value::Array(vec))
    }

    fn visit_map<A>(self, mut map: A) -> Result<Value, A::Error>
    where
        A: de::MapAccess<'de>,
    {
        let Some(first) = map.next_key::<String>()? else {
            return Ok(Value::Table(Table::new()));
        };
        if first == DATETIME_FIELD {
            let text: String = map.next_value()?;
            return Datetime::parse(&text, true)
                .map(Value::Datetime)
                .map_err(|e| de::Error::custom(e.message()));
        }
        if first == ARRAY_OF_TABLES_FIELD {
            return Ok(Value::ArrayOfTables(map.next_value()?));
        }

        let mut table = Table::new();
        table.insert(first, map.next_value()?);
        while let Some((key, value)) = map.next_entry()? {
            table.insert(key, value);
        }
        Ok(Value::Table(table))
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_newtype_struct(VALUE_TOKEN, ValueVisitor)
    }
}

impl<'de> Deserialize<'de> for Table {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::Table(t) => Ok(t),
            other => Err(de::Error::custom(format!(
                "expected a table, found {}",
                other.type_name()
            ))),
        }
    }
}

impl TryFrom<Value> for i64 {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        match value {
            Value::Integer(i) => Ok(i),
            other => Err(crate::Error::type_mismatch(other.type_name(), "i64")),
        }
    }
}

impl TryFrom<Value> for f64 {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        match value {
            Value::Float(f) => Ok(f),
            Value::Integer(i) => Ok(i as f64),
            other => Err(crate::Error::type_mismatch(other.type_name(), "f64")),
        }
    }
}

impl TryFrom<Value> for bool {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        match value {
            Value::Boolean(b) => Ok(b),
            other => Err(crate::Error::type_mismatch(other.type_name(), "bool")),
        }
    }
}

impl TryFrom<Value> for String {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        match value {
            Value::String(s) => Ok(s),
            other => Err(crate::Error::type_mismatch(other.type_name(), "String")),
        }
    }
}

impl TryFrom<Value> for Table {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        match value {
            Value::Table(t) => Ok(t),
            other => Err(crate::Error::type_mismatch(other.type_name(), "table")),
        }
    }
}

macro_rules! from_integer {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::Integer(i64::from(value))
                }
            }
        )*
    };
}

from_integer!(i8, i16, i32, i64, u8, u16, u32);

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Float(f64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<Datetime> for Value {
    fn from(value: Datetime) -> Self {
        Value::Datetime(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::Array(value)
    }
}

impl From<Table> for Value {
    fn from(value: Table) -> Self {
        Value::Table(value)
    }
}
