//! Destination wrappers that take over decoding of a node.
//!
//! - [`Custom`] hands the whole node to a [`FromToml`] implementation and
//!   counts everything beneath it as decoded.
//! - [`Text`] turns a scalar into text and parses it with [`FromStr`].
//! - [`NumberString`] keeps a number in its textual form.
//!
//! ```rust
//! use serde::Deserialize;
//! use std::net::IpAddr;
//! use tomldec::Text;
//!
//! #[derive(Deserialize)]
//! struct Server {
//!     addr: Text<IpAddr>,
//! }
//!
//! let server: Server = tomldec::from_str("addr = \"10.0.0.1\"").unwrap();
//! assert!(server.addr.0.is_ipv4());
//! ```

use crate::ser::format_float;
use crate::Value;
use serde::de::{self, Deserialize, Deserializer, Visitor};
use serde::ser::{Serialize, Serializer};
use std::fmt;
use std::marker::PhantomData;
use std::ops::Deref;
use std::str::FromStr;

pub(crate) const CUSTOM_TOKEN: &str = "$__tomldec_private_Custom";
pub(crate) const TEXT_TOKEN: &str = "$__tomldec_private_Text";
pub(crate) const NUMBER_STRING_TOKEN: &str = "$__tomldec_private_NumberString";

/// Builds a type from a whole document node.
///
/// # Examples
///
/// ```rust
/// use tomldec::{Custom, FromToml, Value};
///
/// struct Version(u32, u32);
///
/// impl FromToml for Version {
///     type Error = String;
///
///     fn from_toml(value: Value) -> Result<Self, String> {
///         match value {
///             Value::String(s) => {
///                 let (a, b) = s.split_once('.').ok_or("expected MAJOR.MINOR")?;
///                 Ok(Version(a.parse().map_err(|_| "bad major")?, b.parse().map_err(|_| "bad minor")?))
///             }
///             Value::Integer(major) => Ok(Version(major as u32, 0)),
///             other => Err(format!("unexpected {}", other.type_name())),
///         }
///     }
/// }
///
/// #[derive(serde::Deserialize)]
/// struct Manifest {
///     version: Custom<Version>,
/// }
///
/// let m: Manifest = tomldec::from_str("version = \"1.4\"").unwrap();
/// assert_eq!((m.version.0).0, 1);
/// assert_eq!((m.version.0).1, 4);
/// ```
pub trait FromToml: Sized {
    type Error: fmt::Display;

    fn from_toml(value: Value) -> Result<Self, Self::Error>;
}

/// Decodes `T` through its [`FromToml`] implementation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Custom<T>(pub T);

impl<T> Deref for Custom<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

struct CustomVisitor<T>(PhantomData<T>);

impl<'de, T: FromToml> Visitor<'de> for CustomVisitor<T> {
    type Value = Custom<T>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a TOML value")
    }

    fn visit_newtype_struct<D>(self, deserializer: D) -> Result<Custom<T>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        T::from_toml(value).map(Custom).map_err(de::Error::custom)
    }
}

impl<'de, T: FromToml> Deserialize<'de> for Custom<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_newtype_struct(CUSTOM_TOKEN, CustomVisitor(PhantomData))
    }
}

/// Decodes `T` from the textual form of a scalar with [`FromStr`].
///
/// Strings are used as they are; booleans, integers, floats and datetimes
/// are first rendered in their TOML spelling. Arrays and tables are type
/// errors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Text<T>(pub T);

impl<T> Deref for Text<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

struct TextVisitor<T>(PhantomData<T>);

impl<'de, T> Visitor<'de> for TextVisitor<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    type Value = Text<T>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a scalar TOML value")
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Text<T>, E> {
        T::from_str(value).map(Text).map_err(E::custom)
    }

    fn visit_newtype_struct<D>(self, deserializer: D) -> Result<Text<T>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        self.visit_str(&text)
    }
}

impl<'de, T> Deserialize<'de> for Text<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_newtype_struct(TEXT_TOKEN, TextVisitor(PhantomData))
    }
}

/// A number kept as text, as written in (or rendered from) the document.
///
/// # Examples
///
/// ```rust
/// use serde::Deserialize;
/// use tomldec::NumberString;
///
/// #[derive(Deserialize)]
/// struct Limits {
///     max: NumberString,
///     ratio: NumberString,
/// }
///
/// let limits: Limits = tomldec::from_str("max = 1_000\nratio = 0.5").unwrap();
/// assert_eq!(limits.max.as_str(), "1000");
/// assert_eq!(limits.ratio.as_f64(), Some(0.5));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct NumberString(String);

impl NumberString {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        self.0.parse().ok()
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self.0.as_str() {
            "inf" | "+inf" => Some(f64::INFINITY),
            "-inf" => Some(f64::NEG_INFINITY),
            "nan" | "+nan" | "-nan" => Some(f64::NAN),
            s => s.parse().ok(),
        }
    }
}

impl fmt::Display for NumberString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<i64> for NumberString {
    fn from(n: i64) -> Self {
        NumberString(n.to_string())
    }
}

impl From<f64> for NumberString {
    fn from(f: f64) -> Self {
        NumberString(format_float(f))
    }
}

impl Serialize for NumberString {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if let Some(i) = self.as_i64() {
            serializer.serialize_i64(i)
        } else if let Some(f) = self.as_f64() {
            serializer.serialize_f64(f)
        } else {
            serializer.serialize_str(&self.0)
        }
    }
}

struct NumberStringVisitor;

impl<'de> Visitor<'de> for NumberStringVisitor {
    type Value = NumberString;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a number or a string")
    }

    fn visit_i64<E>(self, value: i64) -> Result<NumberString, E> {
        Ok(NumberString::from(value))
    }

    fn visit_u64<E>(self, value: u64) -> Result<NumberString, E> {
        Ok(NumberString(value.to_string()))
    }

    fn visit_f64<E>(self, value: f64) -> Result<NumberString, E> {
        Ok(NumberString::from(value))
    }

    fn visit_str<E>(self, value: &str) -> Result<NumberString, E> {
        Ok(NumberString(value.to_string()))
    }

    fn visit_string<E>(self, value: String) -> Result<NumberString, E> {
        Ok(NumberString(value))
    }

    fn visit_newtype_struct<D>(self, deserializer: D) -> Result<NumberString, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(self)
    }
}

impl<'de> Deserialize<'de> for NumberString {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_newtype_struct(NUMBER_STRING_TOKEN, NumberStringVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_string_conversions() {
        assert_eq!(NumberString::from(42).as_i64(), Some(42));
        assert_eq!(NumberString::from(1.0).as_str(), "1.0");
        assert_eq!(NumberString::from(f64::NEG_INFINITY).as_str(), "-inf");
        assert!(NumberString::from(f64::NAN).as_f64().unwrap().is_nan());
    }

    #[test]
    fn test_hooks_with_json() {
        let n: NumberString = serde_json::from_str("12.5").unwrap();
        assert_eq!(n.as_str(), "12.5");

        let port: Text<u16> = serde_json::from_str("\"8080\"").unwrap();
        assert_eq!(*port, 8080);
    }
}
