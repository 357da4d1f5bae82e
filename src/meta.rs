//! Key and type metadata.
//!
//! Parsing records every key it defines, in document order, together with
//! the kind of value and the position of its definition. Decoding adds the
//! set of keys that the destination actually consumed, which makes it
//! possible to report keys that were present in the document but never
//! used.
//!
//! ```rust
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Config {
//!     name: String,
//! }
//!
//! let (config, meta) = tomldec::decode::<Config>("name = \"x\"\nport = 80").unwrap();
//! assert_eq!(config.name, "x");
//! assert!(meta.is_defined(&["port"]));
//! assert_eq!(meta.type_name(&["port"]), Some("Integer"));
//!
//! let unused: Vec<String> = meta.undecoded().iter().map(|k| k.to_string()).collect();
//! assert_eq!(unused, vec!["port"]);
//! ```

use crate::de::{decode_with, Src};
use crate::error::{Error, Result};
use crate::key::Key;
use crate::position::Position;
use crate::primitive::Primitive;
use log::trace;
use serde::de::DeserializeOwned;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// The kind of value a key was defined with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    String,
    Integer,
    Float,
    Bool,
    Datetime,
    Array,
    /// A table, from a `[header]`, a dotted key or an inline table.
    Hash,
    /// An array of tables, from `[[header]]`.
    ArrayHash,
}

impl ValueType {
    /// The registry name: `"String"`, `"Integer"`, `"Float"`, `"Bool"`,
    /// `"Datetime"`, `"Array"`, `"Hash"` or `"ArrayHash"`.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            ValueType::String => "String",
            ValueType::Integer => "Integer",
            ValueType::Float => "Float",
            ValueType::Bool => "Bool",
            ValueType::Datetime => "Datetime",
            ValueType::Array => "Array",
            ValueType::Hash => "Hash",
            ValueType::ArrayHash => "ArrayHash",
        }
    }

    pub(crate) const fn describe(&self) -> &'static str {
        match self {
            ValueType::String => "string",
            ValueType::Integer => "integer",
            ValueType::Float => "float",
            ValueType::Bool => "boolean",
            ValueType::Datetime => "datetime",
            ValueType::Array => "array",
            ValueType::Hash => "table",
            ValueType::ArrayHash => "array of tables",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What the registry knows about one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyInfo {
    pub value_type: ValueType,
    pub position: Position,
}

/// Metadata about a parsed document and about what decoding consumed.
#[derive(Debug, Clone)]
pub struct MetaData {
    keys: Vec<Key>,
    info: HashMap<Key, KeyInfo>,
    decoded: HashSet<Key>,
    input: Arc<str>,
}

impl MetaData {
    pub(crate) fn new(input: Arc<str>) -> Self {
        MetaData {
            keys: Vec::new(),
            info: HashMap::new(),
            decoded: HashSet::new(),
            input,
        }
    }

    pub(crate) fn push_key(&mut self, key: Key) {
        self.keys.push(key);
    }

    pub(crate) fn set_type(&mut self, key: Key, value_type: ValueType, position: Position) {
        self.info.insert(key, KeyInfo { value_type, position });
    }

    pub(crate) fn mark_decoded(&mut self, key: &Key) {
        if !key.is_empty() && !self.decoded.contains(key) {
            trace!("decoded {key}");
            self.decoded.insert(key.clone());
        }
    }

    /// Marks `key` and every registered key beneath it.
    pub(crate) fn mark_subtree(&mut self, key: &Key) {
        let beneath: Vec<Key> = self
            .keys
            .iter()
            .filter(|k| k.starts_with(key) && !self.decoded.contains(*k))
            .cloned()
            .collect();
        self.decoded.extend(beneath);
        self.mark_decoded(key);
    }

    /// Attaches `key` and its registered position to an error that has
    /// neither yet.
    pub(crate) fn locate(&self, err: Error, key: &Key) -> Error {
        if err.is_located() {
            return err;
        }
        let err = err.in_key(key);
        match self.info.get(key) {
            Some(info) => err.at(info.position, &self.input),
            None => err,
        }
    }

    /// `true` if the document defines `key`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// let doc = tomldec::parse("[server]\nhost = \"localhost\"").unwrap();
    /// assert!(doc.meta().is_defined(&["server", "host"]));
    /// assert!(!doc.meta().is_defined(&["server", "port"]));
    /// ```
    #[must_use]
    pub fn is_defined(&self, key: &[&str]) -> bool {
        self.info.contains_key(&Key::from(key))
    }

    #[must_use]
    pub fn type_of(&self, key: &[&str]) -> Option<ValueType> {
        self.info.get(&Key::from(key)).map(|i| i.value_type)
    }

    /// The registry name of the key's type, `None` when the key is not
    /// defined.
    #[must_use]
    pub fn type_name(&self, key: &[&str]) -> Option<&'static str> {
        self.type_of(key).map(|t| t.name())
    }

    /// Where the key's most recent definition starts.
    #[must_use]
    pub fn position_of(&self, key: &[&str]) -> Option<Position> {
        self.info.get(&Key::from(key)).map(|i| i.position)
    }

    #[must_use]
    pub fn info(&self, key: &Key) -> Option<&KeyInfo> {
        self.info.get(key)
    }

    /// Every key the document defines, in document order.
    ///
    /// A key appears once per definition, so each `[[header]]` of an array
    /// of tables contributes an entry.
    #[must_use]
    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    /// `true` if decoding consumed `key`.
    #[must_use]
    pub fn is_decoded(&self, key: &[&str]) -> bool {
        self.decoded.contains(&Key::from(key))
    }

    /// The keys in [`MetaData::keys`] that decoding did not consume, in
    /// document order.
    #[must_use]
    pub fn undecoded(&self) -> Vec<Key> {
        self.keys
            .iter()
            .filter(|k| !self.decoded.contains(*k))
            .cloned()
            .collect()
    }

    /// Decodes a value whose decoding was deferred with [`Primitive`].
    ///
    /// Keys beneath the primitive are marked as decoded as the destination
    /// consumes them.
    ///
    /// # Errors
    ///
    /// Fails for the same reasons as a direct decode: type mismatches,
    /// range errors, or errors raised by the destination type.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde::Deserialize;
    /// use tomldec::Primitive;
    ///
    /// #[derive(Deserialize)]
    /// struct Envelope {
    ///     kind: String,
    ///     body: Primitive,
    /// }
    ///
    /// #[derive(Deserialize)]
    /// struct Circle {
    ///     radius: f64,
    /// }
    ///
    /// let input = "kind = \"circle\"\n[body]\nradius = 2.5";
    /// let (env, mut meta) = tomldec::decode::<Envelope>(input).unwrap();
    /// assert!(!meta.is_decoded(&["body", "radius"]));
    ///
    /// assert_eq!(env.kind, "circle");
    /// let circle: Circle = meta.decode_primitive(&env.body).unwrap();
    /// assert_eq!(circle.radius, 2.5);
    /// assert!(meta.undecoded().is_empty());
    /// ```
    pub fn decode_primitive<T: DeserializeOwned>(&mut self, primitive: &Primitive) -> Result<T> {
        decode_with(Src::from(primitive.value()), self, primitive.key().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> MetaData {
        let input: Arc<str> = Arc::from("a = 1\n[t]\nb = 2\n");
        let mut meta = MetaData::new(Arc::clone(&input));
        for (key, ty, at) in [
            (vec!["a"], ValueType::Integer, 4),
            (vec!["t"], ValueType::Hash, 6),
            (vec!["t", "b"], ValueType::Integer, 14),
        ] {
            let key = Key::from(key);
            meta.push_key(key.clone());
            meta.set_type(key, ty, Position::resolve(&input, at, 1));
        }
        meta
    }

    #[test]
    fn test_lookup() {
        let meta = sample();
        assert!(meta.is_defined(&["t", "b"]));
        assert_eq!(meta.type_of(&["t"]), Some(ValueType::Hash));
        assert_eq!(meta.type_name(&["a"]), Some("Integer"));
        assert_eq!(meta.type_name(&["missing"]), None);
        assert_eq!(meta.position_of(&["t", "b"]).map(|p| p.line), Some(3));
    }

    #[test]
    fn test_undecoded_follows_document_order() {
        let mut meta = sample();
        meta.mark_decoded(&Key::from(["t"]));
        let rest: Vec<String> = meta.undecoded().iter().map(|k| k.to_string()).collect();
        assert_eq!(rest, vec!["a", "t.b"]);
    }

    #[test]
    fn test_mark_subtree() {
        let mut meta = sample();
        meta.mark_subtree(&Key::from(["t"]));
        assert!(meta.is_decoded(&["t"]));
        assert!(meta.is_decoded(&["t", "b"]));
        assert!(!meta.is_decoded(&["a"]));
    }

    #[test]
    fn test_locate_only_once() {
        let meta = sample();
        let err = meta.locate(Error::custom("boom"), &Key::from(["t", "b"]));
        assert_eq!(err.to_string(), r#"toml: line 3 (last key "t.b"): boom"#);
        let again = meta.locate(err, &Key::from(["a"]));
        assert_eq!(again.last_key().map(|k| k.to_string()), Some("t.b".into()));
    }
}
