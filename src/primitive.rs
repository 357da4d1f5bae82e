//! Deferred decoding.

use crate::key::Key;
use crate::Value;
use serde::de::{self, Deserialize, Deserializer, SeqAccess, Visitor};
use std::fmt;

pub(crate) const PRIMITIVE_TOKEN: &str = "$__tomldec_private_Primitive";

/// A document node whose decoding is postponed.
///
/// A field of type `Primitive` captures the node and its key path. Nothing
/// beneath it counts as decoded until it is passed to
/// [`crate::MetaData::decode_primitive`], usually once other fields have
/// decided what the node should become.
///
/// Only this crate's decoder produces primitives; other formats reject
/// them.
#[derive(Debug, Clone, PartialEq)]
pub struct Primitive {
    value: Value,
    key: Key,
}

impl Primitive {
    #[must_use]
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// The key path the node was found at.
    #[must_use]
    pub fn key(&self) -> &Key {
        &self.key
    }

    #[must_use]
    pub fn into_value(self) -> Value {
        self.value
    }
}

struct PrimitiveVisitor;

impl<'de> Visitor<'de> for PrimitiveVisitor {
    type Value = Primitive;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a TOML document node")
    }

    fn visit_newtype_struct<D>(self, deserializer: D) -> Result<Primitive, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_tuple(2, PartsVisitor)
    }
}

/// Receives `(key segments, node)` from the decoder.
struct PartsVisitor;

impl<'de> Visitor<'de> for PartsVisitor {
    type Value = Primitive;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a key path and a TOML value")
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Primitive, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let segments: Vec<String> = seq
            .next_element()?
            .ok_or_else(|| de::Error::invalid_length(0, &self))?;
        let value: Value = seq
            .next_element()?
            .ok_or_else(|| de::Error::invalid_length(1, &self))?;
        Ok(Primitive {
            value,
            key: Key::from(segments),
        })
    }
}

impl<'de> Deserialize<'de> for Primitive {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_newtype_struct(PRIMITIVE_TOKEN, PrimitiveVisitor)
    }
}
