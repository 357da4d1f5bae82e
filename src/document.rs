//! A parsed document: the tree and its key registry.

use crate::de::decode_table;
use crate::error::Result;
use crate::meta::MetaData;
use crate::Table;
use serde::de::DeserializeOwned;

/// The result of [`crate::parse`].
///
/// # Examples
///
/// ```rust
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct Owner {
///     name: String,
/// }
///
/// let mut doc = tomldec::parse("[owner]\nname = \"Tom\"\ndob = 1979-05-27").unwrap();
/// assert_eq!(doc.meta().type_name(&["owner", "dob"]), Some("Datetime"));
///
/// #[derive(Deserialize)]
/// struct Config {
///     owner: Owner,
/// }
///
/// let config: Config = doc.decode().unwrap();
/// assert_eq!(config.owner.name, "Tom");
/// assert!(doc.meta().is_decoded(&["owner", "name"]));
/// assert!(!doc.meta().is_decoded(&["owner", "dob"]));
/// ```
#[derive(Debug, Clone)]
pub struct Document {
    table: Table,
    meta: MetaData,
}

impl Document {
    pub(crate) fn new(table: Table, meta: MetaData) -> Self {
        Document { table, meta }
    }

    /// The root table.
    #[must_use]
    pub fn table(&self) -> &Table {
        &self.table
    }

    #[must_use]
    pub fn meta(&self) -> &MetaData {
        &self.meta
    }

    #[must_use]
    pub fn into_parts(self) -> (Table, MetaData) {
        (self.table, self.meta)
    }

    /// Decodes the root table into `T`, recording the consumed keys in
    /// [`Document::meta`].
    ///
    /// Decoding the same document twice accumulates the decoded keys of
    /// both passes.
    ///
    /// # Errors
    ///
    /// Type mismatches, range errors and errors raised by `T`'s
    /// `Deserialize` implementation, located at the offending key.
    pub fn decode<T: DeserializeOwned>(&mut self) -> Result<T> {
        decode_table(&self.table, &mut self.meta, false)
    }

    pub(crate) fn decode_strict<T: DeserializeOwned>(&mut self, deny_unknown_keys: bool) -> Result<T> {
        decode_table(&self.table, &mut self.meta, deny_unknown_keys)
    }
}
