//! Configuration options for parsing, decoding and encoding.
//!
//! - [`ParseOptions`]: which TOML dialect the parser accepts
//! - [`DecodeOptions`]: parse options plus strict key checking
//! - [`EncodeOptions`]: layout of encoded documents
//!
//! ## Examples
//!
//! ```rust
//! use tomldec::{DecodeOptions, Decoder, ParseOptions};
//!
//! #[derive(serde::Deserialize)]
//! struct Alarm {
//!     at: tomldec::Datetime,
//! }
//!
//! // Times without seconds are only accepted by the extended dialect.
//! let options = DecodeOptions::new().with_parse(ParseOptions::new().extended(true));
//! let (alarm, _meta) = Decoder::with_options(options).decode::<Alarm>("at = 07:32").unwrap();
//! assert_eq!(alarm.at.to_string(), "07:32:00");
//! ```

/// Options controlling the parser.
///
/// # Examples
///
/// ```rust
/// use tomldec::ParseOptions;
///
/// let options = ParseOptions::new();
/// assert!(!options.extended);
/// assert!(ParseOptions::new().extended(true).extended);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Accept the extended dialect: `\e` and `\xHH` escapes in basic
    /// strings, and datetimes and times written without seconds.
    pub extended: bool,
}

impl ParseOptions {
    /// Creates options for strict TOML 1.0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn extended(mut self, extended: bool) -> Self {
        self.extended = extended;
        self
    }
}

/// Options controlling [`crate::Decoder`].
///
/// # Examples
///
/// ```rust
/// use tomldec::DecodeOptions;
///
/// let options = DecodeOptions::new().deny_unknown_keys(true);
/// assert!(options.deny_unknown_keys);
/// assert!(!options.parse.extended);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DecodeOptions {
    pub parse: ParseOptions,
    /// Fail when the document holds keys the destination never consumed.
    pub deny_unknown_keys: bool,
}

impl DecodeOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_parse(mut self, parse: ParseOptions) -> Self {
        self.parse = parse;
        self
    }

    #[must_use]
    pub fn deny_unknown_keys(mut self, deny: bool) -> Self {
        self.deny_unknown_keys = deny;
        self
    }
}

/// Options controlling the encoder.
///
/// # Examples
///
/// ```rust
/// use tomldec::{to_string_with_options, EncodeOptions};
/// use std::collections::BTreeMap;
///
/// let mut servers = BTreeMap::new();
/// servers.insert("alpha", BTreeMap::from([("ip", "10.0.0.1")]));
/// let doc = BTreeMap::from([("servers", servers)]);
///
/// let text = to_string_with_options(&doc, EncodeOptions::new().with_indent(2)).unwrap();
/// assert_eq!(text, "  [servers.alpha]\n  ip = \"10.0.0.1\"\n");
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EncodeOptions {
    /// Spaces added per nesting level of a section. Top-level sections and
    /// their keys are never indented.
    pub indent: usize,
}

impl EncodeOptions {
    /// Creates default options (no indentation).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }
}
