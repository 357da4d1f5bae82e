//! The TOML grammar as accepted by this crate.
//!
//! This module contains documentation only.
//!
//! # Documents
//!
//! A document is a sequence of lines, each holding at most one of:
//!
//! ```text
//! # a comment
//! key = "value"          # key/value pair
//! [table]                # table header
//! [[array.of.tables]]    # array-of-tables header
//! ```
//!
//! The input must be UTF-8 and must not contain NUL bytes. A leading byte
//! order mark is skipped.
//!
//! ## Keys
//!
//! | Form | Example | Notes |
//! |------|---------|-------|
//! | Bare | `server_1-a` | ASCII letters, digits, `_` and `-` |
//! | Basic | `"ʎǝʞ"` | escapes allowed |
//! | Literal | `'C:\key'` | no escapes |
//! | Dotted | `site."google.com".port` | each segment is one of the above |
//!
//! Keys are resolved relative to the most recent header. Inside an inline
//! table they are resolved relative to the inline table itself.
//!
//! ## Tables
//!
//! - `[a.b.c]` creates `a` and `a.b` implicitly when they do not exist yet.
//!   An implicitly created table may later get its own `[a]` header once;
//!   a second header is a duplicate.
//! - A key can hold a value or a table, never both: `a = 1` followed by
//!   `[a]` or `a.b = 2` is an error.
//! - Inline tables (`{ x = 1, y = 2 }`) are complete once closed. Neither
//!   headers nor dotted keys may add to them afterwards.
//! - `[[fruit]]` appends a new table to the array `fruit`. Headers such as
//!   `[fruit.physical]` that follow refer to the most recent element.
//!
//! ## Values
//!
//! | Type | Examples |
//! |------|----------|
//! | String | `"basic\n"`, `'literal'`, `"""multi-line"""`, `'''multi-line literal'''` |
//! | Integer | `+99`, `-17`, `1_000`, `0xdead_beef`, `0o755`, `0b1101` |
//! | Float | `3.14`, `-0.01`, `5e+22`, `6.626e-34`, `inf`, `-inf`, `nan` |
//! | Boolean | `true`, `false` |
//! | Datetime | `1979-05-27T07:32:00Z`, `1979-05-27 07:32:00`, `1979-05-27`, `07:32:00.999` |
//! | Array | `[1, 2, 3]`, `["a", [1.5, 2.5]]`, trailing commas and comments allowed |
//! | Inline table | `{ first = "Tom", last = "Preston-Werner" }` |
//!
//! Number rules:
//!
//! - Underscores must sit between two digits: `1_000` is valid, `_1000`,
//!   `1000_` and `1__000` are not.
//! - Decimal integers and the integer part of floats have no leading zeros.
//! - A decimal point is followed by at least one digit: `1.e2` is invalid.
//! - Integers must fit in 64 signed bits.
//!
//! Basic strings accept the escapes `\b \t \n \f \r \" \\ \uXXXX
//! \UXXXXXXXX`. A backslash at the end of a line in a multi-line basic
//! string removes the line break and the whitespace that follows.
//!
//! # Extended Dialect
//!
//! [`crate::ParseOptions::extended`] enables a few additions:
//!
//! - `\e` (escape, U+001B) and `\xHH` in basic strings
//! - datetimes and times without seconds: `1979-05-27T07:32`, `07:32`
//!
//! # Decoding
//!
//! | Document value | Destinations |
//! |----------------|--------------|
//! | String | `String`, `&str`-like, `char` (one character), unit enum variants, [`crate::Text`] |
//! | Integer | any integer type (range-checked), floats, [`crate::NumberString`], `Duration` (nanoseconds) |
//! | Float | `f64`, `f32` (range-checked), [`crate::NumberString`] |
//! | Boolean | `bool` |
//! | Datetime | [`crate::Datetime`], `chrono` types, `String` (RFC 3339 text) |
//! | Array | `Vec<T>`, tuples and arrays of matching length, sets |
//! | Table | structs, maps with string keys, single-entry tables for enum variants |
//! | Array of tables | `Vec<T>` of structs or maps |
//!
//! Any node can be captured as [`crate::Value`] or deferred as
//! [`crate::Primitive`]. Struct fields are matched by exact name first, then
//! case-insensitively. `Duration` fields also accept strings such as
//! `"1h30m"` or `"250ms"`.

// This module contains only documentation; no implementation code
