//! Key paths.

use std::fmt;

/// A key path: the ordered segments leading from the document root to a
/// value, e.g. `["servers", "alpha", "ip"]` for `servers.alpha.ip`.
///
/// Array-of-tables elements share the path of their header; paths never
/// carry indices.
///
/// # Examples
///
/// ```rust
/// use tomldec::Key;
///
/// let key = Key::from(vec!["servers", "alpha.beta", "ip"]);
/// assert_eq!(key.to_string(), r#"servers."alpha.beta".ip"#);
/// assert_eq!(key.len(), 3);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key(Vec<String>);

impl Key {
    /// Creates the empty (root) key.
    #[must_use]
    pub fn new() -> Self {
        Key(Vec::new())
    }

    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The final segment, if any.
    #[must_use]
    pub fn last(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    /// The key with the final segment removed.
    #[must_use]
    pub fn parent(&self) -> Key {
        let n = self.0.len().saturating_sub(1);
        Key(self.0[..n].to_vec())
    }

    /// A new key extending this one by `segment`.
    #[must_use]
    pub fn child(&self, segment: impl Into<String>) -> Key {
        let mut segments = Vec::with_capacity(self.0.len() + 1);
        segments.extend_from_slice(&self.0);
        segments.push(segment.into());
        Key(segments)
    }

    /// A new key extending this one by every segment of `other`.
    #[must_use]
    pub fn join(&self, other: &[String]) -> Key {
        let mut segments = self.0.clone();
        segments.extend_from_slice(other);
        Key(segments)
    }

    pub(crate) fn push(&mut self, segment: impl Into<String>) {
        self.0.push(segment.into());
    }

    /// Compares against a path given as string slices.
    #[must_use]
    pub fn matches(&self, path: &[&str]) -> bool {
        self.0.len() == path.len() && self.0.iter().zip(path).all(|(a, b)| a == b)
    }

    /// `true` if `self` starts with every segment of `prefix`.
    #[must_use]
    pub fn starts_with(&self, prefix: &Key) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

/// `true` if `s` can be written as a bare key.
pub(crate) fn is_bare(s: &str) -> bool {
    !s.is_empty()
        && s.bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

/// Writes `s` as a TOML basic string, quotes included.
pub(crate) fn write_quoted(out: &mut impl fmt::Write, s: &str) -> fmt::Result {
    out.write_char('"')?;
    for c in s.chars() {
        match c {
            '"' => out.write_str("\\\"")?,
            '\\' => out.write_str("\\\\")?,
            '\u{8}' => out.write_str("\\b")?,
            '\t' => out.write_str("\\t")?,
            '\n' => out.write_str("\\n")?,
            '\u{c}' => out.write_str("\\f")?,
            '\r' => out.write_str("\\r")?,
            c if c < ' ' || c == '\u{7f}' => write!(out, "\\u{:04X}", c as u32)?,
            c => out.write_char(c)?,
        }
    }
    out.write_char('"')
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            if is_bare(segment) {
                f.write_str(segment)?;
            } else {
                write_quoted(f, segment)?;
            }
        }
        Ok(())
    }
}

impl From<Vec<String>> for Key {
    fn from(segments: Vec<String>) -> Self {
        Key(segments)
    }
}

impl From<Vec<&str>> for Key {
    fn from(segments: Vec<&str>) -> Self {
        Key(segments.into_iter().map(String::from).collect())
    }
}

impl From<&[&str]> for Key {
    fn from(segments: &[&str]) -> Self {
        Key(segments.iter().map(|s| s.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Key {
    fn from(segments: [&str; N]) -> Self {
        Key(segments.iter().map(|s| s.to_string()).collect())
    }
}

impl FromIterator<String> for Key {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Key(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_bare_and_quoted() {
        assert_eq!(Key::from(["a", "b-c", "d_1"]).to_string(), "a.b-c.d_1");
        assert_eq!(Key::from(["a", "b c"]).to_string(), r#"a."b c""#);
        assert_eq!(Key::from(["", "x"]).to_string(), r#""".x"#);
        assert_eq!(Key::from(["tab\there"]).to_string(), r#""tab\there""#);
    }

    #[test]
    fn test_child_parent() {
        let key = Key::from(["a"]).child("b");
        assert!(key.matches(&["a", "b"]));
        assert_eq!(key.parent(), Key::from(["a"]));
        assert_eq!(key.last(), Some("b"));
        assert_eq!(Key::new().parent(), Key::new());
    }

    #[test]
    fn test_starts_with() {
        let key = Key::from(["a", "b", "c"]);
        assert!(key.starts_with(&Key::from(["a", "b"])));
        assert!(!key.starts_with(&Key::from(["b"])));
        assert!(key.starts_with(&Key::new()));
    }

    #[test]
    fn test_write_quoted_control_chars() {
        let mut out = String::new();
        write_quoted(&mut out, "a\u{1}\"b").unwrap();
        assert_eq!(out, r#""a\u0001\"b""#);
    }
}
