//! Source positions.

/// A location in the source document.
///
/// `line` and `column` are 1-based; the column counts characters, not
/// bytes. `start` is the byte offset and `len` the length in bytes of the
/// region the position refers to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Position {
    pub line: usize,
    pub column: usize,
    pub start: usize,
    pub len: usize,
}

impl Position {
    /// Resolves a byte span of `input` into a line/column position.
    ///
    /// Offsets past the end of the input are clamped, and offsets inside a
    /// multi-byte character are moved back to the start of that character.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tomldec::Position;
    ///
    /// let pos = Position::resolve("a = 1\nbé = 2", 10, 1);
    /// assert_eq!((pos.line, pos.column), (2, 4));
    /// ```
    #[must_use]
    pub fn resolve(input: &str, start: usize, len: usize) -> Self {
        let mut start = start.min(input.len());
        while !input.is_char_boundary(start) {
            start -= 1;
        }
        let before = &input[..start];
        let line = before.bytes().filter(|&b| b == b'\n').count() + 1;
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        let column = before[line_start..].chars().count() + 1;
        Position {
            line,
            column,
            start,
            len: len.max(1),
        }
    }
}

/// Expands tabs to the next multiple of eight columns.
pub(crate) fn expand_tab(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut col = 0;
    for c in s.chars() {
        if c == '\t' {
            let n = 8 - col % 8;
            out.extend(std::iter::repeat(' ').take(n));
            col += n;
        } else {
            out.push(c);
            col += 1;
        }
    }
    out
}
