//! Line and column positions
//!
//! Failures report where they happened as a 1-based line and column. The
//! cursor builds one [`LineIndex`] per source text so that every failure can be
//! located with a binary search instead of a rescan from the start.

use std::fmt;

/// A located point in the source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Position {
    /// Byte offset into the source
    pub offset: usize,
    /// One-based line number
    pub line: u32,
    /// One-based column number, counted in `char`s
    pub column: u32,
}

impl Position {
    /// Create a new position
    #[must_use]
    pub const fn new(offset: usize, line: u32, column: u32) -> Self {
        Self {
            offset,
            line,
            column,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[cfg(feature = "diagnostics")]
impl From<Position> for miette::SourceSpan {
    fn from(position: Position) -> Self {
        Self::from((position.offset, 0))
    }
}

/// Line index for converting byte offsets to positions
///
/// Only `\n` starts a new line. A `\r` before it stays part of the previous
/// line, so `\r\n` sources report the same line numbers as `\n` sources.
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Byte offsets of line starts (the first line starts at 0)
    line_starts: Vec<usize>,
    text_len: usize,
}

impl LineIndex {
    /// Create a new line index from source text
    ///
    /// # Example
    ///
    /// ```rust
    /// use weft::cursor::LineIndex;
    ///
    /// let text = "line 1\nline 2\nline 3";
    /// let index = LineIndex::new(text);
    /// let pos = index.locate(text, 10);
    /// assert_eq!((pos.line, pos.column), (2, 4));
    /// ```
    #[must_use]
    pub fn new(text: &str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(
                text.bytes()
                    .enumerate()
                    .filter(|&(_, byte)| byte == b'\n')
                    .map(|(i, _)| i + 1),
            )
            .collect();

        Self {
            line_starts,
            text_len: text.len(),
        }
    }

    /// Locate a byte offset in `text`, which must be the text the index was built from
    ///
    /// Offsets past the end are clamped to the end of the text.
    #[must_use]
    pub fn locate(&self, text: &str, offset: usize) -> Position {
        let offset = offset.min(self.text_len);
        let line = match self.line_starts.binary_search(&offset) {
            Ok(idx) => idx,
            Err(idx) => idx.saturating_sub(1),
        };
        let line_start = self.line_starts[line];
        let column = text
            .get(line_start..offset)
            .map_or(offset - line_start, |prefix| prefix.chars().count());

        Position {
            offset,
            line: u32::try_from(line + 1).unwrap_or(u32::MAX),
            column: u32::try_from(column + 1).unwrap_or(u32::MAX),
        }
    }

    /// Get the byte range of a one-based line, without its terminating newline
    #[must_use]
    pub fn line_span(&self, line: u32) -> Option<std::ops::Range<usize>> {
        let idx = (line as usize).checked_sub(1)?;
        let start = *self.line_starts.get(idx)?;
        let end = self
            .line_starts
            .get(idx + 1)
            .map_or(self.text_len, |next| next - 1);
        Some(start..end)
    }
}
