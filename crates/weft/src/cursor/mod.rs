//! # Text Cursor
//!
//! Character-level access to the source text with scoped backtracking.
//!
//! ## Overview
//!
//! A [`TextCursor`] owns a position in an immutable source string and a stack
//! of saved positions. Every speculative match opens a scope with
//! [`TextCursor::scoped_attempt`] and closes it with exactly one of:
//!
//! - [`TextCursor::commit`]: keep the progress made inside the scope
//! - [`TextCursor::abandon`]: rewind to where the scope started
//!
//! [`TextCursor::attempt`] wraps a closure in a scope and picks between the
//! two from the closure's result, so `?` inside the closure can never leak a
//! scope.
//!
//! ## Nesting Limit
//!
//! Recursive rules open one scope per level, so [`CursorConfig::max_depth`]
//! bounds how deep a parse can go. Opening a scope past the limit through
//! [`TextCursor::try_scoped_attempt`] or [`TextCursor::attempt`] fails like
//! any other mismatch instead of exhausting the stack.
//!
//! ## Skip Sets
//!
//! Characters in the skip set (usually whitespace) are dropped while consuming
//! and never count towards a request. [`SkipMode`] controls when they are
//! dropped.
//!
//! ## Example
//!
//! ```rust
//! use weft::cursor::{CursorConfig, SkipMode, TextCursor};
//!
//! let mut cursor = TextCursor::with_config("  ab c", &CursorConfig::whitespace());
//! assert_eq!(cursor.next(2, SkipMode::Always), "ab");
//!
//! let mark = cursor.scoped_attempt();
//! assert_eq!(cursor.next(1, SkipMode::Always), "c");
//! cursor.abandon(mark);
//!
//! assert_eq!(cursor.peek(1, SkipMode::Always), "c");
//! assert!(!cursor.at_end());
//! ```

mod line_col;

pub use line_col::{LineIndex, Position};

use compact_str::CompactString;
use smallvec::SmallVec;
use tracing::{trace, warn};

use crate::error::{ParseError, ParseFailure, ParseOutcome};
use crate::value::Value;

/// When skip-set characters are dropped during consumption
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SkipMode {
    /// Drop skip characters anywhere
    #[default]
    Always,
    /// Treat skip characters as ordinary content
    Never,
    /// Drop skip characters only before the first consumed character
    Initial,
}

impl From<bool> for SkipMode {
    fn from(skip: bool) -> Self {
        if skip { Self::Always } else { Self::Never }
    }
}

/// Configuration for a [`TextCursor`]
///
/// # Example
///
/// ```rust
/// use weft::cursor::{CursorConfig, TextCursor};
///
/// let config = CursorConfig {
///     skip: vec![' ', '\t'],
///     ..CursorConfig::default()
/// };
/// let cursor = TextCursor::with_config("  x", &config);
/// assert!(!cursor.at_end());
/// ```
#[derive(Debug, Clone)]
pub struct CursorConfig {
    /// Characters dropped during consumption
    pub skip: Vec<char>,
    /// Record the deepest failure seen so top-level errors can report it
    pub track_furthest: bool,
    /// Maximum number of scoped attempts open at once
    pub max_depth: usize,
}

impl Default for CursorConfig {
    fn default() -> Self {
        Self {
            skip: Vec::new(),
            track_furthest: true,
            max_depth: 1000,
        }
    }
}

impl CursorConfig {
    /// Configuration that skips spaces, tabs and line breaks
    #[must_use]
    pub fn whitespace() -> Self {
        Self {
            skip: vec![' ', '\t', '\n', '\r'],
            ..Self::default()
        }
    }
}

/// Token for an open scoped attempt
///
/// A mark must be handed back to the cursor that issued it through
/// [`TextCursor::commit`] or [`TextCursor::abandon`], innermost first.
#[must_use = "a scoped attempt must be committed or abandoned"]
#[derive(Debug)]
pub struct Mark {
    depth: usize,
    start: usize,
}

impl Mark {
    /// Offset the scope was opened at
    #[must_use]
    pub const fn start(&self) -> usize {
        self.start
    }
}

/// Backtracking cursor over source text
#[derive(Debug, Clone)]
pub struct TextCursor<'src> {
    source: &'src str,
    offset: usize,
    marks: Vec<usize>,
    skip: SmallVec<[char; 4]>,
    lines: LineIndex,
    track_furthest: bool,
    max_depth: usize,
    furthest: Option<ParseFailure>,
}

impl<'src> TextCursor<'src> {
    /// Create a cursor with an empty skip set
    #[must_use]
    pub fn new(source: &'src str) -> Self {
        Self::with_config(source, &CursorConfig::default())
    }

    /// Create a cursor with the given configuration
    #[must_use]
    pub fn with_config(source: &'src str, config: &CursorConfig) -> Self {
        Self {
            source,
            offset: 0,
            marks: Vec::new(),
            skip: config.skip.iter().copied().collect(),
            lines: LineIndex::new(source),
            track_furthest: config.track_furthest,
            max_depth: config.max_depth,
            furthest: None,
        }
    }

    /// The full source text
    #[must_use]
    pub const fn source(&self) -> &'src str {
        self.source
    }

    /// Current byte offset
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Number of open scoped attempts
    #[must_use]
    pub fn depth(&self) -> usize {
        self.marks.len()
    }

    /// Unconsumed text, skip characters included
    #[must_use]
    pub fn remaining(&self) -> &'src str {
        &self.source[self.offset..]
    }

    /// Line and column of the current offset
    #[must_use]
    pub fn position(&self) -> Position {
        self.lines.locate(self.source, self.offset)
    }

    fn is_skipped(&self, ch: char) -> bool {
        self.skip.contains(&ch)
    }

    /// Open a scope at the current offset
    ///
    /// The nesting limit is not checked here; see
    /// [`try_scoped_attempt`](Self::try_scoped_attempt).
    pub fn scoped_attempt(&mut self) -> Mark {
        self.marks.push(self.offset);
        Mark {
            depth: self.marks.len(),
            start: self.offset,
        }
    }

    /// Open a scope unless `max_depth` scopes are already open
    ///
    /// # Errors
    ///
    /// Returns a failure at the innermost open scope when the limit is reached.
    pub fn try_scoped_attempt(&mut self) -> ParseOutcome<Mark> {
        if self.marks.len() >= self.max_depth {
            trace!(depth = self.marks.len(), "nesting limit reached");
            return self.fail(format!(
                "maximum nesting depth ({}) exceeded",
                self.max_depth
            ));
        }
        Ok(self.scoped_attempt())
    }

    /// Whether `mark` is the innermost open scope
    ///
    /// A mark closed out of order leaves the stack untouched.
    fn closes_innermost(&self, mark: &Mark) -> bool {
        let innermost = self.marks.len() == mark.depth;
        if !innermost {
            warn!(
                open = self.marks.len(),
                mark = mark.depth,
                "scoped attempt closed out of order, ignoring"
            );
        }
        innermost
    }

    /// Close a scope and keep the progress made inside it
    pub fn commit(&mut self, mark: Mark) {
        if self.closes_innermost(&mark) {
            self.marks.truncate(mark.depth - 1);
        }
    }

    /// Close a scope and rewind to where it was opened
    pub fn abandon(&mut self, mark: Mark) {
        if !self.closes_innermost(&mark) {
            return;
        }
        let restored = self.marks.pop().unwrap_or(mark.start);
        if restored != self.offset {
            trace!(from = self.offset, to = restored, "backtrack");
        }
        self.offset = restored;
    }

    /// Run `f` inside a scope, committing on success and abandoning on failure
    ///
    /// # Errors
    ///
    /// Returns the failure of `f`, or a nesting failure if no scope can be
    /// opened.
    pub fn attempt<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> ParseOutcome<T>,
    ) -> ParseOutcome<T> {
        let mark = self.try_scoped_attempt()?;
        let outcome = f(self);
        match outcome {
            Ok(_) => self.commit(mark),
            Err(_) => self.abandon(mark),
        }
        outcome
    }

    /// Consume up to `count` characters that are not dropped by `mode`
    ///
    /// Returns fewer characters when the input runs out. Callers compare the
    /// length themselves.
    pub fn next(&mut self, count: usize, mode: SkipMode) -> CompactString {
        let source = self.source;
        let mut taken = CompactString::default();
        let mut remaining = count;
        let mut skipping = mode != SkipMode::Never;

        for ch in source[self.offset..].chars() {
            if remaining == 0 {
                break;
            }
            self.offset += ch.len_utf8();
            if skipping && self.is_skipped(ch) {
                continue;
            }
            taken.push(ch);
            remaining -= 1;
            if mode == SkipMode::Initial {
                skipping = false;
            }
        }

        taken
    }

    /// Look at the next characters without consuming them
    pub fn peek(&mut self, count: usize, mode: SkipMode) -> CompactString {
        let mark = self.scoped_attempt();
        let taken = self.next(count, mode);
        self.abandon(mark);
        taken
    }

    /// Whether only skip characters remain
    #[must_use]
    pub fn at_end(&self) -> bool {
        self.remaining().chars().all(|ch| self.is_skipped(ch))
    }

    fn skip_forward(&self, from: usize) -> usize {
        self.source[from..]
            .char_indices()
            .find(|&(_, ch)| !self.is_skipped(ch))
            .map_or(self.source.len(), |(idx, _)| from + idx)
    }

    /// Build a failure located at the start of the innermost open scope
    ///
    /// Leading skip characters are stepped over so the position points at
    /// content. With no scope open the current offset is used. The failure
    /// becomes the furthest one if no recorded failure lies beyond it, so
    /// among failures at the same offset the latest is kept.
    pub fn failure(&mut self, message: impl Into<String>) -> ParseFailure {
        let anchor = self.marks.last().copied().unwrap_or(self.offset);
        let position = self.lines.locate(self.source, self.skip_forward(anchor));
        let failure = ParseFailure::new(message, position);

        if self.track_furthest
            && self
                .furthest
                .as_ref()
                .is_none_or(|recorded| !recorded.is_beyond(&failure))
        {
            self.furthest = Some(failure.clone());
        }

        failure
    }

    /// Fail the current attempt
    pub fn fail<T>(&mut self, message: impl Into<String>) -> ParseOutcome<T> {
        Err(self.failure(message))
    }

    /// The deepest failure recorded so far
    #[must_use]
    pub const fn furthest_failure(&self) -> Option<&ParseFailure> {
        self.furthest.as_ref()
    }

    /// Take the deepest failure, clearing the record
    pub fn take_furthest(&mut self) -> Option<ParseFailure> {
        self.furthest.take()
    }

    fn describe_next(&mut self, count: usize) -> String {
        let found = self.peek(count, SkipMode::Initial);
        if found.is_empty() {
            "end of input".to_string()
        } else {
            format!("'{found}'")
        }
    }

    /// Match `literal` exactly, skipping only before its first character
    pub fn expect(&mut self, literal: &str) -> ParseOutcome<CompactString> {
        let wanted = literal.chars().count();
        self.attempt(|cursor| {
            let found = cursor.next(wanted, SkipMode::Initial);
            if found == literal {
                Ok(found)
            } else {
                let got = if found.is_empty() {
                    "end of input".to_string()
                } else {
                    format!("'{found}'")
                };
                cursor.fail(format!("expected '{literal}', got {got}"))
            }
        })
    }

    /// Match a non-empty run of characters satisfying `accept`
    ///
    /// Skip characters are dropped before the run but end it once it has
    /// started. `expected` names the run in the failure message.
    pub fn take_while1(
        &mut self,
        accept: impl Fn(char) -> bool,
        expected: &str,
    ) -> ParseOutcome<CompactString> {
        self.attempt(|cursor| {
            let start = cursor.skip_forward(cursor.offset);
            let run = cursor.source[start..]
                .char_indices()
                .find(|&(_, ch)| !accept(ch))
                .map_or(cursor.source.len(), |(idx, _)| start + idx);

            if run == start {
                let got = cursor.describe_next(1);
                return cursor.fail(format!("expected {expected}, got {got}"));
            }

            cursor.offset = run;
            Ok(CompactString::from(&cursor.source[start..run]))
        })
    }

    /// Consume raw text up to and including `delimiter`, returning the text before it
    pub fn take_until(&mut self, delimiter: char) -> ParseOutcome<CompactString> {
        self.attempt(|cursor| {
            let rest = cursor.remaining();
            let Some(end) = rest.find(delimiter) else {
                cursor.offset = cursor.source.len();
                return cursor.fail(format!("expected closing '{delimiter}', got end of input"));
            };

            cursor.offset += end + delimiter.len_utf8();
            Ok(CompactString::from(&rest[..end]))
        })
    }

    /// Turn the outcome of a start rule into a top-level result
    ///
    /// Success additionally requires that only skip characters remain.
    pub fn finish(&mut self, outcome: ParseOutcome<Value>) -> Result<Value, ParseError> {
        let furthest = self.take_furthest();
        match outcome {
            Ok(value) if self.at_end() => Ok(value),
            Ok(_) => {
                let start = self.skip_forward(self.offset);
                let position = self.lines.locate(self.source, start);
                let found = self.source[start..].chars().take(16).collect();
                Err(ParseError::TrailingInput {
                    position,
                    found,
                    furthest: furthest.filter(|deeper| deeper.position.offset >= start),
                })
            }
            Err(failure) => Err(ParseError::NoMatch {
                furthest: furthest.filter(|deeper| deeper.is_beyond(&failure)),
                failure,
            }),
        }
    }
}
