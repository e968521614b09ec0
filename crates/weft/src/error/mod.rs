//! # Error Types
//!
//! Error types for matching, top-level parsing and grammar construction.
//!
//! ## Overview
//!
//! There are two families of errors and they never mix:
//!
//! - **Recoverable failures**: [`ParseFailure`] means "this attempt did not
//!   match". Choice, Optional and Repeat catch it, restore the cursor and move
//!   on. It only escapes as a [`ParseError`] when the start rule itself fails.
//! - **Construction errors**: [`GrammarError`] reports a malformed rule
//!   definition. Backtracking never catches it.
//!
//! Transformers report their own failures as a [`Rejection`], which the
//! engine turns into a positioned [`ParseFailure`].
//!
//! ## Diagnostics Support
//!
//! When the `diagnostics` feature is enabled, errors integrate with [`miette`]
//! and label the failing position in the source.

use compact_str::CompactString;
use thiserror::Error;

use crate::cursor::{LineIndex, Position};

#[cfg(feature = "diagnostics")]
use miette::Diagnostic;

/// Result of a single matching step
pub type ParseOutcome<T> = Result<T, ParseFailure>;

/// A recoverable failure to match at a position
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "diagnostics", derive(Diagnostic))]
#[cfg_attr(feature = "diagnostics", diagnostic(code(weft::parse_failure)))]
#[error("Failed to parse: {message} at {position}")]
pub struct ParseFailure {
    /// What was expected and what was found instead
    pub message: String,
    #[cfg_attr(feature = "diagnostics", label("here"))]
    pub position: Position,
}

impl ParseFailure {
    /// Create a new failure
    #[must_use]
    pub fn new(message: impl Into<String>, position: Position) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }

    /// Whether this failure happened strictly further into the input than `other`
    #[must_use]
    pub const fn is_beyond(&self, other: &Self) -> bool {
        self.position.offset > other.position.offset
    }
}

/// Failure of a complete parse
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "diagnostics", derive(Diagnostic))]
pub enum ParseError {
    /// The start rule did not match
    #[error("{failure}")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(weft::no_match)))]
    NoMatch {
        failure: ParseFailure,
        /// A deeper failure recorded while trying alternatives, if any
        furthest: Option<ParseFailure>,
    },

    /// The start rule matched but input remains
    #[error("Unexpected trailing input '{found}' at {position}")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(weft::trailing_input)))]
    TrailingInput {
        #[cfg_attr(feature = "diagnostics", label("parse stopped here"))]
        position: Position,
        found: CompactString,
        furthest: Option<ParseFailure>,
    },

    #[error(transparent)]
    #[cfg_attr(feature = "diagnostics", diagnostic(transparent))]
    Grammar(#[from] GrammarError),
}

impl ParseError {
    /// Get the position this error points at
    #[must_use]
    pub const fn position(&self) -> Option<Position> {
        match self {
            Self::NoMatch { failure, .. } => Some(failure.position),
            Self::TrailingInput { position, .. } => Some(*position),
            Self::Grammar(_) => None,
        }
    }

    /// Get the deepest failure seen during the parse
    ///
    /// This is usually the most useful diagnostic: when a repetition stops
    /// early, the failure that stopped it lies beyond where the parse ended.
    #[must_use]
    pub const fn furthest(&self) -> Option<&ParseFailure> {
        match self {
            Self::NoMatch {
                failure, furthest, ..
            } => match furthest {
                Some(deeper) => Some(deeper),
                None => Some(failure),
            },
            Self::TrailingInput { furthest, .. } => furthest.as_ref(),
            Self::Grammar(_) => None,
        }
    }

    /// Format a list of expected items as a human-readable string
    #[must_use]
    pub fn format_expected_list(expected: &[String]) -> String {
        match expected {
            [] => "nothing".to_string(),
            [only] => only.clone(),
            [first, second] => format!("{first} or {second}"),
            [init @ .., last] => {
                let mut result = init
                    .iter()
                    .map(String::as_str)
                    .collect::<Vec<_>>()
                    .join(", ");
                result.push_str(", or ");
                result.push_str(last);
                result
            }
        }
    }

    /// Format the error with the offending source line and a caret under the position
    ///
    /// # Example
    ///
    /// ```rust
    /// use weft::grammar::parse_grammar;
    ///
    /// let source = "start = \"a\"";
    /// let error = parse_grammar(source).unwrap_err();
    /// let report = error.format_with_context(source);
    /// assert!(report.contains("start = \"a\""));
    /// assert!(report.contains('^'));
    /// ```
    #[must_use]
    pub fn format_with_context(&self, source: &str) -> String {
        use std::fmt::Write;
        let mut result = String::new();

        let _ = write!(result, "{self}");
        let lines = LineIndex::new(source);

        if let Some(position) = self.position() {
            Self::write_snippet(&mut result, source, &lines, position);
        }

        if let Some(deeper) = self.furthest()
            && Some(deeper.position) != self.position()
        {
            let _ = write!(result, "\n\nFurthest failure: {deeper}");
            Self::write_snippet(&mut result, source, &lines, deeper.position);
        }

        result
    }

    fn write_snippet(out: &mut String, source: &str, lines: &LineIndex, position: Position) {
        use std::fmt::Write;

        let Some(line) = lines
            .line_span(position.line)
            .and_then(|span| source.get(span))
        else {
            return;
        };
        let line = line.strip_suffix('\r').unwrap_or(line);
        let gutter = position.line.to_string();
        let padding = " ".repeat(gutter.len());
        let caret_offset = " ".repeat(position.column.saturating_sub(1) as usize);

        let _ = write!(
            out,
            "\n\n{padding} |\n{gutter} | {line}\n{padding} | {caret_offset}^"
        );
    }
}

/// Structural error in a rule or grammar definition
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "diagnostics", derive(Diagnostic))]
pub enum GrammarError {
    #[error("Malformed rule definition: {0}")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::malformed)))]
    Malformed(String),

    #[error("Label count {labels} does not match value count {values}")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::label_count)))]
    LabelCountMismatch { labels: usize, values: usize },

    #[error("Rule '{0}' was declared but never defined")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::undefined_rule)))]
    UndefinedRule(CompactString),

    #[error("Rule '{0}' is defined more than once")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::duplicate_rule)))]
    DuplicateRule(CompactString),

    #[error("Unknown rule '{0}'")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::unknown_rule)))]
    UnknownRule(CompactString),
}

/// Failure reported by a transformer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct Rejection(pub String);

impl Rejection {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}
