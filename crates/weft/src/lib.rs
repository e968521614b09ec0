//! # Weft
//!
//! A backtracking parser-combinator engine with a grammar description
//! language on top.
//!
//! ## Overview
//!
//! - [`cursor`]: the [`TextCursor`] with scoped backtracking and skip sets
//! - [`rule`]: composable matchers ([`RuleNode`]) compiled by a [`RuleSet`]
//!   into a [`Parser`]
//! - [`value`]: match results, including the labelled [`ResultTuple`]
//! - [`grammar`]: the grammar text parser, its syntax tree and an interpreter
//! - [`runtime`]: support for parsers generated by `weft_codegen`
//!
//! ## Quick Start
//!
//! ```rust
//! use weft::rule::{RuleNode, RuleSet};
//! use weft::{CursorConfig, TextCursor, Value};
//!
//! let mut rules = RuleSet::new();
//! let digit = RuleNode::charset('0'..='9').unwrap();
//! let number = RuleNode::one_or_more(digit)
//!     .transform(|value| Ok(Value::Text(value.concat_text())));
//! let sum = rules.declare("sum");
//! rules
//!     .define(sum, number.alias("lhs") & "+" & number.alias("rhs"))
//!     .unwrap();
//!
//! let parser = rules.build().unwrap();
//! let cursor = TextCursor::with_config("12 + 30", &CursorConfig::whitespace());
//! let value = parser.parse_with("sum", cursor).unwrap();
//!
//! assert_eq!(value.get_label("lhs"), Some(&Value::from("12")));
//! assert_eq!(value.get_label("rhs"), Some(&Value::from("30")));
//! ```
//!
//! ## Diagnostics Support
//!
//! Enable the `diagnostics` feature to derive `miette::Diagnostic` for all
//! error types.

pub mod cursor;
pub mod error;
pub mod grammar;
pub mod rule;
pub mod runtime;
pub mod value;

pub use cursor::{CursorConfig, Mark, Position, SkipMode, TextCursor};
pub use error::{GrammarError, ParseError, ParseFailure, ParseOutcome, Rejection};
pub use grammar::{Grammar, GrammarTextParser, parse_grammar};
pub use rule::{Parser, RuleId, RuleKind, RuleNode, RuleOptions, RuleSet, RuleSource};
pub use value::{ResultTuple, Value};
