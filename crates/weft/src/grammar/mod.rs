//! # Grammar Text
//!
//! The grammar description language, its syntax tree and an interpreter.
//!
//! ## Overview
//!
//! - [`parse_grammar`] reads grammar text into a [`Grammar`] tree
//! - [`interpret`] turns a tree into a [`Parser`](crate::Parser) that runs it
//!   directly, without generating code
//!
//! The `weft_codegen` crate turns the same tree into Rust source.
//!
//! ## Example
//!
//! ```rust
//! use weft::grammar::{interpret, parse_grammar};
//!
//! let grammar = parse_grammar("start = 'a' 'b';").unwrap();
//! let parser = interpret(&grammar).unwrap();
//!
//! assert!(parser.parse("start", "ab").is_ok());
//! assert!(parser.parse("start", "ac").is_err());
//! ```

mod ast;
mod lower;
mod parser;

pub use ast::{Expr, Grammar, Modifier, Rule};
pub use lower::{interpret, lower};
pub use parser::{GrammarTextParser, parse_grammar};
