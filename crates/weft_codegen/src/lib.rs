//! # Weft Codegen
//!
//! Compiles weft grammar text into the Rust source of a parser type.
//!
//! ## Overview
//!
//! The generated type holds a [`weft::TextCursor`] and implements
//! [`weft::runtime::GeneratedParser`]. It has one `parse_<rule>` method per
//! grammar rule and private fragment methods for nested sub-expressions.
//! Results have the same shape as those of the interpreter
//! ([`weft::grammar::interpret`]) for the same grammar.
//!
//! Use the `grammar!` macro from `weft_macros` to compile a parser into a
//! crate, or [`compile`] to get the source as text.
//!
//! ## Example
//!
//! ```rust
//! use weft_codegen::{CodegenConfig, compile};
//!
//! let source = compile("start = 'a' 'b';", CodegenConfig::default()).unwrap();
//! assert!(source.contains("struct GrammarParser"));
//! assert!(source.contains("fn parse_start"));
//! ```

mod codegen;
mod config;
mod error;

pub use codegen::CodeGenerator;
pub use config::CodegenConfig;
pub use error::{CodegenError, CompileError};

use proc_macro2::TokenStream;
use weft::parse_grammar;

/// Parse grammar text and generate a parser for it
///
/// # Errors
///
/// Returns [`CompileError::Parse`] for malformed grammar text and
/// [`CompileError::Codegen`] when no parser can be generated.
pub fn compile_tokens(text: &str, config: CodegenConfig) -> Result<TokenStream, CompileError> {
    let grammar = parse_grammar(text)?;
    Ok(CodeGenerator::new(&grammar, config).generate()?)
}

/// [`compile_tokens`], rendered as text
///
/// # Errors
///
/// See [`compile_tokens`].
pub fn compile(text: &str, config: CodegenConfig) -> Result<String, CompileError> {
    compile_tokens(text, config).map(|tokens| tokens.to_string())
}
