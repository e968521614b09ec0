//! Code generation errors

use thiserror::Error;
use weft::ParseError;

/// A grammar that cannot be turned into Rust source
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodegenError {
    /// A parser, rule or method name that is not a Rust identifier
    #[error("'{0}' is not a valid Rust identifier")]
    InvalidIdentifier(String),

    #[error("'{0}' is not a valid runtime path")]
    InvalidRuntimePath(String),

    #[error("'{0}' is not a valid visibility")]
    InvalidVisibility(String),

    #[error("grammar has no rules")]
    EmptyGrammar,

    #[error("start rule '{0}' is not defined by the grammar")]
    UnknownStartRule(String),
}

/// Failure to compile grammar text into parser source
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("invalid grammar text: {0}")]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Codegen(#[from] CodegenError),
}
