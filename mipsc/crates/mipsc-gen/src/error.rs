//! Error type for MIPS code generation.
//!
//! Generation runs over a tree that symbol-table building and type
//! checking have already accepted, so the only failures left are internal
//! ones (an operator slipped past the type checker's table, a function
//! call to an undeclared name) — never user-facing diagnostics.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodeGenError {
    #[error("no instruction mapping for operator `{0}`")]
    UnmappedOperator(String),

    #[error("call to undeclared function `{0}`")]
    UnknownFunction(String),

    #[error("reference to variable `{0}` with no assigned stack offset")]
    UnknownVariable(String),

    #[error("parse tree has no root; nothing to generate")]
    EmptyTree,
}

pub type Result<T> = std::result::Result<T, CodeGenError>;
