//! Error type for semantic analysis.
//!
//! Every check in this crate (duplicate declarations, undeclared
//! identifiers, operator/assignment/return mismatches) is a diagnostic on
//! the shared `Handler`, not a hard error — a source file can have several
//! semantic mistakes and the compiler should surface all of them in one
//! pass. `SemError` exists only for the condition where the walk cannot
//! make sense of the tree at all.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SemError {
    #[error("parse tree has no root; nothing to analyze")]
    EmptyTree,

    #[error("expected parse-tree node `{expected}`, found `{found}`")]
    UnexpectedNode { expected: String, found: String },
}

pub type Result<T> = std::result::Result<T, SemError>;
