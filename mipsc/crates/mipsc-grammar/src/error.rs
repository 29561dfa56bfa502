//! Error type for grammar loading.
//!
//! Per-line issues (an unrecognized symbol, a malformed production) are
//! reported as diagnostics on the shared `Handler` so the loader can collect
//! more than one before giving up; `GrammarError` covers only conditions
//! that make the rest of loading meaningless.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GrammarError {
    #[error("grammar file is empty; no start symbol could be determined")]
    EmptyGrammar,

    #[error("failed to read grammar file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, GrammarError>;
