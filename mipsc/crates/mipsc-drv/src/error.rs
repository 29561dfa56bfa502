//! Error type for the driver.
//!
//! Each pipeline stage already accumulates its own diagnostics on the
//! shared [`mipsc_util::Handler`]; `CompileError` is what `Session::compile`
//! returns when the pipeline cannot continue at all — I/O failure, or a
//! stage reporting errors (inspected via `handler.has_errors()` between
//! phases so the driver can fail fast).

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("compilation failed with {0} error(s)")]
    Failed(usize),

    #[error(transparent)]
    Grammar(#[from] mipsc_grammar::GrammarError),

    #[error(transparent)]
    Table(#[from] mipsc_table::TableError),
}

pub type Result<T> = std::result::Result<T, CompileError>;
