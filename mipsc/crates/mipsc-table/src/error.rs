//! Error type for LL(1) table construction and (de)serialization.
//!
//! An LL(1) conflict is not fatal to the build by itself — it is reported as
//! a diagnostic on the shared `Handler` (code `G_LL1_CONFLICT`) so the
//! caller can see every conflicting cell before deciding to fail, matching
//! the accumulate-then-fail-fast policy used elsewhere in the pipeline.
//! `TableError` covers only the table-file artifact's I/O and shape.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("failed to write table CSV: {0}")]
    CsvWrite(#[source] csv::Error),

    #[error("failed to read table CSV: {0}")]
    CsvRead(#[source] csv::Error),

    #[error("table CSV has no header row")]
    MissingHeader,

    #[error("table CSV references unknown terminal `{0}` in its header")]
    UnknownTerminal(String),

    #[error("table CSV references unknown nonterminal `{0}` in a row")]
    UnknownNonTerminal(String),

    #[error("I/O error reading/writing table file: {0}")]
    Io(#[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TableError>;
