//! Error type for the table-driven parser.
//!
//! A mismatch between expected and found token is reported as a diagnostic
//! on the shared `Handler` (code `P_EXPECTED_TOKEN`/`P_NO_TABLE_ENTRY`), not
//! as a hard error, so the parser can resynchronize past `;`/`}` and keep
//! producing a usable (if partial) tree. `ParseError` covers only the
//! condition where no tree can be produced at all.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("parsing failed: {error_count} syntax error(s) reported")]
    Failed { error_count: usize },

    #[error("the parsing table has no start symbol entry; was it built correctly?")]
    EmptyTable,
}

pub type Result<T> = std::result::Result<T, ParseError>;
