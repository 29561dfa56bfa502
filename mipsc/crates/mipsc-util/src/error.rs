//! Core error types shared by `mipsc-util`'s helper modules.

use thiserror::Error;

/// Error type for symbol interning operations.
#[derive(Debug, Error)]
pub enum SymbolError {
    /// Symbol not found in the interner.
    #[error("symbol not found: index {index}")]
    NotFound { index: u32 },
}

/// Error type for index-vector operations.
#[derive(Debug, Error)]
pub enum IndexVecError {
    /// Index out of bounds.
    #[error("index out of bounds: index {index}, length {length}")]
    OutOfBounds { index: usize, length: usize },
}

/// Error type for diagnostic handling.
#[derive(Debug, Error)]
pub enum DiagnosticError {
    /// A diagnostic code was requested that no stage registered.
    #[error("unknown diagnostic code: {0}")]
    UnknownCode(String),
}

/// Result type alias for symbol operations.
pub type SymbolResult<T> = std::result::Result<T, SymbolError>;

/// Result type alias for index vector operations.
pub type IndexVecResult<T> = std::result::Result<T, IndexVecError>;

/// Result type alias for diagnostic operations.
pub type DiagnosticResult<T> = std::result::Result<T, DiagnosticError>;
