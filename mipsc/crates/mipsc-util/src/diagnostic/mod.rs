//! Diagnostic reporting infrastructure shared by every compiler stage.
//!
//! ```
//! use mipsc_util::diagnostic::{Handler, Diagnostic, Span};
//!
//! let handler = Handler::new();
//! handler.emit(Diagnostic::error("unexpected token", Span::DUMMY));
//! assert!(handler.has_errors());
//! ```

mod codes;

pub use codes::*;

use crate::Span;
use std::cell::RefCell;
use std::fmt;

/// Diagnostic severity level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    Error,
    Warning,
    Note,
    Help,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Error => write!(f, "error"),
            Level::Warning => write!(f, "warning"),
            Level::Note => write!(f, "note"),
            Level::Help => write!(f, "help"),
        }
    }
}

/// A diagnostic message with severity, location, and optional supporting text.
#[derive(Clone, Debug)]
pub struct Diagnostic {
    pub level: Level,
    pub message: String,
    pub span: Span,
    pub code: Option<DiagnosticCode>,
    pub notes: Vec<String>,
    pub helps: Vec<String>,
}

impl Diagnostic {
    pub fn new(level: Level, message: impl Into<String>, span: Span) -> Self {
        Self {
            level,
            message: message.into(),
            span,
            code: None,
            notes: Vec::new(),
            helps: Vec::new(),
        }
    }

    pub fn error(message: impl Into<String>, span: Span) -> Self {
        Self::new(Level::Error, message, span)
    }

    pub fn warning(message: impl Into<String>, span: Span) -> Self {
        Self::new(Level::Warning, message, span)
    }

    pub fn with_code(mut self, code: DiagnosticCode) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.helps.push(help.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.level == Level::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.span.line == 0 {
            write!(f, "{}: {}", self.level, self.message)?;
        } else {
            write!(
                f,
                "{}:{}: {}: {}",
                self.span.line, self.span.column, self.level, self.message
            )?;
        }
        if let Some(code) = self.code {
            write!(f, " [{code}]")?;
        }
        for note in &self.notes {
            write!(f, "\n  note: {note}")?;
        }
        for help in &self.helps {
            write!(f, "\n  help: {help}")?;
        }
        Ok(())
    }
}

/// Accumulates diagnostics for a single stage's pass.
///
/// A `Handler` is owned by the [`crate::symbol`]-adjacent `Session`-style
/// driver state and threaded through a stage by mutable reference; it is
/// never shared via `Rc`/interior-mutability-across-threads, though a
/// `RefCell` is used internally so read-only borrows of a stage's state can
/// still record diagnostics without a separate `&mut` path.
pub struct Handler {
    diagnostics: RefCell<Vec<Diagnostic>>,
}

impl Handler {
    pub fn new() -> Self {
        Self {
            diagnostics: RefCell::new(Vec::new()),
        }
    }

    pub fn emit(&self, diagnostic: Diagnostic) {
        self.diagnostics.borrow_mut().push(diagnostic);
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.borrow().iter().any(Diagnostic::is_error)
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.borrow().iter().filter(|d| d.is_error()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics
            .borrow()
            .iter()
            .filter(|d| d.level == Level::Warning)
            .count()
    }

    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.borrow().clone()
    }

    /// Promote every warning to an error in place, for `--warnings-as-errors`.
    pub fn promote_warnings(&self) {
        for diag in self.diagnostics.borrow_mut().iter_mut() {
            if diag.level == Level::Warning {
                diag.level = Level::Error;
            }
        }
    }

    pub fn clear(&self) {
        self.diagnostics.borrow_mut().clear();
    }
}

impl Default for Handler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handler_tracks_errors_and_warnings_separately() {
        let handler = Handler::new();
        handler.emit(Diagnostic::error("bad token", Span::DUMMY));
        handler.emit(Diagnostic::warning("narrowing", Span::DUMMY));

        assert!(handler.has_errors());
        assert_eq!(handler.error_count(), 1);
        assert_eq!(handler.warning_count(), 1);
        assert_eq!(handler.diagnostics().len(), 2);
    }

    #[test]
    fn promote_warnings_turns_them_into_errors() {
        let handler = Handler::new();
        handler.emit(Diagnostic::warning("narrowing", Span::DUMMY));
        assert!(!handler.has_errors());

        handler.promote_warnings();
        assert!(handler.has_errors());
    }

    #[test]
    fn diagnostic_display_includes_position_and_code() {
        let diag = Diagnostic::error("bad", Span::new(0, 1, 3, 7)).with_code(L_UNKNOWN_CHAR);
        let rendered = diag.to_string();
        assert!(rendered.starts_with("3:7: error: bad"));
        assert!(rendered.contains("L0001"));
    }
}
