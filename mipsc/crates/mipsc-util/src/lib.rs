//! Core utilities and foundation types shared by every `mipsc-*` crate.
//!
//! This crate has no knowledge of the source language, the grammar, or
//! MIPS assembly; it only provides the plumbing every stage needs:
//! source spans, diagnostics, string interning, and typed arenas.

pub mod diagnostic;
pub mod error;
pub mod index_vec;
pub mod span;
pub mod symbol;

pub use diagnostic::{Diagnostic, Handler, Level};
pub use index_vec::{Idx, IndexVec};
pub use span::{FileId, Span};
pub use symbol::{StringTable, Symbol};
