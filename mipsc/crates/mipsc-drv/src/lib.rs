//! Compiler driver: orchestrates lex → load-grammar → build-table → parse
//! → build-symbols → type-check → emit over one source file.
//!
//! `Session::compile` is the single entry point `main` calls; it owns the
//! session-wide [`StringTable`] and [`Handler`], and queries
//! `handler.has_errors()` between phases to fail fast, the same
//! accumulate-then-check policy every stage already follows internally.

pub mod config;
pub mod error;

pub use config::{Config, EmitKind};
pub use error::{CompileError, Result};

use mipsc_lex::{Lexer, Token, TERMINAL_ALPHABET};
use mipsc_par::ParseTree;
use mipsc_sem::ScopeTree;
use mipsc_util::{Handler, StringTable};
use std::collections::HashSet;
use std::path::Path;

/// Everything a `build`/`dump-*` invocation might want to inspect: every
/// stage's output is populated even when `config.emit` stops short of
/// assembly, so `--emit tokens` and friends can print an intermediate
/// result without re-running the pipeline.
pub struct CompileOutput {
    pub tokens: Vec<Token>,
    pub parse_tree: Option<ParseTree>,
    pub scopes: Option<ScopeTree>,
    pub asm: Option<String>,
    pub strings: StringTable,
}

/// A compilation session: owns the string table and diagnostic handler for
/// one invocation.
pub struct Session {
    pub config: Config,
    pub handler: Handler,
}

impl Session {
    pub fn new(config: Config) -> Self {
        Session { config, handler: Handler::new() }
    }

    pub fn compile(&mut self) -> Result<CompileOutput> {
        let source = read_to_string(&self.config.source_path)?;
        let mut strings = StringTable::new();

        tracing::info!(path = %self.config.source_path.display(), "lexing");
        let lexer = Lexer::new(&source);
        let tokens = lexer.tokenize(&self.handler);
        self.maybe_promote();
        if self.handler.has_errors() {
            return Err(CompileError::Failed(self.handler.error_count()));
        }
        if self.config.emit == EmitKind::Tokens {
            return Ok(CompileOutput { tokens, parse_tree: None, scopes: None, asm: None, strings });
        }

        let grammar_text = read_to_string(&self.config.grammar_path)?;
        let known_terminals: HashSet<&str> = TERMINAL_ALPHABET.iter().copied().collect();
        let grammar = mipsc_grammar::load(
            &grammar_text,
            &self.config.grammar_path.display().to_string(),
            &known_terminals,
            &self.handler,
        )?;
        self.maybe_promote();
        if self.handler.has_errors() {
            return Err(CompileError::Failed(self.handler.error_count()));
        }
        if self.config.emit == EmitKind::Grammar {
            return Ok(CompileOutput { tokens, parse_tree: None, scopes: None, asm: None, strings });
        }

        tracing::info!("building LL(1) table");
        let table = match &self.config.table_path {
            Some(path) => {
                let file = std::fs::File::open(path).map_err(|source| CompileError::Io {
                    path: path.clone(),
                    source,
                })?;
                let nonterminals: HashSet<&str> = grammar.nonterminals().collect();
                mipsc_table::read_csv(file, &known_terminals, &nonterminals)?
            }
            None => {
                let first = mipsc_table::compute_first_sets(&grammar);
                let follow = mipsc_table::compute_follow_sets(&grammar, &first);
                let mut terminal_order: Vec<String> = known_terminals
                    .iter()
                    .filter(|t| **t != "$")
                    .map(|t| t.to_string())
                    .collect();
                terminal_order.sort();
                terminal_order.push("$".to_string());
                mipsc_table::build_table(&grammar, &first, &follow, &terminal_order, &self.handler)
            }
        };
        self.maybe_promote();
        if self.handler.has_errors() {
            return Err(CompileError::Failed(self.handler.error_count()));
        }
        if self.config.emit == EmitKind::Table {
            return Ok(CompileOutput { tokens, parse_tree: None, scopes: None, asm: None, strings });
        }

        tracing::info!("parsing");
        let parse_tree = mipsc_par::parse(&tokens, grammar.start_symbol(), &table, &self.handler);
        self.maybe_promote();
        if self.handler.has_errors() {
            return Err(CompileError::Failed(self.handler.error_count()));
        }
        if self.config.emit == EmitKind::ParseTree {
            return Ok(CompileOutput {
                tokens,
                parse_tree: Some(parse_tree),
                scopes: None,
                asm: None,
                strings,
            });
        }

        tracing::info!("building symbol table");
        let scopes = mipsc_sem::build_symbol_table(&parse_tree, &mut strings, &self.handler);
        self.maybe_promote();
        if self.handler.has_errors() {
            return Err(CompileError::Failed(self.handler.error_count()));
        }
        if self.config.emit == EmitKind::Symbols {
            return Ok(CompileOutput {
                tokens,
                parse_tree: Some(parse_tree),
                scopes: Some(scopes),
                asm: None,
                strings,
            });
        }

        tracing::info!("type checking");
        mipsc_sem::check_types(&parse_tree, &scopes, &strings, &self.handler);
        self.maybe_promote();
        if self.handler.has_errors() {
            return Err(CompileError::Failed(self.handler.error_count()));
        }

        tracing::info!("generating assembly");
        let asm = mipsc_gen::generate(&parse_tree, &scopes, &strings)
            .map_err(|_| CompileError::Failed(self.handler.error_count()))?;

        Ok(CompileOutput {
            tokens,
            parse_tree: Some(parse_tree),
            scopes: Some(scopes),
            asm: Some(asm),
            strings,
        })
    }

    fn maybe_promote(&self) {
        if self.config.warnings_as_errors {
            self.handler.promote_warnings();
        }
    }
}

fn read_to_string(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| CompileError::Io { path: path.to_path_buf(), source })
}
