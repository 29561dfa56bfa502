//! CLI argument parsing and the `Config` it resolves to.
//!
//! `CliArgs` is the derive-based clap surface; `main` parses it and hands
//! `Config` to `Session`, keeping the parsing/orchestration split the same
//! way the teacher's driver kept configuration and session state separate.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "mipsc", version, about = "A MIPS32/SPIM-targeting compiler")]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compile a source file down to MIPS32 assembly (or an earlier stage, via --emit).
    Build {
        source: PathBuf,
        #[arg(long)]
        grammar: PathBuf,
        #[arg(long)]
        table: Option<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = EmitKind::Asm)]
        emit: EmitKind,
        #[arg(short, long)]
        verbose: bool,
        #[arg(long)]
        warnings_as_errors: bool,
    },
    /// Build the LL(1) table from a grammar file and write it as CSV.
    EmitTable {
        grammar: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Lex a source file and print its tokens, one per line.
    DumpTokens { source: PathBuf },
    /// Parse a source file and print its parse tree.
    DumpTree {
        source: PathBuf,
        #[arg(long)]
        grammar: PathBuf,
        #[arg(long)]
        table: Option<PathBuf>,
    },
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum EmitKind {
    Tokens,
    Grammar,
    Table,
    ParseTree,
    Symbols,
    Asm,
}

/// Fully-resolved configuration for a `build`/`dump-tree` invocation.
#[derive(Debug, Clone)]
pub struct Config {
    pub source_path: PathBuf,
    pub grammar_path: PathBuf,
    pub table_path: Option<PathBuf>,
    pub output_path: Option<PathBuf>,
    pub emit: EmitKind,
    pub verbose: bool,
    pub warnings_as_errors: bool,
}

impl Config {
    /// The path assembly (or whichever `--emit` stage) is written to:
    /// `--output` if given, else the source's stem with a `.s` extension.
    pub fn resolved_output_path(&self) -> PathBuf {
        self.output_path.clone().unwrap_or_else(|| self.source_path.with_extension("s"))
    }
}
