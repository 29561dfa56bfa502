//! Grammar file loading.
//!
//! Reads a text file of productions (`LHS -> s1 s2 ... sk`, or `LHS -> ''`
//! for the empty production) into a [`Grammar`] indexed by left-hand side,
//! ready for [`mipsc-table`](../mipsc_table) to compute FIRST/FOLLOW and
//! build the LL(1) parsing table from it.

pub mod error;

pub use error::{GrammarError, Result};

use indexmap::{IndexMap, IndexSet};
use mipsc_util::diagnostic::codes;
use mipsc_util::{Diagnostic, Handler, Span};
use std::collections::HashSet;
use std::fmt;

/// One symbol on the right-hand side of a production.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum GrammarSymbol {
    Terminal(String),
    NonTerminal(String),
    /// The empty string, written `''` in a grammar file.
    Epsilon,
    /// The end-of-input marker, `$`.
    EndOfInput,
}

impl fmt::Display for GrammarSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrammarSymbol::Terminal(s) => write!(f, "{s}"),
            GrammarSymbol::NonTerminal(s) => write!(f, "{s}"),
            GrammarSymbol::Epsilon => write!(f, "ε"),
            GrammarSymbol::EndOfInput => write!(f, "$"),
        }
    }
}

impl GrammarSymbol {
    pub fn is_terminal(&self) -> bool {
        matches!(self, GrammarSymbol::Terminal(_) | GrammarSymbol::EndOfInput)
    }

    pub fn name(&self) -> &str {
        match self {
            GrammarSymbol::Terminal(s) | GrammarSymbol::NonTerminal(s) => s,
            GrammarSymbol::Epsilon => "e",
            GrammarSymbol::EndOfInput => "$",
        }
    }
}

/// A single production `lhs -> rhs`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Production {
    pub lhs: String,
    pub rhs: Vec<GrammarSymbol>,
}

impl Production {
    /// True for the distinguished `A -> ε` production.
    pub fn is_epsilon(&self) -> bool {
        matches!(self.rhs.as_slice(), [GrammarSymbol::Epsilon])
    }
}

impl fmt::Display for Production {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_epsilon() {
            write!(f, "{} -> ε", self.lhs)
        } else {
            let rhs: Vec<_> = self.rhs.iter().map(|s| s.to_string()).collect();
            write!(f, "{} -> {}", self.lhs, rhs.join(" "))
        }
    }
}

/// A grammar: the full set of productions, grouped by left-hand side, with
/// the start symbol fixed as the first LHS defined in the file.
#[derive(Clone, Debug)]
pub struct Grammar {
    productions: Vec<Production>,
    by_lhs: IndexMap<String, Vec<usize>>,
    nonterminals: IndexSet<String>,
    start_symbol: String,
}

impl Grammar {
    pub fn productions(&self) -> &[Production] {
        &self.productions
    }

    pub fn nonterminals(&self) -> impl Iterator<Item = &str> {
        self.nonterminals.iter().map(String::as_str)
    }

    pub fn start_symbol(&self) -> &str {
        &self.start_symbol
    }

    pub fn productions_for(&self, lhs: &str) -> impl Iterator<Item = &Production> {
        self.by_lhs
            .get(lhs)
            .into_iter()
            .flatten()
            .map(move |&i| &self.productions[i])
    }

    pub fn is_nonterminal(&self, name: &str) -> bool {
        self.nonterminals.contains(name)
    }
}

/// Parses `text` (the contents of a grammar file) into a [`Grammar`].
///
/// `known_terminals` is the fixed terminal alphabet (from the lexer's token
/// kinds) used to classify each right-hand-side symbol; classification is
/// never inferred from the grammar file itself (see the design note on
/// terminal/nonterminal classification).
pub fn load(
    text: &str,
    path: &str,
    known_terminals: &HashSet<&str>,
    handler: &Handler,
) -> Result<Grammar> {
    let mut productions = Vec::new();
    let mut by_lhs: IndexMap<String, Vec<usize>> = IndexMap::new();
    let mut nonterminals: IndexSet<String> = IndexSet::new();

    // First pass: collect every LHS so symbol classification doesn't depend
    // on file order (a nonterminal may be used before its own definition).
    for (lineno, raw_line) in text.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((lhs, _)) = split_arrow(line) else {
            handler.emit(
                Diagnostic::error(
                    format!("line {}: missing `->` or `::=` arrow", lineno + 1),
                    Span::point((lineno + 1) as u32, 1),
                )
                .with_code(codes::G_UNKNOWN_SYMBOL),
            );
            continue;
        };
        nonterminals.insert(lhs.trim().to_string());
    }

    for (lineno, raw_line) in text.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((lhs, rhs)) = split_arrow(line) else {
            continue; // already reported above
        };
        let lhs = lhs.trim().to_string();
        if lhs.is_empty() {
            continue;
        }

        let rhs_symbols = parse_rhs(rhs.trim(), &nonterminals, known_terminals, path, lineno + 1, handler);

        let idx = productions.len();
        productions.push(Production {
            lhs: lhs.clone(),
            rhs: rhs_symbols,
        });
        by_lhs.entry(lhs).or_default().push(idx);
    }

    let start_symbol = by_lhs
        .keys()
        .next()
        .cloned()
        .ok_or(GrammarError::EmptyGrammar)?;

    Ok(Grammar {
        productions,
        by_lhs,
        nonterminals,
        start_symbol,
    })
}

fn split_arrow(line: &str) -> Option<(&str, &str)> {
    if let Some(idx) = line.find("->") {
        Some((&line[..idx], &line[idx + 2..]))
    } else {
        line.find("::=").map(|idx| (&line[..idx], &line[idx + 3..]))
    }
}

fn parse_rhs(
    rhs: &str,
    nonterminals: &IndexSet<String>,
    known_terminals: &HashSet<&str>,
    path: &str,
    lineno: usize,
    handler: &Handler,
) -> Vec<GrammarSymbol> {
    if rhs == "''" {
        return vec![GrammarSymbol::Epsilon];
    }

    rhs.split_whitespace()
        .map(|sym| classify(sym, nonterminals, known_terminals, path, lineno, handler))
        .collect()
}

fn classify(
    sym: &str,
    nonterminals: &IndexSet<String>,
    known_terminals: &HashSet<&str>,
    path: &str,
    lineno: usize,
    handler: &Handler,
) -> GrammarSymbol {
    if sym == "$" {
        GrammarSymbol::EndOfInput
    } else if nonterminals.contains(sym) {
        GrammarSymbol::NonTerminal(sym.to_string())
    } else if known_terminals.contains(sym) {
        GrammarSymbol::Terminal(sym.to_string())
    } else {
        handler.emit(
            Diagnostic::error(
                format!("{path}:{lineno}: unknown symbol `{sym}` (neither a known terminal nor a defined nonterminal)"),
                Span::point(lineno as u32, 1),
            )
            .with_code(codes::G_UNKNOWN_SYMBOL),
        );
        GrammarSymbol::Terminal(sym.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terminals() -> HashSet<&'static str> {
        ["id", "int", "+", "(", ")", "$"].into_iter().collect()
    }

    #[test]
    fn loads_simple_grammar_with_epsilon() {
        let text = "E -> T Eprime\nEprime -> + T Eprime\nEprime -> ''\nT -> id\n";
        let handler = Handler::new();
        let grammar = load(text, "g.txt", &terminals(), &handler).unwrap();
        assert!(!handler.has_errors());
        assert_eq!(grammar.start_symbol(), "E");
        assert_eq!(grammar.productions_for("Eprime").count(), 2);
        assert!(grammar.productions_for("Eprime").any(Production::is_epsilon));
    }

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        let text = "# a comment\n\nE -> id\n";
        let handler = Handler::new();
        let grammar = load(text, "g.txt", &terminals(), &handler).unwrap();
        assert_eq!(grammar.productions().len(), 1);
    }

    #[test]
    fn both_arrow_styles_are_accepted() {
        let text = "E -> id\nF ::= id\n";
        let handler = Handler::new();
        let grammar = load(text, "g.txt", &terminals(), &handler).unwrap();
        assert_eq!(grammar.productions().len(), 2);
    }

    #[test]
    fn unknown_symbol_is_a_diagnostic_not_a_crash() {
        let text = "E -> zzz\n";
        let handler = Handler::new();
        let grammar = load(text, "g.txt", &terminals(), &handler).unwrap();
        assert!(handler.has_errors());
        assert_eq!(grammar.productions().len(), 1);
    }

    #[test]
    fn start_symbol_is_the_first_defined_lhs() {
        let text = "B -> id\nA -> id\n";
        let handler = Handler::new();
        let grammar = load(text, "g.txt", &terminals(), &handler).unwrap();
        assert_eq!(grammar.start_symbol(), "B");
    }
}
