//! FIRST/FOLLOW computation and LL(1) parsing table construction.
//!
//! Consumes a [`mipsc_grammar::Grammar`] and produces the two-dimensional
//! `M[nonterminal, terminal]` table the parser drives off of, plus a CSV
//! reader/writer for the table-file artifact (§6 of the external
//! interfaces).

pub mod error;

pub use error::{Result, TableError};

use indexmap::{IndexMap, IndexSet};
use mipsc_grammar::{Grammar, GrammarSymbol, Production};
use mipsc_util::diagnostic::codes;
use mipsc_util::{Diagnostic, Handler, Span};
use std::collections::HashSet;
use std::io::{Read, Write};

/// The sentinel used inside FIRST/FOLLOW sets (and the table-file cells) for
/// the empty production, matching the grammar file's own `''` convention.
pub const EPSILON: &str = "e";
/// The end-of-input terminal.
pub const END: &str = "$";

pub type FirstSets = IndexMap<String, IndexSet<String>>;
pub type FollowSets = IndexMap<String, IndexSet<String>>;

/// FIRST(α) for a right-hand-side sequence, given already-known FIRST sets
/// for every nonterminal. Terminals contribute themselves; a nonterminal
/// contributes its FIRST set minus ε, continuing to the next symbol only if
/// ε was present; the whole sequence contributes ε iff every symbol does.
pub fn first_of_sequence(rhs: &[GrammarSymbol], first: &FirstSets) -> IndexSet<String> {
    let mut result = IndexSet::new();

    if matches!(rhs, [GrammarSymbol::Epsilon]) {
        result.insert(EPSILON.to_string());
        return result;
    }

    let mut all_nullable = true;
    for sym in rhs {
        match sym {
            GrammarSymbol::Terminal(t) => {
                result.insert(t.clone());
                all_nullable = false;
                break;
            }
            GrammarSymbol::EndOfInput => {
                result.insert(END.to_string());
                all_nullable = false;
                break;
            }
            GrammarSymbol::Epsilon => continue,
            GrammarSymbol::NonTerminal(nt) => {
                let nt_first = first.get(nt).cloned().unwrap_or_default();
                for s in &nt_first {
                    if s != EPSILON {
                        result.insert(s.clone());
                    }
                }
                if !nt_first.contains(EPSILON) {
                    all_nullable = false;
                    break;
                }
            }
        }
    }
    if all_nullable {
        result.insert(EPSILON.to_string());
    }
    result
}

/// Computes FIRST(X) for every nonterminal X in `grammar` by fixed-point
/// iteration over the full production set: repeat a pass unioning each
/// production's contribution into its LHS's set until nothing grows.
pub fn compute_first_sets(grammar: &Grammar) -> FirstSets {
    let mut first: FirstSets = grammar
        .nonterminals()
        .map(|nt| (nt.to_string(), IndexSet::new()))
        .collect();

    let mut changed = true;
    while changed {
        changed = false;
        for prod in grammar.productions() {
            let contribution = first_of_sequence(&prod.rhs, &first);
            let entry = first.entry(prod.lhs.clone()).or_default();
            for sym in contribution {
                changed |= entry.insert(sym);
            }
        }
    }
    first
}

/// Computes FOLLOW(A) for every nonterminal A, seeding FOLLOW(start) with
/// `$` and iterating every production `B -> αAβ` to fixed point.
pub fn compute_follow_sets(grammar: &Grammar, first: &FirstSets) -> FollowSets {
    let mut follow: FollowSets = grammar
        .nonterminals()
        .map(|nt| (nt.to_string(), IndexSet::new()))
        .collect();

    follow
        .entry(grammar.start_symbol().to_string())
        .or_default()
        .insert(END.to_string());

    let mut changed = true;
    while changed {
        changed = false;
        for prod in grammar.productions() {
            for (i, sym) in prod.rhs.iter().enumerate() {
                let GrammarSymbol::NonTerminal(a) = sym else {
                    continue;
                };
                let beta = &prod.rhs[i + 1..];
                let beta_first = if beta.is_empty() {
                    let mut s = IndexSet::new();
                    s.insert(EPSILON.to_string());
                    s
                } else {
                    first_of_sequence(beta, &first)
                };

                let lhs_follow = follow.get(&prod.lhs).cloned().unwrap_or_default();
                let entry = follow.entry(a.clone()).or_default();
                for t in &beta_first {
                    if t != EPSILON {
                        changed |= entry.insert(t.clone());
                    }
                }
                if beta_first.contains(EPSILON) {
                    for t in lhs_follow {
                        changed |= entry.insert(t);
                    }
                }
            }
        }
    }
    follow
}

/// The LL(1) parsing table: `M[nonterminal][terminal] -> production RHS`.
#[derive(Clone, Debug, Default)]
pub struct Ll1Table {
    cells: IndexMap<(String, String), Vec<GrammarSymbol>>,
    nonterminals: Vec<String>,
    terminals: Vec<String>,
}

impl Ll1Table {
    pub fn get(&self, nonterminal: &str, terminal: &str) -> Option<&[GrammarSymbol]> {
        self.cells
            .get(&(nonterminal.to_string(), terminal.to_string()))
            .map(Vec::as_slice)
    }

    pub fn nonterminals(&self) -> &[String] {
        &self.nonterminals
    }

    pub fn terminals(&self) -> &[String] {
        &self.terminals
    }
}

/// Builds the LL(1) table from `grammar`'s FIRST/FOLLOW sets.
///
/// `terminal_order` fixes the terminal alphabet's column order in the
/// eventual CSV artifact (`$` conventionally last, per §6). A cell that
/// would receive two different productions is an LL(1) conflict: the first
/// production seen wins and every conflict is reported on `handler` (the
/// caller checks `handler.has_errors()` to fail the build, matching every
/// other stage's accumulate-then-fail-fast policy).
pub fn build_table(
    grammar: &Grammar,
    first: &FirstSets,
    follow: &FollowSets,
    terminal_order: &[String],
    handler: &Handler,
) -> Ll1Table {
    let mut cells: IndexMap<(String, String), Vec<GrammarSymbol>> = IndexMap::new();
    let nonterminals: Vec<String> = grammar.nonterminals().map(str::to_string).collect();

    for prod in grammar.productions() {
        let alpha_first = first_of_sequence(&prod.rhs, first);

        for terminal in alpha_first.iter().filter(|t| *t != EPSILON) {
            insert_cell(&mut cells, prod, terminal, handler);
        }

        if alpha_first.contains(EPSILON) {
            let empty = IndexSet::new();
            for terminal in follow.get(&prod.lhs).unwrap_or(&empty) {
                insert_cell(&mut cells, prod, terminal, handler);
            }
        }
    }

    Ll1Table {
        cells,
        nonterminals,
        terminals: terminal_order.to_vec(),
    }
}

fn insert_cell(
    cells: &mut IndexMap<(String, String), Vec<GrammarSymbol>>,
    prod: &Production,
    terminal: &str,
    handler: &Handler,
) {
    let key = (prod.lhs.clone(), terminal.to_string());
    match cells.get(&key) {
        None => {
            cells.insert(key, prod.rhs.clone());
        }
        Some(existing) if existing == &prod.rhs => {
            // Same production reached via both FIRST and FOLLOW; not a conflict.
        }
        Some(existing) => {
            handler.emit(
                Diagnostic::error(
                    format!(
                        "LL(1) conflict at ({}, {}): `{}` vs `{}`",
                        prod.lhs,
                        terminal,
                        render_rhs(existing),
                        render_rhs(&prod.rhs),
                    ),
                    Span::DUMMY,
                )
                .with_code(codes::G_LL1_CONFLICT),
            );
        }
    }
}

fn render_rhs(rhs: &[GrammarSymbol]) -> String {
    if matches!(rhs, [GrammarSymbol::Epsilon]) {
        EPSILON.to_string()
    } else {
        rhs.iter().map(|s| s.name().to_string()).collect::<Vec<_>>().join(" ")
    }
}

/// Serializes `table` as CSV: header row is an empty cell followed by every
/// terminal (`$` last), each data row is a nonterminal followed by its cell
/// contents (empty string for no entry, `e` for epsilon, space-joined RHS
/// symbols otherwise).
pub fn write_csv<W: Write>(table: &Ll1Table, writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    let mut header = vec![String::new()];
    header.extend(table.terminals.iter().cloned());
    csv_writer.write_record(&header).map_err(TableError::CsvWrite)?;

    for nt in &table.nonterminals {
        let mut row = vec![nt.clone()];
        for terminal in &table.terminals {
            let cell = table
                .get(nt, terminal)
                .map(render_rhs)
                .unwrap_or_default();
            row.push(cell);
        }
        csv_writer.write_record(&row).map_err(TableError::CsvWrite)?;
    }

    csv_writer.flush().map_err(TableError::Io)?;
    Ok(())
}

/// Reads a previously-serialized table back, validating every header
/// terminal and row nonterminal against the fixed alphabets the caller
/// already knows about.
pub fn read_csv<R: Read>(
    reader: R,
    known_terminals: &HashSet<&str>,
    known_nonterminals: &HashSet<&str>,
) -> Result<Ll1Table> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let header = csv_reader.headers().map_err(TableError::CsvRead)?.clone();
    let terminals: Vec<String> = header.iter().skip(1).map(str::to_string).collect();
    for t in &terminals {
        if t != END && !known_terminals.contains(t.as_str()) {
            return Err(TableError::UnknownTerminal(t.clone()));
        }
    }

    let mut cells = IndexMap::new();
    let mut nonterminals = Vec::new();

    for record in csv_reader.records() {
        let record = record.map_err(TableError::CsvRead)?;
        let mut fields = record.iter();
        let nt = fields.next().ok_or(TableError::MissingHeader)?.to_string();
        if !known_nonterminals.contains(nt.as_str()) {
            return Err(TableError::UnknownNonTerminal(nt));
        }
        nonterminals.push(nt.clone());

        for (terminal, cell) in terminals.iter().zip(fields) {
            if cell.is_empty() {
                continue;
            }
            let rhs = if cell == EPSILON {
                vec![GrammarSymbol::Epsilon]
            } else {
                cell.split_whitespace()
                    .map(|s| {
                        if known_terminals.contains(s) || s == END {
                            if s == END {
                                GrammarSymbol::EndOfInput
                            } else {
                                GrammarSymbol::Terminal(s.to_string())
                            }
                        } else {
                            GrammarSymbol::NonTerminal(s.to_string())
                        }
                    })
                    .collect()
            };
            cells.insert((nt.clone(), terminal.clone()), rhs);
        }
    }

    Ok(Ll1Table {
        cells,
        nonterminals,
        terminals,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn classic_grammar() -> (Grammar, HashSet<&'static str>) {
        // E -> T Eprime
        // Eprime -> + T Eprime | ''
        // T -> id
        let text = "E -> T Eprime\nEprime -> + T Eprime\nEprime -> ''\nT -> id\n";
        let terms: HashSet<&str> = ["id", "+", "$"].into_iter().collect();
        let handler = Handler::new();
        let grammar = mipsc_grammar::load(text, "g.txt", &terms, &handler).unwrap();
        assert!(!handler.has_errors());
        (grammar, terms)
    }

    #[test]
    fn first_sets_propagate_through_nullable_nonterminals() {
        let (grammar, _) = classic_grammar();
        let first = compute_first_sets(&grammar);
        assert_eq!(first["T"], IndexSet::from(["id".to_string()]));
        assert!(first["Eprime"].contains("+"));
        assert!(first["Eprime"].contains(EPSILON));
        assert!(first["E"].contains("id"));
    }

    #[test]
    fn follow_sets_reach_fixed_point() {
        let (grammar, _) = classic_grammar();
        let first = compute_first_sets(&grammar);
        let follow = compute_follow_sets(&grammar, &first);
        assert!(follow["E"].contains(END));
        assert!(follow["Eprime"].contains(END));
        assert!(follow["T"].contains("+"));
        assert!(follow["T"].contains(END));
    }

    #[test]
    fn table_has_no_conflicts_for_an_ll1_grammar() {
        let (grammar, _) = classic_grammar();
        let first = compute_first_sets(&grammar);
        let follow = compute_follow_sets(&grammar, &first);
        let handler = Handler::new();
        let terminal_order = vec!["id".to_string(), "+".to_string(), END.to_string()];
        let table = build_table(&grammar, &first, &follow, &terminal_order, &handler);
        assert!(!handler.has_errors());
        assert!(table.get("T", "id").is_some());
        assert!(table.get("Eprime", "+").is_some());
        assert_eq!(table.get("Eprime", END).unwrap(), [GrammarSymbol::Epsilon]);
    }

    #[test]
    fn conflicting_grammar_is_reported_not_panicked() {
        // Ambiguous: both alternatives of A start with `id`.
        let text = "S -> A\nA -> id\nA -> id\n";
        let terms: HashSet<&str> = ["id", "$"].into_iter().collect();
        let handler = Handler::new();
        let grammar = mipsc_grammar::load(text, "g.txt", &terms, &handler).unwrap();
        let first = compute_first_sets(&grammar);
        let follow = compute_follow_sets(&grammar, &first);
        let table_handler = Handler::new();
        let terminal_order = vec!["id".to_string(), END.to_string()];
        build_table(&grammar, &first, &follow, &terminal_order, &table_handler);
        assert!(table_handler.has_errors());
    }

    #[test]
    fn csv_round_trip_preserves_every_cell() {
        let (grammar, terms) = classic_grammar();
        let first = compute_first_sets(&grammar);
        let follow = compute_follow_sets(&grammar, &first);
        let handler = Handler::new();
        let terminal_order = vec!["id".to_string(), "+".to_string(), END.to_string()];
        let table = build_table(&grammar, &first, &follow, &terminal_order, &handler);

        let mut buf = Vec::new();
        write_csv(&table, &mut buf).unwrap();

        let nonterminals: HashSet<&str> = ["E", "Eprime", "T"].into_iter().collect();
        let read_back = read_csv(buf.as_slice(), &terms, &nonterminals).unwrap();

        for nt in table.nonterminals() {
            for t in table.terminals() {
                assert_eq!(table.get(nt, t), read_back.get(nt, t), "mismatch at ({nt}, {t})");
            }
        }
    }
}
