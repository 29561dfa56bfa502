//! Table-driven LL(1) parser.
//!
//! Builds a concrete parse tree by driving an explicit stack off the LL(1)
//! table from [`mipsc_table`], rather than recursive descent, so table
//! changes (a different grammar file) never require touching this crate.
//! The tree is an arena (`IndexVec<NodeId, ParseTreeNode>`) with a parallel
//! parent back-link per node instead of `Rc<RefCell<_>>` shared ownership —
//! see the design note on parse-tree representation.

pub mod error;

pub use error::{ParseError, Result};

use mipsc_grammar::GrammarSymbol;
use mipsc_lex::Token;
use mipsc_table::Ll1Table;
use mipsc_util::diagnostic::codes;
use mipsc_util::index_vec::Idx;
use mipsc_util::{define_idx, Diagnostic, Handler, IndexVec};

define_idx!(pub struct NodeId);

/// One node of the concrete parse tree. Terminal nodes carry the matched
/// token's lexeme and position once bound; nonterminal nodes never do.
#[derive(Clone, Debug)]
pub struct ParseTreeNode {
    pub id: NodeId,
    pub symbol: String,
    pub terminal: bool,
    pub lexeme: Option<String>,
    pub line: Option<u32>,
    pub column: Option<u32>,
    pub children: Vec<NodeId>,
    pub parent: Option<NodeId>,
}

impl ParseTreeNode {
    fn new(id: NodeId, symbol: String, terminal: bool, parent: Option<NodeId>) -> Self {
        ParseTreeNode {
            id,
            symbol,
            terminal,
            lexeme: None,
            line: None,
            column: None,
            children: Vec::new(),
            parent,
        }
    }
}

/// The parse tree produced by a (possibly partial, on error) parse.
#[derive(Clone, Debug, Default)]
pub struct ParseTree {
    nodes: IndexVec<NodeId, ParseTreeNode>,
    root: Option<NodeId>,
}

impl ParseTree {
    pub fn get(&self, id: NodeId) -> &ParseTreeNode {
        self.nodes.get(id).expect("NodeId always indexes a live node")
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Drives `table` over `tokens`, producing a [`ParseTree`]. Every syntax
/// error is reported on `handler` and the driver resynchronizes by
/// advancing the token stream, so a source file with multiple mistakes
/// surfaces more than just the first one.
pub fn parse(tokens: &[Token], start_symbol: &str, table: &Ll1Table, handler: &Handler) -> ParseTree {
    let mut tree = ParseTree::default();
    let root_id = tree.nodes.push(ParseTreeNode::new(
        NodeId::from_usize(0),
        start_symbol.to_string(),
        false,
        None,
    ));
    tree.root = Some(root_id);

    let mut stack = vec![root_id];
    let mut i = 0usize;
    let eof_index = tokens.len().saturating_sub(1);

    while let Some(top) = stack.pop() {
        let (symbol, terminal) = {
            let node = tree.get(top);
            (node.symbol.clone(), node.terminal)
        };

        let Some(current) = tokens.get(i) else { break };

        if terminal {
            if current.kind.terminal_name() == symbol {
                let node = node_mut(&mut tree, top);
                node.lexeme = Some(current.kind.lexeme_text());
                node.line = Some(current.span.line);
                node.column = Some(current.span.column);
                i += 1;
            } else {
                handler.emit(
                    Diagnostic::error(
                        format!("expected `{symbol}`, found {}", current.kind),
                        current.span,
                    )
                    .with_code(codes::P_EXPECTED_TOKEN),
                );
                if i < eof_index {
                    i += 1;
                    stack.push(top);
                }
            }
            continue;
        }

        let terminal_name = current.kind.terminal_name();
        match table.get(&symbol, terminal_name) {
            Some(rhs) => expand(&mut tree, top, rhs, &mut stack),
            None => {
                handler.emit(
                    Diagnostic::error(
                        format!("no production for `{symbol}` on seeing {}", current.kind),
                        current.span,
                    )
                    .with_code(codes::P_NO_TABLE_ENTRY),
                );
                if i < eof_index {
                    i += 1;
                    stack.push(top);
                }
            }
        }
    }

    tree
}

fn node_mut(tree: &mut ParseTree, id: NodeId) -> &mut ParseTreeNode {
    tree.nodes.get_mut(id).expect("NodeId always indexes a live node")
}

fn expand(tree: &mut ParseTree, parent: NodeId, rhs: &[GrammarSymbol], stack: &mut Vec<NodeId>) {
    if matches!(rhs, [GrammarSymbol::Epsilon]) {
        // ε leaves are never matched against input; nothing pushed onto the stack.
        push_child(tree, parent, "e".to_string(), true);
        return;
    }

    let mut child_ids = Vec::with_capacity(rhs.len());
    for sym in rhs {
        let (name, is_terminal) = match sym {
            GrammarSymbol::Terminal(t) => (t.clone(), true),
            GrammarSymbol::NonTerminal(nt) => (nt.clone(), false),
            GrammarSymbol::EndOfInput => ("$".to_string(), true),
            GrammarSymbol::Epsilon => ("e".to_string(), true),
        };
        child_ids.push(push_child(tree, parent, name, is_terminal));
    }
    for &id in child_ids.iter().rev() {
        stack.push(id);
    }
}

fn push_child(tree: &mut ParseTree, parent: NodeId, symbol: String, terminal: bool) -> NodeId {
    let next = tree.nodes.next_index();
    let id = tree.nodes.push(ParseTreeNode::new(next, symbol, terminal, Some(parent)));
    node_mut(tree, parent).children.push(id);
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use mipsc_lex::{Token, TokenKind};
    use mipsc_table::{build_table, compute_first_sets, compute_follow_sets};
    use mipsc_util::Span;
    use std::collections::HashSet;

    fn tok(kind: TokenKind) -> Token {
        Token { kind, span: Span::new(0, 0, 1, 1) }
    }

    fn arith_table() -> mipsc_table::Ll1Table {
        // E -> T Eprime | Eprime -> + T Eprime | '' | T -> id
        let text = "E -> T Eprime\nEprime -> + T Eprime\nEprime -> ''\nT -> id\n";
        let terms: HashSet<&str> = ["id", "+", "$"].into_iter().collect();
        let handler = Handler::new();
        let grammar = mipsc_grammar::load(text, "g.txt", &terms, &handler).unwrap();
        let first = compute_first_sets(&grammar);
        let follow = compute_follow_sets(&grammar, &first);
        let table_handler = Handler::new();
        let order = vec!["id".to_string(), "+".to_string(), "$".to_string()];
        let table = build_table(&grammar, &first, &follow, &order, &table_handler);
        assert!(!table_handler.has_errors());
        table
    }

    #[test]
    fn parses_id_plus_id_with_no_errors() {
        let table = arith_table();
        let tokens = vec![
            tok(TokenKind::Identifier("a".into())),
            tok(TokenKind::Plus),
            tok(TokenKind::Identifier("b".into())),
            tok(TokenKind::Eof),
        ];
        let handler = Handler::new();
        let tree = parse(&tokens, "E", &table, &handler);
        assert!(!handler.has_errors());
        assert!(!tree.is_empty());
        let root = tree.get(tree.root().unwrap());
        assert_eq!(root.symbol, "E");
        assert_eq!(root.children.len(), 2);
    }

    #[test]
    fn mismatched_token_is_reported_not_panicked() {
        let table = arith_table();
        let tokens = vec![tok(TokenKind::Plus), tok(TokenKind::Eof)];
        let handler = Handler::new();
        let _tree = parse(&tokens, "E", &table, &handler);
        assert!(handler.has_errors());
    }
}
