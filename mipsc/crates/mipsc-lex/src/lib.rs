//! Hand-written lexer for the source language.
//!
//! Turns source text into an ordered [`Token`] stream terminated by a
//! synthetic end-of-input token, plus any lexical diagnostics collected
//! along the way. Unrecognized characters are skipped (one at a time) after
//! emitting a diagnostic, so a single bad character does not abort the scan.

pub mod cursor;

use cursor::Cursor;
use mipsc_util::diagnostic::{codes, Diagnostic};
use mipsc_util::{Handler, Span};
use std::fmt;

/// The lexical category of a token, doubling as the terminal alphabet the
/// grammar file and LL(1) table are built against.
#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    // Keywords
    KwFunction,
    KwMain,
    KwIf,
    KwElse,
    KwWhile,
    KwFor,
    KwDo,
    KwSwitch,
    KwCase,
    KwDefault,
    KwBreak,
    KwContinue,
    KwReturn,
    KwInt,
    KwFloat,
    KwText,
    KwBool,
    KwVoid,
    KwTrue,
    KwFalse,
    KwShow,
    KwInput,
    KwRead,

    // Literals
    IntLiteral(i64),
    FloatLiteral(f64),
    StringLiteral(String),
    BoolLiteral(bool),
    Identifier(String),

    // Multi-character operators
    EqEq,
    NotEq,
    LtEq,
    GtEq,
    AndAnd,
    OrOr,

    // Single-character operators and punctuation
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Assign,
    Lt,
    Gt,
    Bang,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Semicolon,
    Comma,
    Colon,
    Dot,

    /// Synthetic end-of-input terminal, `$`.
    Eof,
}

impl TokenKind {
    /// The terminal symbol name used by the grammar file and LL(1) table;
    /// literal/identifier variants collapse to one terminal regardless of
    /// their value, since the grammar classifies by category, not content.
    pub fn terminal_name(&self) -> &'static str {
        use TokenKind::*;
        match self {
            KwFunction => "function",
            KwMain => "main",
            KwIf => "if",
            KwElse => "else",
            KwWhile => "while",
            KwFor => "for",
            KwDo => "do",
            KwSwitch => "switch",
            KwCase => "case",
            KwDefault => "default",
            KwBreak => "break",
            KwContinue => "continue",
            KwReturn => "return",
            KwInt => "int",
            KwFloat => "float",
            KwText => "text",
            KwBool => "bool",
            KwVoid => "void",
            KwTrue | KwFalse => "boolliteral",
            KwShow => "show",
            KwInput => "input",
            KwRead => "read",
            IntLiteral(_) => "intliteral",
            FloatLiteral(_) => "floatliteral",
            StringLiteral(_) => "stringliteral",
            BoolLiteral(_) => "boolliteral",
            Identifier(_) => "id",
            EqEq => "==",
            NotEq => "!=",
            LtEq => "<=",
            GtEq => ">=",
            AndAnd => "&&",
            OrOr => "||",
            Plus => "+",
            Minus => "-",
            Star => "*",
            Slash => "/",
            Percent => "%",
            Assign => "=",
            Lt => "<",
            Gt => ">",
            Bang => "!",
            LParen => "(",
            RParen => ")",
            LBrace => "{",
            RBrace => "}",
            LBracket => "[",
            RBracket => "]",
            Semicolon => ";",
            Comma => ",",
            Colon => ":",
            Dot => ".",
            Eof => "$",
        }
    }

    pub fn is_eof(&self) -> bool {
        matches!(self, TokenKind::Eof)
    }

    /// The raw source text a downstream stage needs to recover a literal's
    /// or identifier's value, as opposed to [`Display`]'s human-readable
    /// rendering (which wraps these in `identifier \`...\`` etc. for
    /// diagnostic messages).
    pub fn lexeme_text(&self) -> String {
        use TokenKind::*;
        match self {
            Identifier(name) => name.clone(),
            IntLiteral(v) => v.to_string(),
            FloatLiteral(v) => v.to_string(),
            StringLiteral(v) => v.clone(),
            BoolLiteral(v) => v.to_string(),
            other => other.terminal_name().to_string(),
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Identifier(name) => write!(f, "identifier `{name}`"),
            TokenKind::IntLiteral(v) => write!(f, "integer literal `{v}`"),
            TokenKind::FloatLiteral(v) => write!(f, "float literal `{v}`"),
            TokenKind::StringLiteral(v) => write!(f, "string literal {v:?}"),
            TokenKind::BoolLiteral(v) => write!(f, "boolean literal `{v}`"),
            other => write!(f, "`{}`", other.terminal_name()),
        }
    }
}

/// The fixed terminal alphabet the grammar file and LL(1) table are built
/// against — every distinct string `TokenKind::terminal_name` can produce,
/// independent of any particular token's value. Classifying a grammar
/// symbol is always done against this list, never inferred from the
/// grammar file itself.
pub const TERMINAL_ALPHABET: &[&str] = &[
    "function", "main", "if", "else", "while", "for", "do", "switch", "case", "default", "break",
    "continue", "return", "int", "float", "text", "bool", "void", "show", "input", "read",
    "intliteral", "floatliteral", "stringliteral", "boolliteral", "id", "==", "!=", "<=", ">=",
    "&&", "||", "+", "-", "*", "/", "%", "=", "<", ">", "!", "(", ")", "{", "}", "[", "]", ";",
    ",", ":", ".", "$",
];

/// A single lexical token with its source position.
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

fn lookup_keyword(ident: &str) -> Option<TokenKind> {
    use TokenKind::*;
    Some(match ident {
        "function" | "fn" => KwFunction,
        "main" => KwMain,
        "if" => KwIf,
        "else" => KwElse,
        "while" => KwWhile,
        "for" => KwFor,
        "do" => KwDo,
        "switch" => KwSwitch,
        "case" => KwCase,
        "default" => KwDefault,
        "break" => KwBreak,
        "continue" => KwContinue,
        "return" => KwReturn,
        "int" => KwInt,
        "float" => KwFloat,
        "text" => KwText,
        "bool" => KwBool,
        "void" => KwVoid,
        "true" => KwTrue,
        "false" => KwFalse,
        "show" => KwShow,
        "input" => KwInput,
        "read" => KwRead,
        _ => return None,
    })
}

/// Scans source text into a token stream, one [`Lexer`] per source file.
pub struct Lexer<'a> {
    cursor: Cursor<'a>,
    file_id: mipsc_util::FileId,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            cursor: Cursor::new(source),
            file_id: mipsc_util::FileId::DUMMY,
        }
    }

    /// Tokenize the whole source, returning tokens (terminated by `Eof`)
    /// and accumulating lexical diagnostics on `handler`.
    pub fn tokenize(mut self, handler: &Handler) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token(handler);
            let is_eof = tok.kind.is_eof();
            tokens.push(tok);
            if is_eof {
                break;
            }
        }
        tokens
    }

    fn span_from(&self, start_pos: usize, start_line: u32, start_col: u32) -> Span {
        Span::with_file(start_pos, self.cursor.position(), self.file_id, start_line, start_col)
    }

    fn skip_trivia(&mut self, handler: &Handler) {
        loop {
            match self.cursor.current_char() {
                Some(c) if c.is_whitespace() => {
                    self.cursor.advance();
                }
                Some('/') if self.cursor.char_at(1) == Some('/') => {
                    while !matches!(self.cursor.current_char(), None | Some('\n')) {
                        self.cursor.advance();
                    }
                }
                Some('/') if self.cursor.char_at(1) == Some('*') => {
                    let start_line = self.cursor.line();
                    let start_col = self.cursor.column();
                    let start_pos = self.cursor.position();
                    self.cursor.advance();
                    self.cursor.advance();
                    let mut closed = false;
                    while let Some(c) = self.cursor.current_char() {
                        if c == '*' && self.cursor.char_at(1) == Some('/') {
                            self.cursor.advance();
                            self.cursor.advance();
                            closed = true;
                            break;
                        }
                        self.cursor.advance();
                    }
                    if !closed {
                        handler.emit(
                            Diagnostic::error(
                                "unterminated block comment",
                                self.span_from(start_pos, start_line, start_col),
                            )
                            .with_code(codes::L_UNTERMINATED_STRING),
                        );
                    }
                }
                _ => break,
            }
        }
    }

    /// Produce the next token, skipping leading whitespace/comments.
    pub fn next_token(&mut self, handler: &Handler) -> Token {
        self.skip_trivia(handler);

        let start_pos = self.cursor.position();
        let start_line = self.cursor.line();
        let start_col = self.cursor.column();

        let Some(c) = self.cursor.current_char() else {
            return Token::new(TokenKind::Eof, Span::point(start_line, start_col));
        };

        let kind = match c {
            '"' => self.lex_string(handler, start_line, start_col),
            c if c.is_ascii_digit() => self.lex_number(handler, start_line, start_col),
            c if c.is_alphabetic() || c == '_' => self.lex_identifier_or_keyword(),
            _ => self.lex_operator(handler, start_line, start_col),
        };

        Token::new(kind, self.span_from(start_pos, start_line, start_col))
    }

    fn lex_identifier_or_keyword(&mut self) -> TokenKind {
        let mut name = String::new();
        while let Some(c) = self.cursor.current_char() {
            if c.is_alphanumeric() || c == '_' {
                name.push(c);
                self.cursor.advance();
            } else {
                break;
            }
        }
        if let Some(kw) = lookup_keyword(&name) {
            match kw {
                TokenKind::KwTrue => TokenKind::BoolLiteral(true),
                TokenKind::KwFalse => TokenKind::BoolLiteral(false),
                other => other,
            }
        } else {
            TokenKind::Identifier(name)
        }
    }

    fn lex_number(&mut self, handler: &Handler, start_line: u32, start_col: u32) -> TokenKind {
        let mut digits = String::new();
        while let Some(c) = self.cursor.current_char() {
            if c.is_ascii_digit() {
                digits.push(c);
                self.cursor.advance();
            } else {
                break;
            }
        }
        if self.cursor.current_char() == Some('.') && self.cursor.char_at(1).is_some_and(|c| c.is_ascii_digit()) {
            digits.push('.');
            self.cursor.advance();
            while let Some(c) = self.cursor.current_char() {
                if c.is_ascii_digit() {
                    digits.push(c);
                    self.cursor.advance();
                } else {
                    break;
                }
            }
            match digits.parse::<f64>() {
                Ok(v) => TokenKind::FloatLiteral(v),
                Err(_) => {
                    handler.emit(
                        Diagnostic::error(
                            format!("malformed float literal `{digits}`"),
                            Span::point(start_line, start_col),
                        )
                        .with_code(codes::L_MALFORMED_NUMBER),
                    );
                    TokenKind::FloatLiteral(0.0)
                }
            }
        } else {
            match digits.parse::<i64>() {
                Ok(v) => TokenKind::IntLiteral(v),
                Err(_) => {
                    handler.emit(
                        Diagnostic::error(
                            format!("malformed integer literal `{digits}`"),
                            Span::point(start_line, start_col),
                        )
                        .with_code(codes::L_MALFORMED_NUMBER),
                    );
                    TokenKind::IntLiteral(0)
                }
            }
        }
    }

    /// Strings may contain raw newlines; each one advances the line counter
    /// exactly as ordinary source text does, via `Cursor::advance`.
    fn lex_string(&mut self, handler: &Handler, start_line: u32, start_col: u32) -> TokenKind {
        self.cursor.advance(); // opening quote
        let mut value = String::new();
        loop {
            match self.cursor.current_char() {
                None => {
                    handler.emit(
                        Diagnostic::error(
                            "unterminated string literal",
                            Span::point(start_line, start_col),
                        )
                        .with_code(codes::L_UNTERMINATED_STRING),
                    );
                    break;
                }
                Some('"') => {
                    self.cursor.advance();
                    break;
                }
                Some(c) => {
                    value.push(c);
                    self.cursor.advance();
                }
            }
        }
        TokenKind::StringLiteral(value)
    }

    fn lex_operator(&mut self, handler: &Handler, start_line: u32, start_col: u32) -> TokenKind {
        let c = self.cursor.advance().expect("checked by caller");
        let two_char = |lexer: &mut Self, second: char, two: TokenKind, one: TokenKind| {
            if lexer.cursor.eat(second) {
                two
            } else {
                one
            }
        };
        match c {
            '=' => two_char(self, '=', TokenKind::EqEq, TokenKind::Assign),
            '!' => two_char(self, '=', TokenKind::NotEq, TokenKind::Bang),
            '<' => two_char(self, '=', TokenKind::LtEq, TokenKind::Lt),
            '>' => two_char(self, '=', TokenKind::GtEq, TokenKind::Gt),
            '&' if self.cursor.eat('&') => TokenKind::AndAnd,
            '|' if self.cursor.eat('|') => TokenKind::OrOr,
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '%' => TokenKind::Percent,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            ';' => TokenKind::Semicolon,
            ',' => TokenKind::Comma,
            ':' => TokenKind::Colon,
            '.' => TokenKind::Dot,
            other => {
                handler.emit(
                    Diagnostic::error(
                        format!("unexpected character `{other}`"),
                        Span::point(start_line, start_col),
                    )
                    .with_code(codes::L_UNKNOWN_CHAR),
                );
                // Re-dispatch: treat the unknown character as consumed and
                // keep scanning from the next one.
                self.lex_operator_or_eof(handler)
            }
        }
    }

    fn lex_operator_or_eof(&mut self, handler: &Handler) -> TokenKind {
        let line = self.cursor.line();
        let col = self.cursor.column();
        match self.cursor.current_char() {
            None => TokenKind::Eof,
            Some(c) if c.is_ascii_digit() => self.lex_number(handler, line, col),
            Some(c) if c.is_alphabetic() || c == '_' => self.lex_identifier_or_keyword(),
            Some('"') => self.lex_string(handler, line, col),
            _ => self.lex_operator(handler, line, col),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex_all(source: &str) -> (Vec<Token>, Handler) {
        let handler = Handler::new();
        let tokens = Lexer::new(source).tokenize(&handler);
        (tokens, handler)
    }

    #[test]
    fn scenario_a_hello_world_token_count() {
        let (tokens, handler) = lex_all(r#"fn main() int { return 0; }"#);
        assert!(!handler.has_errors());
        // fn, main, (, ), int, {, return, 0, ;, }, $  == 11 tokens incl Eof
        assert_eq!(tokens.last().unwrap().kind, TokenKind::Eof);
        assert!(tokens.iter().any(|t| t.kind == TokenKind::KwMain));
        assert!(tokens.iter().any(|t| t.kind == TokenKind::KwReturn));
    }

    #[test]
    fn keywords_are_classified_not_identifiers() {
        let (tokens, _) = lex_all("if else while for show read true false");
        let kinds: Vec<_> = tokens.into_iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::KwIf,
                TokenKind::KwElse,
                TokenKind::KwWhile,
                TokenKind::KwFor,
                TokenKind::KwShow,
                TokenKind::KwRead,
                TokenKind::BoolLiteral(true),
                TokenKind::BoolLiteral(false),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn two_char_operators_take_priority_over_one_char() {
        let (tokens, _) = lex_all("<= >= == != && ||");
        let kinds: Vec<_> = tokens.into_iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::LtEq,
                TokenKind::GtEq,
                TokenKind::EqEq,
                TokenKind::NotEq,
                TokenKind::AndAnd,
                TokenKind::OrOr,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn float_literal_requires_digits_on_both_sides_of_the_dot() {
        let (tokens, _) = lex_all("3.14");
        assert_eq!(tokens[0].kind, TokenKind::FloatLiteral(3.14));
    }

    #[test]
    fn string_literal_may_span_multiple_lines() {
        let (tokens, handler) = lex_all("\"hi\nthere\" x");
        assert!(!handler.has_errors());
        assert_eq!(tokens[0].kind, TokenKind::StringLiteral("hi\nthere".to_string()));
        // the identifier after the string should report line 2
        assert_eq!(tokens[1].span.line, 2);
    }

    #[test]
    fn unterminated_string_is_a_diagnostic_not_a_panic() {
        let (_, handler) = lex_all("\"oops");
        assert!(handler.has_errors());
    }

    #[test]
    fn unknown_character_is_skipped_with_a_diagnostic() {
        let (tokens, handler) = lex_all("x @ y");
        assert!(handler.has_errors());
        let kinds: Vec<_> = tokens.into_iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Identifier("x".into()),
                TokenKind::Identifier("y".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn line_comments_and_block_comments_are_skipped() {
        let (tokens, handler) = lex_all("x // comment\n/* block */ y");
        assert!(!handler.has_errors());
        let kinds: Vec<_> = tokens.into_iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Identifier("x".into()),
                TokenKind::Identifier("y".into()),
                TokenKind::Eof,
            ]
        );
    }
}
