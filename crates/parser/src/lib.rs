//! Recursive-descent parser: token stream → [`ast::Program`].
//!
//! The grammar is hand-written, not table-driven; each non-terminal has a
//! matching `parse_*` method, split across [`items`] (declarations),
//! [`stmt`] (statements and `for`/`if`/`while` desugaring) and [`expr`]
//! (precedence-climbing expression parsing). Parse errors do not abort the
//! parse: the parser records a diagnostic and synchronizes to the next
//! statement boundary, so a single run can report more than one
//! `SyntaxError`.

pub mod ast;
mod expr;
mod items;
pub mod pretty;
mod stmt;

use ast::Program;
use loks_lexer::{Token, TokenKind};
use loks_util::error::LoksError;
use loks_util::span::Span;

/// The token kinds the parser resynchronizes on after a syntax error.
const SYNC_KINDS: &[fn(&TokenKind) -> bool] = &[
    |k| matches!(k, TokenKind::Semicolon),
    |k| matches!(k, TokenKind::Eof),
    |k| matches!(k, TokenKind::Var),
    |k| matches!(k, TokenKind::Fun),
    |k| matches!(k, TokenKind::RParen),
    |k| matches!(k, TokenKind::RBrace),
    |k| matches!(k, TokenKind::Return),
];

/// Recursive-descent parser over a token stream.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    errors: Vec<LoksError>,
}

impl Parser {
    /// Builds a parser over a scanned token stream (expected to end with
    /// exactly one EOF token, per the scanner's contract).
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            errors: Vec::new(),
        }
    }

    /// Parses a complete program, returning the AST and any diagnostics
    /// collected along the way. Never aborts on the first error.
    pub fn parse(mut self) -> (Program, Vec<LoksError>) {
        let mut decls = Vec::new();
        while !self.is_at_end() {
            match self.parse_decl() {
                Some(decl) => decls.push(decl),
                None => self.synchronize(),
            }
        }
        (decls, self.errors)
    }

    // --- token stream primitives, shared by items/stmt/expr ---

    pub(crate) fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    pub(crate) fn peek_kind(&self) -> &TokenKind {
        &self.peek().kind
    }

    pub(crate) fn previous(&self) -> &Token {
        &self.tokens[self.pos - 1]
    }

    pub(crate) fn is_at_end(&self) -> bool {
        matches!(self.peek().kind, TokenKind::Eof)
    }

    pub(crate) fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(self.peek_kind()) == std::mem::discriminant(kind)
    }

    pub(crate) fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.pos += 1;
        }
        self.previous()
    }

    pub(crate) fn match_kind(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consumes the current token if it matches `kind`, else records a
    /// `SyntaxError` naming the expected token and returns `None`.
    pub(crate) fn expect(&mut self, kind: &TokenKind, what: &str) -> Option<&Token> {
        if self.check(kind) {
            Some(self.advance())
        } else {
            self.error_here(format!("expected {what}, found {:?}", self.peek_kind()));
            None
        }
    }

    pub(crate) fn error_here(&mut self, message: String) {
        use loks_util::error::ErrorKind;
        let span = self.peek().span;
        self.errors.push(LoksError::new(ErrorKind::SyntaxError(message), span));
    }

    pub(crate) fn span_to_here(&self, start: Span) -> Span {
        start.merge(self.previous().span)
    }

    /// Advances until a synchronization token is seen.
    fn synchronize(&mut self) {
        if !self.is_at_end() {
            self.advance();
        }
        while !self.is_at_end() {
            if SYNC_KINDS.iter().any(|pred| pred(self.peek_kind())) {
                return;
            }
            self.advance();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loks_lexer::Lexer;
    use loks_util::span::FileId;

    fn parse(src: &str) -> (Program, Vec<LoksError>) {
        let (tokens, lex_errors) = Lexer::new(src, FileId::DUMMY).tokenize();
        assert!(lex_errors.is_empty(), "unexpected lex errors: {lex_errors:?}");
        Parser::new(tokens).parse()
    }

    #[test]
    fn parses_empty_program() {
        let (decls, errors) = parse("");
        assert!(decls.is_empty());
        assert!(errors.is_empty());
    }

    #[test]
    fn recovers_after_a_syntax_error_and_keeps_parsing() {
        let (decls, errors) = parse("var x = ; var y = 1;");
        assert!(!errors.is_empty());
        assert!(decls.iter().any(|d| matches!(d, ast::Decl::Var(v) if v.name.as_str() == "y")));
    }
}
