//! Top-level and block-level declarations: `var` and `fun`.

use crate::ast::{Block, Decl, FunDecl, VarDecl};
use crate::Parser;
use loks_lexer::TokenKind;
use loks_util::symbol::Symbol;

impl Parser {
    /// `decl := varDecl | funDecl | stmt`
    pub(crate) fn parse_decl(&mut self) -> Option<Decl> {
        match self.peek_kind() {
            TokenKind::Var => self.parse_var_decl().map(Decl::Var),
            TokenKind::Fun => self.parse_fun_decl().map(Decl::Fun),
            _ => self.parse_stmt().map(Decl::Stmt),
        }
    }

    /// `varDecl := 'var' ID ( '=' expr )? ';'`
    fn parse_var_decl(&mut self) -> Option<VarDecl> {
        let start = self.peek().span;
        self.advance(); // 'var'
        let name = self.expect_identifier()?;

        let init = if self.match_kind(&TokenKind::Equal) {
            Some(self.parse_expr()?)
        } else {
            None
        };
        self.expect(&TokenKind::Semicolon, "';'")?;
        let span = self.span_to_here(start);
        Some(VarDecl { name, init, span })
    }

    /// `funDecl := 'fun' ID '(' params? ')' block`
    fn parse_fun_decl(&mut self) -> Option<FunDecl> {
        let start = self.peek().span;
        self.advance(); // 'fun'
        let name = self.expect_identifier()?;
        self.expect(&TokenKind::LParen, "'('")?;

        let mut params = Vec::new();
        if !self.check(&TokenKind::RParen) {
            loop {
                params.push(self.expect_identifier()?);
                if !self.match_kind(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(&TokenKind::RParen, "')'")?;

        let body = self.parse_block()?;
        let span = self.span_to_here(start);
        Some(FunDecl { name, params, body, span })
    }

    /// `'{' decl* '}'`
    pub(crate) fn parse_block(&mut self) -> Option<Block> {
        let start = self.peek().span;
        self.expect(&TokenKind::LBrace, "'{'")?;

        let mut decls = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            match self.parse_decl() {
                Some(decl) => decls.push(decl),
                None => self.synchronize_in_block(),
            }
        }
        self.expect(&TokenKind::RBrace, "'}'")?;
        let span = self.span_to_here(start);
        Some(Block { decls, span })
    }

    fn synchronize_in_block(&mut self) {
        // a lighter-weight recovery than the top-level one: just skip
        // forward to the next statement-ish boundary without leaving the
        // enclosing block behind via `}`.
        while !self.is_at_end()
            && !self.check(&TokenKind::RBrace)
            && !self.check(&TokenKind::Semicolon)
        {
            self.advance();
        }
        self.match_kind(&TokenKind::Semicolon);
    }

    pub(crate) fn expect_identifier(&mut self) -> Option<Symbol> {
        match self.peek_kind().clone() {
            TokenKind::Identifier(sym) => {
                self.advance();
                Some(sym)
            }
            _ => {
                self.error_here(format!("expected identifier, found {:?}", self.peek_kind()));
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Decl;
    use loks_lexer::Lexer;
    use loks_util::span::FileId;

    fn parse(src: &str) -> (Vec<Decl>, Vec<loks_util::error::LoksError>) {
        let (tokens, _) = Lexer::new(src, FileId::DUMMY).tokenize();
        Parser::new(tokens).parse()
    }

    #[test]
    fn parses_var_decl_with_init() {
        let (decls, errors) = parse("var x = 1;");
        assert!(errors.is_empty());
        assert!(matches!(&decls[0], Decl::Var(v) if v.init.is_some()));
    }

    #[test]
    fn parses_var_decl_without_init() {
        let (decls, errors) = parse("var x;");
        assert!(errors.is_empty());
        assert!(matches!(&decls[0], Decl::Var(v) if v.init.is_none()));
    }

    #[test]
    fn parses_fun_decl_with_params() {
        let (decls, errors) = parse("fun add(a, b) { return a + b; }");
        assert!(errors.is_empty());
        match &decls[0] {
            Decl::Fun(f) => assert_eq!(f.params.len(), 2),
            _ => panic!("expected FunDecl"),
        }
    }
}
