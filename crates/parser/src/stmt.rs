//! Statements, including `if`/`while`/`for` control flow and the `for`
//! desugaring into an equivalent `while` block.

use crate::ast::{Block, ConditionalArm, Decl, ExprKind, LValue, Stmt, VarDecl};
use crate::Parser;
use loks_lexer::TokenKind;

impl Parser {
    /// `stmt := assign | if | block | return | continue | break | while | for | exprStmt`
    pub(crate) fn parse_stmt(&mut self) -> Option<Stmt> {
        match self.peek_kind() {
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::For => self.parse_for(),
            TokenKind::Return => self.parse_return(),
            TokenKind::Continue => self.parse_continue(),
            TokenKind::Break => self.parse_break(),
            TokenKind::LBrace => self.parse_block().map(Stmt::BlockStmt),
            TokenKind::Identifier(_) => self.parse_assign_or_expr_stmt(),
            _ => self.parse_expr_stmt(),
        }
    }

    /// Disambiguates `assign := ID ('[' expr ']')? '=' expr ';'` from a
    /// plain expression statement by lookahead on the token(s) following
    /// the identifier.
    fn parse_assign_or_expr_stmt(&mut self) -> Option<Stmt> {
        let start = self.peek().span;
        let save = self.pos;
        let name = self.expect_identifier()?;

        if self.match_kind(&TokenKind::Equal) {
            let value = self.parse_expr()?;
            self.expect(&TokenKind::Semicolon, "';'")?;
            let span = self.span_to_here(start);
            return Some(Stmt::Assign {
                target: LValue::Identifier(name),
                value,
                span,
            });
        }

        if self.check(&TokenKind::LBracket) {
            self.advance();
            let index = self.parse_expr()?;
            self.expect(&TokenKind::RBracket, "']'")?;
            if self.match_kind(&TokenKind::Equal) {
                let value = self.parse_expr()?;
                self.expect(&TokenKind::Semicolon, "';'")?;
                let span = self.span_to_here(start);
                let base = crate::ast::Expr::new(ExprKind::Identifier(name), start);
                return Some(Stmt::Assign {
                    target: LValue::Index {
                        base: Box::new(base),
                        index: Box::new(index),
                    },
                    value,
                    span,
                });
            }
        }

        // not an assignment after all: rewind and parse as a general
        // expression statement (covers bare calls like `f();`).
        self.pos = save;
        self.parse_expr_stmt()
    }

    fn parse_expr_stmt(&mut self) -> Option<Stmt> {
        let start = self.peek().span;
        let expr = self.parse_expr()?;
        self.expect(&TokenKind::Semicolon, "';'")?;
        let span = self.span_to_here(start);
        Some(Stmt::ExprStmt { expr, span })
    }

    /// `if := 'if' '(' expr ')' stmt ('elsif' '(' expr ')' stmt)* ('else' stmt)?`
    fn parse_if(&mut self) -> Option<Stmt> {
        let start = self.peek().span;
        let mut arms = vec![self.parse_conditional_arm(&TokenKind::If)?];

        while self.check(&TokenKind::Elsif) {
            arms.push(self.parse_conditional_arm(&TokenKind::Elsif)?);
        }

        let else_body = if self.match_kind(&TokenKind::Else) {
            Some(self.parse_stmt_as_block()?)
        } else {
            None
        };

        let span = self.span_to_here(start);
        Some(Stmt::If { arms, else_body, span })
    }

    fn parse_conditional_arm(&mut self, keyword: &TokenKind) -> Option<ConditionalArm> {
        let start = self.peek().span;
        self.expect(keyword, "'if'/'elsif'")?;
        self.expect(&TokenKind::LParen, "'('")?;
        let cond = self.parse_expr()?;
        self.expect(&TokenKind::RParen, "')'")?;
        let body = self.parse_stmt_as_block()?;
        let span = self.span_to_here(start);
        Some(ConditionalArm { cond, body, span })
    }

    /// A bare `stmt` used where the grammar allows a single statement (the
    /// body of `if`/`elsif`/`else`/`while`): wraps it in a one-element
    /// block so every branch has uniform `Block` shape downstream.
    fn parse_stmt_as_block(&mut self) -> Option<Block> {
        if self.check(&TokenKind::LBrace) {
            return self.parse_block();
        }
        let start = self.peek().span;
        let stmt = self.parse_stmt()?;
        let span = self.span_to_here(start);
        Some(Block {
            decls: vec![Decl::Stmt(stmt)],
            span,
        })
    }

    /// `while := 'while' '(' expr ')' stmt`
    fn parse_while(&mut self) -> Option<Stmt> {
        let start = self.peek().span;
        self.expect(&TokenKind::While, "'while'")?;
        self.expect(&TokenKind::LParen, "'('")?;
        let cond = self.parse_expr()?;
        self.expect(&TokenKind::RParen, "')'")?;
        let body = self.parse_stmt_as_block()?;
        let span = self.span_to_here(start);
        Some(Stmt::While { cond, body, span })
    }

    /// `for := 'for' '(' forInit ';' expr? ';' forUpdate? ')' stmt`
    ///
    /// Desugars to `{ init; while (cond) { body; update; } }`. A missing
    /// condition becomes literal `true`; a missing init/update is simply
    /// omitted.
    fn parse_for(&mut self) -> Option<Stmt> {
        let start = self.peek().span;
        self.expect(&TokenKind::For, "'for'")?;
        self.expect(&TokenKind::LParen, "'('")?;

        // `var` declarations and bare assignments both consume their own
        // trailing `;`; a plain expression forInit still needs one here.
        let init = if self.check(&TokenKind::Var) {
            Some(Decl::Var(self.parse_var_decl_inline()?))
        } else if self.check(&TokenKind::Semicolon) {
            self.advance();
            None
        } else {
            Some(Decl::Stmt(self.parse_assign_or_expr_stmt()?))
        };

        let cond = if self.check(&TokenKind::Semicolon) {
            crate::ast::Expr::new(ExprKind::True, self.peek().span)
        } else {
            self.parse_expr()?
        };
        self.expect(&TokenKind::Semicolon, "';'")?;

        // the update clause is a bare assignment/expression with no
        // trailing `;` of its own (the `for` grammar's closing `)` follows
        // directly), so assignment is parsed manually here rather than via
        // `parse_assign_or_expr_stmt`, which always expects one.
        let update: Option<Stmt> = if self.check(&TokenKind::RParen) {
            None
        } else {
            Some(self.parse_for_update_clause()?)
        };
        self.expect(&TokenKind::RParen, "')'")?;

        let body = self.parse_stmt_as_block()?;
        let span = self.span_to_here(start);

        let mut while_body_decls = body.decls;
        if let Some(update) = update {
            while_body_decls.push(Decl::Stmt(update));
        }
        let while_body = Block {
            decls: while_body_decls,
            span: body.span,
        };
        let while_stmt = Stmt::While {
            cond,
            body: while_body,
            span,
        };

        let mut block_decls = Vec::new();
        if let Some(init) = init {
            block_decls.push(init);
        }
        block_decls.push(Decl::Stmt(while_stmt));

        Some(Stmt::BlockStmt(Block {
            decls: block_decls,
            span,
        }))
    }

    /// A `for` update clause: either `ID ('[' expr ']')? = expr` or a bare
    /// expression, with no trailing `;` (the enclosing `for(...)` supplies
    /// the closing paren instead).
    fn parse_for_update_clause(&mut self) -> Option<Stmt> {
        let start = self.peek().span;
        if let TokenKind::Identifier(name) = self.peek_kind().clone() {
            let save = self.pos;
            self.advance();

            if self.match_kind(&TokenKind::Equal) {
                let value = self.parse_expr()?;
                let span = self.span_to_here(start);
                return Some(Stmt::Assign {
                    target: LValue::Identifier(name),
                    value,
                    span,
                });
            }
            if self.check(&TokenKind::LBracket) {
                self.advance();
                let index = self.parse_expr()?;
                self.expect(&TokenKind::RBracket, "']'")?;
                if self.match_kind(&TokenKind::Equal) {
                    let value = self.parse_expr()?;
                    let span = self.span_to_here(start);
                    let base = crate::ast::Expr::new(ExprKind::Identifier(name), start);
                    return Some(Stmt::Assign {
                        target: LValue::Index {
                            base: Box::new(base),
                            index: Box::new(index),
                        },
                        value,
                        span,
                    });
                }
            }
            self.pos = save;
        }

        let expr = self.parse_expr()?;
        let span = self.span_to_here(start);
        Some(Stmt::ExprStmt { expr, span })
    }

    fn parse_var_decl_inline(&mut self) -> Option<VarDecl> {
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

    /// `return := 'return' expr? ';'` — an empty return yields `nil`.
    fn parse_return(&mut self) -> Option<Stmt> {
        let start = self.peek().span;
        self.advance(); // 'return'
        let value = if self.check(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect(&TokenKind::Semicolon, "';'")?;
        let span = self.span_to_here(start);
        Some(Stmt::Return { value, span })
    }

    fn parse_continue(&mut self) -> Option<Stmt> {
        let start = self.peek().span;
        self.advance();
        self.expect(&TokenKind::Semicolon, "';'")?;
        Some(Stmt::Continue {
            span: self.span_to_here(start),
        })
    }

    fn parse_break(&mut self) -> Option<Stmt> {
        let start = self.peek().span;
        self.advance();
        self.expect(&TokenKind::Semicolon, "';'")?;
        Some(Stmt::Break {
            span: self.span_to_here(start),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Decl;
    use loks_lexer::Lexer;
    use loks_util::span::FileId;

    fn parse_program(src: &str) -> Vec<Decl> {
        let (tokens, lex_errors) = Lexer::new(src, FileId::DUMMY).tokenize();
        assert!(lex_errors.is_empty());
        let (decls, errors) = Parser::new(tokens).parse();
        assert!(errors.is_empty(), "unexpected parse errors: {errors:?}");
        decls
    }

    #[test]
    fn parses_simple_assignment() {
        let decls = parse_program("var x; x = 1;");
        assert!(matches!(&decls[1], Decl::Stmt(Stmt::Assign { .. })));
    }

    #[test]
    fn parses_subscript_assignment() {
        let decls = parse_program("var a; a[0] = 1;");
        match &decls[1] {
            Decl::Stmt(Stmt::Assign { target, .. }) => {
                assert!(matches!(target, LValue::Index { .. }));
            }
            _ => panic!("expected assign stmt"),
        }
    }

    #[test]
    fn parses_if_elsif_else() {
        let decls = parse_program("if (1) { } elsif (2) { } else { }");
        match &decls[0] {
            Decl::Stmt(Stmt::If { arms, else_body, .. }) => {
                assert_eq!(arms.len(), 2);
                assert!(else_body.is_some());
            }
            _ => panic!("expected if stmt"),
        }
    }

    #[test]
    fn for_desugars_to_init_then_while_with_update_appended() {
        let decls = parse_program("for (var i=0; i<3; i=i+1) { print(i); }");
        match &decls[0] {
            Decl::Stmt(Stmt::BlockStmt(block)) => {
                assert_eq!(block.decls.len(), 2);
                assert!(matches!(&block.decls[0], Decl::Var(v) if v.name.as_str() == "i"));
                match &block.decls[1] {
                    Decl::Stmt(Stmt::While { body, .. }) => {
                        // body statement, then the appended update statement
                        assert_eq!(body.decls.len(), 2);
                    }
                    _ => panic!("expected desugared while"),
                }
            }
            _ => panic!("expected desugared block"),
        }
    }

    #[test]
    fn for_without_condition_defaults_to_true() {
        let decls = parse_program("for (;;) { break; }");
        match &decls[0] {
            Decl::Stmt(Stmt::BlockStmt(block)) => match &block.decls[0] {
                Decl::Stmt(Stmt::While { cond, .. }) => {
                    assert!(matches!(cond.kind, ExprKind::True));
                }
                _ => panic!("expected while"),
            },
            _ => panic!("expected block"),
        }
    }
}
