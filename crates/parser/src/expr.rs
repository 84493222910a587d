//! Expression parsing by precedence climbing, lowest to highest: `or`,
//! `and`, equality, comparison, additive, multiplicative, unary, postfix,
//! primary.

use crate::ast::{BinOpKind, Expr, ExprKind, NumberLit, UnOpKind};
use crate::Parser;
use loks_lexer::{Literal, TokenKind};

impl Parser {
    pub(crate) fn parse_expr(&mut self) -> Option<Expr> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Option<Expr> {
        let mut left = self.parse_and()?;
        while self.check(&TokenKind::Or) {
            self.advance();
            let right = self.parse_and()?;
            left = self.binop(BinOpKind::Or, left, right);
        }
        Some(left)
    }

    fn parse_and(&mut self) -> Option<Expr> {
        let mut left = self.parse_equality()?;
        while self.check(&TokenKind::And) {
            self.advance();
            let right = self.parse_equality()?;
            left = self.binop(BinOpKind::And, left, right);
        }
        Some(left)
    }

    fn parse_equality(&mut self) -> Option<Expr> {
        let mut left = self.parse_comparison()?;
        loop {
            let kind = match self.peek_kind() {
                TokenKind::EqualEqual => BinOpKind::Eq,
                TokenKind::BangEqual => BinOpKind::Ne,
                _ => break,
            };
            self.advance();
            let right = self.parse_comparison()?;
            left = self.binop(kind, left, right);
        }
        Some(left)
    }

    fn parse_comparison(&mut self) -> Option<Expr> {
        let mut left = self.parse_additive()?;
        loop {
            let kind = match self.peek_kind() {
                TokenKind::Greater => BinOpKind::Gt,
                TokenKind::GreaterEqual => BinOpKind::Ge,
                TokenKind::Less => BinOpKind::Lt,
                TokenKind::LessEqual => BinOpKind::Le,
                _ => break,
            };
            self.advance();
            let right = self.parse_additive()?;
            left = self.binop(kind, left, right);
        }
        Some(left)
    }

    fn parse_additive(&mut self) -> Option<Expr> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let kind = match self.peek_kind() {
                TokenKind::Plus => BinOpKind::Add,
                TokenKind::Minus => BinOpKind::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = self.binop(kind, left, right);
        }
        Some(left)
    }

    fn parse_multiplicative(&mut self) -> Option<Expr> {
        let mut left = self.parse_unary()?;
        loop {
            let kind = match self.peek_kind() {
                TokenKind::Star => BinOpKind::Mul,
                TokenKind::Slash => BinOpKind::Div,
                TokenKind::Percent => BinOpKind::Mod,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            left = self.binop(kind, left, right);
        }
        Some(left)
    }

    fn parse_unary(&mut self) -> Option<Expr> {
        let start = self.peek().span;
        let kind = match self.peek_kind() {
            TokenKind::Bang => Some(UnOpKind::Not),
            TokenKind::Minus => Some(UnOpKind::Neg),
            _ => None,
        };
        if let Some(kind) = kind {
            self.advance();
            let operand = self.parse_unary()?;

            // literal folding: `-<number literal>` becomes a single
            // negative constant instead of a UnaryOp node, which also
            // shortens the bytecode the compiler later emits for it.
            if kind == UnOpKind::Neg {
                if let ExprKind::Number(lit) = operand.kind {
                    let span = self.span_to_here(start);
                    let folded = match lit {
                        NumberLit::Integer(n) => NumberLit::Integer(-n),
                        NumberLit::Double(d) => NumberLit::Double(-d),
                    };
                    return Some(Expr::new(ExprKind::Number(folded), span));
                }
            }

            let span = self.span_to_here(start);
            return Some(Expr::new(
                ExprKind::UnaryOp {
                    kind,
                    expr: Box::new(operand),
                },
                span,
            ));
        }
        self.parse_postfix()
    }

    /// Array access and calls are left-recursive chains: after a primary
    /// expression, accept any sequence of `[expr]` and `(args)`.
    fn parse_postfix(&mut self) -> Option<Expr> {
        let start = self.peek().span;
        let mut expr = self.parse_primary()?;

        loop {
            match self.peek_kind() {
                TokenKind::LBracket => {
                    self.advance();
                    let index = self.parse_expr()?;
                    self.expect(&TokenKind::RBracket, "']'")?;
                    let span = self.span_to_here(start);
                    expr = Expr::new(
                        ExprKind::ArrayAccess {
                            base: Box::new(expr),
                            index: Box::new(index),
                        },
                        span,
                    );
                }
                TokenKind::LParen => {
                    self.advance();
                    let mut args = Vec::new();
                    if !self.check(&TokenKind::RParen) {
                        loop {
                            args.push(self.parse_expr()?);
                            if !self.match_kind(&TokenKind::Comma) {
                                break;
                            }
                        }
                    }
                    self.expect(&TokenKind::RParen, "')'")?;
                    let span = self.span_to_here(start);
                    expr = Expr::new(
                        ExprKind::Call {
                            callee: Box::new(expr),
                            args,
                        },
                        span,
                    );
                }
                _ => break,
            }
        }
        Some(expr)
    }

    fn parse_primary(&mut self) -> Option<Expr> {
        let span = self.peek().span;
        match self.peek_kind().clone() {
            TokenKind::Number(Literal::Integer(n)) => {
                self.advance();
                Some(Expr::new(ExprKind::Number(NumberLit::Integer(n)), span))
            }
            TokenKind::Number(Literal::Double(d)) => {
                self.advance();
                Some(Expr::new(ExprKind::Number(NumberLit::Double(d)), span))
            }
            TokenKind::String(s) => {
                self.advance();
                Some(Expr::new(ExprKind::String(s), span))
            }
            TokenKind::True => {
                self.advance();
                Some(Expr::new(ExprKind::True, span))
            }
            TokenKind::False => {
                self.advance();
                Some(Expr::new(ExprKind::False, span))
            }
            TokenKind::Nil => {
                self.advance();
                Some(Expr::new(ExprKind::Nil, span))
            }
            TokenKind::Identifier(sym) => {
                self.advance();
                Some(Expr::new(ExprKind::Identifier(sym), span))
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expr()?;
                self.expect(&TokenKind::RParen, "')'")?;
                Some(inner)
            }
            TokenKind::LBracket => {
                self.advance();
                let mut elems = Vec::new();
                if !self.check(&TokenKind::RBracket) {
                    loop {
                        elems.push(self.parse_expr()?);
                        if !self.match_kind(&TokenKind::Comma) {
                            break;
                        }
                    }
                }
                self.expect(&TokenKind::RBracket, "']'")?;
                let span = self.span_to_here(span);
                Some(Expr::new(ExprKind::Array(elems), span))
            }
            _ => {
                self.error_here(format!("expected expression, found {:?}", self.peek_kind()));
                None
            }
        }
    }

    fn binop(&self, kind: BinOpKind, left: Expr, right: Expr) -> Expr {
        let span = left.span.merge(right.span);
        Expr::new(
            ExprKind::BinOp {
                kind,
                left: Box::new(left),
                right: Box::new(right),
            },
            span,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Parser;
    use loks_lexer::Lexer;
    use loks_util::span::FileId;

    fn parse_expr(src: &str) -> Expr {
        let (tokens, lex_errors) = Lexer::new(src, FileId::DUMMY).tokenize();
        assert!(lex_errors.is_empty());
        let mut parser = Parser::new(tokens);
        parser.parse_expr().expect("expected a valid expression")
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        let expr = parse_expr("2 + 3 * 4");
        match expr.kind {
            ExprKind::BinOp { kind: BinOpKind::Add, right, .. } => {
                assert!(matches!(right.kind, ExprKind::BinOp { kind: BinOpKind::Mul, .. }));
            }
            other => panic!("unexpected shape: {other:?}"),
        }
    }

    #[test]
    fn unary_minus_on_a_literal_is_folded() {
        let expr = parse_expr("-5");
        assert!(matches!(expr.kind, ExprKind::Number(NumberLit::Integer(-5))));
    }

    #[test]
    fn unary_minus_on_non_literal_stays_a_node() {
        let expr = parse_expr("-x");
        assert!(matches!(expr.kind, ExprKind::UnaryOp { kind: UnOpKind::Neg, .. }));
    }

    #[test]
    fn postfix_chain_of_call_and_index() {
        let expr = parse_expr("f(1)[0]");
        assert!(matches!(expr.kind, ExprKind::ArrayAccess { .. }));
    }

    #[test]
    fn array_literal_parses_elements() {
        let expr = parse_expr("[1, 2, 3]");
        match expr.kind {
            ExprKind::Array(elems) => assert_eq!(elems.len(), 3),
            other => panic!("unexpected shape: {other:?}"),
        }
    }

    #[test]
    fn or_has_lower_precedence_than_and() {
        let expr = parse_expr("true or false and true");
        assert!(matches!(
            expr.kind,
            ExprKind::BinOp { kind: BinOpKind::Or, .. }
        ));
    }
}
