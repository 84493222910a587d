use super::Lexer;
use crate::token::{Token, TokenKind};

impl<'a> Lexer<'a> {
    /// Attempts to scan punctuation or an operator at the cursor: first a
    /// two-character operator (`<= >= == !=`), then a single-character one.
    /// Returns `None` if the current character is none of these, leaving
    /// the cursor untouched.
    pub(super) fn scan_operator(&mut self) -> Option<Token> {
        let start = self.cursor.position();
        let (start_line, start_col) = (self.cursor.line(), self.cursor.column());
        let c = self.cursor.current_char();
        let next = self.cursor.char_at(1);

        let two_char = match (c, next) {
            ('<', '=') => Some(TokenKind::LessEqual),
            ('>', '=') => Some(TokenKind::GreaterEqual),
            ('=', '=') => Some(TokenKind::EqualEqual),
            ('!', '=') => Some(TokenKind::BangEqual),
            _ => None,
        };
        if let Some(kind) = two_char {
            self.cursor.advance(false);
            self.cursor.advance(false);
            let span = self.span_from(start, start_line, start_col);
            return Some(Token::new(kind, span));
        }

        let single = match c {
            '(' => Some(TokenKind::LParen),
            ')' => Some(TokenKind::RParen),
            '[' => Some(TokenKind::LBracket),
            ']' => Some(TokenKind::RBracket),
            '{' => Some(TokenKind::LBrace),
            '}' => Some(TokenKind::RBrace),
            ';' => Some(TokenKind::Semicolon),
            ',' => Some(TokenKind::Comma),
            '<' => Some(TokenKind::Less),
            '>' => Some(TokenKind::Greater),
            '!' => Some(TokenKind::Bang),
            '+' => Some(TokenKind::Plus),
            '-' => Some(TokenKind::Minus),
            '*' => Some(TokenKind::Star),
            '/' => Some(TokenKind::Slash),
            '%' => Some(TokenKind::Percent),
            '=' => Some(TokenKind::Equal),
            _ => None,
        };

        single.map(|kind| {
            self.cursor.advance(false);
            let span = self.span_from(start, start_line, start_col);
            Token::new(kind, span)
        })
    }
}
