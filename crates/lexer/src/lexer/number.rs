use super::Lexer;
use crate::token::{Literal, Token, TokenKind};
use loks_util::error::{ErrorKind, LoksError};

impl<'a> Lexer<'a> {
    /// Scans a numeric literal: a greedy run over `[0-9.]`. Zero dots is an
    /// integer, one dot a double, two or more a syntax error.
    pub(super) fn scan_number(&mut self) {
        let start = self.cursor.position();
        let (start_line, start_col) = (self.cursor.line(), self.cursor.column());
        let mut dot_count = 0usize;

        while !self.cursor.is_at_end() {
            let c = self.cursor.current_char();
            if c.is_ascii_digit() {
                self.cursor.advance(false);
            } else if c == '.' {
                dot_count += 1;
                self.cursor.advance(false);
            } else {
                break;
            }
        }

        let lexeme = self.cursor.slice_from(start);
        let span = self.span_from(start, start_line, start_col);

        match dot_count {
            0 => {
                let value: i64 = lexeme.parse().unwrap_or(0);
                self.tokens
                    .push(Token::new(TokenKind::Number(Literal::Integer(value)), span));
            }
            1 => {
                let value: f64 = lexeme.parse().unwrap_or(0.0);
                self.tokens
                    .push(Token::new(TokenKind::Number(Literal::Double(value)), span));
            }
            _ => {
                self.errors.push(LoksError::new(
                    ErrorKind::SyntaxError("Number contains more than 1 decimal point".into()),
                    span,
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::Lexer;
    use crate::token::{Literal, TokenKind};
    use loks_util::span::FileId;

    #[test]
    fn scans_integer() {
        let (tokens, _) = Lexer::new("42", FileId::DUMMY).tokenize();
        assert_eq!(tokens[0].kind, TokenKind::Number(Literal::Integer(42)));
    }

    #[test]
    fn scans_double() {
        let (tokens, _) = Lexer::new("3.14", FileId::DUMMY).tokenize();
        assert_eq!(tokens[0].kind, TokenKind::Number(Literal::Double(3.14)));
    }

    #[test]
    fn two_dots_is_a_syntax_error() {
        let (_, errors) = Lexer::new("1.2.3", FileId::DUMMY).tokenize();
        assert_eq!(errors.len(), 1);
    }
}
