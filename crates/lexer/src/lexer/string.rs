use super::Lexer;
use crate::token::{Token, TokenKind};
use loks_util::error::{ErrorKind, LoksError};

impl<'a> Lexer<'a> {
    /// Scans a quoted string literal. `quote` is the delimiter character
    /// that opened it (`'` or `"`); the closing delimiter must match.
    /// Newlines inside the literal do not advance the reported line.
    pub(super) fn scan_string(&mut self, quote: char) {
        let start = self.cursor.position();
        let (start_line, start_col) = (self.cursor.line(), self.cursor.column());
        self.cursor.advance(false); // opening quote

        let mut value = String::new();
        loop {
            if self.cursor.is_at_end() {
                let span = self.span_from(start, start_line, start_col);
                self.errors.push(LoksError::new(
                    ErrorKind::SyntaxError("Unmatched Quote".into()),
                    span,
                ));
                return;
            }
            let c = self.cursor.current_char();
            if c == quote {
                self.cursor.advance(true);
                break;
            }
            value.push(c);
            self.cursor.advance(true);
        }

        let span = self.span_from(start, start_line, start_col);
        self.tokens.push(Token::new(TokenKind::String(value), span));
    }
}
