use super::Lexer;
use crate::token::{Token, TokenKind};
use loks_util::span::Span;

impl<'a> Lexer<'a> {
    /// The main scan loop: skip whitespace/comments, then dispatch to the
    /// token family matching the current character, in priority order.
    pub(super) fn run(&mut self) {
        loop {
            self.skip_whitespace();
            if self.skip_comment() {
                continue;
            }
            if self.cursor.is_at_end() {
                break;
            }

            let c = self.cursor.current_char();
            if c == '\'' || c == '"' {
                self.scan_string(c);
            } else if let Some(token) = self.scan_operator() {
                self.tokens.push(token);
            } else if c.is_ascii_digit() {
                self.scan_number();
            } else if c.is_ascii_alphabetic() || c == '_' {
                self.scan_identifier();
            } else {
                self.illegal_character(c);
            }
        }

        let eof_span = self.point_span();
        self.tokens.push(Token::new(TokenKind::Eof, eof_span));
    }

    fn skip_whitespace(&mut self) {
        while !self.cursor.is_at_end() {
            let c = self.cursor.current_char();
            if c == ' ' || c == '\t' || c == '\r' || c == '\n' {
                self.cursor.advance(false);
            } else {
                break;
            }
        }
    }

    fn illegal_character(&mut self, c: char) {
        use loks_util::error::{ErrorKind, LoksError};
        let span = self.point_span();
        self.errors.push(LoksError::new(
            ErrorKind::IllegalCharacter(format!("unexpected character '{c}'")),
            span,
        ));
        self.cursor.advance(false);
    }

    /// A zero-length span at the cursor's current position, used for EOF
    /// and single-character error tokens.
    pub(super) fn point_span(&self) -> Span {
        let pos = self.cursor.position();
        Span::with_file(pos, pos, self.file_id, self.cursor.line(), self.cursor.column())
    }

    /// A span covering `[start, cursor)`, with the start line/column
    /// supplied by the caller (captured before scanning the lexeme).
    pub(super) fn span_from(&self, start: usize, start_line: u32, start_col: u32) -> Span {
        Span::with_file(start, self.cursor.position(), self.file_id, start_line, start_col)
    }
}

#[cfg(test)]
mod tests {
    use super::super::Lexer;
    use crate::token::TokenKind;
    use loks_util::span::FileId;

    #[test]
    fn always_terminates_with_exactly_one_eof() {
        let (tokens, _) = Lexer::new("var x = 1;", FileId::DUMMY).tokenize();
        assert_eq!(tokens.last().unwrap().kind, TokenKind::Eof);
        assert_eq!(tokens.iter().filter(|t| t.kind == TokenKind::Eof).count(), 1);
    }

    #[test]
    fn empty_source_yields_only_eof() {
        let (tokens, errors) = Lexer::new("", FileId::DUMMY).tokenize();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Eof);
        assert!(errors.is_empty());
    }

    #[test]
    fn whitespace_is_skipped() {
        let (tokens, _) = Lexer::new("   \t\n  ", FileId::DUMMY).tokenize();
        assert_eq!(tokens.len(), 1);
    }
}
