use super::Lexer;

impl<'a> Lexer<'a> {
    /// Skips a line or block comment starting at the cursor, returning
    /// `true` if one was consumed. An unterminated block comment runs to
    /// end of input without being diagnosed as an error.
    pub(super) fn skip_comment(&mut self) -> bool {
        if self.cursor.current_char() != '/' {
            return false;
        }
        match self.cursor.char_at(1) {
            '/' => {
                while !self.cursor.is_at_end() && self.cursor.current_char() != '\n' {
                    self.cursor.advance(false);
                }
                true
            }
            '*' => {
                self.cursor.advance(false);
                self.cursor.advance(false);
                while !self.cursor.is_at_end()
                    && !(self.cursor.current_char() == '*' && self.cursor.char_at(1) == '/')
                {
                    self.cursor.advance(false);
                }
                if !self.cursor.is_at_end() {
                    self.cursor.advance(false);
                    self.cursor.advance(false);
                }
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::Lexer;
    use crate::token::TokenKind;
    use loks_util::span::FileId;

    #[test]
    fn line_comment_is_skipped() {
        let (tokens, _) = Lexer::new("// hello\nvar", FileId::DUMMY).tokenize();
        assert_eq!(tokens[0].kind, TokenKind::Var);
    }

    #[test]
    fn block_comment_is_skipped() {
        let (tokens, _) = Lexer::new("/* hi\nthere */var", FileId::DUMMY).tokenize();
        assert_eq!(tokens[0].kind, TokenKind::Var);
    }

    #[test]
    fn unterminated_block_comment_runs_to_eof_without_error() {
        let (tokens, errors) = Lexer::new("/* never closed", FileId::DUMMY).tokenize();
        assert_eq!(tokens.len(), 1);
        assert!(errors.is_empty());
    }
}
