use super::Lexer;
use crate::token::{Token, TokenKind};

impl<'a> Lexer<'a> {
    /// Scans `[A-Za-z_][A-Za-z0-9_]*`, producing a keyword token when the
    /// lexeme matches the reserved word table, otherwise an identifier.
    pub(super) fn scan_identifier(&mut self) {
        let start = self.cursor.position();
        let (start_line, start_col) = (self.cursor.line(), self.cursor.column());

        while !self.cursor.is_at_end() {
            let c = self.cursor.current_char();
            if c.is_ascii_alphanumeric() || c == '_' {
                self.cursor.advance(false);
            } else {
                break;
            }
        }

        let lexeme = self.cursor.slice_from(start);
        let span = self.span_from(start, start_line, start_col);
        let kind = TokenKind::keyword(lexeme)
            .unwrap_or_else(|| TokenKind::Identifier(loks_util::symbol::intern(lexeme)));
        self.tokens.push(Token::new(kind, span));
    }
}

#[cfg(test)]
mod tests {
    use super::super::Lexer;
    use crate::token::TokenKind;
    use loks_util::span::FileId;

    #[test]
    fn scans_plain_identifier() {
        let (tokens, _) = Lexer::new("counter", FileId::DUMMY).tokenize();
        assert!(matches!(tokens[0].kind, TokenKind::Identifier(_)));
    }

    #[test]
    fn scans_keyword_as_its_own_kind() {
        let (tokens, _) = Lexer::new("while", FileId::DUMMY).tokenize();
        assert_eq!(tokens[0].kind, TokenKind::While);
    }

    #[test]
    fn identifier_may_contain_digits_and_underscore() {
        let (tokens, _) = Lexer::new("x_1", FileId::DUMMY).tokenize();
        assert!(matches!(tokens[0].kind, TokenKind::Identifier(_)));
    }
}
