//! The scanner, split by token family the way a hand-written recursive
//! descent lexer naturally organizes: whitespace/comment skipping, then one
//! module per token family.

mod comment;
mod core;
mod identifier;
mod number;
mod operator;
mod string;

use crate::cursor::Cursor;
use crate::token::Token;
use loks_util::error::LoksError;
use loks_util::span::FileId;

/// Scans a source string into a token stream.
///
/// The scanner never aborts on the first bad character; it records an
/// error and keeps going, always appending exactly one EOF token at the
/// end.
pub struct Lexer<'a> {
    cursor: Cursor<'a>,
    file_id: FileId,
    tokens: Vec<Token>,
    errors: Vec<LoksError>,
}

impl<'a> Lexer<'a> {
    /// Builds a scanner over `source`, tagging every emitted span with
    /// `file_id`.
    pub fn new(source: &'a str, file_id: FileId) -> Self {
        Self {
            cursor: Cursor::new(source),
            file_id,
            tokens: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Runs the scanner to completion, returning the token stream and any
    /// errors collected along the way.
    pub fn tokenize(mut self) -> (Vec<Token>, Vec<LoksError>) {
        self.run();
        (self.tokens, self.errors)
    }
}
