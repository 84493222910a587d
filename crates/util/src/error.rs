use crate::span::Span;
use thiserror::Error;

/// The uniform error taxonomy shared by every pipeline stage.
///
/// Each variant carries the span of the offending source so a [`Diagnostic`]
/// can always be rendered with line/column information, in the uniform
/// `"{Kind}(line L): {msg} at character C"` message format.
///
/// [`Diagnostic`]: crate::diagnostic::Diagnostic
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ErrorKind {
    /// The scanner encountered a byte that cannot start any token.
    #[error("IllegalCharacter: {0}")]
    IllegalCharacter(String),

    /// The parser could not derive a production for the current token.
    #[error("SyntaxError: {0}")]
    SyntaxError(String),

    /// A name was referenced that has no binding in scope.
    #[error("NameError: {0}")]
    NameError(String),

    /// An operation was applied to a value of the wrong kind.
    #[error("TypeError: {0}")]
    TypeError(String),

    /// A value was syntactically well-kinded but semantically invalid.
    #[error("ValueError: {0}")]
    ValueError(String),

    /// Division or modulo by zero.
    #[error("ZeroDivisionError: {0}")]
    ZeroDivisionError(String),

    /// An array index was out of bounds.
    #[error("IndexError: {0}")]
    IndexError(String),

    /// The bytecode loader rejected a malformed binary image.
    #[error("InvalidBytecodeError: {0}")]
    InvalidBytecodeError(String),
}

/// An [`ErrorKind`] paired with the [`Span`] it occurred at.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("{kind}")]
pub struct LoksError {
    /// The category and message of the failure.
    pub kind: ErrorKind,
    /// Where in the source the failure occurred.
    pub span: Span,
}

impl LoksError {
    /// Builds a new located error.
    pub fn new(kind: ErrorKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Renders the error in a plain
    /// `"Kind(line L): message at character C"` shape, without needing a
    /// `SourceMap` for a caret snippet.
    pub fn render_plain(&self) -> String {
        let (name, msg) = self.kind_name_and_message();
        format!(
            "{name}(line {}): {msg} at character {}",
            self.span.line, self.span.column
        )
    }

    fn kind_name_and_message(&self) -> (&'static str, String) {
        match &self.kind {
            ErrorKind::IllegalCharacter(m) => ("IllegalCharacter", m.clone()),
            ErrorKind::SyntaxError(m) => ("SyntaxError", m.clone()),
            ErrorKind::NameError(m) => ("NameError", m.clone()),
            ErrorKind::TypeError(m) => ("TypeError", m.clone()),
            ErrorKind::ValueError(m) => ("ValueError", m.clone()),
            ErrorKind::ZeroDivisionError(m) => ("ZeroDivisionError", m.clone()),
            ErrorKind::IndexError(m) => ("IndexError", m.clone()),
            ErrorKind::InvalidBytecodeError(m) => ("InvalidBytecodeError", m.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_plain_matches_expected_shape() {
        let err = LoksError::new(
            ErrorKind::NameError("undefined variable 'x'".into()),
            Span::new(10, 11, 3, 5),
        );
        assert_eq!(
            err.render_plain(),
            "NameError(line 3): undefined variable 'x' at character 5"
        );
    }
}
