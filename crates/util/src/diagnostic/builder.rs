//! Fluent construction of [`Diagnostic`]s for call sites that want more
//! control than [`crate::error::LoksError::render_plain`] gives them.

use super::{Diagnostic, Handler, Level};
use crate::span::Span;

/// Fluent builder for a [`Diagnostic`].
///
/// ```
/// use loks_util::diagnostic::DiagnosticBuilder;
/// use loks_util::span::Span;
///
/// let diag = DiagnosticBuilder::error("unexpected token ';'")
///     .span(Span::new(4, 5, 1, 5))
///     .build();
/// assert_eq!(diag.message, "unexpected token ';'");
/// ```
pub struct DiagnosticBuilder {
    level: Level,
    message: String,
    span: Span,
}

impl DiagnosticBuilder {
    /// Starts building an error-level diagnostic.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: Level::Error,
            message: message.into(),
            span: Span::DUMMY,
        }
    }

    /// Starts building a warning-level diagnostic.
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: Level::Warning,
            message: message.into(),
            span: Span::DUMMY,
        }
    }

    /// Attaches a source span.
    pub fn span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Finishes the diagnostic.
    pub fn build(self) -> Diagnostic {
        Diagnostic {
            level: self.level,
            message: self.message,
            span: self.span,
        }
    }

    /// Finishes the diagnostic and hands it to a [`Handler`].
    pub fn emit(self, handler: &Handler) {
        handler.emit(self.build());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_produces_expected_diagnostic() {
        let diag = DiagnosticBuilder::error("bad token")
            .span(Span::new(0, 1, 1, 1))
            .build();
        assert_eq!(diag.level, Level::Error);
        assert_eq!(diag.message, "bad token");
    }

    #[test]
    fn emit_reaches_the_handler() {
        let handler = Handler::new();
        DiagnosticBuilder::warning("unreachable code").emit(&handler);
        assert_eq!(handler.diagnostics().len(), 1);
    }
}
