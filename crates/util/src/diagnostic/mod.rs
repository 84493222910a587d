//! Diagnostic reporting infrastructure.
//!
//! Every stage of the pipeline (scanner, parser, analyzer) reports failures
//! as a [`Diagnostic`] instead of aborting on the first error, so a single
//! run can surface more than one problem. The VM and tree-walking
//! interpreter, which have no notion of "keep going after an error", convert
//! a single [`crate::error::LoksError`] into a [`Diagnostic`] at the point
//! where the driver reports it.

mod builder;

pub use builder::DiagnosticBuilder;

use crate::error::LoksError;
use crate::span::{SourceMap, Span};
use std::cell::RefCell;
use std::fmt;

/// Diagnostic severity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    /// A failure that prevents a successful run.
    Error,
    /// A non-fatal observation (currently unused by the language itself,
    /// kept available for future lints).
    Warning,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Error => write!(f, "error"),
            Level::Warning => write!(f, "warning"),
        }
    }
}

/// A single reported diagnostic.
#[derive(Clone, Debug)]
pub struct Diagnostic {
    /// Severity.
    pub level: Level,
    /// Human-readable message, already including the error kind name.
    pub message: String,
    /// Location of the offending source.
    pub span: Span,
}

impl Diagnostic {
    /// Builds a diagnostic directly from a [`LoksError`].
    pub fn from_error(err: &LoksError) -> Self {
        Self {
            level: Level::Error,
            message: err.render_plain(),
            span: err.span,
        }
    }

    /// Renders this diagnostic, appending a caret-annotated source snippet
    /// when a `SourceMap` is available.
    pub fn render(&self, source_map: Option<&SourceMap>) -> String {
        match source_map.and_then(|map| {
            map.format_span(self.span.file_id, self.span.line, self.span.column)
        }) {
            Some(snippet) => format!("{}\n{snippet}", self.message),
            None => self.message.clone(),
        }
    }
}

/// Collects diagnostics produced over the course of a single pipeline run.
///
/// Unlike the VM (which must stop at the first runtime error), the scanner,
/// parser, and analyzer keep going after a recoverable error so that a
/// single invocation can report more than one problem.
#[derive(Default)]
pub struct Handler {
    diagnostics: RefCell<Vec<Diagnostic>>,
}

impl Handler {
    /// Creates an empty handler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a diagnostic.
    pub fn emit(&self, diagnostic: Diagnostic) {
        self.diagnostics.borrow_mut().push(diagnostic);
    }

    /// Records a [`LoksError`] as an error-level diagnostic.
    pub fn emit_error(&self, err: &LoksError) {
        self.emit(Diagnostic::from_error(err));
    }

    /// Returns `true` if at least one error-level diagnostic was recorded.
    pub fn has_errors(&self) -> bool {
        self.diagnostics.borrow().iter().any(|d| d.level == Level::Error)
    }

    /// Number of recorded diagnostics at error level.
    pub fn error_count(&self) -> usize {
        self.diagnostics
            .borrow()
            .iter()
            .filter(|d| d.level == Level::Error)
            .count()
    }

    /// Returns a snapshot of all diagnostics recorded so far.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.borrow().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn handler_starts_empty() {
        let handler = Handler::new();
        assert!(!handler.has_errors());
        assert_eq!(handler.error_count(), 0);
    }

    #[test]
    fn emitting_an_error_is_observable() {
        let handler = Handler::new();
        let err = LoksError::new(ErrorKind::SyntaxError("unexpected ';'".into()), Span::new(0, 1, 1, 1));
        handler.emit_error(&err);
        assert!(handler.has_errors());
        assert_eq!(handler.error_count(), 1);
    }

    #[test]
    fn render_without_source_map_is_plain_message() {
        let err = LoksError::new(ErrorKind::NameError("undefined 'x'".into()), Span::new(0, 1, 2, 3));
        let diag = Diagnostic::from_error(&err);
        assert_eq!(diag.render(None), diag.message);
    }
}
