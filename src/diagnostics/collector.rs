//! Diagnostic accumulation across validation stages

use super::dedupe::dedupe;
use super::types::{Diagnostic, DiagnosticKind};

/// Collects diagnostics during parsing and validation
#[derive(Debug, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollector {
    /// Create a new empty collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a YAML syntax error, positioned when the parser reported a mark
    pub fn add_syntax_error(&mut self, message: String, position: Option<(u32, u32)>) {
        let diagnostic = Diagnostic::error(DiagnosticKind::SyntaxError, message);
        self.diagnostics.push(match position {
            Some((line, column)) => diagnostic.at_position(line, column),
            None => diagnostic,
        });
    }

    /// Add a structural error that stops further validation
    pub fn add_structure_error(&mut self, message: String, line: u32, column: u32) {
        self.diagnostics.push(
            Diagnostic::error(DiagnosticKind::Structure, message).at_position(line, column),
        );
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Convert into the final de-duplicated, line-sorted list
    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        dedupe(self.diagnostics)
    }
}

impl Extend<Diagnostic> for DiagnosticCollector {
    fn extend<T: IntoIterator<Item = Diagnostic>>(&mut self, iter: T) {
        self.diagnostics.extend(iter);
    }
}
