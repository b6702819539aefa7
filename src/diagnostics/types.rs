//! Diagnostic data model shared by every validation stage

use std::fmt;

use serde::Serialize;

use crate::parser::Location;

/// Classification tag of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticKind {
    SyntaxError,
    MissingField,
    InvalidValue,
    RunnerLabel,
    Expression,
    Action,
    Glob,
    Configuration,
    Structure,
    UnexpectedKey,
    InvalidCharacter,
    UnknownInput,
    UndefinedProperty,
    TypeMismatch,
}

impl DiagnosticKind {
    /// Stable tag used in reports and as the LSP diagnostic code
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SyntaxError => "syntax-error",
            Self::MissingField => "missing-field",
            Self::InvalidValue => "invalid-value",
            Self::RunnerLabel => "runner-label",
            Self::Expression => "expression",
            Self::Action => "action",
            Self::Glob => "glob",
            Self::Configuration => "configuration",
            Self::Structure => "structure",
            Self::UnexpectedKey => "unexpected-key",
            Self::InvalidCharacter => "invalid-character",
            Self::UnknownInput => "unknown-input",
            Self::UndefinedProperty => "undefined-property",
            Self::TypeMismatch => "type-mismatch",
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity of a diagnostic; `Error` orders above `Warning`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

/// One reported issue in a workflow document
///
/// `line` and `column` are 1-based. `types` and `paths` stay empty until
/// de-duplication folds another diagnostic into this one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    #[serde(rename = "type")]
    pub kind: DiagnosticKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub types: Vec<DiagnosticKind>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub paths: Vec<String>,
}

impl Diagnostic {
    fn new(kind: DiagnosticKind, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            line: None,
            column: None,
            path: None,
            severity,
            types: Vec::new(),
            paths: Vec::new(),
        }
    }

    pub fn error(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self::new(kind, Severity::Error, message)
    }

    pub fn warning(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self::new(kind, Severity::Warning, message)
    }

    /// Attach a source position
    pub fn at(mut self, location: &Location) -> Self {
        self.line = Some(location.line);
        self.column = Some(location.column);
        self
    }

    pub fn at_position(mut self, line: u32, column: u32) -> Self {
        self.line = Some(line);
        self.column = Some(column);
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Fold a diagnostic sharing this one's message and position into it
    pub(crate) fn absorb(&mut self, other: Diagnostic) {
        for kind in std::iter::once(other.kind).chain(other.types) {
            if kind != self.kind && !self.types.contains(&kind) {
                self.types.push(kind);
            }
        }

        for path in other.path.into_iter().chain(other.paths) {
            match &self.path {
                None => self.path = Some(path),
                Some(own) if *own == path => {}
                Some(_) => {
                    if !self.paths.contains(&path) {
                        self.paths.push(path);
                    }
                }
            }
        }

        self.severity = self.severity.max(other.severity);
    }
}

impl fmt::Display for Diagnostic {
    /// Renders `line:L, col:C message [path]`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "line:{}, col:{} {}",
            self.line.unwrap_or(1),
            self.column.unwrap_or(1),
            self.message
        )?;
        if let Some(path) = &self.path {
            write!(f, " [{}]", path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_tags_are_kebab_case() {
        assert_eq!(DiagnosticKind::SyntaxError.as_str(), "syntax-error");
        assert_eq!(DiagnosticKind::UnknownInput.to_string(), "unknown-input");
        assert_eq!(
            serde_json::to_value(DiagnosticKind::TypeMismatch).unwrap(),
            serde_json::json!("type-mismatch")
        );
    }

    #[test]
    fn test_error_outranks_warning() {
        assert!(Severity::Error > Severity::Warning);
        assert_eq!(Severity::Warning.max(Severity::Error), Severity::Error);
    }

    #[test]
    fn test_absorb_merges_kinds_paths_and_severity() {
        let mut first = Diagnostic::warning(DiagnosticKind::Expression, "same")
            .at_position(3, 5)
            .with_path("jobs.a.steps.0.run");
        let second = Diagnostic::error(DiagnosticKind::Structure, "same")
            .at_position(3, 5)
            .with_path("jobs.a.steps.0");

        first.absorb(second.clone());
        first.absorb(second);

        assert_eq!(first.severity, Severity::Error);
        assert_eq!(first.kind, DiagnosticKind::Expression);
        assert_eq!(first.types, vec![DiagnosticKind::Structure]);
        assert_eq!(first.paths, vec!["jobs.a.steps.0".to_string()]);
    }

    #[test]
    fn test_display_format() {
        let diagnostic = Diagnostic::error(DiagnosticKind::MissingField, "Missing 'name'")
            .at_position(1, 1)
            .with_path("name");
        assert_eq!(diagnostic.to_string(), "line:1, col:1 Missing 'name' [name]");

        let bare = Diagnostic::error(DiagnosticKind::SyntaxError, "broken");
        assert_eq!(bare.to_string(), "line:1, col:1 broken");
    }

    #[test]
    fn test_serialize_omits_empty_fields() {
        let diagnostic = Diagnostic::error(DiagnosticKind::SyntaxError, "broken");
        let json = serde_json::to_value(&diagnostic).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "syntax-error", "message": "broken", "severity": "error"})
        );
    }
}
