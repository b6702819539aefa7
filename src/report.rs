//! Plain-text and JSON rendering of validation results

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::diagnostics::{get_yaml_errors, Diagnostic};
use crate::filename::{validate_workflow_filename, FilenameValidationError};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Render diagnostics as `line:L, col:C message [path]`, blank-line separated
pub fn format_text(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(Diagnostic::to_string)
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Pretty-print diagnostics or file reports as JSON
pub fn format_json<T: Serialize + ?Sized>(value: &T) -> Result<String, ReportError> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Validation result for one workflow file
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub path: String,
    pub filename_errors: Vec<FilenameValidationError>,
    pub diagnostics: Vec<Diagnostic>,
}

impl FileReport {
    /// Validate `text` as if it were stored at `path`
    pub fn new(path: &Path, text: &str) -> Self {
        let filename_errors = path
            .file_name()
            .map(|name| validate_workflow_filename(&name.to_string_lossy()))
            .unwrap_or_default();

        Self {
            path: path.display().to_string(),
            filename_errors,
            diagnostics: get_yaml_errors(text),
        }
    }

    /// Whether any workflow diagnostic has error severity
    ///
    /// Filename problems are advisory and never fail a report.
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn render_text(&self) -> String {
        let errors = self.diagnostics.iter().filter(|d| d.is_error()).count();
        let warnings = self.diagnostics.len() - errors;

        let mut out = format!(
            "{}: {} error{}, {} warning{}",
            self.path,
            errors,
            if errors == 1 { "" } else { "s" },
            warnings,
            if warnings == 1 { "" } else { "s" }
        );
        for error in &self.filename_errors {
            out.push_str(&format!("\nfilename: {}", error.message));
        }
        if !self.diagnostics.is_empty() {
            out.push_str("\n\n");
            out.push_str(&format_text(&self.diagnostics));
        }
        out
    }
}

/// Read and validate a workflow file
pub fn check_file(path: &Path) -> Result<FileReport, ReportError> {
    let text = fs::read_to_string(path).map_err(|source| ReportError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), bytes = text.len(), "Checking workflow file");
    Ok(FileReport::new(path, &text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::DiagnosticKind;
    use assert_matches::assert_matches;
    use std::io::Write;

    #[test]
    fn test_format_text_separates_with_blank_line() {
        let diagnostics = vec![
            Diagnostic::error(DiagnosticKind::MissingField, "Missing 'on'")
                .at_position(1, 1)
                .with_path("on"),
            Diagnostic::warning(DiagnosticKind::Expression, "Unsafe value").at_position(9, 14),
        ];
        assert_eq!(
            format_text(&diagnostics),
            "line:1, col:1 Missing 'on' [on]\n\nline:9, col:14 Unsafe value"
        );
        assert_eq!(format_text(&[]), "");
    }

    #[test]
    fn test_format_json_uses_kind_tags() {
        let diagnostics = vec![Diagnostic::error(DiagnosticKind::RunnerLabel, "x").at_position(2, 3)];
        let json: serde_json::Value = serde_json::from_str(&format_json(&diagnostics).unwrap()).unwrap();
        assert_eq!(json[0]["type"], "runner-label");
        assert_eq!(json[0]["severity"], "error");
        assert_eq!(json[0]["line"], 2);
    }

    #[test]
    fn test_check_file_reports_filename_and_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("con.yml");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "name: Scan").unwrap();

        let report = check_file(&path).unwrap();
        assert_eq!(report.filename_errors.len(), 1);
        assert!(report.has_errors());

        let text = report.render_text();
        assert!(text.contains("filename: 'con' is a reserved system name"));
        assert!(text.contains("Missing required 'on' field"));

        let json: serde_json::Value = serde_json::from_str(&format_json(&report).unwrap()).unwrap();
        assert_eq!(json["filename_errors"][0]["type"], "reserved");
    }

    #[test]
    fn test_check_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert_matches!(
            check_file(&dir.path().join("absent.yml")),
            Err(ReportError::Read { .. })
        );
    }
}
