//! Document state management

use tower_lsp::lsp_types::Url;

use crate::diagnostics::{get_yaml_errors, Diagnostic};
use crate::filename::{validate_workflow_filename, FilenameValidationError};

/// An open workflow document and its latest validation results
#[derive(Debug, Clone)]
pub struct Document {
    pub text: String,
    pub version: i32,
    pub diagnostics: Vec<Diagnostic>,
    pub filename_errors: Vec<FilenameValidationError>,
}

impl Document {
    /// Validate `text` and the file name taken from `uri`
    pub fn new(uri: &Url, text: String, version: i32) -> Self {
        let diagnostics = get_yaml_errors(&text);
        let filename_errors = file_name(uri)
            .map(|name| validate_workflow_filename(&name))
            .unwrap_or_default();

        Self {
            text,
            version,
            diagnostics,
            filename_errors,
        }
    }
}

/// Last path segment of a URI, percent-decoded when possible
fn file_name(uri: &Url) -> Option<String> {
    match uri.to_file_path() {
        Ok(path) => path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned()),
        Err(()) => uri
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|segment| !segment.is_empty())
            .map(str::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filename::FilenameErrorKind;

    #[test]
    fn test_file_name_from_uri() {
        let uri = Url::parse("file:///tmp/my%20scan.yml").unwrap();
        assert_eq!(file_name(&uri), Some("my scan.yml".to_string()));
        let uri = Url::parse("untitled:Untitled-1").unwrap();
        assert_eq!(file_name(&uri), None);
        let uri = Url::parse("https://example.com/repo/.github/workflows/ci.yaml").unwrap();
        assert_eq!(file_name(&uri), Some("ci.yaml".to_string()));
        let uri = Url::parse("https://example.com/").unwrap();
        assert_eq!(file_name(&uri), None);
    }

    #[test]
    fn test_new_validates_name_and_text() {
        let uri = Url::parse("https://example.com/workflows/scan.txt").unwrap();
        let document = Document::new(&uri, "- not a mapping\n".to_string(), 3);

        assert_eq!(document.version, 3);
        assert_eq!(document.diagnostics.len(), 1);
        assert_eq!(document.filename_errors[0].kind, FilenameErrorKind::Extension);
    }
}
