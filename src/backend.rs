//! LSP Backend implementation

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer};

use crate::diagnostics::{Diagnostic as WorkflowDiagnostic, Severity};
use crate::document::Document;
use crate::filename::FilenameValidationError;

const SOURCE: &str = "scan-workflow-lsp";

/// The LSP backend that handles all language server requests
pub struct Backend {
    /// The LSP client for sending notifications
    client: Client,
    /// Map of document URIs to their state
    documents: Arc<RwLock<HashMap<Url, Document>>>,
}

impl Backend {
    /// Create a new backend instance
    pub fn new(client: Client) -> Self {
        Self {
            client,
            documents: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Validate a document, store it and publish its diagnostics
    async fn update_document(&self, uri: Url, text: String, version: i32) {
        let document = Document::new(&uri, text, version);
        let diagnostics = to_lsp_diagnostics(&document);

        tracing::debug!(
            uri = %uri,
            version,
            count = diagnostics.len(),
            "Publishing diagnostics"
        );

        {
            let mut docs = self.documents.write().await;
            docs.insert(uri.clone(), document);
        }

        self.client
            .publish_diagnostics(uri, diagnostics, Some(version))
            .await;
    }
}

/// All LSP diagnostics for a document, filename issues last
pub(crate) fn to_lsp_diagnostics(document: &Document) -> Vec<Diagnostic> {
    document
        .diagnostics
        .iter()
        .map(|diagnostic| to_lsp_diagnostic(diagnostic, &document.text))
        .chain(document.filename_errors.iter().map(filename_diagnostic))
        .collect()
}

/// Convert a 1-based workflow diagnostic into a 0-based LSP diagnostic
///
/// The range runs from the reported column to the end of its line.
pub(crate) fn to_lsp_diagnostic(diagnostic: &WorkflowDiagnostic, text: &str) -> Diagnostic {
    let line = diagnostic.line.unwrap_or(1).saturating_sub(1);
    let character = diagnostic.column.unwrap_or(1).saturating_sub(1);
    let line_end = text
        .lines()
        .nth(line as usize)
        .map_or(character, |content| {
            u32::try_from(content.encode_utf16().count()).unwrap_or(u32::MAX)
        })
        .max(character);

    Diagnostic {
        range: Range {
            start: Position { line, character },
            end: Position {
                line,
                character: line_end,
            },
        },
        severity: Some(match diagnostic.severity {
            Severity::Error => DiagnosticSeverity::ERROR,
            Severity::Warning => DiagnosticSeverity::WARNING,
        }),
        code: Some(NumberOrString::String(diagnostic.kind.to_string())),
        code_description: None,
        source: Some(SOURCE.to_string()),
        message: diagnostic.message.clone(),
        related_information: None,
        tags: None,
        data: None,
    }
}

fn filename_diagnostic(error: &FilenameValidationError) -> Diagnostic {
    let origin = Position {
        line: 0,
        character: 0,
    };

    Diagnostic {
        range: Range {
            start: origin,
            end: origin,
        },
        severity: Some(DiagnosticSeverity::WARNING),
        code: Some(NumberOrString::String("filename".to_string())),
        code_description: None,
        source: Some(SOURCE.to_string()),
        message: error.message.clone(),
        related_information: None,
        tags: None,
        data: None,
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, _: InitializeParams) -> Result<InitializeResult> {
        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::FULL,
                )),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: SOURCE.to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        tracing::info!("Server initialized");
    }

    async fn shutdown(&self) -> Result<()> {
        tracing::info!("Server shutting down");
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let document = params.text_document;
        tracing::debug!("Document opened: {}", document.uri);

        self.update_document(document.uri, document.text, document.version)
            .await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        let version = params.text_document.version;

        // FULL sync: the last change carries the whole text
        if let Some(change) = params.content_changes.into_iter().last() {
            tracing::debug!("Document changed: {}", uri);
            self.update_document(uri, change.text, version).await;
        }
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        tracing::debug!("Document saved: {}", params.text_document.uri);
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        tracing::debug!("Document closed: {}", uri);

        {
            let mut docs = self.documents.write().await;
            docs.remove(&uri);
        }

        self.client.publish_diagnostics(uri, vec![], None).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::DiagnosticKind;

    #[test]
    fn test_positions_become_zero_based() {
        let text = "name: Scan\non: push\n";
        let diagnostic = WorkflowDiagnostic::error(DiagnosticKind::MissingField, "Missing 'jobs'")
            .at_position(2, 1);

        let lsp = to_lsp_diagnostic(&diagnostic, text);
        assert_eq!(lsp.range.start, Position::new(1, 0));
        assert_eq!(lsp.range.end, Position::new(1, 8));
        assert_eq!(lsp.severity, Some(DiagnosticSeverity::ERROR));
        assert_eq!(lsp.code, Some(NumberOrString::String("missing-field".to_string())));
        assert_eq!(lsp.source.as_deref(), Some("scan-workflow-lsp"));
    }

    #[test]
    fn test_unpositioned_diagnostic_starts_at_origin() {
        let diagnostic = WorkflowDiagnostic::warning(DiagnosticKind::Expression, "x");
        let lsp = to_lsp_diagnostic(&diagnostic, "");
        assert_eq!(lsp.range.start, Position::new(0, 0));
        assert_eq!(lsp.range.end, Position::new(0, 0));
        assert_eq!(lsp.severity, Some(DiagnosticSeverity::WARNING));
    }

    #[test]
    fn test_filename_issues_are_appended() {
        let uri = Url::parse("file:///repo/.github/workflows/con.yml").unwrap();
        let document = Document::new(&uri, "- item\n".to_string(), 1);

        let diagnostics = to_lsp_diagnostics(&document);
        assert_eq!(diagnostics.len(), 2);

        let last = &diagnostics[1];
        assert_eq!(last.range.start, Position::new(0, 0));
        assert_eq!(last.severity, Some(DiagnosticSeverity::WARNING));
        assert_eq!(last.code, Some(NumberOrString::String("filename".to_string())));
    }
}
