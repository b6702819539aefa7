//! scan-workflow-lsp: validation of GitHub Actions workflows that embed the
//! Black Duck security scan action
//!
//! This library provides:
//! - YAML parsing and best-effort source locations for document paths
//! - JSON-schema validation translated into actionable diagnostics
//! - Heuristic checks for script injection through untrusted event data
//! - Workflow filename validation and correction
//! - A session expiry manager
//! - Plain-text and JSON reports, and an LSP backend
//!
//! # Example
//!
//! ```
//! use scan_workflow_lsp::diagnostics::{get_yaml_errors, DiagnosticKind};
//!
//! let text = "name: Scan\njobs: {}\n";
//! let diagnostics = get_yaml_errors(text);
//! assert!(diagnostics.iter().any(|d| d.kind == DiagnosticKind::MissingField));
//! ```

pub mod cli;
pub mod diagnostics;
pub mod document;
pub mod filename;
pub mod parser;
pub mod report;
pub mod schema;
pub mod session;

mod backend;

pub use backend::Backend;
