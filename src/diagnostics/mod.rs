//! Diagnostic model and the workflow validation pipeline

mod collector;
mod dedupe;
mod security;
mod translate;
mod types;
mod workflow_validator;

pub use collector::DiagnosticCollector;
pub use dedupe::dedupe;
pub use security::{check_additional, CheckError};
pub use translate::translate;
pub use types::{Diagnostic, DiagnosticKind, Severity};
pub use workflow_validator::{get_yaml_errors, validate_workflow};
