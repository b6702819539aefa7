//! Workflow validation pipeline
//!
//! Runs parsing, location indexing, schema validation, error translation and
//! the heuristic checks, then de-duplicates and orders the result.

use serde_json::Value;

use super::collector::DiagnosticCollector;
use super::security::check_additional;
use super::translate::translate;
use super::types::{Diagnostic, DiagnosticKind};
use crate::parser::{build_location_map, parse_yaml};
use crate::schema::validate;

/// Validate workflow text and return the final diagnostic list
pub fn get_yaml_errors(text: &str) -> Vec<Diagnostic> {
    let mut collector = DiagnosticCollector::new();
    validate_workflow(text, &mut collector);
    collector.into_diagnostics()
}

/// Run every validation stage over `text`, collecting into `collector`
///
/// Syntax errors and non-object documents stop the pipeline early. A failure
/// of the heuristic checks is reported as a warning without discarding the
/// schema diagnostics already collected.
pub fn validate_workflow(text: &str, collector: &mut DiagnosticCollector) {
    let Some(document) = parse_yaml(text, collector) else {
        return;
    };

    if !document.is_object() {
        tracing::debug!(root = root_kind(&document), "Workflow root is not a mapping");
        collector.add_structure_error("Workflow document must be a valid object".to_string(), 1, 1);
        return;
    }

    let index = build_location_map(text, &document);
    tracing::trace!(locations = index.len(), "Built location index");

    let raw_errors = validate(&document);
    tracing::debug!(count = raw_errors.len(), "Schema validation finished");
    collector.extend(
        raw_errors
            .iter()
            .filter_map(|error| translate(error, &index, &document)),
    );

    match check_additional(&document, &index) {
        Ok(findings) => collector.extend(findings),
        Err(err) => {
            tracing::warn!("Heuristic checks incomplete: {}", err);
            let message = format!("Additional workflow checks could not complete: {}", err);
            collector.extend(err.into_findings());
            collector.push(Diagnostic::warning(DiagnosticKind::Structure, message).at_position(1, 1));
        }
    }
}

fn root_kind(document: &Value) -> &'static str {
    match document {
        Value::Null => "empty",
        Value::Array(_) => "sequence",
        Value::Object(_) => "mapping",
        _ => "scalar",
    }
}
