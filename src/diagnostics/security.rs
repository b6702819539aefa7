//! Heuristic checks the schema cannot express
//!
//! Flags step values that interpolate attacker-controlled event data and
//! expressions that are never closed.

use serde_json::Value;
use thiserror::Error;

use super::types::{Diagnostic, DiagnosticKind};
use crate::parser::{join_path, scan_expressions, LocationIndex};

/// Nesting limit for the recursive step walk
const MAX_DEPTH: usize = 32;

/// Context values an external user can set freely
const UNTRUSTED_CONTEXTS: &[&str] = &[
    "github.event.issue.title",
    "github.event.issue.body",
    "github.event.pull_request.title",
    "github.event.pull_request.body",
    "github.event.pull_request.head.ref",
    "github.event.pull_request.head.label",
    "github.event.pull_request.head.repo.default_branch",
    "github.event.comment.body",
    "github.event.review.body",
    "github.event.review_comment.body",
    "github.event.head_commit.message",
    "github.event.head_commit.author.email",
    "github.event.head_commit.author.name",
    "github.head_ref",
];

/// The checks stopped short of part of the document
///
/// Carries every finding from the parts that were checked.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CheckError {
    #[error("step values nested too deeply at '{path}'")]
    DepthExceeded {
        path: String,
        findings: Vec<Diagnostic>,
    },
}

impl CheckError {
    /// Findings collected outside the skipped values
    pub fn into_findings(self) -> Vec<Diagnostic> {
        match self {
            CheckError::DepthExceeded { findings, .. } => findings,
        }
    }
}

/// Run the heuristic checks over every step of every job
pub fn check_additional(
    document: &Value,
    index: &LocationIndex,
) -> Result<Vec<Diagnostic>, CheckError> {
    let mut walk = Walk {
        index,
        diagnostics: Vec::new(),
        too_deep: None,
    };

    let Some(jobs) = document.get("jobs").and_then(Value::as_object) else {
        return Ok(walk.diagnostics);
    };

    for (job_name, job) in jobs {
        let Some(steps) = job.get("steps").and_then(Value::as_array) else {
            continue;
        };
        let steps_path = join_path(&join_path("jobs", job_name), "steps");

        for (i, step) in steps.iter().enumerate() {
            let Some(fields) = step.as_object() else {
                continue;
            };
            let step_path = join_path(&steps_path, &i.to_string());

            for (key, value) in fields {
                // Moving values into `env` is the remedy, so it is not inspected
                if key == "env" {
                    continue;
                }
                walk.visit(value, &join_path(&step_path, key), 0);
            }
        }
    }

    match walk.too_deep {
        Some(path) => Err(CheckError::DepthExceeded {
            path,
            findings: walk.diagnostics,
        }),
        None => Ok(walk.diagnostics),
    }
}

struct Walk<'a> {
    index: &'a LocationIndex,
    diagnostics: Vec<Diagnostic>,
    /// First value skipped for exceeding the nesting limit
    too_deep: Option<String>,
}

impl Walk<'_> {
    fn visit(&mut self, value: &Value, path: &str, depth: usize) {
        if depth > MAX_DEPTH {
            tracing::debug!(path, "Skipping deeply nested step value");
            self.too_deep.get_or_insert_with(|| path.to_string());
            return;
        }

        match value {
            Value::String(text) => check_string(text, path, self.index, &mut self.diagnostics),
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    self.visit(item, &join_path(path, &i.to_string()), depth + 1);
                }
            }
            Value::Object(fields) => {
                for (key, item) in fields {
                    self.visit(item, &join_path(path, key), depth + 1);
                }
            }
            Value::Null | Value::Bool(_) | Value::Number(_) => {}
        }
    }
}

fn check_string(text: &str, path: &str, index: &LocationIndex, diagnostics: &mut Vec<Diagnostic>) {
    for context in UNTRUSTED_CONTEXTS
        .iter()
        .filter(|context| text.contains(**context))
    {
        diagnostics.push(
            Diagnostic::warning(
                DiagnosticKind::Expression,
                format!(
                    "Potential script injection: '${{{{ {} }}}}' is controlled by whoever \
                     triggers the workflow. Pass it through an environment variable instead, \
                     for example env: {{ VALUE: ${{{{ {} }}}} }} and reference \"$VALUE\"",
                    context, context
                ),
            )
            .at(&index.resolve(path))
            .with_path(path),
        );
    }

    for expression in scan_expressions(text).iter().filter(|e| !e.terminated) {
        diagnostics.push(
            Diagnostic::warning(
                DiagnosticKind::Expression,
                format!(
                    "Unterminated expression starting at '{}': close it with '}}}}'",
                    truncate(&text[expression.start..], 40)
                ),
            )
            .at(&index.resolve(path))
            .with_path(path),
        );
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}
