//! Diagnostic de-duplication and ranking

use std::collections::HashMap;

use super::types::Diagnostic;

/// Merge diagnostics sharing `(message, line, column)` and sort by line.
///
/// Merged entries keep the first diagnostic's kind and path, accumulate the
/// others in `types`/`paths`, and take the highest severity. The sort is
/// stable and treats a missing line as 0, so running this twice is a no-op.
pub fn dedupe(diagnostics: Vec<Diagnostic>) -> Vec<Diagnostic> {
    let mut merged: Vec<Diagnostic> = Vec::with_capacity(diagnostics.len());
    let mut seen: HashMap<(String, Option<u32>, Option<u32>), usize> = HashMap::new();

    for diagnostic in diagnostics {
        let key = (
            diagnostic.message.clone(),
            diagnostic.line,
            diagnostic.column,
        );
        match seen.get(&key) {
            Some(&slot) => merged[slot].absorb(diagnostic),
            None => {
                seen.insert(key, merged.len());
                merged.push(diagnostic);
            }
        }
    }

    merged.sort_by_key(|d| d.line.unwrap_or(0));
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{DiagnosticKind, Severity};

    fn diag(kind: DiagnosticKind, message: &str, line: u32) -> Diagnostic {
        Diagnostic::warning(kind, message).at_position(line, 1)
    }

    #[test]
    fn test_collapses_identical_message_and_position() {
        let input = vec![
            diag(DiagnosticKind::Expression, "dup", 4).with_path("a"),
            Diagnostic::error(DiagnosticKind::Structure, "dup")
                .at_position(4, 1)
                .with_path("b"),
        ];

        let output = dedupe(input);

        assert_eq!(output.len(), 1);
        assert_eq!(output[0].severity, Severity::Error);
        assert_eq!(output[0].kind, DiagnosticKind::Expression);
        assert_eq!(output[0].types, vec![DiagnosticKind::Structure]);
        assert_eq!(output[0].path.as_deref(), Some("a"));
        assert_eq!(output[0].paths, vec!["b".to_string()]);
    }

    #[test]
    fn test_same_message_different_column_is_kept() {
        let input = vec![
            Diagnostic::error(DiagnosticKind::Structure, "m").at_position(2, 1),
            Diagnostic::error(DiagnosticKind::Structure, "m").at_position(2, 7),
        ];
        assert_eq!(dedupe(input).len(), 2);
    }

    #[test]
    fn test_sorted_by_line_with_missing_first() {
        let input = vec![
            diag(DiagnosticKind::Structure, "third", 9),
            diag(DiagnosticKind::Structure, "second", 2),
            Diagnostic::error(DiagnosticKind::SyntaxError, "first"),
        ];

        let messages: Vec<String> = dedupe(input).into_iter().map(|d| d.message).collect();
        assert_eq!(messages, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_dedupe_is_idempotent() {
        let input = vec![
            diag(DiagnosticKind::Expression, "x", 3).with_path("p1"),
            diag(DiagnosticKind::Action, "x", 3).with_path("p2"),
            diag(DiagnosticKind::Expression, "x", 3).with_path("p3"),
            diag(DiagnosticKind::Structure, "y", 1),
            Diagnostic::error(DiagnosticKind::SyntaxError, "z"),
        ];

        let once = dedupe(input);
        let twice = dedupe(once.clone());
        assert_eq!(once, twice);
        assert_eq!(once.len(), 3);
    }

    #[test]
    fn test_warning_pair_stays_warning() {
        let input = vec![diag(DiagnosticKind::Expression, "w", 1), diag(DiagnosticKind::Expression, "w", 1)];
        let output = dedupe(input);
        assert_eq!(output.len(), 1);
        assert_eq!(output[0].severity, Severity::Warning);
        assert!(output[0].types.is_empty());
    }
}
