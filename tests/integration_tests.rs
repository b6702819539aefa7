//! Integration tests for the scan-workflow-lsp validator
//!
//! These tests run the full pipeline from workflow text to the final,
//! de-duplicated diagnostic list.

use std::fs;
use std::path::Path;

use assert_matches::assert_matches;
use scan_workflow_lsp::diagnostics::{dedupe, get_yaml_errors, Diagnostic, DiagnosticKind, Severity};
use scan_workflow_lsp::filename::{
    suggest_filename_correction, validate_workflow_filename, FilenameErrorKind,
};
use scan_workflow_lsp::report::{check_file, format_text};

/// Test helper to compute diagnostics for a fixture
fn fixture_diagnostics(name: &str) -> Vec<Diagnostic> {
    let text = fs::read_to_string(Path::new("tests/fixtures").join(name))
        .expect("Failed to read fixture");
    get_yaml_errors(&text)
}

fn kinds(diagnostics: &[Diagnostic]) -> Vec<DiagnosticKind> {
    diagnostics.iter().map(|d| d.kind).collect()
}

#[test]
fn test_valid_scan_workflow_no_diagnostics() {
    let diagnostics = fixture_diagnostics("polaris_scan.yml");

    assert!(
        diagnostics.is_empty(),
        "Expected no diagnostics for valid workflow, got: {:?}",
        diagnostics
    );
}

#[test]
fn test_syntax_error_is_the_only_diagnostic() {
    let diagnostics = fixture_diagnostics("syntax_error.yml");

    assert_eq!(diagnostics.len(), 1, "got: {:?}", diagnostics);
    assert_eq!(diagnostics[0].kind, DiagnosticKind::SyntaxError);
    assert_eq!(diagnostics[0].severity, Severity::Error);
    assert!(diagnostics[0].line.is_some());
    assert!(diagnostics[0].message.starts_with("YAML syntax error"));
}

#[test]
fn test_invalid_yaml_inputs() {
    for text in ["key: value\n  bad: indentation\n", "key: \"unclosed\nother: value\n", "a: [1, 2\n"] {
        let diagnostics = get_yaml_errors(text);
        assert_eq!(kinds(&diagnostics), vec![DiagnosticKind::SyntaxError], "input {:?}", text);
    }
}

#[test]
fn test_comment_only_document_is_not_an_object() {
    let diagnostics = get_yaml_errors("# nothing here\n# at all\n");

    assert_eq!(kinds(&diagnostics), vec![DiagnosticKind::Structure]);
    assert_eq!(diagnostics[0].line, Some(1));
    assert_eq!(diagnostics[0].column, Some(1));
}

#[test]
fn test_missing_trigger_and_runner() {
    let diagnostics = fixture_diagnostics("missing_trigger_and_runner.yml");

    assert_eq!(
        kinds(&diagnostics),
        vec![DiagnosticKind::MissingField, DiagnosticKind::RunnerLabel]
    );

    let trigger = &diagnostics[0];
    assert_eq!(trigger.path.as_deref(), Some("on"));
    assert!(trigger.message.contains("branches: [main]"));

    let runner = &diagnostics[1];
    assert!(runner.message.contains("Job 'coverity'"));
    assert_eq!(runner.path.as_deref(), Some("jobs.coverity.runs-on"));
    assert_eq!(runner.line, Some(4));
    assert_eq!(runner.column, Some(3));
}

#[test]
fn test_broken_steps_are_located() {
    let diagnostics = fixture_diagnostics("broken_steps.yml");

    assert_eq!(
        kinds(&diagnostics),
        vec![
            DiagnosticKind::InvalidCharacter,
            DiagnosticKind::Action,
            DiagnosticKind::Structure,
            DiagnosticKind::Configuration,
            DiagnosticKind::UnknownInput,
        ],
        "got: {:#?}",
        diagnostics
    );

    let lines: Vec<Option<u32>> = diagnostics.iter().map(|d| d.line).collect();
    assert_eq!(lines, vec![Some(9), Some(10), Some(11), Some(14), Some(16)]);

    assert!(diagnostics[2]
        .message
        .starts_with("Step 2 in job 'scan' has both 'uses' and 'run'"));
    assert_eq!(diagnostics[4].severity, Severity::Warning);
    assert!(diagnostics[4].message.contains("'blackducksca_tokn'"));
}

#[test]
fn test_untrusted_input_warnings() {
    let diagnostics = fixture_diagnostics("untrusted_input.yml");

    assert_eq!(
        kinds(&diagnostics),
        vec![DiagnosticKind::Expression, DiagnosticKind::Expression],
        "got: {:#?}",
        diagnostics
    );
    assert!(diagnostics.iter().all(|d| d.severity == Severity::Warning));

    assert_eq!(diagnostics[0].path.as_deref(), Some("jobs.triage.steps.0.run"));
    assert_eq!(diagnostics[0].line, Some(13));
    assert!(diagnostics[0].message.contains("github.event.issue.title"));

    assert_eq!(
        diagnostics[1].path.as_deref(),
        Some("jobs.triage.steps.2.with.srm_branch_name")
    );
    assert_eq!(diagnostics[1].line, Some(23));
}

#[test]
fn test_pull_request_title_yields_one_warning() {
    let text = r#"name: PR
on: pull_request
jobs:
  scan:
    runs-on: ubuntu-latest
    steps:
      - run: echo "${{ github.event.pull_request.title }}"
      - uses: blackduck-inc/black-duck-security-scan@v2
        with:
          blackducksca_url: https://blackduck.example.com
          blackducksca_token: ${{ secrets.TOKEN }}
"#;
    let diagnostics = get_yaml_errors(text);

    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].kind, DiagnosticKind::Expression);
    assert_eq!(diagnostics[0].severity, Severity::Warning);
    assert_eq!(diagnostics[0].path.as_deref(), Some("jobs.scan.steps.0.run"));
}

#[test]
fn test_pipeline_output_is_already_deduplicated() {
    for fixture in ["broken_steps.yml", "untrusted_input.yml", "missing_trigger_and_runner.yml"] {
        let diagnostics = fixture_diagnostics(fixture);
        assert_eq!(dedupe(diagnostics.clone()), diagnostics, "fixture {}", fixture);
    }
}

#[test]
fn test_text_report_format() {
    let diagnostics = fixture_diagnostics("missing_trigger_and_runner.yml");
    let text = format_text(&diagnostics);

    let blocks: Vec<&str> = text.split("\n\n").collect();
    assert!(blocks.len() >= 2);
    assert!(text.starts_with("line:1, col:1 Missing required 'on' field"));
    assert!(text.contains("line:4, col:3 Job 'coverity' is missing 'runs-on'"));
    assert!(text.contains("[jobs.coverity.runs-on]"));
}

#[test]
fn test_check_file_on_fixtures() {
    let valid = check_file(Path::new("tests/fixtures/polaris_scan.yml")).unwrap();
    assert!(!valid.has_errors());
    assert!(valid.filename_errors.is_empty());

    let untrusted = check_file(Path::new("tests/fixtures/untrusted_input.yml")).unwrap();
    assert!(!untrusted.has_errors(), "warnings alone do not fail a report");

    let broken = check_file(Path::new("tests/fixtures/broken_steps.yml")).unwrap();
    assert!(broken.has_errors());
}

#[test]
fn test_filename_examples() {
    let reserved = validate_workflow_filename("con.yml");
    assert_matches!(reserved.as_slice(), [error] if error.kind == FilenameErrorKind::Reserved);
    assert_eq!(suggest_filename_correction("con.yml"), "con-workflow.yml");

    let long = format!("{}.yml", "a".repeat(150));
    assert!(validate_workflow_filename(&long)
        .iter()
        .any(|e| e.kind == FilenameErrorKind::Length));
    assert_eq!(
        suggest_filename_correction(&long),
        format!("{}.yml", "a".repeat(96))
    );
}

#[test]
fn test_filename_correction_round_trip() {
    let inputs = [
        "Security Scan",
        "scan.yml.bak",
        "../../.github/workflows/scan.yml",
        "AUX",
        "lpt9.YAML",
        "****",
        "  spaced  out  .yaml ",
        "tab\tand\nnewline.yml",
    ];

    for input in inputs {
        let corrected = suggest_filename_correction(input);
        let remaining: Vec<FilenameErrorKind> = validate_workflow_filename(&corrected)
            .into_iter()
            .map(|e| e.kind)
            .filter(|kind| {
                matches!(
                    kind,
                    FilenameErrorKind::Extension | FilenameErrorKind::Path | FilenameErrorKind::Reserved
                )
            })
            .collect();
        assert!(
            remaining.is_empty(),
            "{:?} corrected to {:?} still fails {:?}",
            input,
            corrected,
            remaining
        );
    }
}
