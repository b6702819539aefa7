//! Translation of raw schema failures into user-facing diagnostics
//!
//! Rules are matched in a fixed priority order and the first applicable rule
//! decides the outcome. A rule may also swallow an error that another
//! diagnostic already explains.

use serde_json::Value;

use super::types::{Diagnostic, DiagnosticKind};
use crate::parser::{join_path, LocationIndex};
use crate::schema::{
    is_scan_action, is_trigger_event, RawSchemaError, SchemaKeyword, BACKENDS, SCAN_ACTION_EXAMPLE,
    VENDOR_NAMESPACE,
};

/// Translate one raw schema error, or drop it by returning `None`
pub fn translate(
    error: &RawSchemaError,
    index: &LocationIndex,
    document: &Value,
) -> Option<Diagnostic> {
    let segments = pointer_segments(&error.instance_path);
    let segments: Vec<&str> = segments.iter().map(String::as_str).collect();
    let path = segments.join(".");

    match (segments.as_slice(), &error.keyword) {
        // Workflow root
        ([], SchemaKeyword::Required { missing_property }) if missing_property.as_str() == "on" => {
            Some(missing_trigger(index))
        }
        ([], SchemaKeyword::Required { missing_property }) => {
            Some(missing_root_field(missing_property, index))
        }
        ([], SchemaKeyword::AnyOf) => missing_scan_job(document, index),

        // Triggers
        (["on"], SchemaKeyword::OneOf) => Some(invalid_trigger(&error.data, index)),

        // Jobs
        (["jobs", job], SchemaKeyword::Required { missing_property })
            if missing_property.as_str() == "runs-on" =>
        {
            Some(missing_runner(job, index))
        }
        (["jobs", job], SchemaKeyword::Required { missing_property })
            if missing_property.as_str() == "steps" =>
        {
            Some(missing_steps(job, index))
        }
        (["jobs", job, "steps"], SchemaKeyword::MinItems { .. }) => Some(missing_steps(job, index)),
        (
            ["jobs", job, "runs-on", ..],
            SchemaKeyword::AnyOf
            | SchemaKeyword::Type { .. }
            | SchemaKeyword::MinLength { .. }
            | SchemaKeyword::MinItems { .. },
        ) => Some(invalid_runner(job, &path, index)),

        // Steps
        (["jobs", job, "steps", step], SchemaKeyword::OneOf) => {
            Some(ambiguous_step(job, step, &error.data, &path, index))
        }
        (["jobs", _, "steps", _, "id"], SchemaKeyword::Pattern { .. }) => {
            Some(invalid_step_id(&error.data, &path, index))
        }
        (["jobs", _, "steps", _, "uses"], SchemaKeyword::Pattern { .. }) => {
            Some(invalid_action_reference(&error.data, &path, index))
        }
        (["jobs", _, "steps", _, "with"], SchemaKeyword::AdditionalProperties { unexpected }) => {
            Some(unknown_scan_inputs(unexpected, &path, index))
        }
        (["jobs", _, "steps", _, "with"], SchemaKeyword::AnyOf) => {
            Some(missing_credentials(&path, index))
        }
        (["jobs", job, "steps", step, "with"], SchemaKeyword::Type { .. })
            if is_scan_step(document, job, step) =>
        {
            Some(missing_credentials(&path, index))
        }
        (_, SchemaKeyword::Required { .. } | SchemaKeyword::AnyOf)
            if mentions_vendor(&error.data) =>
        {
            Some(missing_credentials(&scan_parameters_path(&path, &error.data), index))
        }

        // Generic fallbacks
        (_, SchemaKeyword::AdditionalProperties { unexpected }) => {
            Some(unexpected_keys(unexpected, &segments, index))
        }
        (["jobs"], SchemaKeyword::MinProperties { .. }) => Some(
            Diagnostic::error(
                DiagnosticKind::Structure,
                "The 'jobs' section must define at least one job",
            )
            .at(&index.resolve("jobs"))
            .with_path("jobs"),
        ),
        (_, SchemaKeyword::Type { expected }) => {
            Some(type_mismatch(&segments, expected, &error.data, &path, index))
        }
        (_, SchemaKeyword::MinLength { .. }) => Some(
            Diagnostic::error(
                DiagnosticKind::InvalidValue,
                format!("'{}' cannot be empty", field_name(&segments)),
            )
            .at(&index.resolve(&path))
            .with_path(path),
        ),
        (_, SchemaKeyword::Enum { allowed }) => {
            Some(not_allowed(&segments, allowed, &error.data, &path, index))
        }

        _ => {
            tracing::trace!(
                keyword = error.keyword.name(),
                path = %error.instance_path,
                "Dropping untranslated schema error"
            );
            None
        }
    }
}

/// Split a JSON pointer into unescaped segments
fn pointer_segments(pointer: &str) -> Vec<String> {
    pointer
        .split('/')
        .skip(1)
        .map(|segment| segment.replace("~1", "/").replace("~0", "~"))
        .collect()
}

fn missing_trigger(index: &LocationIndex) -> Diagnostic {
    Diagnostic::error(
        DiagnosticKind::MissingField,
        "Missing required 'on' field: the workflow needs at least one trigger. For example:\n\
         on:\n  push:\n    branches: [main]\n  pull_request:\n    branches: [main]",
    )
    .at(&index.resolve("on"))
    .with_path("on")
}

fn missing_root_field(field: &str, index: &LocationIndex) -> Diagnostic {
    let example = match field {
        "name" => "\nFor example: name: Black Duck Security Scan".to_string(),
        "jobs" => format!(
            "\nFor example:\njobs:\n  security-scan:\n    runs-on: ubuntu-latest\n    steps:\n      - uses: {}",
            SCAN_ACTION_EXAMPLE
        ),
        _ => String::new(),
    };

    Diagnostic::error(
        DiagnosticKind::MissingField,
        format!("Missing required field '{}'{}", field, example),
    )
    .at(&index.resolve(field))
    .with_path(field)
}

fn missing_scan_job(document: &Value, index: &LocationIndex) -> Option<Diagnostic> {
    // Missing, mistyped or empty `jobs` is already reported on its own
    let has_jobs = document
        .get("jobs")
        .and_then(Value::as_object)
        .map_or(false, |jobs| !jobs.is_empty());
    if !has_jobs {
        return None;
    }

    Some(
        Diagnostic::error(
            DiagnosticKind::Structure,
            format!(
                "Workflow must contain at least one job with a security scan step, for example:\n\
                 - name: Black Duck Security Scan\n  uses: {}",
                SCAN_ACTION_EXAMPLE
            ),
        )
        .at(&index.resolve("jobs"))
        .with_path("jobs"),
    )
}

fn invalid_trigger(data: &Value, index: &LocationIndex) -> Diagnostic {
    let detail = match data {
        Value::String(event) if !is_trigger_event(event) => {
            format!("'{}' is not a supported event. ", event)
        }
        _ => String::new(),
    };

    Diagnostic::error(
        DiagnosticKind::Configuration,
        format!(
            "Invalid trigger configuration in 'on'. {}Use a single event (on: push), a list of \
             events (on: [push, pull_request]), or a mapping of events to their filters:\n\
             on:\n  push:\n    branches: [main]",
            detail
        ),
    )
    .at(&index.resolve("on"))
    .with_path("on")
}

fn missing_runner(job: &str, index: &LocationIndex) -> Diagnostic {
    let job_path = join_path("jobs", job);
    Diagnostic::error(
        DiagnosticKind::RunnerLabel,
        format!(
            "Job '{}' is missing 'runs-on': specify the runner that executes it, for example: runs-on: ubuntu-latest",
            job
        ),
    )
    .at(&index.resolve(&job_path))
    .with_path(join_path(&job_path, "runs-on"))
}

fn missing_steps(job: &str, index: &LocationIndex) -> Diagnostic {
    let steps_path = join_path(&join_path("jobs", job), "steps");
    Diagnostic::error(
        DiagnosticKind::Structure,
        format!("Job '{}' must define a 'steps' list with at least one step", job),
    )
    .at(&index.resolve(&steps_path))
    .with_path(steps_path)
}

fn invalid_runner(job: &str, path: &str, index: &LocationIndex) -> Diagnostic {
    Diagnostic::error(
        DiagnosticKind::RunnerLabel,
        format!(
            "Job '{}' has an invalid 'runs-on' value: use a runner label such as ubuntu-latest, \
             or a non-empty list of labels such as [self-hosted, linux]",
            job
        ),
    )
    .at(&index.resolve(path))
    .with_path(path)
}

fn ambiguous_step(job: &str, step: &str, data: &Value, path: &str, index: &LocationIndex) -> Diagnostic {
    let number = step.parse::<usize>().map_or(0, |i| i + 1);
    let problem = match (data.get("uses").is_some(), data.get("run").is_some()) {
        (true, true) => "has both 'uses' and 'run'",
        (false, false) => "has neither 'uses' nor 'run'",
        _ => "is malformed",
    };

    Diagnostic::error(
        DiagnosticKind::Structure,
        format!(
            "Step {} in job '{}' {}: a step must have exactly one of an action reference \
             (uses: owner/repo@version) or a shell command (run: ...)",
            number, job, problem
        ),
    )
    .at(&index.resolve(path))
    .with_path(path)
}

fn invalid_step_id(data: &Value, path: &str, index: &LocationIndex) -> Diagnostic {
    Diagnostic::error(
        DiagnosticKind::InvalidCharacter,
        format!(
            "Invalid step id '{}': an id must start with a letter or '_' and contain only \
             letters, digits, '-' and '_' (for example: security-scan or build_1)",
            display_value(data)
        ),
    )
    .at(&index.resolve(path))
    .with_path(path)
}

fn invalid_action_reference(data: &Value, path: &str, index: &LocationIndex) -> Diagnostic {
    Diagnostic::error(
        DiagnosticKind::Action,
        format!(
            "Invalid action reference '{}': use the form owner/repo@version, for example {} \
             or actions/checkout@v4",
            display_value(data),
            SCAN_ACTION_EXAMPLE
        ),
    )
    .at(&index.resolve(path))
    .with_path(path)
}

fn unknown_scan_inputs(unexpected: &[String], path: &str, index: &LocationIndex) -> Diagnostic {
    let first = unexpected.first().map(|key| join_path(path, key));
    let location = index.resolve(first.as_deref().unwrap_or(path));

    Diagnostic::warning(
        DiagnosticKind::UnknownInput,
        format!(
            "Unknown input{} {} for the Black Duck security scan action",
            plural(unexpected.len()),
            quoted_list(unexpected)
        ),
    )
    .at(&location)
    .with_path(location.path.clone())
}

fn missing_credentials(path: &str, index: &LocationIndex) -> Diagnostic {
    let options: Vec<String> = BACKENDS
        .iter()
        .map(|backend| format!("{} ({})", backend.required_inputs.join(" + "), backend.name))
        .collect();

    Diagnostic::error(
        DiagnosticKind::Configuration,
        format!(
            "The security scan step needs credentials for at least one backend under 'with': {}",
            options.join(", or ")
        ),
    )
    .at(&index.resolve(path))
    .with_path(path)
}

/// Whether a value textually contains the vendor namespace
fn mentions_vendor(data: &Value) -> bool {
    match data {
        Value::String(text) => text.contains(VENDOR_NAMESPACE),
        Value::Null | Value::Bool(_) | Value::Number(_) => false,
        other => other.to_string().contains(VENDOR_NAMESPACE),
    }
}

/// Whether `jobs.<job>.steps[<step>]` uses the security scan action
fn is_scan_step(document: &Value, job: &str, step: &str) -> bool {
    let Ok(position) = step.parse::<usize>() else {
        return false;
    };
    document
        .get("jobs")
        .and_then(|jobs| jobs.get(job))
        .and_then(|job| job.get("steps"))
        .and_then(|steps| steps.get(position))
        .and_then(|step| step.get("uses"))
        .and_then(Value::as_str)
        .map_or(false, is_scan_action)
}

/// Point credential diagnostics at the step's `with` block when it exists
fn scan_parameters_path(path: &str, data: &Value) -> String {
    let scan_step = data
        .get("uses")
        .and_then(Value::as_str)
        .map_or(false, is_scan_action);
    if scan_step && data.get("with").is_some() {
        join_path(path, "with")
    } else {
        path.to_string()
    }
}

fn unexpected_keys(unexpected: &[String], segments: &[&str], index: &LocationIndex) -> Diagnostic {
    let parent = segments.join(".");
    let first = unexpected.first().map(|key| join_path(&parent, key));
    let location = index.resolve(first.as_deref().unwrap_or(&parent));

    Diagnostic::error(
        DiagnosticKind::UnexpectedKey,
        format!(
            "Unexpected key{} {} in {}",
            plural(unexpected.len()),
            quoted_list(unexpected),
            describe_container(segments)
        ),
    )
    .at(&location)
    .with_path(location.path.clone())
}

fn type_mismatch(
    segments: &[&str],
    expected: &[String],
    data: &Value,
    path: &str,
    index: &LocationIndex,
) -> Diagnostic {
    let expected = if expected.is_empty() {
        "a different type".to_string()
    } else {
        expected
            .iter()
            .map(|name| with_article(name))
            .collect::<Vec<_>>()
            .join(" or ")
    };

    Diagnostic::error(
        DiagnosticKind::TypeMismatch,
        format!(
            "'{}' must be {}, but found {}",
            field_name(segments),
            expected,
            with_article(json_type_name(data))
        ),
    )
    .at(&index.resolve(path))
    .with_path(path)
}

fn not_allowed(
    segments: &[&str],
    allowed: &[Value],
    data: &Value,
    path: &str,
    index: &LocationIndex,
) -> Diagnostic {
    let allowed: Vec<String> = allowed.iter().map(display_value).collect();
    Diagnostic::error(
        DiagnosticKind::InvalidValue,
        format!(
            "'{}' is not a valid value for '{}'. Allowed values: {}",
            display_value(data),
            field_name(segments),
            allowed.join(", ")
        ),
    )
    .at(&index.resolve(path))
    .with_path(path)
}

/// Name of the field an error points at; list items are named by their list
fn field_name(segments: &[&str]) -> String {
    match segments {
        [] => "workflow".to_string(),
        [.., parent, last] if last.parse::<usize>().is_ok() => {
            format!("{} item {}", parent, last.parse::<usize>().map_or(0, |i| i + 1))
        }
        [.., last] => last.to_string(),
    }
}

fn describe_container(segments: &[&str]) -> String {
    match segments {
        [] => "the workflow".to_string(),
        ["jobs", job] => format!("job '{}'", job),
        ["jobs", job, "steps", step] => format!(
            "step {} of job '{}'",
            step.parse::<usize>().map_or(0, |i| i + 1),
            job
        ),
        _ => format!("'{}'", segments.join(".")),
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn with_article(type_name: &str) -> String {
    match type_name {
        "null" => "null".to_string(),
        "array" | "object" | "integer" => format!("an {}", type_name),
        other => format!("a {}", other),
    }
}

fn quoted_list(keys: &[String]) -> String {
    keys.iter()
        .map(|key| format!("'{}'", key))
        .collect::<Vec<_>>()
        .join(", ")
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}
