//! YAML parsing with syntax error reporting
//!
//! This module parses raw workflow text into a `serde_json::Value` tree and
//! records at most one syntax error, positioned from the parser's mark when
//! one is available.

use serde_json::{Map, Number, Value};

use crate::diagnostics::DiagnosticCollector;

/// Parse YAML text and collect any syntax error
///
/// Mapping keys are stringified so the tree can be validated as JSON.
///
/// # Arguments
/// * `text` - The raw workflow text
/// * `collector` - Collector for diagnostics
///
/// # Returns
/// * `Some(document)` on success, `None` after a syntax error was recorded
pub fn parse_yaml(text: &str, collector: &mut DiagnosticCollector) -> Option<Value> {
    match serde_yaml::from_str::<serde_yaml::Value>(text) {
        Ok(value) => Some(yaml_to_json(value)),
        Err(err) => {
            let message = err.to_string();

            // Prefer the parser's mark; fall back to the "at line X column Y" suffix
            let position = err
                .location()
                .and_then(|mark| {
                    let line = u32::try_from(mark.line()).ok()?;
                    let column = u32::try_from(mark.column()).ok()?;
                    Some((line.max(1), column.max(1)))
                })
                .or_else(|| extract_error_position(&message));

            tracing::debug!(?position, "YAML syntax error: {}", message);

            collector.add_syntax_error(
                format!("YAML syntax error: {}", clean_error_message(&message)),
                position,
            );
            None
        }
    }
}

/// Convert a YAML tree into a JSON tree
fn yaml_to_json(value: serde_yaml::Value) -> Value {
    match value {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(b) => Value::Bool(b),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Number(i.into())
            } else if let Some(u) = n.as_u64() {
                Value::Number(u.into())
            } else {
                n.as_f64()
                    .and_then(Number::from_f64)
                    .map_or(Value::Null, Value::Number)
            }
        }
        serde_yaml::Value::String(s) => Value::String(s),
        serde_yaml::Value::Sequence(items) => {
            Value::Array(items.into_iter().map(yaml_to_json).collect())
        }
        serde_yaml::Value::Mapping(mapping) => {
            let mut object = Map::with_capacity(mapping.len());
            for (key, value) in mapping {
                object.insert(key_to_string(key), yaml_to_json(value));
            }
            Value::Object(object)
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_json(tagged.value),
    }
}

fn key_to_string(key: serde_yaml::Value) -> String {
    match key {
        serde_yaml::Value::String(s) => s,
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Null => "null".to_string(),
        // Sequence and mapping keys render as compact single-line JSON
        other => yaml_to_json(other).to_string(),
    }
}

/// Extract a 1-based line and column from a serde_yaml error message
///
/// serde_yaml errors often look like: "... at line 5 column 10"
fn extract_error_position(message: &str) -> Option<(u32, u32)> {
    use lazy_static::lazy_static;
    use regex::Regex;

    lazy_static! {
        static ref POSITION_RE: Regex = Regex::new(r"at line (\d+) column (\d+)").unwrap();
    }

    let caps = POSITION_RE.captures(message)?;
    let line: u32 = caps.get(1)?.as_str().parse().ok()?;
    let column: u32 = caps.get(2)?.as_str().parse().ok()?;
    Some((line.max(1), column.max(1)))
}

/// Remove the trailing position from an error message
///
/// The position travels in the diagnostic's line and column.
fn clean_error_message(message: &str) -> String {
    use lazy_static::lazy_static;
    use regex::Regex;

    lazy_static! {
        static ref POSITION_SUFFIX_RE: Regex =
            Regex::new(r",?\s+at line \d+ column \d+").unwrap();
    }

    POSITION_SUFFIX_RE.replace(message, "").to_string()
}
