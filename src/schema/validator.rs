//! JSON-schema validation of parsed workflow documents
//!
//! Wraps the `jsonschema` crate with the embedded draft-07 workflow schema and
//! flattens each failure into a [`RawSchemaError`] for the translator.

use jsonschema::error::ValidationErrorKind;
use jsonschema::{ValidationError, Validator};
use lazy_static::lazy_static;
use serde_json::Value;

const SCHEMA_SOURCE: &str = include_str!("workflow.schema.json");

lazy_static! {
    static ref WORKFLOW_SCHEMA: Value =
        serde_json::from_str(SCHEMA_SOURCE).expect("embedded workflow schema is valid JSON");
    static ref WORKFLOW_VALIDATOR: Validator =
        jsonschema::draft7::new(&WORKFLOW_SCHEMA).expect("embedded workflow schema compiles");
}

/// The failing schema keyword together with its keyword-specific parameters
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaKeyword {
    Required { missing_property: String },
    OneOf,
    AnyOf,
    Not,
    Pattern { pattern: String },
    Type { expected: Vec<String> },
    MinLength { limit: u64 },
    MinItems { limit: u64 },
    MinProperties { limit: u64 },
    Enum { allowed: Vec<Value> },
    AdditionalProperties { unexpected: Vec<String> },
    Other { keyword: String },
}

impl SchemaKeyword {
    /// JSON-schema keyword name
    pub fn name(&self) -> &str {
        match self {
            Self::Required { .. } => "required",
            Self::OneOf => "oneOf",
            Self::AnyOf => "anyOf",
            Self::Not => "not",
            Self::Pattern { .. } => "pattern",
            Self::Type { .. } => "type",
            Self::MinLength { .. } => "minLength",
            Self::MinItems { .. } => "minItems",
            Self::MinProperties { .. } => "minProperties",
            Self::Enum { .. } => "enum",
            Self::AdditionalProperties { .. } => "additionalProperties",
            Self::Other { keyword } => keyword,
        }
    }

    fn from_error(kind: &ValidationErrorKind, schema_path: &str) -> Self {
        match kind {
            ValidationErrorKind::Required { property, .. } => Self::Required {
                missing_property: property
                    .as_str()
                    .map_or_else(|| property.to_string(), str::to_string),
            },
            ValidationErrorKind::OneOfNotValid { .. }
            | ValidationErrorKind::OneOfMultipleValid { .. } => Self::OneOf,
            ValidationErrorKind::AnyOf { .. } => Self::AnyOf,
            ValidationErrorKind::Not { .. } => Self::Not,
            ValidationErrorKind::Pattern { pattern, .. } => Self::Pattern {
                pattern: pattern.clone(),
            },
            ValidationErrorKind::Type { .. } => Self::Type {
                expected: expected_types(schema_path),
            },
            ValidationErrorKind::MinLength { limit, .. } => Self::MinLength { limit: *limit },
            ValidationErrorKind::MinItems { limit, .. } => Self::MinItems { limit: *limit },
            ValidationErrorKind::MinProperties { limit, .. } => {
                Self::MinProperties { limit: *limit }
            }
            ValidationErrorKind::Enum { options, .. } => Self::Enum {
                allowed: options.as_array().cloned().unwrap_or_default(),
            },
            ValidationErrorKind::AdditionalProperties { unexpected, .. } => {
                Self::AdditionalProperties {
                    unexpected: unexpected.clone(),
                }
            }
            _ => Self::Other {
                keyword: schema_path.rsplit('/').next().unwrap_or_default().to_string(),
            },
        }
    }
}

/// One schema failure, detached from the validator's borrowed error
#[derive(Debug, Clone, PartialEq)]
pub struct RawSchemaError {
    /// JSON pointer into the document, e.g. `/jobs/build/steps/0`
    pub instance_path: String,
    pub keyword: SchemaKeyword,
    /// JSON pointer into the schema
    pub schema_path: String,
    /// The offending value
    pub data: Value,
}

impl RawSchemaError {
    fn from_validation_error(error: &ValidationError<'_>, document: &Value) -> Self {
        let instance_path = error.instance_path.to_string();
        let schema_path = error.schema_path.to_string();
        let keyword = SchemaKeyword::from_error(&error.kind, &schema_path);
        let data = document.pointer(&instance_path).cloned().unwrap_or(Value::Null);

        Self {
            instance_path,
            keyword,
            schema_path,
            data,
        }
    }
}

/// Validate a parsed document against the embedded workflow schema
pub fn validate(document: &Value) -> Vec<RawSchemaError> {
    let errors: Vec<RawSchemaError> = WORKFLOW_VALIDATOR
        .iter_errors(document)
        .map(|error| RawSchemaError::from_validation_error(&error, document))
        .collect();

    tracing::debug!(count = errors.len(), "Schema validation finished");
    errors
}

/// Type names a `type` keyword expects, read from the schema itself
fn expected_types(schema_path: &str) -> Vec<String> {
    match WORKFLOW_SCHEMA.pointer(schema_path) {
        Some(Value::String(name)) => vec![name.clone()],
        Some(Value::Array(names)) => names
            .iter()
            .filter_map(|name| name.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}
