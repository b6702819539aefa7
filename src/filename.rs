//! Workflow filename validation and correction
//!
//! Both functions are pure. Validation runs every check and reports each
//! failure; correction always produces a name that passes the extension, path
//! and reserved-name checks.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

/// Longest accepted filename, extension included
pub const MAX_FILENAME_LENGTH: usize = 100;

/// Name used when nothing usable survives correction
pub const DEFAULT_FILENAME: &str = "workflow.yml";

const FORBIDDEN_CHARS: &[char] = &['<', '>', ':', '"', '|', '?', '*'];

const DISCOURAGED_CHARS: &[char] = &[
    '!', '@', '#', '$', '%', '^', '&', '(', ')', '+', '=', '[', ']', '{', '}', ';', '\'', ',',
    '~', '`',
];

const RESERVED_NAMES: &[&str] = &[
    "con", "prn", "aux", "nul", "com1", "com2", "com3", "com4", "com5", "com6", "com7", "com8",
    "com9", "lpt1", "lpt2", "lpt3", "lpt4", "lpt5", "lpt6", "lpt7", "lpt8", "lpt9",
];

lazy_static! {
    static ref ALLOWED_PATTERN: Regex = Regex::new(r"^[\w.-]+$").unwrap();
    static ref UNSAFE_CHARS: Regex = Regex::new(r"[^A-Za-z0-9_.-]+").unwrap();
    static ref REPEATED_HYPHENS: Regex = Regex::new(r"-{2,}").unwrap();
    static ref REPEATED_DOTS: Regex = Regex::new(r"\.{2,}").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FilenameErrorKind {
    Extension,
    Characters,
    Length,
    Reserved,
    Path,
}

/// One problem with a workflow filename
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilenameValidationError {
    #[serde(rename = "type")]
    pub kind: FilenameErrorKind,
    pub message: String,
}

impl FilenameValidationError {
    fn new(kind: FilenameErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Check a workflow filename against every naming rule
pub fn validate_workflow_filename(name: &str) -> Vec<FilenameValidationError> {
    use FilenameErrorKind::*;

    let mut errors = Vec::new();
    let length = name.chars().count();

    if name.trim().is_empty() {
        errors.push(FilenameValidationError::new(Length, "Filename cannot be empty"));
    }

    if length > MAX_FILENAME_LENGTH {
        errors.push(FilenameValidationError::new(
            Length,
            format!(
                "Filename is {} characters long; the maximum is {}",
                length, MAX_FILENAME_LENGTH
            ),
        ));
    }

    if name.contains('/') || name.contains('\\') {
        errors.push(FilenameValidationError::new(
            Path,
            "Filename must not contain path separators ('/' or '\\')",
        ));
    }

    let lower = name.to_lowercase();
    if !lower.ends_with(".yml") && !lower.ends_with(".yaml") {
        errors.push(FilenameValidationError::new(
            Extension,
            "Filename must end with .yml or .yaml",
        ));
    }

    let forbidden = offending(name, |c| c.is_control() || FORBIDDEN_CHARS.contains(&c));
    if !forbidden.is_empty() {
        errors.push(FilenameValidationError::new(
            Characters,
            format!("Filename contains forbidden characters: {}", forbidden),
        ));
    }

    let discouraged = offending(name, |c| DISCOURAGED_CHARS.contains(&c));
    if !discouraged.is_empty() {
        errors.push(FilenameValidationError::new(
            Characters,
            format!("Filename should not contain special characters: {}", discouraged),
        ));
    }

    if !name.is_empty() && !ALLOWED_PATTERN.is_match(name) {
        errors.push(FilenameValidationError::new(
            Characters,
            "Filename may only contain letters, digits, '_', '.' and '-'",
        ));
    }

    if is_reserved(stem(name)) {
        errors.push(FilenameValidationError::new(
            Reserved,
            format!("'{}' is a reserved system name", stem(name)),
        ));
    }

    if name.starts_with('.') || name.ends_with('.') {
        errors.push(FilenameValidationError::new(
            Characters,
            "Filename must not start or end with a dot",
        ));
    }

    if name.contains("..") {
        errors.push(FilenameValidationError::new(
            Path,
            "Filename must not contain '..'",
        ));
    }

    if name.contains(' ') {
        errors.push(FilenameValidationError::new(
            Characters,
            "Filename should not contain spaces; use '-' or '_' instead",
        ));
    }

    errors
}

/// Rewrite a filename into one that passes the structural checks
pub fn suggest_filename_correction(name: &str) -> String {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return DEFAULT_FILENAME.to_string();
    }

    let replaced = UNSAFE_CHARS.replace_all(trimmed, "-");
    let collapsed = REPEATED_HYPHENS.replace_all(&replaced, "-");
    let collapsed = REPEATED_DOTS.replace_all(&collapsed, ".");
    let collapsed = collapsed.trim_end_matches(['.', '-']);

    let (stem, extension) = match collapsed.rsplit_once('.') {
        Some((stem, ext)) if ext.eq_ignore_ascii_case("yml") || ext.eq_ignore_ascii_case("yaml") => {
            (stem, format!(".{}", ext.to_ascii_lowercase()))
        }
        Some((stem, _)) => (stem, ".yml".to_string()),
        None => (collapsed, ".yml".to_string()),
    };

    let stem = stem.trim_matches(['.', '-']);
    if stem.is_empty() {
        return DEFAULT_FILENAME.to_string();
    }

    // Only ASCII survives the replacement above, so byte slicing is safe
    let limit = MAX_FILENAME_LENGTH - extension.len();
    let stem = stem[..stem.len().min(limit)].trim_end_matches(['.', '-']);

    if is_reserved(stem) {
        format!("{}-workflow{}", stem, extension)
    } else {
        format!("{}{}", stem, extension)
    }
}

/// Name without its final extension
fn stem(name: &str) -> &str {
    name.rsplit_once('.').map_or(name, |(stem, _)| stem)
}

fn is_reserved(stem: &str) -> bool {
    RESERVED_NAMES
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(stem))
}

/// Distinct offending characters in order of first appearance
fn offending(name: &str, predicate: impl Fn(char) -> bool) -> String {
    let mut found: Vec<char> = Vec::new();
    for c in name.chars().filter(|c| predicate(*c)) {
        if !found.contains(&c) {
            found.push(c);
        }
    }
    found
        .iter()
        .map(|c| {
            if c.is_control() {
                format!("U+{:04X}", u32::from(*c))
            } else {
                format!("'{}'", c)
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}
