//! Best-effort mapping from logical document paths to source positions
//!
//! `serde_yaml` does not keep spans, so positions are recovered by searching
//! the raw text. A child is searched for only inside its parent's block
//! (starting at the parent's line and ending where the indentation drops back
//! to the parent's column), and only at the column of the block's first
//! entry. Sequence items are found by counting `-` markers at that column.
//!
//! Flow collections (`[a, b]`, `{k: v}`), multi-document streams and other
//! unusual layouts are not resolved; such nodes inherit the position of their
//! nearest located ancestor, and unresolved top-level nodes sit at `1:1`.

use std::collections::HashMap;

use serde_json::Value;

/// Source position of a document node (1-based)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub line: u32,
    pub column: u32,
    /// Dot-delimited logical path, e.g. `jobs.build.steps.0.uses`
    pub path: String,
}

impl Location {
    fn document_start(path: &str) -> Self {
        Self {
            line: 1,
            column: 1,
            path: path.to_string(),
        }
    }
}

/// Map from dot-delimited logical paths to source locations
#[derive(Debug, Default)]
pub struct LocationIndex {
    entries: HashMap<String, Location>,
}

impl LocationIndex {
    /// Location recorded for exactly this path
    pub fn get(&self, path: &str) -> Option<&Location> {
        self.entries.get(path)
    }

    /// Location of the path or of its nearest recorded ancestor, else `1:1`
    pub fn resolve(&self, path: &str) -> Location {
        let mut current = path;
        loop {
            if let Some(location) = self.entries.get(current) {
                return Location {
                    path: path.to_string(),
                    ..location.clone()
                };
            }
            match current.rfind('.') {
                Some(dot) => current = &current[..dot],
                None => return Location::document_start(path),
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Join a parent path and a child segment with a dot
pub fn join_path(parent: &str, segment: &str) -> String {
    if parent.is_empty() {
        segment.to_string()
    } else {
        format!("{}.{}", parent, segment)
    }
}

/// Build the location index for a parsed document and its source text
pub fn build_location_map(text: &str, document: &Value) -> LocationIndex {
    let source = SourceLines::new(text);
    let mut index = LocationIndex::default();
    let root = Scope {
        start: 0,
        parent_column: None,
        inline_column: None,
    };
    let origin = Location::document_start("");
    source.index_node(document, "", Some(root), &origin, &mut index.entries);
    index
}

/// Region of the text that holds a node's children
#[derive(Debug, Clone, Copy)]
struct Scope {
    /// First line (0-based) that may hold a child
    start: usize,
    /// Column of the owning key or list marker; `None` at the document root
    parent_column: Option<usize>,
    /// Column where a list item's content starts on the marker line
    inline_column: Option<usize>,
}

/// A non-blank, non-comment line inside a scope
#[derive(Debug)]
struct Entry<'a> {
    line: usize,
    column: usize,
    content: &'a str,
}

struct SourceLines<'a> {
    lines: Vec<&'a str>,
}

impl<'a> SourceLines<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines().collect(),
        }
    }

    fn index_node(
        &self,
        value: &Value,
        path: &str,
        scope: Option<Scope>,
        own: &Location,
        out: &mut HashMap<String, Location>,
    ) {
        match value {
            Value::Object(map) => {
                let entries = scope.map(|s| self.direct_children(s)).unwrap_or_default();
                for (key, child) in map {
                    let child_path = join_path(path, key);
                    let found = entries.iter().find(|e| key_matches(e.content, key));
                    let child_scope = found.map(|e| Scope {
                        start: e.line + 1,
                        parent_column: Some(e.column),
                        inline_column: None,
                    });
                    self.record(child, child_path, found, child_scope, own, out);
                }
            }
            Value::Array(items) => {
                let markers: Vec<Entry<'_>> = scope
                    .map(|s| self.direct_children(s))
                    .unwrap_or_default()
                    .into_iter()
                    .filter(|e| is_list_marker(e.content))
                    .collect();
                for (position, child) in items.iter().enumerate() {
                    let child_path = join_path(path, &position.to_string());
                    let found = markers.get(position);
                    let child_scope = found.map(|e| Scope {
                        start: e.line,
                        parent_column: Some(e.column),
                        inline_column: Some(item_content_column(e)),
                    });
                    self.record(child, child_path, found, child_scope, own, out);
                }
            }
            _ => {}
        }
    }

    fn record(
        &self,
        child: &Value,
        child_path: String,
        found: Option<&Entry<'_>>,
        child_scope: Option<Scope>,
        parent: &Location,
        out: &mut HashMap<String, Location>,
    ) {
        let location = match found {
            Some(entry) => Location {
                line: to_u32(entry.line + 1),
                column: to_u32(entry.column + 1),
                path: child_path.clone(),
            },
            None => Location {
                path: child_path.clone(),
                ..parent.clone()
            },
        };
        self.index_node(child, &child_path, child_scope, &location, out);
        out.insert(child_path, location);
    }

    /// Entries of a scope sitting at the column of its first entry
    fn direct_children(&self, scope: Scope) -> Vec<Entry<'a>> {
        let entries = self.block_entries(scope);
        let Some(column) = entries.first().map(|e| e.column) else {
            return entries;
        };
        entries.into_iter().filter(|e| e.column == column).collect()
    }

    /// All content lines belonging to a scope's block
    fn block_entries(&self, scope: Scope) -> Vec<Entry<'a>> {
        let mut entries = Vec::new();

        for (idx, raw) in self.lines.iter().enumerate().skip(scope.start) {
            if idx == scope.start {
                if let Some(column) = scope.inline_column {
                    // "- key: value": the rest of the marker line belongs to the item
                    if let Some(content) = raw.get(column..) {
                        if !is_blank_or_comment(content) {
                            entries.push(Entry {
                                line: idx,
                                column,
                                content,
                            });
                        }
                    }
                    continue;
                }
            }

            let content = raw.trim_start();
            if is_blank_or_comment(content) {
                continue;
            }
            let column = raw.len() - content.len();

            if let Some(parent) = scope.parent_column {
                // A key's sequence may start at the key's own column
                let same_column_item = column == parent
                    && scope.inline_column.is_none()
                    && is_list_marker(content);
                if column < parent || (column == parent && !same_column_item) {
                    break;
                }
            }

            entries.push(Entry {
                line: idx,
                column,
                content,
            });
        }

        entries
    }
}

fn is_blank_or_comment(content: &str) -> bool {
    let trimmed = content.trim();
    trimmed.is_empty() || trimmed.starts_with('#')
}

fn is_list_marker(content: &str) -> bool {
    content == "-" || content.starts_with("- ")
}

/// Column of the first character after a `- ` marker
fn item_content_column(entry: &Entry<'_>) -> usize {
    let rest = &entry.content[1..];
    entry.column + 1 + (rest.len() - rest.trim_start().len())
}

/// Whether a line starts with `key:`, `"key":` or `'key':`
fn key_matches(content: &str, key: &str) -> bool {
    let rest = content
        .strip_prefix(key)
        .or_else(|| quoted(content, '"', key))
        .or_else(|| quoted(content, '\'', key));

    match rest.and_then(|r| r.strip_prefix(':')) {
        Some(after) => after.is_empty() || after.starts_with(char::is_whitespace),
        None => false,
    }
}

fn quoted<'c>(content: &'c str, quote: char, key: &str) -> Option<&'c str> {
    content
        .strip_prefix(quote)?
        .strip_prefix(key)?
        .strip_prefix(quote)
}

fn to_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}
