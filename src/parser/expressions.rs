//! GitHub Actions `${{ ... }}` expression scanning
//!
//! Finds expression spans inside a scalar value. Single-quoted string
//! literals inside an expression are skipped so a `}}` inside a literal does
//! not close the expression.

/// One expression found in a scalar value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expression {
    /// Byte offset of the opening `${{`
    pub start: usize,
    /// Whether a closing `}}` was found
    pub terminated: bool,
}

/// Scan a value for `${{ ... }}` expressions
pub fn scan_expressions(text: &str) -> Vec<Expression> {
    let mut expressions = Vec::new();
    let mut offset = 0;

    while let Some(found) = text[offset..].find("${{") {
        let start = offset + found;
        let body_start = start + 3;

        match find_closing(text, body_start) {
            Some(close) => {
                expressions.push(Expression {
                    start,
                    terminated: true,
                });
                offset = close + 2;
            }
            None => {
                expressions.push(Expression {
                    start,
                    terminated: false,
                });
                break;
            }
        }
    }

    expressions
}

/// Find the byte offset of the `}}` closing an expression body
fn find_closing(text: &str, from: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let len = bytes.len();
    let mut i = from;

    while i < len {
        match bytes[i] {
            // Expression string literals use single quotes; '' escapes a quote
            b'\'' => {
                i += 1;
                while i < len {
                    if bytes[i] == b'\'' {
                        if i + 1 < len && bytes[i + 1] == b'\'' {
                            i += 2;
                            continue;
                        }
                        break;
                    }
                    i += 1;
                }
            }
            b'}' if i + 1 < len && bytes[i + 1] == b'}' => return Some(i),
            _ => {}
        }
        i += 1;
    }

    None
}
