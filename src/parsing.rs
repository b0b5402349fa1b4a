//! Defensive JSON extraction from model replies.
//!
//! Even with a response schema, models wrap JSON in prose, markdown fences
//! or `<think>` blocks, and occasionally leave trailing commas. [`extract_json`]
//! tries, in order:
//!
//! 1. Direct parse of the reply (after stripping think blocks)
//! 2. The first fenced code block
//! 3. Each balanced top-level `{...}` / `[...]` region, largest first
//! 4. Each candidate again after a light repair pass
//!
//! Failure is reported as [`PantryError::EmptyReply`] or a
//! [`PantryError::SchemaViolation`] at `$`, both of which the flow treats as
//! bad content rather than a backend outage.

use crate::error::{PantryError, Result};
use serde_json::Value;

/// A JSON value pulled out of a reply, with how it was found.
#[derive(Debug, Clone, PartialEq)]
pub struct Extracted {
    pub value: Value,
    /// `"direct"`, `"code_block"` or `"bracketed"`.
    pub strategy: &'static str,
    /// Whether the repair pass was needed.
    pub repaired: bool,
}

/// Extract the JSON payload from raw reply text.
pub fn extract_json(raw: &str) -> Result<Extracted> {
    let cleaned = strip_think_tags(raw);
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return Err(PantryError::EmptyReply);
    }

    let mut candidates: Vec<(&'static str, &str)> = vec![("direct", cleaned)];
    if let Some(block) = fenced_block(cleaned) {
        candidates.push(("code_block", block));
    }
    candidates.extend(bracketed_regions(cleaned).into_iter().map(|r| ("bracketed", r)));

    for &(strategy, text) in &candidates {
        if let Ok(value) = serde_json::from_str::<Value>(text) {
            return Ok(Extracted {
                value,
                strategy,
                repaired: false,
            });
        }
    }

    for &(strategy, text) in &candidates {
        let fixed = repair(text);
        if let Ok(value) = serde_json::from_str::<Value>(&fixed) {
            return Ok(Extracted {
                value,
                strategy,
                repaired: true,
            });
        }
    }

    Err(PantryError::schema(
        "$",
        format!("reply is not valid JSON: {}", truncate(cleaned, 120)),
    ))
}

/// Whether a parsed reply carries no content: `null`, `[]`, `{}` or `""`.
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Remove `<think>...</think>` and `<thinking>...</thinking>` blocks.
///
/// An unclosed block swallows the rest of the text.
pub fn strip_think_tags(text: &str) -> String {
    let mut result = text.to_string();
    for (open, close) in [("<think>", "</think>"), ("<thinking>", "</thinking>")] {
        while let Some(start) = result.find(open) {
            match result[start..].find(close) {
                Some(offset) => {
                    let end = start + offset + close.len();
                    result.replace_range(start..end, "");
                }
                None => {
                    result.truncate(start);
                    break;
                }
            }
        }
    }
    result
}

/// Content of the first markdown fence, with or without a language hint.
fn fenced_block(text: &str) -> Option<&str> {
    let start = text.find("```")?;
    let after = &text[start + 3..];
    let body_start = after.find('\n')? + 1;
    let body = &after[body_start..];
    let end = body.find("```")?;
    Some(body[..end].trim())
}

/// Every balanced top-level `{...}` / `[...]` region, largest first.
///
/// Prose often mentions brackets before the payload (`ranked by [score]`),
/// so an unbalanced or mismatched opener is skipped and the scan resumes
/// after it.
fn bracketed_regions(text: &str) -> Vec<&str> {
    let mut regions = Vec::new();
    let mut from = 0;
    while let Some(offset) = text[from..].find(['{', '[']) {
        let start = from + offset;
        match balanced_end(&text[start..]) {
            Some(len) => {
                regions.push(&text[start..start + len]);
                from = start + len;
            }
            None => from = start + 1,
        }
    }
    regions.sort_by(|a, b| b.len().cmp(&a.len()));
    regions
}

/// Byte length of the balanced region at the start of `text`, ignoring
/// brackets inside string literals. `None` on a mismatched or missing closer.
fn balanced_end(text: &str) -> Option<usize> {
    let mut expected: Vec<char> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (i, ch) in text.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => expected.push('}'),
            '[' => expected.push(']'),
            '}' | ']' => {
                if expected.pop() != Some(ch) {
                    return None;
                }
                if expected.is_empty() {
                    return Some(i + ch.len_utf8());
                }
            }
            _ => {}
        }
    }
    None
}

/// Fix the mistakes models make most: trailing commas and Python literals.
fn repair(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;
    let chars: Vec<char> = text.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        if in_string {
            out.push(ch);
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            i += 1;
            continue;
        }

        if ch == '"' {
            in_string = true;
            out.push(ch);
            i += 1;
            continue;
        }

        if ch == ',' {
            let next = chars[i + 1..].iter().find(|c| !c.is_whitespace());
            if matches!(next, Some('}') | Some(']')) {
                i += 1;
                continue;
            }
        }

        let rest: String = chars[i..chars.len().min(i + 5)].iter().collect();
        let literal = [("True", "true"), ("False", "false"), ("None", "null")]
            .into_iter()
            .find(|(py, _)| rest.starts_with(py));
        if let Some((py, json)) = literal {
            let boundary_before = i == 0 || !chars[i - 1].is_alphanumeric();
            let after = i + py.len();
            let boundary_after = after >= chars.len() || !chars[after].is_alphanumeric();
            if boundary_before && boundary_after {
                out.push_str(json);
                i = after;
                continue;
            }
        }

        out.push(ch);
        i += 1;
    }
    out
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}
