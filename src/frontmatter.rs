//! Minimal `key: value` header parsing for markdown posts.
//!
//! Only a flat subset is understood: one pair per line, optional matching
//! quotes, and comma separated lists. No escaping, nesting or multi-line values.

use std::collections::BTreeMap;

const MARKER: &str = "---";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum FrontmatterValue {
    Scalar(String),
    List(Vec<String>),
}

impl FrontmatterValue {
    /// Scalar as is, list joined back with `", "`.
    pub fn text(&self) -> String {
        match self {
            FrontmatterValue::Scalar(s) => s.clone(),
            FrontmatterValue::List(items) => items.join(", "),
        }
    }

    pub fn first(&self) -> Option<&str> {
        match self {
            FrontmatterValue::Scalar(s) => Some(s.as_str()),
            FrontmatterValue::List(items) => items.first().map(String::as_str),
        }
    }
}

pub(crate) type Frontmatter = BTreeMap<String, FrontmatterValue>;

fn is_marker(line: &str) -> bool {
    line.trim_end() == MARKER
}

fn unquote(value: &str) -> &str {
    let quoted = value.len() >= 2
        && ((value.starts_with('"') && value.ends_with('"'))
            || (value.starts_with('\'') && value.ends_with('\'')));
    if quoted {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

fn parse_line(line: &str) -> Option<(String, FrontmatterValue)> {
    let (key, value) = line.split_once(':')?;
    let value = unquote(value.trim());
    let value = if value.contains(',') {
        FrontmatterValue::List(value.split(',').map(|s| s.trim().to_string()).collect())
    } else {
        FrontmatterValue::Scalar(value.to_string())
    };
    Some((key.trim().to_string(), value))
}

/// Split `text` into its header block and body.
///
/// Without an opening marker on the first line, or without a closing marker
/// after it, the metadata is empty and the body is the whole text.
pub(crate) fn parse_frontmatter(text: &str) -> (Frontmatter, &str) {
    let mut meta = Frontmatter::new();
    let mut lines = text.split_inclusive('\n');

    let mut offset = match lines.next() {
        Some(first) if is_marker(first) => first.len(),
        _ => return (meta, text),
    };
    let mut header = vec![];
    for line in lines {
        offset += line.len();
        if is_marker(line) {
            for line in header {
                if let Some((key, value)) = parse_line(line) {
                    meta.insert(key, value);
                }
            }
            return (meta, &text[offset..]);
        }
        header.push(line.trim_end_matches(['\r', '\n']));
    }

    (meta, text)
}
