//! Per-directory hierarchy directives.
//!
//! Each content directory may carry a Java-style properties file (by default
//! `.properties`, or `.properties.<profile>`) naming the category and section
//! its documents belong to:
//!
//! ```text
//! category.title       = Getting Started
//! category.title.old   = Introduction
//! category.description = First steps
//! category.position    = 1
//! section.title        = Installation
//! ```
//!
//! Reading never fails: a missing or unreadable file yields an empty map.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// DirectiveKeys
// ---------------------------------------------------------------------------

/// Property names looked up in a directive file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectiveKeys {
    pub category_name: String,
    pub category_old_name: String,
    pub category_description: String,
    pub category_position: String,
    pub section_name: String,
    pub section_old_name: String,
    pub section_description: String,
    pub section_position: String,
}

impl Default for DirectiveKeys {
    fn default() -> Self {
        Self {
            category_name: "category.title".into(),
            category_old_name: "category.title.old".into(),
            category_description: "category.description".into(),
            category_position: "category.position".into(),
            section_name: "section.title".into(),
            section_old_name: "section.title.old".into(),
            section_description: "section.description".into(),
            section_position: "section.position".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// LocalDirectiveSet
// ---------------------------------------------------------------------------

/// Declared hierarchy values for one directory.
///
/// Blank names are normalised to `None`; descriptions default to empty and
/// positions to `0`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalDirectiveSet {
    pub category_name: Option<String>,
    pub category_old_name: Option<String>,
    pub category_description: String,
    pub category_position: i64,
    pub section_name: Option<String>,
    pub section_old_name: Option<String>,
    pub section_description: String,
    pub section_position: i64,
}

impl LocalDirectiveSet {
    /// Interpret a raw property map using `keys`.
    ///
    /// Fails only when a position is present but not an integer.
    pub fn from_map(
        map: &BTreeMap<String, String>,
        keys: &DirectiveKeys,
    ) -> Result<Self, CoreError> {
        Ok(Self {
            category_name: non_blank(map, &keys.category_name),
            category_old_name: non_blank(map, &keys.category_old_name),
            category_description: text(map, &keys.category_description),
            category_position: position(map, &keys.category_position)?,
            section_name: non_blank(map, &keys.section_name),
            section_old_name: non_blank(map, &keys.section_old_name),
            section_description: text(map, &keys.section_description),
            section_position: position(map, &keys.section_position)?,
        })
    }

    /// Neither a category nor a section is declared: the directory inherits
    /// its parent's hierarchy untouched.
    pub fn is_empty(&self) -> bool {
        self.category_name.is_none() && self.section_name.is_none()
    }
}

fn non_blank(map: &BTreeMap<String, String>, key: &str) -> Option<String> {
    map.get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

fn text(map: &BTreeMap<String, String>, key: &str) -> String {
    map.get(key).map(|v| v.trim().to_owned()).unwrap_or_default()
}

fn position(map: &BTreeMap<String, String>, key: &str) -> Result<i64, CoreError> {
    match map.get(key).map(|v| v.trim()).filter(|v| !v.is_empty()) {
        None => Ok(0),
        Some(raw) => raw.parse().map_err(|_| CoreError::InvalidDirective {
            key: key.to_owned(),
            value: raw.to_owned(),
        }),
    }
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

/// Read `<dir>/<file_name>` into a key/value map.
///
/// Absence or any read error yields an empty map (logged, never raised).
pub fn read_directives(dir: &Path, file_name: &str) -> BTreeMap<String, String> {
    let path = dir.join(file_name);
    match std::fs::read_to_string(&path) {
        Ok(contents) => parse_properties(&contents),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("no directive file at {}", path.display());
            BTreeMap::new()
        }
        Err(e) => {
            tracing::warn!("error reading directives from {}: {}", path.display(), e);
            BTreeMap::new()
        }
    }
}

/// Parse Java properties text.
///
/// Supports `=`, `:` and whitespace separators, `#`/`!` comment lines,
/// backslash line continuations and the usual escapes (`\t`, `\n`, `\uXXXX`, ...).
/// Later duplicates win.
pub fn parse_properties(contents: &str) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    let mut lines = contents.lines();
    while let Some(first) = lines.next() {
        let mut logical = first.trim_start().to_owned();
        if logical.is_empty() || logical.starts_with('#') || logical.starts_with('!') {
            continue;
        }
        while ends_with_continuation(&logical) {
            logical.pop();
            match lines.next() {
                Some(next) => logical.push_str(next.trim_start()),
                None => break,
            }
        }
        let (key, value) = split_key_value(&logical);
        map.insert(unescape(key), unescape(value));
    }
    map
}

fn ends_with_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|c| *c == '\\').count() % 2 == 1
}

fn split_key_value(line: &str) -> (&str, &str) {
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' => return (&line[..i], line[i + 1..].trim_start()),
            c if c.is_whitespace() => {
                let rest = line[i..].trim_start();
                let rest = rest
                    .strip_prefix('=')
                    .or_else(|| rest.strip_prefix(':'))
                    .unwrap_or(rest);
                return (&line[..i], rest.trim_start());
            }
            _ => {}
        }
    }
    (line, "")
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{000C}'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => {
                        out.push_str("\\u");
                        out.push_str(&hex);
                    }
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separators_and_comments() {
        let map = parse_properties(
            "# comment\n! also comment\na=1\nb: 2\nc 3\nd = spaced value  \n\n",
        );
        assert_eq!(map.get("a").map(String::as_str), Some("1"));
        assert_eq!(map.get("b").map(String::as_str), Some("2"));
        assert_eq!(map.get("c").map(String::as_str), Some("3"));
        assert_eq!(map.get("d").map(String::as_str), Some("spaced value  "));
        assert_eq!(map.len(), 4);
    }

    #[test]
    fn continuation_lines_are_joined() {
        let map = parse_properties("long = first \\\n    second\n");
        assert_eq!(map.get("long").map(String::as_str), Some("first second"));
    }

    #[test]
    fn escapes_are_decoded() {
        let map = parse_properties("key\\ with\\ space = caf\\u00e9\\tx\n");
        assert_eq!(map.get("key with space").map(String::as_str), Some("café\tx"));
    }

    #[test]
    fn blank_names_become_none_and_positions_default() {
        let mut map = BTreeMap::new();
        map.insert("category.title".to_string(), "  ".to_string());
        map.insert("section.title".to_string(), "S".to_string());
        let set = LocalDirectiveSet::from_map(&map, &DirectiveKeys::default()).unwrap();
        assert_eq!(set.category_name, None);
        assert_eq!(set.section_name.as_deref(), Some("S"));
        assert_eq!(set.category_position, 0);
        assert!(!set.is_empty());
    }

    #[test]
    fn non_numeric_position_is_invalid() {
        let mut map = BTreeMap::new();
        map.insert("category.title".to_string(), "A".to_string());
        map.insert("category.position".to_string(), "first".to_string());
        let err = LocalDirectiveSet::from_map(&map, &DirectiveKeys::default()).unwrap_err();
        assert!(matches!(err, CoreError::InvalidDirective { .. }));
    }
}
