//! Content documents and their comment-line headers.
//!
//! A content file declares its metadata in comment lines at any position:
//!
//! ```text
//! // title: Installing the agent
//! // title-old: Agent installation
//! // position: 3
//! // tags: setup, agent
//! // draft
//! ```
//!
//! Boolean headers given without a value mean `true`.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{io_err, CoreError};
use crate::types::HierarchyContext;

/// Position assigned to documents that declare none; sorts them last.
pub const DEFAULT_POSITION: i64 = i32::MAX as i64;

/// Header names recognised in content files (matched case-insensitively).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeaderKeys {
    pub title: String,
    pub old_title: String,
    pub position: String,
    pub draft: String,
    pub promoted: String,
    pub hidden: String,
    pub tags: String,
}

impl Default for HeaderKeys {
    fn default() -> Self {
        Self {
            title: "title".into(),
            old_title: "title-old".into(),
            position: "position".into(),
            draft: "draft".into(),
            promoted: "promoted".into(),
            hidden: "hidden".into(),
            tags: "tags".into(),
        }
    }
}

/// One local content unit.
///
/// Built by [`Document::read`]; the rendered body is attached once with
/// [`Document::with_rendered_body`] and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub source_path: PathBuf,
    pub category: String,
    pub section: String,
    pub title: String,
    pub old_title: Option<String>,
    pub position: i64,
    pub draft: bool,
    pub promoted: bool,
    pub hidden: bool,
    pub tags: BTreeSet<String>,
    rendered_body: Option<String>,
}

impl Document {
    /// Read and parse `path`, recording the hierarchy it is published under.
    pub fn read(
        path: &Path,
        hierarchy: &HierarchyContext,
        keys: &HeaderKeys,
    ) -> Result<Self, CoreError> {
        let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
        Self::parse(path, &contents, hierarchy, keys)
    }

    /// Parse already-loaded file contents.
    pub fn parse(
        path: &Path,
        contents: &str,
        hierarchy: &HierarchyContext,
        keys: &HeaderKeys,
    ) -> Result<Self, CoreError> {
        let headers = Headers::collect(contents);

        let title = headers
            .value(&keys.title)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| CoreError::MissingTitle {
                path: path.to_path_buf(),
            })?
            .to_owned();

        let position = match headers.value(&keys.position) {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!(
                    "ignoring non-numeric position '{}' in {}",
                    raw,
                    path.display()
                );
                DEFAULT_POSITION
            }),
            None => DEFAULT_POSITION,
        };

        let tags = headers
            .value(&keys.tags)
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default();

        let document = Self {
            source_path: path.to_path_buf(),
            category: hierarchy
                .category()
                .map(|c| c.name.clone())
                .unwrap_or_default(),
            section: hierarchy
                .section()
                .map(|s| s.name.clone())
                .unwrap_or_default(),
            title,
            old_title: headers
                .value(&keys.old_title)
                .filter(|t| !t.is_empty())
                .map(str::to_owned),
            position,
            draft: headers.flag(&keys.draft),
            promoted: headers.flag(&keys.promoted),
            hidden: headers.flag(&keys.hidden),
            tags,
            rendered_body: None,
        };

        if !document.title_matches_file_name() {
            tracing::warn!(
                "document title does not match file name: '{}' - '{}'",
                document.title,
                path.file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default()
            );
        }

        Ok(document)
    }

    /// Title used to find the remote article: the old title while a rename
    /// is pending, the current title otherwise.
    pub fn lookup_title(&self) -> &str {
        self.old_title.as_deref().unwrap_or(&self.title)
    }

    /// `true` when the file's base name (spaces as underscores) equals the
    /// title, ignoring case.
    pub fn title_matches_file_name(&self) -> bool {
        let stem = self
            .source_path
            .file_stem()
            .map(|s| s.to_string_lossy().replace(' ', "_"))
            .unwrap_or_default();
        stem.eq_ignore_ascii_case(&self.title.replace(' ', "_"))
    }

    pub fn with_rendered_body(mut self, body: String) -> Self {
        self.rendered_body = Some(body);
        self
    }

    pub fn rendered_body(&self) -> Option<&str> {
        self.rendered_body.as_deref()
    }
}

/// `true` if `path` has one of `extensions` (compared case-insensitively,
/// without the leading dot).
pub fn is_content_file(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| extensions.iter().any(|x| x.eq_ignore_ascii_case(ext)))
}

// ---------------------------------------------------------------------------
// Header scanning
// ---------------------------------------------------------------------------

struct Headers<'a> {
    entries: Vec<(String, &'a str)>,
}

impl<'a> Headers<'a> {
    fn collect(contents: &'a str) -> Self {
        let entries = contents
            .lines()
            .filter_map(|line| line.strip_prefix("//"))
            .map(|rest| rest.trim_start_matches('/').trim())
            .filter(|rest| !rest.is_empty())
            .map(|rest| match rest.split_once(':') {
                Some((k, v)) => (k.trim().to_ascii_lowercase(), v.trim()),
                None => (rest.to_ascii_lowercase(), ""),
            })
            .collect();
        Self { entries }
    }

    /// First value declared for `key`.
    fn value(&self, key: &str) -> Option<&'a str> {
        let key = key.to_ascii_lowercase();
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| *v)
    }

    fn flag(&self, key: &str) -> bool {
        match self.value(key) {
            None => false,
            Some("") => true,
            Some(v) => v.eq_ignore_ascii_case("true") || v.eq_ignore_ascii_case("yes"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(name: &str, text: &str) -> Result<Document, CoreError> {
        Document::parse(
            Path::new(name),
            text,
            &HierarchyContext::new(),
            &HeaderKeys::default(),
        )
    }

    #[test]
    fn reads_all_headers() {
        let doc = parse(
            "docs/Install_Guide.adoc",
            "// title: Install Guide\n// title-old: Setup\n// position: 4\n// draft\n\
             // promoted: false\n// tags: a, b ,, c\n= Install Guide\n\nBody text.\n",
        )
        .unwrap();
        assert_eq!(doc.title, "Install Guide");
        assert_eq!(doc.old_title.as_deref(), Some("Setup"));
        assert_eq!(doc.lookup_title(), "Setup");
        assert_eq!(doc.position, 4);
        assert!(doc.draft);
        assert!(!doc.promoted);
        assert!(!doc.hidden);
        assert_eq!(
            doc.tags.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["a", "b", "c"]
        );
        assert!(doc.title_matches_file_name());
        assert!(doc.rendered_body().is_none());
    }

    #[test]
    fn missing_title_is_an_error() {
        let err = parse("x.adoc", "no headers here\n").unwrap_err();
        assert!(matches!(err, CoreError::MissingTitle { .. }));
    }

    #[test]
    fn defaults_when_headers_absent() {
        let doc = parse("x.adoc", "// title: X\n").unwrap();
        assert_eq!(doc.position, DEFAULT_POSITION);
        assert_eq!(doc.old_title, None);
        assert_eq!(doc.lookup_title(), "X");
        assert!(doc.tags.is_empty());
    }

    #[test]
    fn blank_old_title_is_ignored() {
        let doc = parse("x.adoc", "// title: X\n// title-old:   \n").unwrap();
        assert_eq!(doc.old_title, None);
    }

    #[test]
    fn title_mismatch_is_not_fatal() {
        let doc = parse("other name.adoc", "// title: Something Else\n").unwrap();
        assert!(!doc.title_matches_file_name());
    }

    #[test]
    fn content_extension_match_is_case_insensitive() {
        let exts = vec!["adoc".to_string(), "asciidoc".to_string()];
        assert!(is_content_file(Path::new("a/b.ADOC"), &exts));
        assert!(is_content_file(Path::new("b.asciidoc"), &exts));
        assert!(!is_content_file(Path::new("b.md"), &exts));
        assert!(!is_content_file(Path::new(".properties"), &exts));
    }
}
