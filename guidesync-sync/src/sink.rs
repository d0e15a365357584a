//! Print-only side channel.
//!
//! [`StdoutSink`] prints a header block and the rendered body for each
//! document. [`DirectorySink`] mirrors the content tree under an output
//! directory, one `.html` file per document, written atomically
//! (`<path>.guidesync.tmp` then rename).

use std::io::Write;
use std::path::{Path, PathBuf};

use guidesync_core::Document;

use crate::error::{io_err, SyncError};

const RULE: &str =
    "-------------------------------------------------------------------------------------";

/// Destination for documents rendered in print-only mode.
pub trait PrintSink: Send + Sync {
    fn emit(&self, document: &Document, body: &str) -> Result<(), SyncError>;
}

/// Header block shown before a printed body.
pub fn header_block(document: &Document, indent: &str) -> String {
    let tags: Vec<&str> = document.tags.iter().map(String::as_str).collect();
    let mut out = String::new();
    let mut line = |label: &str, value: &str| {
        out.push_str(&format!("{indent}{label:<10}: {value}\n"));
    };
    line("file", &document.source_path.display().to_string());
    line("category", &document.category);
    line("section", &document.section);
    line("title", &document.title);
    if let Some(old) = &document.old_title {
        line("old title", old);
    }
    line("position", &document.position.to_string());
    line("draft", &document.draft.to_string());
    line("promoted", &document.promoted.to_string());
    line("tags", &tags.join(", "));
    out
}

// ---------------------------------------------------------------------------
// StdoutSink
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl PrintSink for StdoutSink {
    fn emit(&self, document: &Document, body: &str) -> Result<(), SyncError> {
        let text = format!("{RULE}\n{}{body}\n", header_block(document, "    "));
        // One write per document so parallel workers do not interleave.
        let mut stdout = std::io::stdout().lock();
        stdout
            .write_all(text.as_bytes())
            .and_then(|()| stdout.flush())
            .map_err(|e| io_err(&document.source_path, e))
    }
}

// ---------------------------------------------------------------------------
// DirectorySink
// ---------------------------------------------------------------------------

/// Writes `<out_dir>/<path relative to content_root>.html`.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    content_root: PathBuf,
    out_dir: PathBuf,
}

impl DirectorySink {
    pub fn new(content_root: impl Into<PathBuf>, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            content_root: content_root.into(),
            out_dir: out_dir.into(),
        }
    }

    /// Output path for a source file. Files outside the content root are
    /// placed by file name only.
    pub fn target_for(&self, source: &Path) -> PathBuf {
        let relative = source
            .strip_prefix(&self.content_root)
            .ok()
            .map(Path::to_path_buf)
            .or_else(|| source.file_name().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("document"));
        self.out_dir.join(relative).with_extension("html")
    }
}

impl PrintSink for DirectorySink {
    fn emit(&self, document: &Document, body: &str) -> Result<(), SyncError> {
        let target = self.target_for(&document.source_path);
        atomic_write(&target, body)?;
        tracing::info!("wrote: {}", target.display());
        Ok(())
    }
}

/// Write `content` to `path` through a sibling temp file and a rename.
pub(crate) fn atomic_write(path: &Path, content: &str) -> Result<(), SyncError> {
    let normalized = content.replace("\r\n", "\n");
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }
    let tmp = PathBuf::from(format!("{}.guidesync.tmp", path.display()));
    std::fs::write(&tmp, normalized).map_err(|e| io_err(&tmp, e))?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(path, e));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
