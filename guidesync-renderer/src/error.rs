//! Error types for guidesync-renderer.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise while rendering a document.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Tera template engine error.
    #[error("template engine error: {0}")]
    Tera(#[from] tera::Error),

    /// JSON serialization error (building tera context).
    #[error("context serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Filesystem error while reading a document or user templates.
    #[error("render io error at {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },

    /// Rendering produced no publishable content.
    #[error("document {path} rendered to an empty body")]
    Empty { path: PathBuf },
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> RenderError {
    RenderError::Io { path: path.into(), source }
}
