//! Error types for guidesync-sync.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that stop a run before the walk starts, or a single print.
///
/// Failures inside the walk never surface here; they are tallied.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The content root is missing or not a directory.
    #[error("content root {path} is not a directory")]
    RootNotFound { path: PathBuf },

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
