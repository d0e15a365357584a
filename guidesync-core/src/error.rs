//! Error types for guidesync-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from reading local metadata and settings.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Underlying I/O failure, with the path that was being read.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error on settings load, with file path and line context.
    #[error("failed to parse settings at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// `dirs::home_dir()` returned `None`.
    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,

    /// The settings file did not exist at the expected path.
    #[error("settings not found at {path}")]
    SettingsNotFound { path: PathBuf },

    /// A directive value could not be interpreted (e.g. a non-numeric position).
    #[error("invalid directive '{key}' = '{value}'")]
    InvalidDirective { key: String, value: String },

    /// A content file declares no title and cannot be published.
    #[error("document {path} has no title")]
    MissingTitle { path: PathBuf },
}

/// Convenience constructor for [`CoreError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> CoreError {
    CoreError::Io {
        path: path.into(),
        source,
    }
}
