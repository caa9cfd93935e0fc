//! Errors for the per-tool document stages.

use std::path::PathBuf;

/// Failures that abort a single file (or, for directory errors, a whole stage).
///
/// A missing fragment is never an error; it is recorded on the composed tool.
#[derive(Debug, thiserror::Error)]
pub enum ComposeError {
    #[error("Failed to read {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    #[error("Failed to write {path}: {reason}")]
    Write { path: PathBuf, reason: String },

    #[error("Failed to create directory {path}: {reason}")]
    CreateDir { path: PathBuf, reason: String },

    #[error("Template error: {0}")]
    Template(String),

    #[error("Failed to render front matter: {0}")]
    FrontMatter(#[from] serde_yaml::Error),
}

impl ComposeError {
    pub(crate) fn read(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            reason: err.to_string(),
        }
    }

    pub(crate) fn write(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            reason: err.to_string(),
        }
    }
}

/// Create a stage output directory (and parents).
pub(crate) fn ensure_dir(path: &std::path::Path) -> Result<(), ComposeError> {
    std::fs::create_dir_all(path).map_err(|e| ComposeError::CreateDir {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}
