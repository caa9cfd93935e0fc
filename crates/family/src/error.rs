//! Errors for family assembly.

use std::path::PathBuf;
use toolscribe_core::GenerationError;

#[derive(Debug, thiserror::Error)]
pub enum FamilyError {
    #[error("Failed to read {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    #[error("Failed to write {path}: {reason}")]
    Write { path: PathBuf, reason: String },

    #[error("Failed to create directory {path}: {reason}")]
    CreateDir { path: PathBuf, reason: String },

    /// A generation step failed for one family. Fails that family only.
    #[error("{step} generation failed for family '{family}': {source}")]
    Generation {
        family: String,
        step: &'static str,
        #[source]
        source: GenerationError,
    },
}

impl FamilyError {
    /// True when the failure was a cancellation request.
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            FamilyError::Generation {
                source: GenerationError::Cancelled,
                ..
            }
        )
    }
}
