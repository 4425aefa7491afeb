//! Error type for the development tools.

use std::path::PathBuf;

use imperium_core::error::GameError;
use thiserror::Error;

/// Result type alias using [`ToolError`].
pub type Result<T> = std::result::Result<T, ToolError>;

/// Errors raised by the tools.
#[derive(Debug, Error)]
pub enum ToolError {
    /// A file could not be read or written.
    #[error("{path}: {source}")]
    Io {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// A script file failed to parse.
    #[error("Failed to parse script '{path}': {message}")]
    ScriptParse {
        /// Script path.
        path: PathBuf,
        /// Parser message.
        message: String,
    },

    /// One or more data files failed validation.
    #[error("{failed} of {checked} data files failed validation")]
    ValidationFailed {
        /// Files checked.
        checked: usize,
        /// Files with errors.
        failed: usize,
    },

    /// Error from the simulation core.
    #[error(transparent)]
    Game(#[from] GameError),
}

impl ToolError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
