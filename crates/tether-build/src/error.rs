/// Binding generation error types
use std::path::PathBuf;
use thiserror::Error;

pub type BuildResult<T> = Result<T, BuildError>;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Failed to read native source {path}: {error}")]
    SourceRead {
        path: PathBuf,
        error: std::io::Error,
    },

    #[error("I/O error at {path}: {error}")]
    IoError {
        path: PathBuf,
        error: std::io::Error,
    },

    #[error("Invalid generator option '{option}': {reason}")]
    InvalidOption {
        option: &'static str,
        reason: String,
    },

    #[error("Invalid output path: {0}")]
    InvalidOutput(PathBuf),

    #[error("Invalid markers: {0}")]
    InvalidMarkers(&'static str),

    #[error("Cannot generate binding for '{function}': {reason}")]
    Generation { function: String, reason: String },
}

impl BuildError {
    /// Create a source read error
    pub fn source_read(path: impl Into<PathBuf>, error: std::io::Error) -> Self {
        Self::SourceRead {
            path: path.into(),
            error,
        }
    }

    /// Create an I/O error with path context
    pub fn io(path: impl Into<PathBuf>, error: std::io::Error) -> Self {
        Self::IoError {
            path: path.into(),
            error,
        }
    }

    /// Create an invalid option error
    pub fn invalid_option(option: &'static str, reason: impl ToString) -> Self {
        Self::InvalidOption {
            option,
            reason: reason.to_string(),
        }
    }

    /// Create a generation error
    pub fn generation(function: impl Into<String>, reason: impl ToString) -> Self {
        Self::Generation {
            function: function.into(),
            reason: reason.to_string(),
        }
    }
}
