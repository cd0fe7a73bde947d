//! Error types for parcorpus.
//!
//! Library crates use [`CorpusError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all corpus operations.
#[derive(Debug, thiserror::Error)]
pub enum CorpusError {
    /// An example file did not contain exactly two lines.
    #[error("malformed example {path:?}: expected 2 lines, found {line_count}")]
    MalformedExample { path: PathBuf, line_count: usize },

    /// The machine and English sequences ended up with different lengths.
    #[error("alignment mismatch: {machine} machine lines vs {english} english lines")]
    AlignmentMismatch { machine: usize, english: usize },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, CorpusError>;

impl CorpusError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn malformed(path: impl Into<PathBuf>, line_count: usize) -> Self {
        Self::MalformedExample {
            path: path.into(),
            line_count,
        }
    }
}
