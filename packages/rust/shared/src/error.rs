//! Error types for Quantifying.
//!
//! Library crates use [`QuantifyingError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` and maps each kind to an exit code.

use std::path::PathBuf;

/// Top-level error type for all Quantifying operations.
#[derive(Debug, thiserror::Error)]
pub enum QuantifyingError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Caller supplied an inconsistent combination of arguments.
    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    /// The document on disk broke a marker pair (missing or misordered marker).
    #[error("document integrity error in {path:?}: {message}")]
    Integrity { path: PathBuf, message: String },

    /// A value could not be parsed (e.g. a malformed quarter label).
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The repository path exists but is not a git work tree.
    #[error("Invalid Git repository at {}", path.display())]
    InvalidRepository { path: PathBuf },

    /// The repository path does not exist.
    #[error("No such path: {}", path.display())]
    NoSuchPath { path: PathBuf },

    /// A git command failed.
    #[error("{message}")]
    Git { message: String, exit_code: i32 },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, QuantifyingError>;

impl QuantifyingError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create an invalid-input error from any displayable message.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: msg.into(),
        }
    }

    /// Create a document-integrity error for the document at `path`.
    pub fn integrity(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::Integrity {
            path: path.into(),
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a git error with the generic failure exit code.
    pub fn git(msg: impl Into<String>) -> Self {
        Self::Git {
            message: msg.into(),
            exit_code: 1,
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Process exit code the CLI should terminate with for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidRepository { .. } => 2,
            Self::NoSuchPath { .. } => 3,
            Self::Git { exit_code, .. } => *exit_code,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = QuantifyingError::config("could not determine home directory");
        assert_eq!(
            err.to_string(),
            "config error: could not determine home directory"
        );

        let err = QuantifyingError::invalid_input("caption without image path");
        assert!(err.to_string().contains("caption without image path"));

        let err = QuantifyingError::NoSuchPath {
            path: PathBuf::from("/nowhere"),
        };
        assert_eq!(err.to_string(), "No such path: /nowhere");
    }

    #[test]
    fn exit_codes_follow_error_kind() {
        let invalid = QuantifyingError::InvalidRepository {
            path: PathBuf::from("/tmp"),
        };
        assert_eq!(invalid.exit_code(), 2);

        let missing = QuantifyingError::NoSuchPath {
            path: PathBuf::from("/tmp/missing"),
        };
        assert_eq!(missing.exit_code(), 3);

        assert_eq!(QuantifyingError::git("push rejected").exit_code(), 1);
        assert_eq!(QuantifyingError::invalid_input("x").exit_code(), 1);
        assert_eq!(
            QuantifyingError::integrity("README.md", "missing end marker").exit_code(),
            1
        );
    }
}
