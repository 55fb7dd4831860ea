//! Error types for Orderdesk.
//!
//! Library crates use [`OrderdeskError`] via `thiserror`.
//! The CLI app crate wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all Orderdesk operations.
#[derive(Debug, thiserror::Error)]
pub enum OrderdeskError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// The input path names no eligible order documents.
    #[error("no eligible input documents at {path:?}")]
    InputNotFound { path: PathBuf },

    /// The template descriptor does not exist.
    #[error("template not found: {path:?}")]
    TemplateNotFound { path: PathBuf },

    /// A collaborator failure while extracting from the document set.
    #[error("extraction error: {0}")]
    Extraction(String),

    /// Document or configuration content could not be parsed.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Data validation error (bad rule pattern, malformed mapping, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Filesystem I/O error. Output and learning-store write failures are
    /// fatal and abort the run.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, OrderdeskError>;

impl OrderdeskError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
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

    /// An input path that resolved to no eligible documents.
    pub fn input_not_found(path: impl Into<PathBuf>) -> Self {
        Self::InputNotFound { path: path.into() }
    }

    /// A missing template descriptor.
    pub fn template_not_found(path: impl Into<PathBuf>) -> Self {
        Self::TemplateNotFound { path: path.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = OrderdeskError::config("missing output dir");
        assert_eq!(err.to_string(), "config error: missing output dir");

        let err = OrderdeskError::input_not_found("/tmp/no-such-dir");
        assert!(err.to_string().contains("no-such-dir"));

        let err = OrderdeskError::template_not_found("templates/standard.json");
        assert!(err.to_string().contains("template not found"));
    }
}
