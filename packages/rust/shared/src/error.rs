//! Error types for Prospector.
//!
//! Library crates use [`ProspectorError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all Prospector operations.
#[derive(Debug, thiserror::Error)]
pub enum ProspectorError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error while talking to a page or the model provider.
    #[error("network error: {0}")]
    Network(String),

    /// Structured extraction error (provider response, schema mismatch).
    #[error("extraction error: {0}")]
    Extraction(String),

    /// A company name could not be turned into a website URL.
    #[error("resolution error: {0}")]
    Resolution(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Input validation error (inconsistent ICP, bad record, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ProspectorError>;

impl ProspectorError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
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
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = ProspectorError::config("missing API key");
        assert_eq!(err.to_string(), "config error: missing API key");

        let err = ProspectorError::validation("company_size_min 500 exceeds company_size_max 50");
        assert!(err.to_string().contains("exceeds company_size_max"));

        let err = ProspectorError::Resolution("empty company name".into());
        assert_eq!(err.to_string(), "resolution error: empty company name");
    }

    #[test]
    fn display_prefix_names_the_variant() {
        let errors = [
            ProspectorError::config("x"),
            ProspectorError::Network("x".into()),
            ProspectorError::Extraction("x".into()),
            ProspectorError::Resolution("x".into()),
            ProspectorError::io("/tmp/x", std::io::Error::other("x")),
            ProspectorError::validation("x"),
        ];
        for err in errors {
            let prefix = match &err {
                ProspectorError::Config { .. } => "config error",
                ProspectorError::Network(_) => "network error",
                ProspectorError::Extraction(_) => "extraction error",
                ProspectorError::Resolution(_) => "resolution error",
                ProspectorError::Io { .. } => "I/O error",
                ProspectorError::Validation { .. } => "validation error",
            };
            assert!(err.to_string().starts_with(prefix), "{err}");
        }
    }
}
