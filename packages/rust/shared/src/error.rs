//! Error types for Salescope.
//!
//! Library crates use [`SalescopeError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.
//!
//! Data-quality defects in a pipeline payload are never errors: they are
//! reported as [`Issue`](crate::Issue)s inside the completeness report.

use std::path::PathBuf;

/// Top-level error type for all Salescope operations.
#[derive(Debug, thiserror::Error)]
pub enum SalescopeError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Input is not valid JSON.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Input is JSON but cannot be interpreted as a pipeline payload at all.
    #[error("invalid payload: {message}")]
    Payload { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Report or summary serialization error.
    #[error("serialize error: {0}")]
    Serialize(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, SalescopeError>;

impl SalescopeError {
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

    /// Create a payload-shape error from any displayable message.
    pub fn payload(msg: impl Into<String>) -> Self {
        Self::Payload {
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

    /// Whether the caller handed over input that could not be interpreted.
    ///
    /// These map to a 400-class response at a transport boundary.
    pub fn is_caller_error(&self) -> bool {
        matches!(self, Self::Parse { .. } | Self::Payload { .. })
    }
}

impl From<serde_json::Error> for SalescopeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialize(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = SalescopeError::config("unknown item_key policy");
        assert_eq!(err.to_string(), "config error: unknown item_key policy");

        let err = SalescopeError::payload("expected a JSON object, got array");
        assert!(err.to_string().contains("got array"));
    }

    #[test]
    fn caller_errors_are_parse_and_payload() {
        assert!(SalescopeError::parse("eof").is_caller_error());
        assert!(SalescopeError::payload("not an object").is_caller_error());
        assert!(!SalescopeError::config("bad").is_caller_error());
        assert!(!SalescopeError::Serialize("x".into()).is_caller_error());
    }
}
