//! Error types for the xcreport library.
//!
//! Extraction itself never fails: malformed result trees degrade to empty or
//! default records. These error types cover the surrounding plumbing where
//! failures must reach the caller: file I/O, JSON (de)serialization, external
//! tool invocation, and argument validation.

use std::io;

use thiserror::Error;

/// Main result type for xcreport operations.
pub type Result<T> = std::result::Result<T, XcreportError>;

/// Error type for all fallible xcreport operations.
#[derive(Error, Debug)]
pub enum XcreportError {
    /// I/O related errors (file operations, process spawning)
    #[error("I/O error: {message}")]
    Io {
        /// Human-readable error message
        message: String,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {message}")]
    Json {
        /// Error description
        message: String,
        /// Underlying serde error
        #[source]
        source: Option<serde_json::Error>,
    },

    /// External tool invocation errors (xcresulttool, xccov)
    #[error("Tool error running {tool}: {message}")]
    Tool {
        /// Tool that failed
        tool: String,
        /// Error description
        message: String,
    },

    /// Validation errors for input data and arguments
    #[error("Validation error: {message}")]
    Validation {
        /// Error description
        message: String,
    },
}

impl XcreportError {
    /// Create a new I/O error with context
    pub fn io(message: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create a new external tool error
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Tool {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

impl From<io::Error> for XcreportError {
    fn from(err: io::Error) -> Self {
        Self::io("I/O operation failed", err)
    }
}

impl From<serde_json::Error> for XcreportError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json {
            message: format!("JSON serialization failed: {err}"),
            source: Some(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = XcreportError::validation("bad argument");
        assert!(matches!(err, XcreportError::Validation { .. }));

        let err = XcreportError::tool("xcresulttool", "non-zero exit");
        assert!(matches!(err, XcreportError::Tool { .. }));
    }

    #[test]
    fn test_io_error_preserves_kind() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "missing bundle");
        let err = XcreportError::io("failed to read bundle", io_err);

        if let XcreportError::Io { message, source } = &err {
            assert_eq!(message, "failed to read bundle");
            assert_eq!(source.kind(), io::ErrorKind::NotFound);
        } else {
            panic!("expected Io error");
        }
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<i32>("not json").unwrap_err();
        let err: XcreportError = json_err.into();
        assert!(matches!(err, XcreportError::Json { .. }));
    }

    #[test]
    fn test_error_display_formatting() {
        let err = XcreportError::tool("xccov", "timed out after 120s");
        let display = format!("{err}");
        assert!(display.contains("xccov"));
        assert!(display.contains("timed out"));
    }
}
