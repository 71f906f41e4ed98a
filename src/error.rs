//! Custom error types for rustieee.
//!
//! This module defines all error types used throughout the application.
//! All functions return `Result<T, IeeeError>` instead of using `unwrap()`.
//! Each failure class maps to its own process exit code, see [`IeeeError::exit_code`].

use std::path::PathBuf;
use thiserror::Error;

/// Exit code for scraping failures (browser launch, navigation, extraction).
pub const EXIT_SCRAPE: i32 = 2;
/// Exit code for IEEE API failures.
pub const EXIT_API: i32 = 3;
/// Exit code when a combination input file does not exist.
pub const EXIT_MISSING_INPUT: i32 = 4;
/// Exit code for unreadable or malformed result files.
pub const EXIT_MALFORMED_INPUT: i32 = 5;
/// Exit code for failures writing JSON or spreadsheet output.
pub const EXIT_WRITE: i32 = 6;
/// Exit code for invalid arguments detected after parsing (EX_USAGE).
pub const EXIT_USAGE: i32 = 64;

/// Main error type for rustieee operations.
///
/// Uses `thiserror` for ergonomic error handling and automatic `Display` implementation.
#[derive(Debug, Error)]
pub enum IeeeError {
    /// Browser automation error (Chromium)
    #[error("Browser error: {0}")]
    Browser(String),

    /// A bounded wait for a page element expired
    #[error("Timed out after {timeout_secs}s waiting for '{selector}'")]
    Timeout {
        /// CSS selector that never appeared
        selector: String,
        /// Wait bound in seconds
        timeout_secs: u64,
    },

    /// Network/HTTP request error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// External API returned an error status
    #[error("API error: {code} - {message}")]
    Api {
        /// HTTP status code
        code: u16,
        /// Error message from API
        message: String,
    },

    /// HTML parsing error
    #[error("Parse error: {0}")]
    Parse(String),

    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Output file could not be written
    #[error("Error writing {}: {message}", .path.display())]
    Write {
        /// Destination path
        path: PathBuf,
        /// Underlying failure
        message: String,
    },

    /// Combination input that does not exist
    #[error("{}: no such file or directory", .0.display())]
    MissingFile(PathBuf),

    /// A set operator received fewer lists than it needs
    #[error("Insufficient operands: '{operator}' needs {needed}, got {got}")]
    InsufficientOperands {
        /// Operator name as used on the command line
        operator: &'static str,
        /// Human readable requirement, e.g. "at least two files"
        needed: &'static str,
        /// Number of lists supplied
        got: usize,
    },

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl IeeeError {
    /// Process exit code for this failure class.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Browser(_) | Self::Timeout { .. } | Self::Parse(_) => EXIT_SCRAPE,
            Self::Network(_) | Self::Api { .. } => EXIT_API,
            Self::MissingFile(_) => EXIT_MISSING_INPUT,
            Self::Io(_) | Self::Json(_) => EXIT_MALFORMED_INPUT,
            Self::Write { .. } => EXIT_WRITE,
            Self::InsufficientOperands { .. } | Self::Config(_) | Self::Validation(_) => EXIT_USAGE,
        }
    }

    /// Whether this is a bounded-wait expiry rather than a hard failure.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Result type alias using `IeeeError`
pub type Result<T> = std::result::Result<T, IeeeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_are_distinct_per_class() {
        let scrape = IeeeError::Browser("crashed".into()).exit_code();
        let api = IeeeError::Api {
            code: 403,
            message: "forbidden".into(),
        }
        .exit_code();
        let write = IeeeError::Write {
            path: PathBuf::from("out.json"),
            message: "read-only".into(),
        }
        .exit_code();

        assert_eq!(scrape, EXIT_SCRAPE);
        assert_eq!(api, EXIT_API);
        assert_eq!(write, EXIT_WRITE);
        assert_ne!(scrape, api);
        assert_ne!(api, write);
    }

    #[test]
    fn test_missing_file_message_names_path() {
        let err = IeeeError::MissingFile(PathBuf::from("results/a.json"));
        assert_eq!(err.to_string(), "results/a.json: no such file or directory");
        assert_eq!(err.exit_code(), EXIT_MISSING_INPUT);
    }
}
