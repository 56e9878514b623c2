//! Error types for the pagesift crate

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::extractor::Strategy;

/// Result type for pagesift operations
pub type Result<T> = std::result::Result<T, Error>;

/// One failed extraction attempt, kept so callers can see why a URL failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedAttempt {
    /// Strategy that was tried
    pub strategy: Strategy,

    /// Why the attempt produced no usable body text
    pub reason: String,
}

impl fmt::Display for FailedAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.strategy, self.reason)
    }
}

/// Error type for pagesift operations
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed URL or out-of-range option; never retried
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// No strategy, including the generic fallback, yielded body text
    #[error("Extraction failed for {url}: {}", describe_attempts(.attempts))]
    ExtractionFailure {
        /// URL whose extraction failed
        url: String,
        /// Attempts in the order they ran
        attempts: Vec<FailedAttempt>,
    },

    /// Configuration could not be loaded or is inconsistent
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("HTTP status {status} for {url}")]
    Status {
        /// Requested URL
        url: String,
        /// Status code returned by the server
        status: u16,
    },

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Filesystem error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether a fetch that failed with this error is worth retrying
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Error::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

fn describe_attempts(attempts: &[FailedAttempt]) -> String {
    if attempts.is_empty() {
        return "no strategy attempted".to_string();
    }
    attempts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extraction_failure_lists_attempts() {
        let err = Error::ExtractionFailure {
            url: "https://en.wikipedia.org/wiki/Empty".to_string(),
            attempts: vec![
                FailedAttempt {
                    strategy: Strategy::Wikipedia,
                    reason: "missing container".to_string(),
                },
                FailedAttempt {
                    strategy: Strategy::Generic,
                    reason: "empty body".to_string(),
                },
            ],
        };

        let message = err.to_string();
        assert!(message.contains("https://en.wikipedia.org/wiki/Empty"));
        assert!(message.contains("wikipedia: missing container"));
        assert!(message.contains("generic: empty body"));
    }

    #[test]
    fn test_status_transience() {
        let server_error = Error::Status {
            url: "https://example.com".to_string(),
            status: 503,
        };
        let not_found = Error::Status {
            url: "https://example.com".to_string(),
            status: 404,
        };
        let throttled = Error::Status {
            url: "https://example.com".to_string(),
            status: 429,
        };

        assert!(server_error.is_transient());
        assert!(throttled.is_transient());
        assert!(!not_found.is_transient());
        assert!(!Error::InvalidInput("bad".to_string()).is_transient());
    }
}
