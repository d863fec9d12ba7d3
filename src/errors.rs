//! Crate error taxonomy and per-request failure classification.
//!
//! Fatal errors (bad configuration, unusable proxy list) abort before any
//! worker starts. Per-request failures are classified into categories for
//! logging and metrics, counted, and dropped at the dispatcher boundary:
//! this tool has no retry policy.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for the generator.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid CLI input. Reported with usage and exit code 1.
    #[error("configuration error: {0}")]
    Config(String),

    /// The proxy list could not be read at startup.
    #[error("failed to read proxy list '{}': {}", path.display(), source)]
    ProxyFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A proxy draw was attempted against an empty pool.
    #[error("proxy pool is empty")]
    EmptyPool,

    /// An HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    /// The session snapshot could not be serialized.
    #[error("failed to encode session: {0}")]
    SessionEncode(#[from] serde_json::Error),

    /// The serialized session could not be written to disk.
    #[error("failed to persist session to '{}': {}", path.display(), source)]
    SessionWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Categories of per-request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureCategory {
    /// HTTP 4xx responses
    ClientError,

    /// HTTP 5xx responses
    ServerError,

    /// Connectivity failures (DNS, refused connections, dead proxies)
    NetworkError,

    /// Request timeouts
    TimeoutError,

    /// Anything else
    OtherError,
}

impl FailureCategory {
    /// Categorize an HTTP status code. Returns None for success (2xx/3xx).
    pub fn from_status_code(status_code: u16) -> Option<Self> {
        match status_code {
            200..=399 => None,
            400..=499 => Some(FailureCategory::ClientError),
            500..=599 => Some(FailureCategory::ServerError),
            _ => Some(FailureCategory::OtherError),
        }
    }

    /// Categorize a transport-level reqwest error.
    pub fn from_reqwest_error(error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            FailureCategory::TimeoutError
        } else if error.is_connect() || error.is_request() {
            FailureCategory::NetworkError
        } else if error.is_body() || error.is_decode() {
            // Body errors mid-transfer are connectivity problems in practice
            FailureCategory::NetworkError
        } else {
            FailureCategory::OtherError
        }
    }

    /// Prometheus label for this category.
    pub fn label(&self) -> &'static str {
        match self {
            FailureCategory::ClientError => "client_error",
            FailureCategory::ServerError => "server_error",
            FailureCategory::NetworkError => "network_error",
            FailureCategory::TimeoutError => "timeout_error",
            FailureCategory::OtherError => "other_error",
        }
    }
}

/// A single failed request attempt, resolved and never retried.
#[derive(Debug, Clone)]
pub struct RequestFailure {
    pub category: FailureCategory,
    pub status_code: Option<u16>,
    pub message: String,
}

impl RequestFailure {
    /// Failure from a non-success HTTP status.
    pub fn from_status(status: reqwest::StatusCode) -> Self {
        let category = FailureCategory::from_status_code(status.as_u16())
            .unwrap_or(FailureCategory::OtherError);
        Self {
            category,
            status_code: Some(status.as_u16()),
            message: format!("HTTP status {}", status),
        }
    }

    /// Failure from a transport error.
    pub fn from_reqwest(error: &reqwest::Error) -> Self {
        Self {
            category: FailureCategory::from_reqwest_error(error),
            status_code: error.status().map(|s| s.as_u16()),
            message: error.to_string(),
        }
    }
}

impl fmt::Display for RequestFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status_code {
            Some(status) => write!(
                f,
                "[{}] HTTP {}: {}",
                self.category.label(),
                status,
                self.message
            ),
            None => write!(f, "[{}] {}", self.category.label(), self.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_codes_have_no_category() {
        assert_eq!(FailureCategory::from_status_code(200), None);
        assert_eq!(FailureCategory::from_status_code(204), None);
        assert_eq!(FailureCategory::from_status_code(302), None);
    }

    #[test]
    fn categorize_4xx() {
        assert_eq!(
            FailureCategory::from_status_code(404),
            Some(FailureCategory::ClientError)
        );
        assert_eq!(
            FailureCategory::from_status_code(429),
            Some(FailureCategory::ClientError)
        );
    }

    #[test]
    fn categorize_5xx() {
        assert_eq!(
            FailureCategory::from_status_code(500),
            Some(FailureCategory::ServerError)
        );
        assert_eq!(
            FailureCategory::from_status_code(503),
            Some(FailureCategory::ServerError)
        );
    }

    #[test]
    fn category_labels() {
        assert_eq!(FailureCategory::ClientError.label(), "client_error");
        assert_eq!(FailureCategory::NetworkError.label(), "network_error");
        assert_eq!(FailureCategory::TimeoutError.label(), "timeout_error");
    }

    #[test]
    fn failure_from_status_display() {
        let failure = RequestFailure::from_status(reqwest::StatusCode::BAD_GATEWAY);
        assert_eq!(failure.category, FailureCategory::ServerError);
        assert_eq!(failure.status_code, Some(502));
        let display = format!("{}", failure);
        assert!(display.contains("server_error"), "display was: {}", display);
        assert!(display.contains("502"), "display was: {}", display);
    }

    #[test]
    fn config_error_display() {
        let err = Error::Config("duration must be a positive integer".to_string());
        assert!(format!("{}", err).contains("configuration error"));
    }
}
