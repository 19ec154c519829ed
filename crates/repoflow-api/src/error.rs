//! Error types for RepoFlow API operations.
//!
//! Errors are categorized so callers can tell a missing resource apart from a
//! rejected request or a transport failure.

use std::fmt;

/// Result type alias for gateway operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Categories of gateway errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Transport failure before a response arrived.
    Network,
    /// The addressed workspace or repository does not exist.
    NotFound,
    /// The service answered with an error status.
    Rejected,
    /// The response body could not be decoded.
    Format,
    /// Other/unknown errors.
    Other,
}

impl ErrorCategory {
    /// Get a user-friendly description of this error category.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Network => "Network connectivity issue",
            Self::NotFound => "Resource not found",
            Self::Rejected => "Request rejected by the service",
            Self::Format => "Unexpected response format",
            Self::Other => "Unexpected error",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors that can occur while talking to the RepoFlow API.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The service reported that the resource does not exist (HTTP 404).
    #[error("not found: {0}")]
    NotFound(String),

    /// The service answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Request URL.
        url: String,
    },

    /// The request never produced a response.
    #[error("request to {url} failed: {message}")]
    Transport {
        /// Request URL.
        url: String,
        /// Error message.
        message: String,
    },

    /// The response body could not be decoded.
    #[error("invalid API response: {0}")]
    InvalidResponse(String),

    /// Generic error.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Map a `ureq` failure for the given URL.
    pub fn from_ureq(err: ureq::Error, url: &str) -> Self {
        match err {
            ureq::Error::StatusCode(404) => Self::NotFound(url.to_string()),
            ureq::Error::StatusCode(status) => Self::Http {
                status,
                url: url.to_string(),
            },
            other => Self::Transport {
                url: url.to_string(),
                message: other.to_string(),
            },
        }
    }

    /// Get the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NotFound(_) => ErrorCategory::NotFound,
            Self::Http { .. } => ErrorCategory::Rejected,
            Self::Transport { .. } => ErrorCategory::Network,
            Self::InvalidResponse(_) => ErrorCategory::Format,
            Self::Other(_) => ErrorCategory::Other,
        }
    }

    /// Whether the addressed resource does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.category() == ErrorCategory::NotFound
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidResponse(err.to_string())
    }
}
