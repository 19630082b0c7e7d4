//! Error types for cloud storage contracts.

use thiserror::Error;

/// Result type alias for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Failure modes shared by the blob and document store contracts.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// The request never completed (connection refused, DNS, TLS, ...).
    #[error("Network error: {0}")]
    Network(String),

    /// The request exceeded the configured request timeout.
    #[error("Request timed out")]
    Timeout,

    /// The backend answered with a non-success status.
    #[error("Provider error {status}: {code}")]
    Provider {
        /// HTTP-like status code of the response.
        status: u16,
        /// Machine-readable provider error string extracted from the body.
        code: String,
    },

    /// The response body could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),

    /// A local filesystem operation failed.
    #[error("IO error: {0}")]
    Io(String),
}

impl StorageError {
    /// Returns `true` if retrying the same request may succeed.
    ///
    /// Connection failures, timeouts and 5xx responses are considered
    /// transient; 4xx responses and decode failures are not.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout => true,
            Self::Provider { status, .. } => *status >= 500,
            Self::Decode(_) | Self::Io(_) => false,
        }
    }
}

impl From<reqwest::Error> for StorageError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(StorageError::Network("refused".to_string()).is_transient());
        assert!(StorageError::Timeout.is_transient());
        assert!(
            StorageError::Provider {
                status: 503,
                code: "UNAVAILABLE".to_string()
            }
            .is_transient()
        );
        assert!(
            !StorageError::Provider {
                status: 403,
                code: "PERMISSION_DENIED".to_string()
            }
            .is_transient()
        );
        assert!(!StorageError::Decode("bad json".to_string()).is_transient());
    }
}
