//! Error types for session and token operations.

use thiserror::Error;

/// Result type alias for authentication operations.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Failure taxonomy for the session-token lifecycle.
///
/// The variants fall into three groups that callers treat differently:
/// missing prerequisites (fail fast, no network call was made), provider
/// rejections (structured status + reason), and the two freshness outcomes
/// of the sensitive-action protocol.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    // ═══════════════════════════════════════════════════════════
    // Missing Prerequisites
    // ═══════════════════════════════════════════════════════════
    /// No session / access token is held.
    #[error("No access token available")]
    NoToken,

    /// The session has no refresh token, so silent refresh is impossible.
    #[error("No refresh token available")]
    NoRefreshToken,

    // ═══════════════════════════════════════════════════════════
    // Credential Freshness
    // ═══════════════════════════════════════════════════════════
    /// The provider rejected a sensitive action because the credential was
    /// issued too long ago, even though it has not expired.
    #[error("Credential too old for this operation")]
    CredentialTooOld,

    /// Refreshing cannot satisfy the provider's freshness requirement; the
    /// user must log in again. The session is deliberately left intact.
    #[error("Re-authentication required")]
    ReauthenticationRequired,

    // ═══════════════════════════════════════════════════════════
    // Provider / Transport
    // ═══════════════════════════════════════════════════════════
    /// The token-exchange endpoint rejected the request.
    #[error("Token exchange failed: {0}")]
    TokenExchange(String),

    /// Any other structured provider rejection.
    #[error("Provider error {status}: {code}")]
    Provider {
        /// HTTP-like status of the response.
        status: u16,
        /// Machine-readable reason string from the response body.
        code: String,
    },

    /// The request never completed.
    #[error("Network error: {0}")]
    Network(String),

    // ═══════════════════════════════════════════════════════════
    // Local State
    // ═══════════════════════════════════════════════════════════
    /// The persisted credential mirror could not be read or written.
    #[error("Credential store error: {0}")]
    Store(String),

    /// Internal invariant violation (should not be exposed to users).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Returns `true` if the provider signalled that a sensitive action
    /// needs a freshly issued credential.
    #[must_use]
    pub const fn is_credential_too_old(&self) -> bool {
        matches!(self, Self::CredentialTooOld)
    }

    /// Returns `true` if this error ends the session: the manager clears
    /// both the in-memory and the persisted copy when it occurs during a
    /// refresh.
    #[must_use]
    pub const fn is_terminal_for_session(&self) -> bool {
        matches!(
            self,
            Self::TokenExchange(_) | Self::Provider { .. } | Self::Network(_)
        )
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Network("request timed out".to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_too_old_classification() {
        assert!(AuthError::CredentialTooOld.is_credential_too_old());
        assert!(!AuthError::ReauthenticationRequired.is_credential_too_old());
        assert!(!AuthError::NoToken.is_credential_too_old());
    }

    #[test]
    fn test_terminal_classification() {
        assert!(AuthError::Network("refused".to_string()).is_terminal_for_session());
        assert!(AuthError::TokenExchange("INVALID_REFRESH_TOKEN".to_string()).is_terminal_for_session());
        assert!(!AuthError::NoRefreshToken.is_terminal_for_session());
        assert!(!AuthError::ReauthenticationRequired.is_terminal_for_session());
    }
}
