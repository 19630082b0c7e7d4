//! Authorization modes for the storage contracts.

/// Credential presented on each storage request.
///
/// The backend exposes the same REST surface under two authorization modes:
/// an end-user bearer token scoped to the user's private prefix, or a
/// pre-exchanged service credential scoped to the shared application prefix.
/// Both render to a standard `Authorization` header; the distinction matters
/// to callers choosing which prefix they are allowed to write under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreAuth {
    /// Short-lived end-user access token.
    Bearer(String),

    /// Privileged service credential configured at bootstrap.
    Service(String),
}

impl StoreAuth {
    /// Render the `Authorization` header value for a request.
    #[must_use]
    pub fn header_value(&self) -> String {
        match self {
            Self::Bearer(token) | Self::Service(token) => format!("Bearer {token}"),
        }
    }

    /// Returns `true` for the privileged service mode.
    #[must_use]
    pub const fn is_privileged(&self) -> bool {
        matches!(self, Self::Service(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_value() {
        let auth = StoreAuth::Bearer("tok-123".to_string());
        assert_eq!(auth.header_value(), "Bearer tok-123");
        assert!(!auth.is_privileged());
    }

    #[test]
    fn test_service_mode_is_privileged() {
        assert!(StoreAuth::Service("svc".to_string()).is_privileged());
    }
}
