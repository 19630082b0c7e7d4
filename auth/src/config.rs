//! Session lifecycle configuration.

use chrono::Duration;

/// Configuration for the session token manager.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Safety buffer subtracted from the provider-reported token lifetime
    /// when computing `expires_at`, so a token is never presented in its
    /// final seconds of validity.
    ///
    /// Default: 60 seconds
    pub expiry_buffer: Duration,

    /// How close to (buffered) expiry a token must be before
    /// `needs_refresh` reports true.
    ///
    /// Default: 5 minutes
    pub refresh_window: Duration,
}

impl SessionConfig {
    /// Create the default configuration.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            expiry_buffer: Duration::seconds(60),
            refresh_window: Duration::minutes(5),
        }
    }

    /// Set the expiry safety buffer.
    #[must_use]
    pub const fn with_expiry_buffer(mut self, buffer: Duration) -> Self {
        self.expiry_buffer = buffer;
        self
    }

    /// Set the refresh window.
    #[must_use]
    pub const fn with_refresh_window(mut self, window: Duration) -> Self {
        self.refresh_window = window;
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new()
    }
}
