//! Token lifecycle observation.

/// Observer told about every adopted token and every cleared session.
///
/// The cloud log uploader registers one of these so its user-scoped upload
/// context always carries the current bearer token, without the session
/// layer depending on the logging layer.
pub trait TokenObserver: Send + Sync {
    /// A token was adopted (sign-in, restore, or refresh).
    fn token_updated(&self, user_id: &str, access_token: &str);

    /// The session ended; any held token is no longer valid.
    fn session_cleared(&self);
}
