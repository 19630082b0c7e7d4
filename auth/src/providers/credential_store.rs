//! Persisted credential store trait.

use crate::error::Result;
use crate::state::SessionCredential;
use std::future::Future;

/// Persistent mirror of the in-memory session ("remember me").
///
/// The manager writes through to this store on every credential update and
/// clears it on every logout, keeping the persisted copy eventually
/// consistent with the canonical in-memory one. Deployments without
/// "remember me" use [`NoopCredentialStore`](crate::stores::NoopCredentialStore).
pub trait CredentialStore: Send + Sync {
    /// Persist `credential`, replacing any previous copy.
    ///
    /// # Errors
    ///
    /// Returns an error if the copy could not be written.
    fn save(&self, credential: &SessionCredential) -> impl Future<Output = Result<()>> + Send;

    /// Load the persisted copy, if one exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unreadable. A present but
    /// unparseable copy is *not* an error — implementations discard it and
    /// return `None`.
    fn load(&self) -> impl Future<Output = Result<Option<SessionCredential>>> + Send;

    /// Remove the persisted copy. Removing an absent copy is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the copy exists and could not be removed.
    fn clear(&self) -> impl Future<Output = Result<()>> + Send;
}
