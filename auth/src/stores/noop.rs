//! No-op credential store.

use crate::error::Result;
use crate::providers::CredentialStore;
use crate::state::SessionCredential;

/// Store used when "remember me" is off: persists nothing, loads nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCredentialStore;

impl CredentialStore for NoopCredentialStore {
    async fn save(&self, _credential: &SessionCredential) -> Result<()> {
        Ok(())
    }

    async fn load(&self) -> Result<Option<SessionCredential>> {
        Ok(None)
    }

    async fn clear(&self) -> Result<()> {
        Ok(())
    }
}
