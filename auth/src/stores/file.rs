//! File-backed credential store.

use crate::error::{AuthError, Result};
use crate::providers::CredentialStore;
use crate::state::SessionCredential;
use std::path::PathBuf;

/// Stores the "remember me" session copy as a JSON file.
///
/// A corrupt file is treated as no session (and logged), never as a fatal
/// error — losing the remembered session only costs the user a login.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    /// Create a store writing to `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The path this store reads and writes.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl CredentialStore for FileCredentialStore {
    async fn save(&self, credential: &SessionCredential) -> Result<()> {
        let json = serde_json::to_vec_pretty(credential)
            .map_err(|e| AuthError::Store(format!("serialize session: {e}")))?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AuthError::Store(format!("create {}: {e}", parent.display())))?;
        }

        tokio::fs::write(&self.path, json)
            .await
            .map_err(|e| AuthError::Store(format!("write {}: {e}", self.path.display())))
    }

    async fn load(&self) -> Result<Option<SessionCredential>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(AuthError::Store(format!(
                    "read {}: {err}",
                    self.path.display()
                )));
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(credential) => Ok(Some(credential)),
            Err(err) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %err,
                    "Discarding unreadable persisted session"
                );
                Ok(None)
            }
        }
    }

    async fn clear(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(AuthError::Store(format!(
                "remove {}: {err}",
                self.path.display()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{SignInResponse, TokenGrant};
    use chrono::Duration;
    use tempfile::TempDir;

    fn credential() -> SessionCredential {
        let response = SignInResponse {
            grant: TokenGrant {
                access_token: "access-1".to_string(),
                refresh_token: "refresh-1".to_string(),
                expires_in: 3600,
                user_id: "user-1".to_string(),
            },
            email: "agent@unit.example".to_string(),
            display_name: None,
            email_verified: true,
            is_admin: false,
        };
        SessionCredential::from_sign_in(&response, Duration::seconds(60))
    }

    #[tokio::test]
    async fn test_save_load_clear_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = FileCredentialStore::new(dir.path().join("session.json"));

        assert_eq!(store.load().await.unwrap(), None);

        let credential = credential();
        store.save(&credential).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(credential));

        store.clear().await.unwrap();
        assert_eq!(store.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_clear_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = FileCredentialStore::new(dir.path().join("session.json"));

        store.clear().await.unwrap();
        store.clear().await.unwrap();
    }

    #[tokio::test]
    async fn test_corrupt_file_is_discarded() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, b"{not json").unwrap();

        let store = FileCredentialStore::new(&path);
        assert_eq!(store.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_save_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let store = FileCredentialStore::new(dir.path().join("nested/deeper/session.json"));

        store.save(&credential()).await.unwrap();
        assert!(store.load().await.unwrap().is_some());
    }
}
