//! Upload strategies.
//!
//! A strategy decides where a drained batch goes and with which
//! credentials; the shipper's batching and retry machinery is identical
//! either way. The remote store has no native append, so every upload is
//! read-merge-overwrite of the day's object.

use crate::error::{CloudLogError, Result};
use dossier_auth::TokenObserver;
use dossier_core::{BlobStore, StoreAuth};
use std::future::Future;
use std::sync::{Arc, Mutex};

/// Merge prior remote content with a freshly drained batch.
///
/// The result is the existing content, exactly one separating newline,
/// the batch lines newline-joined, and a trailing newline. Line order is
/// preserved.
#[must_use]
pub fn merge_batch(existing: &str, batch: &[String]) -> String {
    let new_content = batch.join("\n");
    let prior = existing.trim_end_matches('\n');
    if prior.is_empty() {
        format!("{new_content}\n")
    } else {
        format!("{prior}\n{new_content}\n")
    }
}

/// Where and how a log batch reaches remote storage.
pub trait UploadStrategy: Send + Sync + 'static {
    /// Short name used in diagnostics and backup file headers.
    fn name(&self) -> &'static str;

    /// Full remote object path for (folder, file name) under this
    /// strategy's namespace.
    fn remote_path(&self, folder: &str, file_name: &str) -> String;

    /// Prior content at the target path. Absent objects and every error
    /// read as empty: a failed fetch must never abort an upload.
    fn fetch_existing(
        &self,
        folder: &str,
        file_name: &str,
    ) -> impl Future<Output = String> + Send;

    /// Merge the batch after existing content and overwrite the object.
    ///
    /// # Errors
    ///
    /// Returns [`CloudLogError::MissingUserContext`] when the strategy's
    /// prerequisites are absent (no network call is made), or
    /// [`CloudLogError::Upload`] when the store rejects the write.
    fn upload(
        &self,
        batch: &[String],
        folder: &str,
        file_name: &str,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// The signed-in user a user-scoped strategy uploads as.
#[derive(Debug, Clone)]
struct UserContext {
    user_id: String,
    access_token: String,
}

/// Shared, cloneable slot holding the current user context.
///
/// Implements [`TokenObserver`], so registering a clone with the session
/// token manager keeps the upload credentials current through sign-in,
/// every refresh, and sign-out.
#[derive(Debug, Clone, Default)]
pub struct UserContextHandle {
    inner: Arc<Mutex<Option<UserContext>>>,
}

impl UserContextHandle {
    /// Empty handle; user-scoped uploads fail fast until a user signs in.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set or replace the user context.
    pub fn set(&self, user_id: &str, access_token: &str) {
        if let Ok(mut guard) = self.inner.lock() {
            *guard = Some(UserContext {
                user_id: user_id.to_string(),
                access_token: access_token.to_string(),
            });
        }
    }

    /// Drop the user context.
    pub fn clear(&self) {
        if let Ok(mut guard) = self.inner.lock() {
            *guard = None;
        }
    }

    /// Current `(user_id, access_token)`, if a user is signed in.
    #[must_use]
    pub fn current(&self) -> Option<(String, String)> {
        self.inner
            .lock()
            .ok()
            .and_then(|guard| {
                guard
                    .as_ref()
                    .map(|ctx| (ctx.user_id.clone(), ctx.access_token.clone()))
            })
    }
}

impl TokenObserver for UserContextHandle {
    fn token_updated(&self, user_id: &str, access_token: &str) {
        self.set(user_id, access_token);
    }

    fn session_cleared(&self) {
        self.clear();
    }
}

/// Uploads under the signed-in user's private prefix with their bearer
/// token. Fails fast when no user is signed in.
pub struct UserScopedStrategy<B>
where
    B: BlobStore,
{
    store: B,
    context: UserContextHandle,
}

impl<B> UserScopedStrategy<B>
where
    B: BlobStore,
{
    /// Strategy reading its credentials from `context`.
    #[must_use]
    pub fn new(store: B, context: UserContextHandle) -> Self {
        Self { store, context }
    }
}

impl<B> UploadStrategy for UserScopedStrategy<B>
where
    B: BlobStore + 'static,
{
    fn name(&self) -> &'static str {
        "user-scoped"
    }

    fn remote_path(&self, folder: &str, file_name: &str) -> String {
        let user_id = self
            .context
            .current()
            .map(|(user_id, _)| user_id)
            .unwrap_or_else(|| "unknown".to_string());
        format!("users/{user_id}/{folder}/{file_name}")
    }

    async fn fetch_existing(&self, folder: &str, file_name: &str) -> String {
        let Some((_, access_token)) = self.context.current() else {
            return String::new();
        };
        let path = self.remote_path(folder, file_name);
        let auth = StoreAuth::Bearer(access_token);
        match self.store.download_text(&path, &auth).await {
            Ok(Some(content)) => content,
            Ok(None) => String::new(),
            Err(err) => {
                tracing::debug!(
                    target: "dossier_cloudlog::strategy",
                    error = %err,
                    path,
                    "Could not fetch existing log content, starting fresh"
                );
                String::new()
            }
        }
    }

    async fn upload(&self, batch: &[String], folder: &str, file_name: &str) -> Result<()> {
        let Some((_, access_token)) = self.context.current() else {
            return Err(CloudLogError::MissingUserContext);
        };
        let path = self.remote_path(folder, file_name);
        let existing = self.fetch_existing(folder, file_name).await;
        let merged = merge_batch(&existing, batch);
        let auth = StoreAuth::Bearer(access_token);
        self.store.upload_text(&path, &merged, &auth).await?;
        Ok(())
    }
}

/// Uploads under a shared application prefix with privileged service
/// credentials configured at construction.
pub struct ServiceScopedStrategy<B>
where
    B: BlobStore,
{
    store: B,
    credential: String,
}

impl<B> ServiceScopedStrategy<B>
where
    B: BlobStore,
{
    /// Strategy using `credential` for every upload.
    #[must_use]
    pub fn new(store: B, credential: impl Into<String>) -> Self {
        Self {
            store,
            credential: credential.into(),
        }
    }
}

impl<B> UploadStrategy for ServiceScopedStrategy<B>
where
    B: BlobStore + 'static,
{
    fn name(&self) -> &'static str {
        "service-scoped"
    }

    fn remote_path(&self, folder: &str, file_name: &str) -> String {
        format!("shared/{folder}/{file_name}")
    }

    async fn fetch_existing(&self, folder: &str, file_name: &str) -> String {
        let path = self.remote_path(folder, file_name);
        let auth = StoreAuth::Service(self.credential.clone());
        match self.store.download_text(&path, &auth).await {
            Ok(Some(content)) => content,
            Ok(None) => String::new(),
            Err(err) => {
                tracing::debug!(
                    target: "dossier_cloudlog::strategy",
                    error = %err,
                    path,
                    "Could not fetch existing log content, starting fresh"
                );
                String::new()
            }
        }
    }

    async fn upload(&self, batch: &[String], folder: &str, file_name: &str) -> Result<()> {
        let path = self.remote_path(folder, file_name);
        let existing = self.fetch_existing(folder, file_name).await;
        let merged = merge_batch(&existing, batch);
        let auth = StoreAuth::Service(self.credential.clone());
        self.store.upload_text(&path, &merged, &auth).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dossier_core::mocks::MockBlobStore;

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_merge_batch_into_empty() {
        let merged = merge_batch("", &lines(&["one", "two"]));
        assert_eq!(merged, "one\ntwo\n");
    }

    #[test]
    fn test_merge_batch_appends_with_single_separator() {
        let merged = merge_batch("old\n", &lines(&["new"]));
        assert_eq!(merged, "old\nnew\n");
        // Missing trailing newline on the prior content is normalized.
        let merged = merge_batch("old", &lines(&["new"]));
        assert_eq!(merged, "old\nnew\n");
    }

    #[test]
    fn test_merge_batch_preserves_order() {
        let batch = lines(&["1", "2", "3"]);
        let first = merge_batch("", &batch);
        let second = merge_batch(&first, &lines(&["4", "5"]));
        assert_eq!(second, "1\n2\n3\n4\n5\n");
    }

    #[tokio::test]
    async fn test_user_scoped_fails_fast_without_context() {
        let store = MockBlobStore::new();
        let strategy = UserScopedStrategy::new(store.clone(), UserContextHandle::new());

        let err = strategy
            .upload(&lines(&["line"]), "app_logs/1.0/user", "2026-08-31.log")
            .await
            .unwrap_err();
        assert!(matches!(err, CloudLogError::MissingUserContext));
        // No network call was attempted.
        assert_eq!(store.upload_count(), 0);
    }

    #[tokio::test]
    async fn test_user_scoped_round_trip() {
        let store = MockBlobStore::new();
        let context = UserContextHandle::new();
        context.set("user-1", "token");
        let strategy = UserScopedStrategy::new(store.clone(), context);

        strategy
            .upload(&lines(&["a", "b"]), "app_logs/1.0/user", "2026-08-31.log")
            .await
            .unwrap();
        strategy
            .upload(&lines(&["c"]), "app_logs/1.0/user", "2026-08-31.log")
            .await
            .unwrap();

        let content = store
            .object("users/user-1/app_logs/1.0/user/2026-08-31.log")
            .unwrap();
        assert_eq!(content, "a\nb\nc\n");
    }

    #[tokio::test]
    async fn test_context_handle_follows_token_lifecycle() {
        let context = UserContextHandle::new();
        assert!(context.current().is_none());

        context.token_updated("user-1", "access-1");
        assert_eq!(
            context.current(),
            Some(("user-1".to_string(), "access-1".to_string()))
        );

        context.token_updated("user-1", "access-2");
        assert_eq!(
            context.current().map(|(_, token)| token),
            Some("access-2".to_string())
        );

        context.session_cleared();
        assert!(context.current().is_none());
    }

    #[tokio::test]
    async fn test_service_scoped_uses_shared_prefix() {
        let store = MockBlobStore::new();
        let strategy = ServiceScopedStrategy::new(store.clone(), "service-key");

        strategy
            .upload(&lines(&["x"]), "app_logs/1.0/service", "2026-08-31.log")
            .await
            .unwrap();

        assert!(store
            .object("shared/app_logs/1.0/service/2026-08-31.log")
            .is_some());
    }

    #[tokio::test]
    async fn test_fetch_existing_swallows_errors() {
        // An empty mock has nothing at the path; absent reads as empty.
        let store = MockBlobStore::new();
        let strategy = ServiceScopedStrategy::new(store, "service-key");
        let existing = strategy.fetch_existing("folder", "file.log").await;
        assert_eq!(existing, "");
    }
}
