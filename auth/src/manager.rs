//! Session token manager.
//!
//! Owns the canonical in-memory session and implements the full credential
//! lifecycle: interactive sign-in, silent refresh with an expiry safety
//! window, forced logout on unrecoverable refresh failure, and the
//! refresh-and-retry protocol for sensitive account operations.

use crate::config::SessionConfig;
use crate::error::{AuthError, Result};
use crate::notify::{NoticeLevel, NotificationSink};
use crate::observer::TokenObserver;
use crate::providers::{CredentialStore, IdentityProvider};
use crate::state::SessionCredential;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Message shown when the session had to be terminated.
const SESSION_EXPIRED_NOTICE: &str = "Your session has expired. Please sign in again.";

/// Manages the lifetime of one user session.
///
/// All session mutation goes through this type: the in-memory credential
/// lives behind an async `RwLock`, refreshes are serialized by a dedicated
/// gate so two callers can never race a token exchange for the same
/// session, and every update or clear is mirrored to the persisted copy.
///
/// # Example
///
/// ```ignore
/// use dossier_auth::{SessionConfig, SessionTokenManager};
/// use dossier_auth::providers::RestIdentityProvider;
/// use dossier_auth::stores::FileCredentialStore;
///
/// let manager = SessionTokenManager::new(
///     RestIdentityProvider::new(api_key)?,
///     FileCredentialStore::new(session_path),
///     SessionConfig::new(),
/// );
/// manager.sign_in("agent@unit.example", "hunter2").await?;
/// ```
pub struct SessionTokenManager<P, S>
where
    P: IdentityProvider,
    S: CredentialStore,
{
    provider: P,
    store: S,
    config: SessionConfig,
    /// The single canonical in-memory session copy.
    session: RwLock<Option<SessionCredential>>,
    /// Serializes refreshes and their session mutation.
    refresh_gate: Mutex<()>,
    observer: Option<Arc<dyn TokenObserver>>,
    sink: Option<Arc<dyn NotificationSink>>,
}

impl<P, S> SessionTokenManager<P, S>
where
    P: IdentityProvider,
    S: CredentialStore,
{
    /// Create a manager with no observer and no notification sink.
    #[must_use]
    pub fn new(provider: P, store: S, config: SessionConfig) -> Self {
        Self {
            provider,
            store,
            config,
            session: RwLock::new(None),
            refresh_gate: Mutex::new(()),
            observer: None,
            sink: None,
        }
    }

    /// Register a token observer (e.g. the cloud log upload context).
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn TokenObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Register a sink for user-visible notifications.
    #[must_use]
    pub fn with_notification_sink(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    // ═══════════════════════════════════════════════════════════
    // Session Lifecycle
    // ═══════════════════════════════════════════════════════════

    /// Interactive sign-in. On success the new session replaces any
    /// previous one, the persisted copy is updated, and the observer is
    /// told about the new token.
    ///
    /// # Errors
    ///
    /// Returns the provider's rejection unchanged; no session state is
    /// touched on failure.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<SessionCredential> {
        let response = self.provider.sign_in(email, password).await?;
        let credential = SessionCredential::from_sign_in(&response, self.config.expiry_buffer);

        *self.session.write().await = Some(credential.clone());
        self.mirror(&credential).await;
        self.announce_token(&credential);

        tracing::info!(user_id = %credential.user_id, "Signed in");
        Ok(credential)
    }

    /// Load a remembered session from the persisted copy, if one exists.
    ///
    /// The restored token may already be stale; the next
    /// [`ensure_fresh`](Self::ensure_fresh) call will refresh it.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Store`] if the persisted copy is unreadable.
    pub async fn restore(&self) -> Result<Option<SessionCredential>> {
        let Some(credential) = self.store.load().await? else {
            return Ok(None);
        };

        *self.session.write().await = Some(credential.clone());
        self.announce_token(&credential);

        tracing::info!(user_id = %credential.user_id, "Restored persisted session");
        Ok(Some(credential))
    }

    /// User-initiated sign-out: clears both session copies without a
    /// notification.
    pub async fn sign_out(&self) {
        self.clear_session(None).await;
    }

    /// Snapshot of the current session, if signed in.
    pub async fn current_session(&self) -> Option<SessionCredential> {
        self.session.read().await.clone()
    }

    /// The current access token, if signed in.
    pub async fn access_token(&self) -> Option<String> {
        self.session
            .read()
            .await
            .as_ref()
            .map(|c| c.access_token.clone())
    }

    // ═══════════════════════════════════════════════════════════
    // Refresh Protocol
    // ═══════════════════════════════════════════════════════════

    /// Whether the held token needs refreshing.
    ///
    /// True when `force` is set, when no session or no expiry is recorded,
    /// or when the buffered expiry falls within the configured refresh
    /// window from now.
    pub async fn needs_refresh(&self, force: bool) -> bool {
        if force {
            return true;
        }

        match self.session.read().await.as_ref() {
            Some(credential) => credential.expires_within(self.config.refresh_window),
            None => true,
        }
    }

    /// Refresh the access token if needed (always, when `force` is set).
    ///
    /// On success the session atomically adopts the returned grant —
    /// access token, possibly-rotated refresh token, and recomputed
    /// buffered expiry — and the persisted copy and observer are updated.
    ///
    /// Returns `Ok(false)` when no refresh was needed.
    ///
    /// # Errors
    ///
    /// - [`AuthError::NoToken`] / [`AuthError::NoRefreshToken`]: nothing to
    ///   refresh with; no network call is made and the session is left as
    ///   is for the caller to handle.
    /// - Any provider or network error: the exchange failed, the session
    ///   is unrecoverable, and **both copies have been cleared** (forced
    ///   logout with a user-visible notice) before the error is returned.
    pub async fn refresh(&self, force: bool) -> Result<bool> {
        let _gate = self.refresh_gate.lock().await;

        if !self.needs_refresh(force).await {
            return Ok(false);
        }

        let refresh_token = {
            let guard = self.session.read().await;
            let credential = guard.as_ref().ok_or(AuthError::NoToken)?;
            if credential.refresh_token.is_empty() {
                return Err(AuthError::NoRefreshToken);
            }
            credential.refresh_token.clone()
        };

        match self.provider.refresh(&refresh_token).await {
            Ok(grant) => {
                let snapshot = {
                    let mut guard = self.session.write().await;
                    let Some(credential) = guard.as_mut() else {
                        // Signed out while the exchange was in flight.
                        return Err(AuthError::NoToken);
                    };
                    credential.adopt_grant(&grant, self.config.expiry_buffer);
                    credential.clone()
                };

                self.mirror(&snapshot).await;
                self.announce_token(&snapshot);

                tracing::info!(user_id = %snapshot.user_id, "Access token refreshed");
                Ok(true)
            }
            Err(err) => {
                tracing::warn!(error = %err, "Token refresh failed, ending session");
                self.clear_session(Some(SESSION_EXPIRED_NOTICE)).await;
                Err(err)
            }
        }
    }

    /// Refresh if needed and return a token that is valid for at least the
    /// refresh window.
    ///
    /// # Errors
    ///
    /// Same contract as [`refresh`](Self::refresh), plus
    /// [`AuthError::NoToken`] when not signed in.
    pub async fn ensure_fresh(&self) -> Result<String> {
        if self.needs_refresh(false).await {
            self.refresh(false).await?;
        }
        self.access_token().await.ok_or(AuthError::NoToken)
    }

    // ═══════════════════════════════════════════════════════════
    // Sensitive Actions
    // ═══════════════════════════════════════════════════════════

    /// Run an action that requires a *recently issued* token, handling the
    /// provider's "credential too old" rejection.
    ///
    /// Protocol:
    /// 1. No session: forced logout, [`AuthError::NoToken`].
    /// 2. Run the action with the current token; success returns.
    /// 3. On [`AuthError::CredentialTooOld`]: one forced refresh (a failed
    ///    refresh forces logout and returns its error), then one retry.
    /// 4. A second [`AuthError::CredentialTooOld`] becomes
    ///    [`AuthError::ReauthenticationRequired`] and the session is
    ///    **kept** — only a fresh interactive login can satisfy the
    ///    provider, and the user should be prompted, not ejected.
    /// 5. Any other error propagates unchanged.
    ///
    /// # Errors
    ///
    /// As described above.
    pub async fn with_fresh_credentials<T, F, Fut>(&self, action: F) -> Result<T>
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let Some(token) = self.access_token().await else {
            self.clear_session(Some(SESSION_EXPIRED_NOTICE)).await;
            return Err(AuthError::NoToken);
        };

        match action(token).await {
            Err(err) if err.is_credential_too_old() => {
                tracing::info!("Sensitive action needs a fresh credential, refreshing");

                if let Err(refresh_err) = self.refresh(true).await {
                    // Provider/network failures already forced a logout
                    // inside refresh; a missing refresh token has not.
                    if matches!(
                        refresh_err,
                        AuthError::NoToken | AuthError::NoRefreshToken
                    ) {
                        self.clear_session(Some(SESSION_EXPIRED_NOTICE)).await;
                    }
                    return Err(refresh_err);
                }

                let Some(token) = self.access_token().await else {
                    return Err(AuthError::NoToken);
                };

                match action(token).await {
                    Err(retry_err) if retry_err.is_credential_too_old() => {
                        tracing::warn!(
                            "Provider still rejects the refreshed credential; re-login required"
                        );
                        Err(AuthError::ReauthenticationRequired)
                    }
                    other => other,
                }
            }
            other => other,
        }
    }

    /// Update the account display name (sensitive action).
    ///
    /// # Errors
    ///
    /// See [`with_fresh_credentials`](Self::with_fresh_credentials).
    pub async fn update_profile(&self, display_name: &str) -> Result<()> {
        let provider = &self.provider;
        self.with_fresh_credentials(|token| async move {
            provider.update_profile(&token, display_name).await
        })
        .await?;

        // Keep the in-memory identity in step with the provider.
        let snapshot = {
            let mut guard = self.session.write().await;
            guard.as_mut().map(|credential| {
                credential.display_name = Some(display_name.to_string());
                credential.clone()
            })
        };
        if let Some(snapshot) = snapshot {
            self.mirror(&snapshot).await;
        }

        Ok(())
    }

    /// Change the account password (sensitive action).
    ///
    /// # Errors
    ///
    /// See [`with_fresh_credentials`](Self::with_fresh_credentials).
    pub async fn change_password(&self, new_password: &str) -> Result<()> {
        let provider = &self.provider;
        self.with_fresh_credentials(|token| async move {
            provider.change_password(&token, new_password).await
        })
        .await
    }

    /// Delete the account (sensitive action). On success the session is
    /// cleared — there is no account left to be signed in to.
    ///
    /// # Errors
    ///
    /// See [`with_fresh_credentials`](Self::with_fresh_credentials).
    pub async fn delete_account(&self) -> Result<()> {
        let provider = &self.provider;
        self.with_fresh_credentials(|token| async move { provider.delete_account(&token).await })
            .await?;

        self.clear_session(None).await;
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════
    // Internals
    // ═══════════════════════════════════════════════════════════

    /// Clear both session copies; `notice` is shown to the user when the
    /// logout was forced rather than requested.
    async fn clear_session(&self, notice: Option<&str>) {
        *self.session.write().await = None;

        if let Err(err) = self.store.clear().await {
            tracing::warn!(error = %err, "Failed to clear persisted session copy");
        }

        if let Some(observer) = &self.observer {
            observer.session_cleared();
        }

        if let Some(notice) = notice {
            if let Some(sink) = &self.sink {
                sink.notify(NoticeLevel::Warning, notice);
            }
        }

        tracing::info!(forced = notice.is_some(), "Session cleared");
    }

    /// Write-through to the persisted copy. Best effort: a failing mirror
    /// write is logged, not surfaced — the canonical copy is in memory.
    async fn mirror(&self, credential: &SessionCredential) {
        if let Err(err) = self.store.save(credential).await {
            tracing::warn!(error = %err, "Failed to persist session copy");
        }
    }

    fn announce_token(&self, credential: &SessionCredential) {
        if let Some(observer) = &self.observer {
            observer.token_updated(&credential.user_id, &credential.access_token);
        }
    }
}
