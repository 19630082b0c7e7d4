//! Scripted identity provider.

use super::decrement_if_positive;
use crate::error::{AuthError, Result};
use crate::providers::{IdentityProvider, SignInResponse, TokenGrant};
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// In-memory identity provider with scripted failures.
///
/// Issues `access-1`/`refresh-1` on sign-in and numbers each refresh
/// grant after it (`access-2`, `access-3`, ...), so tests can tell which
/// token an action ran with.
#[derive(Debug, Clone, Default)]
pub struct MockIdentityProvider {
    sign_in_calls: Arc<AtomicUsize>,
    refresh_calls: Arc<AtomicUsize>,
    sensitive_calls: Arc<AtomicUsize>,
    /// Sensitive calls left to reject as "credential too old".
    too_old_remaining: Arc<AtomicUsize>,
    fail_refresh: bool,
    fail_sensitive: bool,
}

impl MockIdentityProvider {
    /// Provider that accepts everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject the next `count` sensitive calls as "credential too old".
    #[must_use]
    pub fn credential_too_old_for(self, count: usize) -> Self {
        self.too_old_remaining.store(count, Ordering::SeqCst);
        self
    }

    /// Fail every refresh exchange with a network error.
    #[must_use]
    pub fn failing_refresh(mut self) -> Self {
        self.fail_refresh = true;
        self
    }

    /// Reject every sensitive call with a non-retryable provider error.
    #[must_use]
    pub fn failing_sensitive_actions(mut self) -> Self {
        self.fail_sensitive = true;
        self
    }

    /// Number of sign-in exchanges performed.
    #[must_use]
    pub fn sign_in_count(&self) -> usize {
        self.sign_in_calls.load(Ordering::SeqCst)
    }

    /// Number of refresh exchanges performed.
    #[must_use]
    pub fn refresh_count(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    /// Number of sensitive account calls received.
    #[must_use]
    pub fn sensitive_call_count(&self) -> usize {
        self.sensitive_calls.load(Ordering::SeqCst)
    }

    fn sensitive_result(&self) -> Result<()> {
        self.sensitive_calls.fetch_add(1, Ordering::SeqCst);
        if decrement_if_positive(&self.too_old_remaining) {
            return Err(AuthError::CredentialTooOld);
        }
        if self.fail_sensitive {
            return Err(AuthError::Provider {
                status: 400,
                code: "WEAK_OPERATION".to_string(),
            });
        }
        Ok(())
    }
}

impl IdentityProvider for MockIdentityProvider {
    fn sign_in(
        &self,
        email: &str,
        _password: &str,
    ) -> impl Future<Output = Result<SignInResponse>> + Send {
        self.sign_in_calls.fetch_add(1, Ordering::SeqCst);
        let response = SignInResponse {
            grant: TokenGrant {
                access_token: "access-1".to_string(),
                refresh_token: "refresh-1".to_string(),
                expires_in: 3600,
                user_id: "user-1".to_string(),
            },
            email: email.to_string(),
            display_name: None,
            email_verified: true,
            is_admin: false,
        };
        async move { Ok(response) }
    }

    fn refresh(&self, _refresh_token: &str) -> impl Future<Output = Result<TokenGrant>> + Send {
        let result = if self.fail_refresh {
            Err(AuthError::Network("connection reset".to_string()))
        } else {
            let n = self.refresh_calls.fetch_add(1, Ordering::SeqCst) + 2;
            Ok(TokenGrant {
                access_token: format!("access-{n}"),
                refresh_token: format!("refresh-{n}"),
                expires_in: 3600,
                user_id: "user-1".to_string(),
            })
        };
        async move { result }
    }

    fn update_profile(
        &self,
        _access_token: &str,
        _display_name: &str,
    ) -> impl Future<Output = Result<()>> + Send {
        let result = self.sensitive_result();
        async move { result }
    }

    fn change_password(
        &self,
        _access_token: &str,
        _new_password: &str,
    ) -> impl Future<Output = Result<()>> + Send {
        let result = self.sensitive_result();
        async move { result }
    }

    fn delete_account(&self, _access_token: &str) -> impl Future<Output = Result<()>> + Send {
        let result = self.sensitive_result();
        async move { result }
    }
}
