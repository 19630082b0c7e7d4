//! Identity provider trait.
//!
//! Abstracts the token-exchange and account endpoints of the cloud identity
//! service: interactive sign-in, refresh-token exchange, and the three
//! sensitive account operations that require a recently issued credential.

use crate::error::Result;
use std::future::Future;

/// Tokens returned by a sign-in or refresh exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenGrant {
    /// New bearer credential.
    pub access_token: String,

    /// Refresh token to use next time. The provider may return the same
    /// one or a rotated one; callers always adopt what is returned.
    pub refresh_token: String,

    /// Token lifetime in seconds, as reported by the provider.
    pub expires_in: u32,

    /// Stable user identifier the grant belongs to.
    pub user_id: String,
}

/// Result of an interactive sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignInResponse {
    /// The issued tokens.
    pub grant: TokenGrant,

    /// Account email.
    pub email: String,

    /// Display name, when set on the account.
    pub display_name: Option<String>,

    /// Whether the provider has verified the account email.
    pub email_verified: bool,

    /// Administrative claim.
    pub is_admin: bool,
}

/// The identity service consumed by the session token manager.
///
/// # Error Contract
///
/// Implementations must map the provider's machine-readable "token too
/// old, must re-authenticate" rejection to
/// [`AuthError::CredentialTooOld`](crate::AuthError::CredentialTooOld) —
/// the sensitive-action retry protocol depends on that variant being
/// distinguishable from every other rejection.
pub trait IdentityProvider: Send + Sync {
    /// Exchange email and password for a session.
    ///
    /// # Errors
    ///
    /// Returns an error on network failure or credential rejection.
    fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<SignInResponse>> + Send;

    /// Exchange a refresh token for a new token grant.
    ///
    /// # Errors
    ///
    /// Returns an error on network failure or if the refresh token was
    /// revoked or rejected.
    fn refresh(&self, refresh_token: &str) -> impl Future<Output = Result<TokenGrant>> + Send;

    /// Update the account display name. Sensitive: may be rejected with
    /// "credential too old".
    ///
    /// # Errors
    ///
    /// Returns an error on network failure or provider rejection.
    fn update_profile(
        &self,
        access_token: &str,
        display_name: &str,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Change the account password. Sensitive: may be rejected with
    /// "credential too old".
    ///
    /// # Errors
    ///
    /// Returns an error on network failure or provider rejection.
    fn change_password(
        &self,
        access_token: &str,
        new_password: &str,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Delete the account. Sensitive: may be rejected with "credential
    /// too old".
    ///
    /// # Errors
    ///
    /// Returns an error on network failure or provider rejection.
    fn delete_account(&self, access_token: &str) -> impl Future<Output = Result<()>> + Send;
}
