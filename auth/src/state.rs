//! Session credential state.
//!
//! Exactly one canonical in-memory [`SessionCredential`] exists per active
//! session, owned by the manager. An optional persisted copy mirrors it for
//! "remember me" and is updated on every change through the same manager.

use crate::providers::{SignInResponse, TokenGrant};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Everything a live session holds.
///
/// Invariants:
/// - `access_token` and `refresh_token` are set together at construction
///   and replaced together on refresh; clearing drops the whole value.
/// - `expires_at` is populated whenever a token is adopted. A missing
///   expiry is treated as "needs refresh", never as "valid forever".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCredential {
    /// Opaque bearer credential presented on each request.
    pub access_token: String,

    /// Longer-lived credential exchanged for new access tokens. The
    /// provider may rotate it on refresh; whatever it returns is adopted.
    pub refresh_token: String,

    /// Absolute expiry of `access_token`, already reduced by the safety
    /// buffer. `None` means the expiry was never recorded and the token
    /// must be treated as stale.
    pub expires_at: Option<DateTime<Utc>>,

    /// Provider-assigned stable user identifier.
    pub user_id: String,

    /// Account email.
    pub email: String,

    /// Display name, when the account has one.
    pub display_name: Option<String>,

    /// Administrative claim carried by the identity provider.
    pub is_admin: bool,
}

impl SessionCredential {
    /// Build a credential from an interactive sign-in response.
    ///
    /// `expiry_buffer` is subtracted from the provider-reported lifetime.
    #[must_use]
    pub fn from_sign_in(response: &SignInResponse, expiry_buffer: Duration) -> Self {
        Self {
            access_token: response.grant.access_token.clone(),
            refresh_token: response.grant.refresh_token.clone(),
            expires_at: Some(buffered_expiry(response.grant.expires_in, expiry_buffer)),
            user_id: response.grant.user_id.clone(),
            email: response.email.clone(),
            display_name: response.display_name.clone(),
            is_admin: response.is_admin,
        }
    }

    /// Adopt a refresh grant: replace both tokens and the expiry in one
    /// step. Identity fields are untouched; callers never observe a state
    /// where only some of the token fields changed.
    pub fn adopt_grant(&mut self, grant: &TokenGrant, expiry_buffer: Duration) {
        self.access_token = grant.access_token.clone();
        self.refresh_token = grant.refresh_token.clone();
        self.expires_at = Some(buffered_expiry(grant.expires_in, expiry_buffer));
    }

    /// Returns `true` if the token expires within `window` from now, or if
    /// no expiry was ever recorded.
    #[must_use]
    pub fn expires_within(&self, window: Duration) -> bool {
        match self.expires_at {
            Some(expires_at) => Utc::now() + window >= expires_at,
            None => true,
        }
    }
}

/// Absolute expiry for a token valid for `expires_in` seconds, minus the
/// safety buffer.
fn buffered_expiry(expires_in: u32, expiry_buffer: Duration) -> DateTime<Utc> {
    Utc::now() + Duration::seconds(i64::from(expires_in)) - expiry_buffer
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grant(expires_in: u32) -> TokenGrant {
        TokenGrant {
            access_token: "access-1".to_string(),
            refresh_token: "refresh-1".to_string(),
            expires_in,
            user_id: "user-1".to_string(),
        }
    }

    fn credential(expires_in: u32) -> SessionCredential {
        let response = SignInResponse {
            grant: grant(expires_in),
            email: "agent@unit.example".to_string(),
            display_name: Some("Agent".to_string()),
            email_verified: true,
            is_admin: false,
        };
        SessionCredential::from_sign_in(&response, Duration::seconds(60))
    }

    #[test]
    fn test_expiry_carries_safety_buffer() {
        let credential = credential(3600);
        let expires_at = credential.expires_at.unwrap();

        // ~3540s out: one hour minus the 60s buffer.
        let remaining = expires_at - Utc::now();
        assert!(remaining <= Duration::seconds(3540));
        assert!(remaining > Duration::seconds(3530));
    }

    #[test]
    fn test_expires_within_window() {
        // Buffered expiry ~2 minutes out, window 5 minutes: needs refresh.
        let near = credential(180);
        assert!(near.expires_within(Duration::minutes(5)));

        // Buffered expiry ~59 minutes out: comfortably valid.
        let far = credential(3600);
        assert!(!far.expires_within(Duration::minutes(5)));
    }

    #[test]
    fn test_missing_expiry_means_stale() {
        let mut credential = credential(3600);
        credential.expires_at = None;
        assert!(credential.expires_within(Duration::zero()));
    }

    #[test]
    fn test_adopt_grant_replaces_all_token_fields() {
        let mut credential = credential(3600);
        let old_expiry = credential.expires_at;

        let new_grant = TokenGrant {
            access_token: "access-2".to_string(),
            refresh_token: "refresh-2".to_string(),
            expires_in: 7200,
            user_id: "user-1".to_string(),
        };
        credential.adopt_grant(&new_grant, Duration::seconds(60));

        assert_eq!(credential.access_token, "access-2");
        assert_eq!(credential.refresh_token, "refresh-2");
        assert_ne!(credential.expires_at, old_expiry);
        // Identity fields survive a refresh.
        assert_eq!(credential.email, "agent@unit.example");
    }

    #[test]
    fn test_round_trips_through_serde() {
        let credential = credential(3600);
        let json = serde_json::to_string(&credential).unwrap();
        let back: SessionCredential = serde_json::from_str(&json).unwrap();
        assert_eq!(back, credential);
    }
}
