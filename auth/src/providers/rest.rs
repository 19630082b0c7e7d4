//! REST identity provider implementation.
//!
//! Talks to the cloud identity service's two endpoint families: the
//! account API (sign-in, profile update, password change, deletion) and
//! the token API (refresh-token exchange). Both return structured error
//! bodies of the shape `{"error": {"code": 400, "message": "REASON"}}`;
//! the message string is the machine-readable reason this module maps
//! into the [`AuthError`] taxonomy.

use crate::error::{AuthError, Result};
use crate::providers::identity::{IdentityProvider, SignInResponse, TokenGrant};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// Default per-request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Reason string for the distinct "token too old" rejection of sensitive
/// account operations.
const CREDENTIAL_TOO_OLD: &str = "CREDENTIAL_TOO_OLD_LOGIN_AGAIN";

/// REST implementation of [`IdentityProvider`].
///
/// # Example
///
/// ```no_run
/// use dossier_auth::providers::RestIdentityProvider;
///
/// let provider = RestIdentityProvider::new("api-key".to_string())?;
/// # Ok::<(), dossier_auth::AuthError>(())
/// ```
#[derive(Debug, Clone)]
pub struct RestIdentityProvider {
    /// Project API key appended to every request.
    api_key: String,

    /// Base URL of the account endpoint family.
    account_url: String,

    /// Base URL of the token-exchange endpoint family.
    token_url: String,

    /// HTTP client for making requests.
    http_client: Client,
}

impl RestIdentityProvider {
    /// Create a new provider with the production endpoints.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Network`] if the HTTP client cannot be built.
    pub fn new(api_key: String) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AuthError::Network(e.to_string()))?;

        Ok(Self {
            api_key,
            account_url: "https://identitytoolkit.googleapis.com/v1".to_string(),
            token_url: "https://securetoken.googleapis.com/v1".to_string(),
            http_client,
        })
    }

    /// Override the account endpoint base (tests, self-hosted proxies).
    #[must_use]
    pub fn with_account_url(mut self, url: impl Into<String>) -> Self {
        self.account_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Override the token endpoint base.
    #[must_use]
    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = url.into().trim_end_matches('/').to_string();
        self
    }

    fn account_endpoint(&self, action: &str) -> String {
        format!("{}/accounts:{}?key={}", self.account_url, action, self.api_key)
    }

    /// POST a JSON body to an account endpoint and surface structured
    /// errors.
    async fn post_account(
        &self,
        action: &str,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value> {
        let response = self
            .http_client
            .post(self.account_endpoint(action))
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(map_provider_error(status, &body));
        }

        Ok(response.json().await?)
    }
}

impl IdentityProvider for RestIdentityProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<SignInResponse> {
        let body = serde_json::json!({
            "email": email,
            "password": password,
            "returnSecureToken": true,
        });

        let value = self.post_account("signInWithPassword", &body).await?;
        let wire: SignInWire = serde_json::from_value(value)
            .map_err(|e| AuthError::Internal(format!("malformed sign-in response: {e}")))?;

        Ok(SignInResponse {
            grant: TokenGrant {
                access_token: wire.id_token,
                refresh_token: wire.refresh_token,
                expires_in: parse_lifetime(&wire.expires_in),
                user_id: wire.local_id,
            },
            email: wire.email.unwrap_or_else(|| email.to_string()),
            display_name: wire.display_name.filter(|name| !name.is_empty()),
            email_verified: wire.email_verified.unwrap_or(false),
            is_admin: wire.is_admin.unwrap_or(false),
        })
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant> {
        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ];

        let response = self
            .http_client
            .post(format!("{}/token?key={}", self.token_url, self.api_key))
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status, "Token refresh rejected by provider");
            return Err(match map_provider_error(status, &body) {
                AuthError::Provider { code, .. } => AuthError::TokenExchange(code),
                other => other,
            });
        }

        let wire: RefreshWire = response
            .json()
            .await
            .map_err(|e| AuthError::Internal(format!("malformed refresh response: {e}")))?;

        Ok(TokenGrant {
            access_token: wire.access_token,
            refresh_token: wire.refresh_token,
            expires_in: parse_lifetime(&wire.expires_in),
            user_id: wire.user_id,
        })
    }

    async fn update_profile(&self, access_token: &str, display_name: &str) -> Result<()> {
        let body = serde_json::json!({
            "idToken": access_token,
            "displayName": display_name,
            "returnSecureToken": false,
        });
        self.post_account("update", &body).await.map(|_| ())
    }

    async fn change_password(&self, access_token: &str, new_password: &str) -> Result<()> {
        let body = serde_json::json!({
            "idToken": access_token,
            "password": new_password,
            "returnSecureToken": false,
        });
        self.post_account("update", &body).await.map(|_| ())
    }

    async fn delete_account(&self, access_token: &str) -> Result<()> {
        let body = serde_json::json!({ "idToken": access_token });
        self.post_account("delete", &body).await.map(|_| ())
    }
}

/// Map a non-success response body to an [`AuthError`].
///
/// The "credential too old" reason gets its own variant; everything else
/// is surfaced as a structured provider error. Some deployments append
/// detail after a colon (`"REASON : human text"`), so matching is on the
/// leading token.
fn map_provider_error(status: u16, body: &str) -> AuthError {
    let code = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")?
                .get("message")
                .and_then(|m| m.as_str())
                .map(ToString::to_string)
        })
        .unwrap_or_else(|| body.chars().take(120).collect());

    let reason = code
        .split([':', ' '])
        .next()
        .unwrap_or(code.as_str())
        .to_string();

    if reason == CREDENTIAL_TOO_OLD {
        AuthError::CredentialTooOld
    } else {
        AuthError::Provider {
            status,
            code: reason,
        }
    }
}

/// The provider reports token lifetimes as decimal-string seconds. A value
/// that fails to parse is treated as already expired rather than trusted.
fn parse_lifetime(expires_in: &str) -> u32 {
    expires_in.parse().unwrap_or(0)
}

/// Account endpoint sign-in response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInWire {
    id_token: String,
    refresh_token: String,
    expires_in: String,
    local_id: String,
    email: Option<String>,
    display_name: Option<String>,
    email_verified: Option<bool>,
    is_admin: Option<bool>,
}

/// Token endpoint refresh response.
#[derive(Debug, Deserialize)]
struct RefreshWire {
    access_token: String,
    refresh_token: String,
    expires_in: String,
    user_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_too_old_is_distinguished() {
        let body = r#"{"error": {"code": 400, "message": "CREDENTIAL_TOO_OLD_LOGIN_AGAIN"}}"#;
        assert_eq!(map_provider_error(400, body), AuthError::CredentialTooOld);
    }

    #[test]
    fn test_credential_too_old_with_detail_suffix() {
        let body =
            r#"{"error": {"code": 400, "message": "CREDENTIAL_TOO_OLD_LOGIN_AGAIN : Please sign in again."}}"#;
        assert_eq!(map_provider_error(400, body), AuthError::CredentialTooOld);
    }

    #[test]
    fn test_other_reasons_become_provider_errors() {
        let body = r#"{"error": {"code": 400, "message": "INVALID_PASSWORD"}}"#;
        assert_eq!(
            map_provider_error(400, body),
            AuthError::Provider {
                status: 400,
                code: "INVALID_PASSWORD".to_string()
            }
        );
    }

    #[test]
    fn test_unstructured_body_falls_back_to_text() {
        let err = map_provider_error(502, "bad gateway");
        assert_eq!(
            err,
            AuthError::Provider {
                status: 502,
                code: "bad".to_string()
            }
        );
    }

    #[test]
    fn test_lifetime_parsing_is_defensive() {
        assert_eq!(parse_lifetime("3600"), 3600);
        assert_eq!(parse_lifetime("not-a-number"), 0);
        assert_eq!(parse_lifetime(""), 0);
    }

    #[test]
    fn test_endpoint_urls() {
        let provider = RestIdentityProvider::new("k123".to_string())
            .unwrap()
            .with_account_url("https://id.example.com/v1/");

        assert_eq!(
            provider.account_endpoint("update"),
            "https://id.example.com/v1/accounts:update?key=k123"
        );
    }
}
