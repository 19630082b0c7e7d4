//! Blob store contract and REST implementation.
//!
//! The remote store holds whole text objects under slash-separated paths.
//! There is no native append: callers that need append semantics download
//! the prior content, concatenate, and overwrite.

use crate::credentials::StoreAuth;
use crate::error::{Result, StorageError};
use reqwest::{Client, StatusCode, header};
use std::future::Future;
use std::time::Duration;

/// Default per-request timeout for blob operations.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Text object storage under a named path.
///
/// Implementations must be cheap to clone or share; the log shipper holds
/// one per upload strategy.
pub trait BlobStore: Send + Sync {
    /// Download the text content at `path`.
    ///
    /// Returns `Ok(None)` when no object exists at that path.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] on network failure or a non-404 provider
    /// rejection.
    fn download_text(
        &self,
        path: &str,
        auth: &StoreAuth,
    ) -> impl Future<Output = Result<Option<String>>> + Send;

    /// Upload `content` as the full object at `path`, replacing whatever
    /// was there.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] on network failure or provider rejection.
    fn upload_text(
        &self,
        path: &str,
        content: &str,
        auth: &StoreAuth,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// REST implementation of [`BlobStore`] over a bucket-style object API.
///
/// Object names are percent-encoded into the URL (the path separator is
/// part of the object name, not of the URL hierarchy).
#[derive(Debug, Clone)]
pub struct RestBlobStore {
    client: Client,
    base_url: String,
    bucket: String,
}

impl RestBlobStore {
    /// Create a new store for `bucket` behind `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Network`] if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, bucket: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| StorageError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            bucket: bucket.into(),
        })
    }

    fn object_url(&self, path: &str) -> String {
        format!(
            "{}/b/{}/o/{}",
            self.base_url,
            self.bucket,
            urlencoding::encode(path)
        )
    }

    fn upload_url(&self, path: &str) -> String {
        format!(
            "{}/b/{}/o?uploadType=media&name={}",
            self.base_url,
            self.bucket,
            urlencoding::encode(path)
        )
    }
}

impl BlobStore for RestBlobStore {
    async fn download_text(&self, path: &str, auth: &StoreAuth) -> Result<Option<String>> {
        let response = self
            .client
            .get(format!("{}?alt=media", self.object_url(path)))
            .header(header::AUTHORIZATION, auth.header_value())
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(provider_error(status, &body));
        }

        Ok(Some(response.text().await?))
    }

    async fn upload_text(&self, path: &str, content: &str, auth: &StoreAuth) -> Result<()> {
        let response = self
            .client
            .post(self.upload_url(path))
            .header(header::AUTHORIZATION, auth.header_value())
            .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(content.to_string())
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(provider_error(status, &body));
        }

        Ok(())
    }
}

/// Map a non-success response to a [`StorageError::Provider`], extracting
/// the machine-readable error string from a `{"error": {...}}` body when
/// present.
pub(crate) fn provider_error(status: u16, body: &str) -> StorageError {
    let code = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            let error = v.get("error")?;
            error
                .get("message")
                .or_else(|| error.get("code"))
                .map(|m| m.to_string().trim_matches('"').to_string())
        })
        .unwrap_or_else(|| body.chars().take(120).collect());

    StorageError::Provider { status, code }
}
