//! Document store contract and REST implementation.
//!
//! Documents are addressed by `(collection, document id)` and hold a flat
//! JSON object of fields. The contract is deliberately narrow: read one
//! field, or upsert the whole document with the given fields. Partial-field
//! merge is *not* part of the contract — callers that need it must
//! read-modify-write.

use crate::blob::provider_error;
use crate::credentials::StoreAuth;
use crate::error::{Result, StorageError};
use rand::Rng;
use reqwest::{Client, StatusCode, header};
use std::future::Future;
use std::time::Duration;

/// Default per-request timeout for document operations.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Key-value document storage.
pub trait DocumentStore: Send + Sync {
    /// Read a single field of a document.
    ///
    /// Returns `Ok(None)` when the document or the field does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] on network failure or a non-404 provider
    /// rejection.
    fn get_field(
        &self,
        collection: &str,
        doc_id: &str,
        field: &str,
        auth: &StoreAuth,
    ) -> impl Future<Output = Result<Option<serde_json::Value>>> + Send;

    /// Create or replace a document with the given fields.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] on network failure or provider rejection.
    fn upsert(
        &self,
        collection: &str,
        doc_id: &str,
        fields: serde_json::Value,
        auth: &StoreAuth,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// Generate a chronologically sortable document id.
///
/// Ids are a zero-padded hex millisecond timestamp followed by a short
/// random suffix, so ids generated later always sort after ids generated
/// in an earlier millisecond while concurrent ids stay unique. Used for
/// appending metric documents in insertion order.
#[must_use]
pub fn chronological_id() -> String {
    let millis = chrono::Utc::now().timestamp_millis().max(0);
    let suffix: String = rand::thread_rng()
        .sample_iter(&rand::distributions::Alphanumeric)
        .take(8)
        .map(char::from)
        .collect();

    format!("{millis:013x}-{suffix}")
}

/// REST implementation of [`DocumentStore`].
#[derive(Debug, Clone)]
pub struct RestDocumentStore {
    client: Client,
    base_url: String,
}

impl RestDocumentStore {
    /// Create a new store behind `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Network`] if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| StorageError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn document_url(&self, collection: &str, doc_id: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url,
            urlencoding::encode(collection),
            urlencoding::encode(doc_id)
        )
    }
}

impl DocumentStore for RestDocumentStore {
    async fn get_field(
        &self,
        collection: &str,
        doc_id: &str,
        field: &str,
        auth: &StoreAuth,
    ) -> Result<Option<serde_json::Value>> {
        let response = self
            .client
            .get(self.document_url(collection, doc_id))
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

        let document: serde_json::Value = response.json().await?;
        Ok(document.get(field).cloned())
    }

    async fn upsert(
        &self,
        collection: &str,
        doc_id: &str,
        fields: serde_json::Value,
        auth: &StoreAuth,
    ) -> Result<()> {
        let response = self
            .client
            .patch(self.document_url(collection, doc_id))
            .header(header::AUTHORIZATION, auth.header_value())
            .json(&fields)
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_url_encodes_components() {
        let store = RestDocumentStore::new("https://db.example.com/v1/").unwrap();
        let url = store.document_url("user prefs", "alice@example.com");
        assert_eq!(
            url,
            "https://db.example.com/v1/user%20prefs/alice%40example.com"
        );
    }

    #[test]
    fn test_chronological_ids_sort_by_generation_time() {
        let first = chronological_id();
        std::thread::sleep(Duration::from_millis(5));
        let second = chronological_id();

        assert!(second > first, "{second} should sort after {first}");
    }

    #[test]
    fn test_chronological_ids_are_unique() {
        let ids: std::collections::HashSet<String> =
            (0..100).map(|_| chronological_id()).collect();
        assert_eq!(ids.len(), 100);
    }
}
