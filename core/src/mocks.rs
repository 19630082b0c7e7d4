//! In-memory mock stores for testing.
//!
//! Both mocks record every call and can be scripted to fail, so tests can
//! exercise retry and backup paths without a network.

use crate::blob::BlobStore;
use crate::credentials::StoreAuth;
use crate::document::DocumentStore;
use crate::error::{Result, StorageError};
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Mock blob store backed by a `HashMap`.
#[derive(Debug, Clone, Default)]
pub struct MockBlobStore {
    objects: Arc<Mutex<HashMap<String, String>>>,
    /// Number of upload calls that should still fail.
    failures_remaining: Arc<AtomicUsize>,
    upload_calls: Arc<AtomicUsize>,
    download_calls: Arc<AtomicUsize>,
}

impl MockBlobStore {
    /// Create a new empty mock store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` uploads fail with a network error.
    #[must_use]
    pub fn failing_uploads(self, count: usize) -> Self {
        self.failures_remaining.store(count, Ordering::SeqCst);
        self
    }

    /// Seed an object before the test runs.
    pub fn seed_object(&self, path: &str, content: &str) {
        if let Ok(mut objects) = self.objects.lock() {
            objects.insert(path.to_string(), content.to_string());
        }
    }

    /// Content currently stored at `path`, if any.
    #[must_use]
    pub fn object(&self, path: &str) -> Option<String> {
        self.objects.lock().ok()?.get(path).cloned()
    }

    /// Number of upload attempts seen so far.
    #[must_use]
    pub fn upload_count(&self) -> usize {
        self.upload_calls.load(Ordering::SeqCst)
    }

    /// Number of download attempts seen so far.
    #[must_use]
    pub fn download_count(&self) -> usize {
        self.download_calls.load(Ordering::SeqCst)
    }
}

impl BlobStore for MockBlobStore {
    fn download_text(
        &self,
        path: &str,
        _auth: &StoreAuth,
    ) -> impl Future<Output = Result<Option<String>>> + Send {
        self.download_calls.fetch_add(1, Ordering::SeqCst);
        let result = self
            .objects
            .lock()
            .map_err(|_| StorageError::Io("mock store poisoned".to_string()))
            .map(|objects| objects.get(path).cloned());

        async move { result }
    }

    fn upload_text(
        &self,
        path: &str,
        content: &str,
        _auth: &StoreAuth,
    ) -> impl Future<Output = Result<()>> + Send {
        self.upload_calls.fetch_add(1, Ordering::SeqCst);

        let result = if decrement_if_positive(&self.failures_remaining) {
            Err(StorageError::Network("mock upload failure".to_string()))
        } else {
            self.objects
                .lock()
                .map_err(|_| StorageError::Io("mock store poisoned".to_string()))
                .map(|mut objects| {
                    objects.insert(path.to_string(), content.to_string());
                })
        };

        async move { result }
    }
}

/// Mock document store backed by a `HashMap`.
#[derive(Debug, Clone, Default)]
pub struct MockDocumentStore {
    documents: Arc<Mutex<HashMap<(String, String), serde_json::Value>>>,
    upsert_calls: Arc<AtomicUsize>,
    failures_remaining: Arc<AtomicUsize>,
}

impl MockDocumentStore {
    /// Create a new empty mock store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` upserts fail with a network error.
    #[must_use]
    pub fn failing_upserts(self, count: usize) -> Self {
        self.failures_remaining.store(count, Ordering::SeqCst);
        self
    }

    /// Document stored under `(collection, doc_id)`, if any.
    #[must_use]
    pub fn document(&self, collection: &str, doc_id: &str) -> Option<serde_json::Value> {
        self.documents
            .lock()
            .ok()?
            .get(&(collection.to_string(), doc_id.to_string()))
            .cloned()
    }

    /// All document ids in a collection, sorted.
    #[must_use]
    pub fn ids_in(&self, collection: &str) -> Vec<String> {
        let Ok(documents) = self.documents.lock() else {
            return Vec::new();
        };
        let mut ids: Vec<String> = documents
            .keys()
            .filter(|(c, _)| c == collection)
            .map(|(_, id)| id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// Number of upsert attempts seen so far.
    #[must_use]
    pub fn upsert_count(&self) -> usize {
        self.upsert_calls.load(Ordering::SeqCst)
    }
}

impl DocumentStore for MockDocumentStore {
    fn get_field(
        &self,
        collection: &str,
        doc_id: &str,
        field: &str,
        _auth: &StoreAuth,
    ) -> impl Future<Output = Result<Option<serde_json::Value>>> + Send {
        let result = self
            .documents
            .lock()
            .map_err(|_| StorageError::Io("mock store poisoned".to_string()))
            .map(|documents| {
                documents
                    .get(&(collection.to_string(), doc_id.to_string()))
                    .and_then(|doc| doc.get(field).cloned())
            });

        async move { result }
    }

    fn upsert(
        &self,
        collection: &str,
        doc_id: &str,
        fields: serde_json::Value,
        _auth: &StoreAuth,
    ) -> impl Future<Output = Result<()>> + Send {
        self.upsert_calls.fetch_add(1, Ordering::SeqCst);

        let result = if decrement_if_positive(&self.failures_remaining) {
            Err(StorageError::Network("mock upsert failure".to_string()))
        } else {
            self.documents
                .lock()
                .map_err(|_| StorageError::Io("mock store poisoned".to_string()))
                .map(|mut documents| {
                    documents.insert((collection.to_string(), doc_id.to_string()), fields);
                })
        };

        async move { result }
    }
}

/// Atomically decrement `counter` if it is positive; returns whether a
/// decrement happened.
fn decrement_if_positive(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}
