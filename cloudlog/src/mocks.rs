//! In-memory upload strategy for tests.

use crate::error::{CloudLogError, Result};
use crate::strategy::{merge_batch, UploadStrategy};
use dossier_core::StorageError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Upload strategy that keeps the "remote" document in memory and can
/// script upload failures. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MockUploadStrategy {
    remote: Arc<Mutex<String>>,
    batches: Arc<Mutex<Vec<Vec<String>>>>,
    fail_remaining: Arc<AtomicUsize>,
    attempts: Arc<AtomicUsize>,
    fail_missing_context: bool,
}

impl MockUploadStrategy {
    /// Strategy that accepts every upload.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `count` upload attempts with a transient error.
    #[must_use]
    pub fn failing(self, count: usize) -> Self {
        self.fail_remaining.store(count, Ordering::SeqCst);
        self
    }

    /// Fail every upload attempt.
    #[must_use]
    pub fn always_failing(self) -> Self {
        self.failing(usize::MAX)
    }

    /// Reject every upload as if no user were signed in (a failure
    /// retrying cannot fix).
    #[must_use]
    pub const fn missing_user_context(mut self) -> Self {
        self.fail_missing_context = true;
        self
    }

    /// The accumulated remote document.
    #[must_use]
    pub fn remote_content(&self) -> String {
        self.remote
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    /// Batches accepted so far, in upload order.
    #[must_use]
    pub fn batches(&self) -> Vec<Vec<String>> {
        self.batches
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    /// Number of successful uploads.
    #[must_use]
    pub fn batch_count(&self) -> usize {
        self.batches.lock().map(|guard| guard.len()).unwrap_or(0)
    }

    /// Number of upload attempts, including failed ones.
    #[must_use]
    pub fn attempt_count(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl UploadStrategy for MockUploadStrategy {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn remote_path(&self, folder: &str, file_name: &str) -> String {
        format!("mock/{folder}/{file_name}")
    }

    async fn fetch_existing(&self, _folder: &str, _file_name: &str) -> String {
        self.remote_content()
    }

    async fn upload(&self, batch: &[String], _folder: &str, _file_name: &str) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        if self.fail_missing_context {
            return Err(CloudLogError::MissingUserContext);
        }

        let should_fail = self
            .fail_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if should_fail {
            return Err(CloudLogError::Upload(StorageError::Network(
                "scripted failure".to_string(),
            )));
        }

        let merged = {
            let existing = self.remote_content();
            merge_batch(&existing, batch)
        };
        if let Ok(mut guard) = self.remote.lock() {
            *guard = merged;
        }
        if let Ok(mut guard) = self.batches.lock() {
            guard.push(batch.to_vec());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_failures_run_out() {
        let strategy = MockUploadStrategy::new().failing(1);
        let batch = vec!["line".to_string()];

        assert!(strategy.upload(&batch, "f", "x.log").await.is_err());
        assert!(strategy.upload(&batch, "f", "x.log").await.is_ok());
        assert_eq!(strategy.attempt_count(), 2);
        assert_eq!(strategy.batch_count(), 1);
    }
}
