//! Cloud logging error taxonomy.
//!
//! These never escape the shipper's public surface; they travel between
//! the strategies, the retry loop and the backup writer.

use dossier_core::StorageError;
use thiserror::Error;

/// Errors raised while shipping a log batch.
#[derive(Debug, Error)]
pub enum CloudLogError {
    /// User-scoped upload attempted before any user signed in.
    #[error("No user context set; cannot upload user-scoped logs")]
    MissingUserContext,

    /// The remote store rejected the upload.
    #[error("Upload failed: {0}")]
    Upload(#[from] StorageError),

    /// Writing the local backup file failed.
    #[error("Backup write failed: {0}")]
    Backup(String),
}

impl CloudLogError {
    /// Whether retrying the same upload could plausibly succeed.
    ///
    /// A missing user context cannot be fixed by waiting, so the retry
    /// loop gives up on it immediately.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::MissingUserContext | Self::Backup(_) => false,
            Self::Upload(err) => err.is_transient(),
        }
    }
}

/// Result alias for cloud logging operations.
pub type Result<T> = std::result::Result<T, CloudLogError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_context_is_not_retryable() {
        assert!(!CloudLogError::MissingUserContext.is_retryable());
    }

    #[test]
    fn test_transient_upload_is_retryable() {
        let err = CloudLogError::Upload(StorageError::Timeout);
        assert!(err.is_retryable());
        let err = CloudLogError::Upload(StorageError::Provider {
            status: 403,
            code: "PERMISSION_DENIED".to_string(),
        });
        assert!(!err.is_retryable());
    }
}
