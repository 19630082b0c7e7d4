//! Shipper configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Configuration for [`CloudLogShipper`](crate::CloudLogShipper).
///
/// # Example
///
/// ```
/// use dossier_cloudlog::ShipperConfig;
/// use std::time::Duration;
///
/// let config = ShipperConfig::new("1.4.2", "analyst-pc", "/tmp/dossier-logs")
///     .with_flush_interval(Duration::from_secs(10))
///     .with_max_entries(100);
/// ```
#[derive(Debug, Clone)]
pub struct ShipperConfig {
    /// How often the worker drains the buffer regardless of size.
    pub flush_interval: Duration,

    /// Buffer size that triggers an immediate drain.
    pub max_entries: usize,

    /// Upload attempts per batch before falling back to the backup file.
    pub max_attempts: usize,

    /// Fixed delay between upload attempts.
    pub retry_delay: Duration,

    /// How long `shutdown` waits for the worker to finish.
    pub shutdown_timeout: Duration,

    /// Remote folder all log files live under.
    pub root_folder: String,

    /// Application version, part of the remote path.
    pub app_version: String,

    /// Machine/application username composite, part of the remote path.
    /// Sanitized before use.
    pub user_name: String,

    /// Directory for local backup files when uploads are exhausted.
    pub backup_dir: PathBuf,
}

impl ShipperConfig {
    /// Configuration with default timing and batching values.
    #[must_use]
    pub fn new(
        app_version: impl Into<String>,
        user_name: impl Into<String>,
        backup_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            flush_interval: Duration::from_secs(30),
            max_entries: 50,
            max_attempts: 3,
            retry_delay: Duration::from_secs(2),
            shutdown_timeout: Duration::from_secs(5),
            root_folder: "app_logs".to_string(),
            app_version: app_version.into(),
            user_name: user_name.into(),
            backup_dir: backup_dir.into(),
        }
    }

    /// Set the periodic drain interval.
    #[must_use]
    pub const fn with_flush_interval(mut self, interval: Duration) -> Self {
        self.flush_interval = interval;
        self
    }

    /// Set the buffer size that forces an early drain.
    #[must_use]
    pub const fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    /// Set the number of upload attempts per batch.
    #[must_use]
    pub const fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Set the fixed delay between upload attempts.
    #[must_use]
    pub const fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Set the bounded shutdown join timeout.
    #[must_use]
    pub const fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Set the remote root folder.
    #[must_use]
    pub fn with_root_folder(mut self, folder: impl Into<String>) -> Self {
        self.root_folder = folder.into();
        self
    }
}
