//! Local backup for batches that exhausted their upload retries.
//!
//! A batch that cannot reach remote storage is never dropped; it lands in
//! a timestamped file with enough header metadata to ship it manually
//! later.

use crate::error::{CloudLogError, Result};
use chrono::Utc;
use std::path::{Path, PathBuf};

/// Writes failed batches to a configured directory.
#[derive(Debug, Clone)]
pub struct BackupWriter {
    dir: PathBuf,
}

impl BackupWriter {
    /// Writer targeting `dir`; the directory is created on first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The backup directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write one failed batch. Returns the path of the created file.
    ///
    /// The file starts with header lines naming the strategy and the
    /// intended remote path, followed by the batch verbatim.
    ///
    /// # Errors
    ///
    /// Returns [`CloudLogError::Backup`] if the directory or file cannot
    /// be written.
    pub async fn write(
        &self,
        strategy_name: &str,
        remote_path: &str,
        batch: &[String],
    ) -> Result<PathBuf> {
        let now = Utc::now();
        let file_path = self
            .dir
            .join(format!("failed-{}.log", now.format("%Y%m%d-%H%M%S%.3f")));

        let mut content = String::new();
        content.push_str(&format!("# strategy: {strategy_name}\n"));
        content.push_str(&format!("# intended path: {remote_path}\n"));
        content.push_str(&format!("# written at: {}\n", now.to_rfc3339()));
        content.push_str(&batch.join("\n"));
        content.push('\n');

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|err| CloudLogError::Backup(err.to_string()))?;
        tokio::fs::write(&file_path, content)
            .await
            .map_err(|err| CloudLogError::Backup(err.to_string()))?;

        Ok(file_path)
    }
}
