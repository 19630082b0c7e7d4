//! Buffered, batching, retrying log shipper.
//!
//! One shipper is constructed at process start; clones of the handle are
//! cheap and share the same buffer and the same single background worker.
//! Appenders only ever take a short-lived std mutex, so `emit` never
//! blocks on network IO.

use crate::backup::BackupWriter;
use crate::config::ShipperConfig;
use crate::error::CloudLogError;
use crate::path::{log_file_name, remote_folder};
use crate::strategy::UploadStrategy;
use chrono::Utc;
use dossier_core::{retry_with_policy, RetryPolicy};
use std::mem;
use std::sync::{Arc, Mutex};
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;

/// State shared between handle clones and the worker task.
struct Shared {
    buffer: Mutex<Vec<String>>,
    flush_signal: Notify,
    config: ShipperConfig,
    backup: BackupWriter,
    strategy_name: &'static str,
}

impl Shared {
    /// Take everything currently buffered.
    fn drain(&self) -> Vec<String> {
        self.buffer
            .lock()
            .map(|mut guard| mem::take(&mut *guard))
            .unwrap_or_default()
    }
}

/// Handle to the process-wide log shipping service.
///
/// Dropping the last handle stops the worker after one final drain.
/// Prefer calling [`shutdown`](Self::shutdown) from the process-exit
/// path: it waits (with a bounded timeout) for that flush to finish.
#[derive(Clone)]
pub struct CloudLogShipper {
    shared: Arc<Shared>,
    stop_tx: watch::Sender<bool>,
    worker: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl CloudLogShipper {
    /// Start the shipper: spawns exactly one background worker that owns
    /// `strategy` and drains the buffer on a timer, on the size
    /// threshold, and once more at shutdown.
    #[must_use]
    pub fn spawn<S>(strategy: S, config: ShipperConfig) -> Self
    where
        S: UploadStrategy,
    {
        let shared = Arc::new(Shared {
            buffer: Mutex::new(Vec::new()),
            flush_signal: Notify::new(),
            backup: BackupWriter::new(config.backup_dir.clone()),
            strategy_name: strategy.name(),
            config,
        });
        let (stop_tx, stop_rx) = watch::channel(false);

        let worker = tokio::spawn(worker_loop(strategy, Arc::clone(&shared), stop_rx));

        Self {
            shared,
            stop_tx,
            worker: Arc::new(Mutex::new(Some(worker))),
        }
    }

    /// Append one formatted log line to the buffer.
    ///
    /// Empty and whitespace-only lines are dropped. When the buffer
    /// reaches the configured maximum the worker is signalled to drain
    /// early; the signal is sent after the lock is released, so emitters
    /// never wait on the network path. Never panics, never errors.
    pub fn emit(&self, line: &str) {
        if line.trim().is_empty() {
            return;
        }

        let len = match self.shared.buffer.lock() {
            Ok(mut guard) => {
                guard.push(line.to_string());
                guard.len()
            }
            Err(_) => return,
        };

        if len >= self.shared.config.max_entries {
            self.shared.flush_signal.notify_one();
        }
    }

    /// Ask the worker to drain now, regardless of buffer size.
    pub fn flush(&self) {
        self.shared.flush_signal.notify_one();
    }

    /// Number of lines currently buffered.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.shared.buffer.lock().map(|guard| guard.len()).unwrap_or(0)
    }

    /// Stop the worker and flush whatever remains.
    ///
    /// The worker performs one final drain-and-upload before exiting; the
    /// join is bounded by the configured shutdown timeout. If the worker
    /// does not finish in time, a warning is logged, any lines still
    /// buffered are salvaged to the local backup file, and shutdown
    /// proceeds — process exit is never blocked indefinitely.
    pub async fn shutdown(&self) {
        let _ = self.stop_tx.send(true);
        self.shared.flush_signal.notify_one();

        let handle = self
            .worker
            .lock()
            .ok()
            .and_then(|mut guard| guard.take());
        let Some(handle) = handle else {
            return;
        };

        let timeout = self.shared.config.shutdown_timeout;
        match tokio::time::timeout(timeout, handle).await {
            Ok(Ok(())) => {
                tracing::debug!(target: "dossier_cloudlog::shipper", "Log worker finished");
            }
            Ok(Err(join_err)) => {
                tracing::warn!(
                    target: "dossier_cloudlog::shipper",
                    error = %join_err,
                    "Log worker ended abnormally"
                );
            }
            Err(_) => {
                tracing::warn!(
                    target: "dossier_cloudlog::shipper",
                    timeout_ms = timeout.as_millis(),
                    "Log worker did not stop in time, proceeding with shutdown"
                );
                self.salvage_remainder().await;
            }
        }
    }

    /// Last-resort flush when the worker could not be joined: whatever is
    /// still buffered goes straight to the backup file.
    async fn salvage_remainder(&self) {
        let batch = self.shared.drain();
        if batch.is_empty() {
            return;
        }

        let intended = format!(
            "{}/{}",
            remote_folder(&self.shared.config),
            log_file_name(Utc::now())
        );
        if let Err(err) = self
            .shared
            .backup
            .write(self.shared.strategy_name, &intended, &batch)
            .await
        {
            tracing::error!(
                target: "dossier_cloudlog::shipper",
                error = %err,
                lines = batch.len(),
                "Lost log lines: backup write failed during shutdown"
            );
        }
    }
}

/// Background worker: waits on timer, flush signal, or stop; drains and
/// uploads on every wakeup; drains once more before exiting.
async fn worker_loop<S>(strategy: S, shared: Arc<Shared>, mut stop_rx: watch::Receiver<bool>)
where
    S: UploadStrategy,
{
    let mut ticker = tokio::time::interval(shared.config.flush_interval);
    // The first tick completes immediately; consume it so the loop waits
    // a full interval before the first timed drain.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                drain_and_upload(&strategy, &shared).await;
            }
            () = shared.flush_signal.notified() => {
                drain_and_upload(&strategy, &shared).await;
            }
            changed = stop_rx.changed() => {
                // A closed channel means every handle was dropped; treat
                // it like an explicit stop so the loop never spins on an
                // immediately-ready error arm.
                if changed.is_err() || *stop_rx.borrow() {
                    break;
                }
            }
        }
    }

    // Final drain on shutdown.
    drain_and_upload(&strategy, &shared).await;
    tracing::debug!(target: "dossier_cloudlog::shipper", "Log worker stopped");
}

/// Take the current batch and ship it; on retry exhaustion the batch goes
/// verbatim to the backup file so nothing is silently lost.
async fn drain_and_upload<S>(strategy: &S, shared: &Shared)
where
    S: UploadStrategy,
{
    let batch = shared.drain();
    if batch.is_empty() {
        return;
    }

    let folder = remote_folder(&shared.config);
    let file_name = log_file_name(Utc::now());
    let policy = RetryPolicy::fixed(shared.config.max_attempts, shared.config.retry_delay);

    let outcome = retry_with_policy(
        &policy,
        || strategy.upload(&batch, &folder, &file_name),
        CloudLogError::is_retryable,
    )
    .await;

    match outcome {
        Ok(()) => {
            tracing::debug!(
                target: "dossier_cloudlog::shipper",
                lines = batch.len(),
                "Shipped log batch"
            );
        }
        Err(err) => {
            tracing::warn!(
                target: "dossier_cloudlog::shipper",
                error = %err,
                lines = batch.len(),
                "Upload retries exhausted, writing batch to local backup"
            );
            let intended = strategy.remote_path(&folder, &file_name);
            if let Err(backup_err) = shared
                .backup
                .write(strategy.name(), &intended, &batch)
                .await
            {
                tracing::error!(
                    target: "dossier_cloudlog::shipper",
                    error = %backup_err,
                    lines = batch.len(),
                    "Lost log lines: backup write failed"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::MockUploadStrategy;
    use std::time::Duration;

    fn test_config(backup_dir: &std::path::Path) -> ShipperConfig {
        // Hour-long interval so only explicit triggers drain the buffer.
        ShipperConfig::new("1.0.0", "tester", backup_dir)
            .with_flush_interval(Duration::from_secs(3600))
            .with_max_entries(50)
            .with_max_attempts(2)
            .with_retry_delay(Duration::from_millis(10))
            .with_shutdown_timeout(Duration::from_secs(2))
    }

    async fn wait_for<F>(mut condition: F)
    where
        F: FnMut() -> bool,
    {
        for _ in 0..200 {
            if condition() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("condition not met within 2s");
    }

    #[tokio::test]
    async fn test_emit_drops_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let shipper = CloudLogShipper::spawn(MockUploadStrategy::new(), test_config(dir.path()));

        shipper.emit("");
        shipper.emit("   \t  ");
        shipper.emit("real line");

        assert_eq!(shipper.pending(), 1);
        shipper.shutdown().await;
    }

    #[tokio::test]
    async fn test_threshold_triggers_early_flush() {
        let dir = tempfile::tempdir().unwrap();
        let strategy = MockUploadStrategy::new();
        let config = test_config(dir.path()).with_max_entries(3);
        let shipper = CloudLogShipper::spawn(strategy.clone(), config);

        shipper.emit("one");
        shipper.emit("two");
        assert_eq!(strategy.batch_count(), 0);
        shipper.emit("three");

        // Drained long before the hour-long timer could fire.
        wait_for(|| strategy.batch_count() == 1).await;
        assert_eq!(shipper.pending(), 0);
        assert_eq!(strategy.batches()[0], vec!["one", "two", "three"]);
        shipper.shutdown().await;
    }

    #[tokio::test]
    async fn test_explicit_flush_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let strategy = MockUploadStrategy::new();
        let shipper = CloudLogShipper::spawn(strategy.clone(), test_config(dir.path()));

        shipper.emit("1");
        shipper.emit("2");
        shipper.flush();
        wait_for(|| strategy.batch_count() == 1).await;

        shipper.emit("3");
        shipper.flush();
        wait_for(|| strategy.batch_count() == 2).await;

        assert_eq!(strategy.remote_content(), "1\n2\n3\n");
        shipper.shutdown().await;
    }

    #[tokio::test]
    async fn test_retry_exhaustion_writes_backup_exactly_once() {
        let dir = tempfile::tempdir().unwrap();
        let strategy = MockUploadStrategy::new().always_failing();
        let shipper = CloudLogShipper::spawn(strategy.clone(), test_config(dir.path()));

        shipper.emit("lost-1");
        shipper.emit("lost-2");
        shipper.flush();

        wait_for(|| std::fs::read_dir(dir.path()).map(|d| d.count() > 0).unwrap_or(false)).await;

        // Both configured attempts were made.
        assert_eq!(strategy.attempt_count(), 2);
        // Batch is out of the buffer and in exactly one backup file.
        assert_eq!(shipper.pending(), 0);
        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
        let content = std::fs::read_to_string(entries[0].as_ref().unwrap().path()).unwrap();
        assert!(content.contains("# strategy: mock"));
        assert!(content.ends_with("lost-1\nlost-2\n"));

        shipper.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_flushes_remaining_lines() {
        let dir = tempfile::tempdir().unwrap();
        let strategy = MockUploadStrategy::new();
        let shipper = CloudLogShipper::spawn(strategy.clone(), test_config(dir.path()));

        shipper.emit("a");
        shipper.emit("b");
        shipper.emit("c");
        assert_eq!(strategy.batch_count(), 0);

        shipper.shutdown().await;

        // Final drain shipped exactly the three unsent lines, and the
        // worker is gone.
        assert_eq!(strategy.remote_content(), "a\nb\nc\n");
        assert_eq!(shipper.pending(), 0);
        assert!(shipper.worker.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_dropping_last_handle_stops_worker_with_final_drain() {
        let dir = tempfile::tempdir().unwrap();
        let strategy = MockUploadStrategy::new();
        let shipper = CloudLogShipper::spawn(strategy.clone(), test_config(dir.path()));

        shipper.emit("parting line");
        drop(shipper);

        // The closed stop channel ends the worker; the final drain still
        // ships what was buffered instead of spinning on a dead channel.
        wait_for(|| strategy.batch_count() == 1).await;
        assert_eq!(strategy.remote_content(), "parting line\n");
        assert_eq!(strategy.attempt_count(), 1);
    }

    #[tokio::test]
    async fn test_missing_context_goes_to_backup_without_retries() {
        let dir = tempfile::tempdir().unwrap();
        let strategy = MockUploadStrategy::new().missing_user_context();
        let config = test_config(dir.path()).with_max_attempts(3);
        let shipper = CloudLogShipper::spawn(strategy.clone(), config);

        shipper.emit("before sign-in");
        shipper.flush();

        wait_for(|| std::fs::read_dir(dir.path()).map(|d| d.count() > 0).unwrap_or(false)).await;

        // Nothing a retry could fix: exactly one attempt, straight to
        // backup.
        assert_eq!(strategy.attempt_count(), 1);
        assert_eq!(shipper.pending(), 0);

        shipper.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_with_empty_buffer_is_clean() {
        let dir = tempfile::tempdir().unwrap();
        let strategy = MockUploadStrategy::new();
        let shipper = CloudLogShipper::spawn(strategy.clone(), test_config(dir.path()));

        shipper.shutdown().await;
        assert_eq!(strategy.attempt_count(), 0);
    }

    #[tokio::test]
    async fn test_handle_clones_share_one_buffer() {
        let dir = tempfile::tempdir().unwrap();
        let strategy = MockUploadStrategy::new();
        let shipper = CloudLogShipper::spawn(strategy.clone(), test_config(dir.path()));
        let clone = shipper.clone();

        shipper.emit("from original");
        clone.emit("from clone");
        assert_eq!(shipper.pending(), 2);

        clone.shutdown().await;
        assert_eq!(strategy.remote_content(), "from original\nfrom clone\n");
    }
}
