//! User-visible notification sink.

/// Severity of a user-visible message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    /// Informational message.
    Info,
    /// Something went wrong but the user can continue or retry.
    Warning,
    /// The user must act (e.g. sign in again).
    Error,
}

/// Non-blocking sink for messages the user should see.
///
/// The UI layer provides the implementation (snackbar, dialog, status
/// line); the session layer only decides *when* a message is warranted —
/// forced logouts always produce one, transient failures never force one.
pub trait NotificationSink: Send + Sync {
    /// Show `message` to the user. Must not block the caller.
    fn notify(&self, level: NoticeLevel, message: &str);
}

/// Sink that forwards notifications to the tracing output.
///
/// Useful as a default in headless contexts and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotificationSink;

impl NotificationSink for TracingNotificationSink {
    fn notify(&self, level: NoticeLevel, message: &str) {
        match level {
            NoticeLevel::Info => tracing::info!(notice = message, "User notification"),
            NoticeLevel::Warning => tracing::warn!(notice = message, "User notification"),
            NoticeLevel::Error => tracing::error!(notice = message, "User notification"),
        }
    }
}
