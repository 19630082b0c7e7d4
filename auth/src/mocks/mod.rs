//! In-memory test doubles for the session lifecycle.
//!
//! Available behind the default `test-utils` feature so downstream crates
//! can drive the manager in their own tests without a network.

mod credential_store;
mod identity;

pub use credential_store::MockCredentialStore;
pub use identity::MockIdentityProvider;

use crate::notify::{NoticeLevel, NotificationSink};
use crate::observer::TokenObserver;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Records every observer callback for later assertion.
#[derive(Debug, Default)]
pub struct RecordingTokenObserver {
    updates: Mutex<Vec<(String, String)>>,
    cleared: AtomicUsize,
}

impl RecordingTokenObserver {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All `(user_id, access_token)` updates seen, in order.
    #[must_use]
    pub fn updates(&self) -> Vec<(String, String)> {
        self.updates
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    /// How many times the session was cleared.
    #[must_use]
    pub fn cleared_count(&self) -> usize {
        self.cleared.load(Ordering::SeqCst)
    }
}

impl TokenObserver for RecordingTokenObserver {
    fn token_updated(&self, user_id: &str, access_token: &str) {
        if let Ok(mut guard) = self.updates.lock() {
            guard.push((user_id.to_string(), access_token.to_string()));
        }
    }

    fn session_cleared(&self) {
        self.cleared.fetch_add(1, Ordering::SeqCst);
    }
}

/// Captures user-visible notifications instead of showing them.
#[derive(Debug, Default)]
pub struct MockNotificationSink {
    messages: Mutex<Vec<(NoticeLevel, String)>>,
}

impl MockNotificationSink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All captured messages, in order.
    #[must_use]
    pub fn messages(&self) -> Vec<(NoticeLevel, String)> {
        self.messages
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

impl NotificationSink for MockNotificationSink {
    fn notify(&self, level: NoticeLevel, message: &str) {
        if let Ok(mut guard) = self.messages.lock() {
            guard.push((level, message.to_string()));
        }
    }
}

/// Consume one scripted failure. Returns true while failures remain.
pub(crate) fn decrement_if_positive(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
            current.checked_sub(1)
        })
        .is_ok()
}
