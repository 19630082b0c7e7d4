//! In-memory credential store.

use crate::error::{AuthError, Result};
use crate::providers::CredentialStore;
use crate::state::SessionCredential;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Credential store backed by a shared in-memory slot.
///
/// Clones share the slot, so one instance can play the roles of both the
/// store that saved a session and the store a later manager restores
/// from.
#[derive(Debug, Clone, Default)]
pub struct MockCredentialStore {
    slot: Arc<Mutex<Option<SessionCredential>>>,
    save_calls: Arc<AtomicUsize>,
    clear_calls: Arc<AtomicUsize>,
}

impl MockCredentialStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The currently persisted credential, if any.
    #[must_use]
    pub fn stored(&self) -> Option<SessionCredential> {
        self.slot.lock().map(|guard| guard.clone()).unwrap_or(None)
    }

    /// Number of save calls received.
    #[must_use]
    pub fn save_count(&self) -> usize {
        self.save_calls.load(Ordering::SeqCst)
    }

    /// Number of clear calls received.
    #[must_use]
    pub fn clear_count(&self) -> usize {
        self.clear_calls.load(Ordering::SeqCst)
    }
}

impl CredentialStore for MockCredentialStore {
    fn save(&self, credential: &SessionCredential) -> impl Future<Output = Result<()>> + Send {
        self.save_calls.fetch_add(1, Ordering::SeqCst);
        let result = match self.slot.lock() {
            Ok(mut guard) => {
                *guard = Some(credential.clone());
                Ok(())
            }
            Err(_) => Err(AuthError::Store("mock slot poisoned".to_string())),
        };
        async move { result }
    }

    fn load(&self) -> impl Future<Output = Result<Option<SessionCredential>>> + Send {
        let result = match self.slot.lock() {
            Ok(guard) => Ok(guard.clone()),
            Err(_) => Err(AuthError::Store("mock slot poisoned".to_string())),
        };
        async move { result }
    }

    fn clear(&self) -> impl Future<Output = Result<()>> + Send {
        self.clear_calls.fetch_add(1, Ordering::SeqCst);
        let result = match self.slot.lock() {
            Ok(mut guard) => {
                *guard = None;
                Ok(())
            }
            Err(_) => Err(AuthError::Store("mock slot poisoned".to_string())),
        };
        async move { result }
    }
}
