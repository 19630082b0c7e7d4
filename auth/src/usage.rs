//! Per-user usage recording.
//!
//! Appends small analytics documents (one per recorded event) under a
//! per-user collection, keyed by time-sortable ids so a plain listing
//! reads back in chronological order. Recording is best-effort: a failed
//! write is logged and dropped, it never interrupts the user's action.

use dossier_core::{chronological_id, DocumentStore, StoreAuth};
use serde_json::json;

/// Records usage events for the signed-in user.
pub struct UsageRecorder<D>
where
    D: DocumentStore,
{
    store: D,
    app_version: String,
}

impl<D> UsageRecorder<D>
where
    D: DocumentStore,
{
    /// Create a recorder stamping every event with `app_version`.
    #[must_use]
    pub fn new(store: D, app_version: impl Into<String>) -> Self {
        Self {
            store,
            app_version: app_version.into(),
        }
    }

    /// Record one event for `user_id`.
    ///
    /// Best-effort: errors are logged at warn level and swallowed.
    pub async fn record(
        &self,
        user_id: &str,
        access_token: &str,
        event: &str,
        quantity: u64,
    ) {
        let collection = format!("usage/{user_id}/events");
        let doc_id = chronological_id();
        let fields = json!({
            "event": event,
            "quantity": quantity,
            "app_version": self.app_version,
            "recorded_at": chrono::Utc::now().to_rfc3339(),
        });

        let auth = StoreAuth::Bearer(access_token.to_string());
        if let Err(err) = self.store.upsert(&collection, &doc_id, fields, &auth).await {
            tracing::warn!(error = %err, event, "Failed to record usage event");
        }
    }
}
