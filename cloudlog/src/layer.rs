//! `tracing` layer feeding the shipper.
//!
//! Installing this layer makes every `tracing` event a cloud log line;
//! events produced by the shipping machinery itself are skipped so a
//! failing upload can never generate more upload traffic for itself.

use crate::shipper::CloudLogShipper;
use chrono::{SecondsFormat, Utc};
use std::fmt::Write as _;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

/// Target prefixes whose events never enter the buffer.
const SELF_TARGETS: [&str; 2] = ["dossier_cloudlog", "dossier_core::retry"];

/// Formats `tracing` events and hands them to a [`CloudLogShipper`].
pub struct CloudLogLayer {
    shipper: CloudLogShipper,
}

impl CloudLogLayer {
    /// Layer emitting into `shipper`.
    #[must_use]
    pub fn new(shipper: CloudLogShipper) -> Self {
        Self { shipper }
    }
}

impl<S> Layer<S> for CloudLogLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let target = metadata.target();
        if SELF_TARGETS.iter().any(|prefix| target.starts_with(prefix)) {
            return;
        }

        let mut visitor = LineVisitor::default();
        event.record(&mut visitor);

        let line = format!(
            "{} {} {}: {}",
            Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            metadata.level(),
            target,
            visitor.rendered(),
        );
        self.shipper.emit(&line);
    }
}

/// Collects the event message and fields into one display line. Field
/// values render through `Debug`, so values without a clean string form
/// still produce a usable representation instead of dropping the line.
#[derive(Default)]
struct LineVisitor {
    message: String,
    fields: String,
}

impl LineVisitor {
    fn rendered(&self) -> String {
        if self.fields.is_empty() {
            self.message.clone()
        } else {
            format!("{}{}", self.message, self.fields)
        }
    }
}

impl Visit for LineVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{value:?}");
        } else {
            let _ = write!(self.fields, " {}={value:?}", field.name());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ShipperConfig;
    use crate::mocks::MockUploadStrategy;
    use std::time::Duration;
    use tracing_subscriber::layer::SubscriberExt;

    fn test_shipper(
        dir: &std::path::Path,
        strategy: MockUploadStrategy,
    ) -> CloudLogShipper {
        let config = ShipperConfig::new("1.0.0", "tester", dir)
            .with_flush_interval(Duration::from_secs(3600))
            .with_retry_delay(Duration::from_millis(10));
        CloudLogShipper::spawn(strategy, config)
    }

    #[tokio::test]
    async fn test_events_become_buffered_lines() {
        let dir = tempfile::tempdir().unwrap();
        let shipper = test_shipper(dir.path(), MockUploadStrategy::new());
        let subscriber =
            tracing_subscriber::registry().with(CloudLogLayer::new(shipper.clone()));

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(target: "dossier::app", document = 42, "Analysis started");
        });

        assert_eq!(shipper.pending(), 1);
        shipper.shutdown().await;
    }

    #[tokio::test]
    async fn test_own_events_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let shipper = test_shipper(dir.path(), MockUploadStrategy::new());
        let subscriber =
            tracing_subscriber::registry().with(CloudLogLayer::new(shipper.clone()));

        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(target: "dossier_cloudlog::shipper", "internal noise");
            tracing::warn!(target: "dossier_core::retry", "retry noise");
        });

        assert_eq!(shipper.pending(), 0);
        shipper.shutdown().await;
    }

    #[tokio::test]
    async fn test_line_format_carries_level_target_and_fields() {
        let dir = tempfile::tempdir().unwrap();
        let strategy = MockUploadStrategy::new();
        let shipper = test_shipper(dir.path(), strategy.clone());
        let subscriber =
            tracing_subscriber::registry().with(CloudLogLayer::new(shipper.clone()));

        tracing::subscriber::with_default(subscriber, || {
            tracing::error!(target: "dossier::app", case_id = "A-17", "Export failed");
        });
        shipper.shutdown().await;

        let content = strategy.remote_content();
        assert!(content.contains("ERROR dossier::app: Export failed"));
        assert!(content.contains("case_id=\"A-17\""));
    }
}
