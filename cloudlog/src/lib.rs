//! # Dossier Cloud Logging
//!
//! Ships application log lines to remote blob storage without ever
//! blocking or crashing the caller: lines are buffered process-wide,
//! drained by a single background worker on a timer or a size threshold,
//! uploaded with bounded retries, and written to a local backup file when
//! every attempt fails. A `tracing` layer feeds the shipper so normal
//! `tracing::info!` calls end up in the cloud.
//!
//! ## Architecture
//!
//! - [`UploadStrategy`] decides *where* a batch goes: under the signed-in
//!   user's private prefix ([`UserScopedStrategy`]) or a shared service
//!   prefix ([`ServiceScopedStrategy`]). The batching and retry machinery
//!   is identical for both.
//! - [`CloudLogShipper`] is an explicit, owned service handle constructed
//!   once at startup; clones share one buffer and one worker task.
//! - [`UserContextHandle`] implements
//!   [`dossier_auth::TokenObserver`], so the session token manager keeps
//!   the user-scoped strategy's credentials current automatically.

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

pub mod backup;
pub mod config;
pub mod error;
pub mod layer;
pub mod path;
pub mod shipper;
pub mod strategy;

#[cfg(feature = "test-utils")]
pub mod mocks;

pub use config::ShipperConfig;
pub use error::{CloudLogError, Result};
pub use layer::CloudLogLayer;
pub use shipper::CloudLogShipper;
pub use strategy::{
    merge_batch, ServiceScopedStrategy, UploadStrategy, UserContextHandle, UserScopedStrategy,
};
