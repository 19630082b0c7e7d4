//! # Dossier Core
//!
//! Shared storage contracts and retry machinery for the Dossier client.
//!
//! This crate defines the request/response contracts the rest of the
//! application consumes from the cloud backend:
//!
//! - [`BlobStore`](blob::BlobStore): upload/download text objects under a
//!   named path, in either end-user (bearer token) or privileged (service
//!   credential) authorization mode.
//! - [`DocumentStore`](document::DocumentStore): read a single field of a
//!   document, or upsert a whole document with the given fields. No
//!   partial-merge semantics are assumed.
//! - [`retry`]: generic retry with configurable delay policy, used by the
//!   cloud log shipper.
//!
//! Concrete REST implementations live next to each trait; in-memory mocks
//! for tests are available behind the default `test-utils` feature.

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

pub mod blob;
pub mod credentials;
pub mod document;
pub mod error;
pub mod retry;

#[cfg(feature = "test-utils")]
pub mod mocks;

pub use blob::{BlobStore, RestBlobStore};
pub use credentials::StoreAuth;
pub use document::{DocumentStore, RestDocumentStore, chronological_id};
pub use error::{Result, StorageError};
pub use retry::{RetryPolicy, retry_with_policy};
