//! # Dossier Authentication
//!
//! Session-token lifecycle for the Dossier client: keeping a bearer
//! credential valid through silent refresh, escalating to re-login only
//! when the provider demands a freshly issued credential, and guaranteeing
//! that an unrecoverable session always ends in a clean, visible logout.
//!
//! ## Architecture
//!
//! The [`SessionTokenManager`] owns the single canonical in-memory
//! [`SessionCredential`] behind an async lock. External dependencies are
//! traits so the lifecycle logic runs against mocks at memory speed:
//!
//! - [`IdentityProvider`](providers::IdentityProvider) — sign-in, refresh
//!   token exchange, and the sensitive account operations.
//! - [`CredentialStore`](providers::CredentialStore) — the optional
//!   persisted "remember me" mirror of the session.
//! - [`TokenObserver`] — told about every new token and every cleared
//!   session (the cloud log shipper hangs off this).
//! - [`NotificationSink`] — user-visible messages for forced logouts.
//!
//! ## Sensitive actions
//!
//! Password change, profile update and account deletion may be rejected
//! with a distinct "credential too old" reason even when the token is not
//! expired. [`SessionTokenManager::with_fresh_credentials`] handles that
//! protocol: one forced refresh, one retry, then
//! [`AuthError::ReauthenticationRequired`] without touching the session.

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

pub mod config;
pub mod error;
pub mod manager;
pub mod notify;
pub mod observer;
pub mod providers;
pub mod state;
pub mod stores;
pub mod usage;

#[cfg(feature = "test-utils")]
pub mod mocks;

pub use config::SessionConfig;
pub use error::{AuthError, Result};
pub use manager::SessionTokenManager;
pub use notify::{NoticeLevel, NotificationSink};
pub use observer::TokenObserver;
pub use state::SessionCredential;
pub use usage::UsageRecorder;
