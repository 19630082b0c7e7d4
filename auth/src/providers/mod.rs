//! Authentication providers.
//!
//! This module defines traits for the external dependencies of the session
//! layer. Providers are **interfaces**, not implementations: the manager
//! depends on these traits, the application wires in the REST
//! implementations, and tests wire in mocks.

pub mod credential_store;
pub mod identity;
pub mod rest;

pub use credential_store::CredentialStore;
pub use identity::{IdentityProvider, SignInResponse, TokenGrant};
pub use rest::RestIdentityProvider;
