//! Credential store implementations.

pub mod file;
pub mod noop;

pub use file::FileCredentialStore;
pub use noop::NoopCredentialStore;
