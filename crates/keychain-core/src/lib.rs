//! Core abstractions for the keychain client: key normalization, the
//! encryption envelope and the backend-agnostic storage client.
//! This crate is intentionally small and synchronous; backends live in
//! `keychain-storage` and concurrency wrappers in `keychain-async`.

pub mod envelope;
pub mod error;
pub mod key;
pub mod settings;
pub mod storage;

pub use error::KeyChainError;
pub use settings::EncryptionSettings;
pub use storage::{FnBackend, ItemMode, KeyChainBackend, KeyChainClient};
