//! Concrete backends for the keychain client.
//! `KeyringBackend` persists envelopes in the OS keyring; `MemoryBackend`
//! is the mutex-guarded test double.

pub mod auth;
pub mod keyring_backend;
pub mod memory;

pub use auth::{AuthError, AuthPolicy, Authenticator, NoPrompt};
pub use keyring_backend::{GetOption, KeyringBackend, KeyringSettings};
pub use memory::MemoryBackend;
