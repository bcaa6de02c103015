use std::{fmt, sync::Arc};

use tracing::{debug, instrument};

use super::backend::{ItemMode, KeyChainBackend};
use crate::{envelope, error::KeyChainError, key::normalize, settings::EncryptionSettings};

/// Encrypting client over an injected [`KeyChainBackend`].
///
/// Every key is passed through [`normalize`] first, so keys that differ only
/// by whitespace or non-ASCII characters address the same item. Values are
/// sealed with the key derived from the current [`EncryptionSettings`] before
/// they reach the backend and opened again on the way out.
///
/// The client holds no mutable state of its own; clones share the backend
/// and the settings handle and may be used from any thread.
#[derive(Clone)]
pub struct KeyChainClient {
    backend: Arc<dyn KeyChainBackend>,
    settings: EncryptionSettings,
}

impl KeyChainClient {
    pub fn new(backend: impl KeyChainBackend + 'static, settings: EncryptionSettings) -> Self {
        Self {
            backend: Arc::new(backend),
            settings,
        }
    }

    /// Build from an already shared backend.
    pub fn from_shared(backend: Arc<dyn KeyChainBackend>, settings: EncryptionSettings) -> Self {
        Self { backend, settings }
    }

    pub fn settings(&self) -> &EncryptionSettings {
        &self.settings
    }

    /// Whether a value is stored under `key`. Performs no decryption.
    pub fn exists(&self, key: &str) -> bool {
        self.backend.exists(&normalize(key))
    }

    /// Fetch and decrypt the value stored under `key`.
    ///
    /// Backend failures ([`KeyChainError::NotFound`],
    /// [`KeyChainError::UserCancelledOrFailedAuthentication`]) pass through
    /// unchanged; [`KeyChainError::DecryptionFailed`] means the stored
    /// envelope does not authenticate under the current passphrase.
    ///
    /// # Panics
    ///
    /// If the stored bytes are not a structurally valid envelope.
    #[instrument(level = "debug", skip_all)]
    pub fn get(&self, key: &str) -> Result<Vec<u8>, KeyChainError> {
        let key = normalize(key);
        let sealed = self.backend.get(&key)?;
        let opened = envelope::open(&sealed, &self.settings.derived_key());
        if let Err(err) = &opened {
            debug!(%key, "open failed: {err}");
        }
        opened
    }

    /// Encrypt `data` and store it under `key` with [`ItemMode::UserPresence`].
    pub fn put(&self, key: &str, data: &[u8]) {
        self.put_with_mode(key, data, ItemMode::UserPresence)
    }

    /// Encrypt `data` and store it under `key` with [`ItemMode::System`].
    pub fn put_system(&self, key: &str, data: &[u8]) {
        self.put_with_mode(key, data, ItemMode::System)
    }

    #[instrument(level = "debug", skip(self, data))]
    fn put_with_mode(&self, key: &str, data: &[u8], mode: ItemMode) {
        let key = normalize(key);
        let sealed = envelope::seal(data, &self.settings.derived_key());
        self.backend.put(&key, &sealed, mode);
    }
}

impl fmt::Debug for KeyChainClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyChainClient")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
