use std::{
    fmt,
    sync::{Arc, PoisonError, RwLock},
};

use tracing::debug;
use zeroize::Zeroizing;

use crate::envelope::{derive_key, SymmetricKey};

/// Passphrase shipped as the default encryption key.
pub const LIVE_PASSPHRASE: &str = "🦊 The quick brown fox jumps over the lazy dog 🐶";

/// Shared handle to the encryption passphrase.
///
/// Clones point at the same setting, so swapping the passphrase through one
/// handle is observed by every client built from it on its next call.
/// Values sealed under a previous passphrase stop decrypting after a swap.
#[derive(Clone)]
pub struct EncryptionSettings {
    passphrase: Arc<RwLock<Zeroizing<Vec<u8>>>>,
}

impl EncryptionSettings {
    pub fn new(passphrase: impl Into<Vec<u8>>) -> Self {
        Self {
            passphrase: Arc::new(RwLock::new(Zeroizing::new(passphrase.into()))),
        }
    }

    /// Settings carrying [`LIVE_PASSPHRASE`].
    pub fn live() -> Self {
        Self::new(LIVE_PASSPHRASE.as_bytes())
    }

    /// Replace the passphrase for all holders of this handle.
    pub fn set_passphrase(&self, passphrase: impl Into<Vec<u8>>) {
        // The guarded value is a plain byte buffer; a panicked writer cannot
        // leave it half-updated, so poisoning is ignored.
        let mut guard = self
            .passphrase
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *guard = Zeroizing::new(passphrase.into());
        debug!("encryption passphrase replaced");
    }

    /// Key derived from the passphrase as of this call.
    pub fn derived_key(&self) -> SymmetricKey {
        let guard = self
            .passphrase
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        derive_key(&guard)
    }
}

impl Default for EncryptionSettings {
    fn default() -> Self {
        Self::live()
    }
}

impl fmt::Debug for EncryptionSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptionSettings")
            .field("passphrase", &"[REDACTED]")
            .finish()
    }
}
