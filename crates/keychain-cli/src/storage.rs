use keychain_core::{EncryptionSettings, KeyChainClient};
use keychain_storage::{KeyringBackend, KeyringSettings, MemoryBackend};
use tracing::debug;

use crate::config::{BackendKind, Config};

/// Environment variable that overrides the configured passphrase.
pub const ENCRYPTION_KEY_ENV: &str = "KEYCHAIN_ENCRYPTION_KEY";

/// Passphrase precedence: environment, then config file, then the live default.
pub fn encryption_settings(config: &Config) -> EncryptionSettings {
    let passphrase = std::env::var(ENCRYPTION_KEY_ENV)
        .ok()
        .or_else(|| config.encryption_key.clone());
    match passphrase {
        Some(passphrase) => EncryptionSettings::new(passphrase),
        None => EncryptionSettings::live(),
    }
}

/// Keyring placement with config overrides applied over the live defaults.
pub fn keyring_settings(config: &Config) -> KeyringSettings {
    let defaults = KeyringSettings::default();
    let overrides = config.keyring.clone().unwrap_or_default();
    KeyringSettings::new(
        overrides.service.unwrap_or(defaults.service),
        overrides.key_prefix.unwrap_or(defaults.key_prefix),
    )
}

/// Build the client described by `config`.
pub fn client_from_config(config: &Config) -> KeyChainClient {
    let settings = encryption_settings(config);
    match config.backend {
        BackendKind::Keyring => {
            let keyring = keyring_settings(config);
            debug!(
                service = %keyring.service,
                prefix = %keyring.key_prefix,
                "using keyring backend"
            );
            KeyChainClient::new(KeyringBackend::passcode(keyring), settings)
        }
        BackendKind::Memory => {
            debug!("using in-memory backend");
            KeyChainClient::new(MemoryBackend::new(), settings)
        }
    }
}
