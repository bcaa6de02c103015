use base64::{engine::general_purpose, Engine as _};
use keychain_core::{ItemMode, KeyChainBackend, KeyChainError};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument, warn};

use crate::auth::{challenge, Authenticator, NoPrompt};

/// Where items live in the OS keyring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyringSettings {
    /// Keyring service name shared by every item.
    pub service: String,
    /// Prepended to each normalized key to form the keyring account.
    pub key_prefix: String,
}

impl KeyringSettings {
    pub fn new(service: impl Into<String>, key_prefix: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            key_prefix: key_prefix.into(),
        }
    }
}

impl Default for KeyringSettings {
    fn default() -> Self {
        Self::new("keychain-client", "app.fltr.")
    }
}

/// How reads are gated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GetOption {
    /// Read without challenging the user.
    Passcode,
    /// Challenge the user before reading any item not stored in
    /// [`ItemMode::System`].
    Biometric,
}

/// Secret persisted per item: the protection mode next to the envelope.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
struct StoredItem {
    mode: ItemMode,
    payload: String,
}

/// Backend persisting envelopes in the platform keyring through the
/// `keyring` crate (Keychain on macOS and iOS, Credential Manager on
/// Windows, the kernel keyutils session keyring on Linux).
///
/// On any other target the `keyring` crate only has its mock store, which
/// keeps nothing between entries; constructing a backend there logs a
/// warning.
///
/// Keyring failures outside "no such entry" are not part of the client's
/// error model; they abort the operation with a panic.
pub struct KeyringBackend<A = NoPrompt> {
    settings: KeyringSettings,
    option: GetOption,
    authenticator: A,
}

/// Targets where the enabled `keyring` features provide a persistent store.
const NATIVE_STORE: bool = cfg!(any(
    target_os = "macos",
    target_os = "ios",
    target_os = "windows",
    target_os = "linux"
));

impl KeyringBackend<NoPrompt> {
    /// Reads go straight to the keyring.
    pub fn passcode(settings: KeyringSettings) -> Self {
        Self::with_option(settings, GetOption::Passcode, NoPrompt)
    }
}

impl<A: Authenticator> KeyringBackend<A> {
    /// Reads of user-presence items are gated on `authenticator`.
    pub fn biometric(settings: KeyringSettings, authenticator: A) -> Self {
        Self::with_option(settings, GetOption::Biometric, authenticator)
    }

    fn with_option(settings: KeyringSettings, option: GetOption, authenticator: A) -> Self {
        if !NATIVE_STORE {
            warn!(
                service = %settings.service,
                "no native keyring on this platform, stored items will not persist"
            );
        }
        Self {
            settings,
            option,
            authenticator,
        }
    }

    pub fn settings(&self) -> &KeyringSettings {
        &self.settings
    }

    pub fn option(&self) -> GetOption {
        self.option
    }

    /// Whether `key` holds an item written with [`ItemMode::System`].
    pub fn is_system(&self, key: &str) -> bool {
        self.read_item(key)
            .is_some_and(|item| item.mode == ItemMode::System)
    }

    fn account(&self, key: &str) -> String {
        format!("{}{}", self.settings.key_prefix, key)
    }

    fn entry(&self, key: &str) -> keyring::Entry {
        keyring::Entry::new(&self.settings.service, &self.account(key))
            .unwrap_or_else(|err| fail("entry", err))
    }

    fn read_item(&self, key: &str) -> Option<StoredItem> {
        match self.entry(key).get_password() {
            Ok(secret) => Some(decode_item(&secret)),
            Err(keyring::Error::NoEntry) => None,
            Err(err) => fail("read", err),
        }
    }

    fn delete_item(&self, key: &str) -> bool {
        match self.entry(key).delete_credential() {
            Ok(()) => true,
            Err(keyring::Error::NoEntry) => false,
            Err(err) => fail("delete", err),
        }
    }
}

impl<A: Authenticator> KeyChainBackend for KeyringBackend<A> {
    #[instrument(skip_all, fields(key = %key))]
    fn exists(&self, key: &str) -> bool {
        self.read_item(key).is_some()
    }

    #[instrument(skip_all, fields(key = %key))]
    fn get(&self, key: &str) -> Result<Vec<u8>, KeyChainError> {
        if self.option == GetOption::Biometric && !self.is_system(key) {
            let policy = challenge(&self.authenticator).map_err(|err| {
                warn!("authentication rejected: {err}");
                KeyChainError::UserCancelledOrFailedAuthentication
            })?;
            debug!(?policy, "user authenticated");
        }

        let item = self.read_item(key).ok_or(KeyChainError::NotFound)?;
        Ok(decode_payload(&item.payload))
    }

    #[instrument(skip_all, fields(key = %key, mode = ?mode))]
    fn put(&self, key: &str, envelope: &[u8], mode: ItemMode) {
        if mode == ItemMode::Query {
            error!("refusing to store item with query mode");
            panic!("query mode carries no access policy and cannot be stored");
        }

        if self.delete_item(key) {
            debug!("replacing existing item");
        }

        let secret = encode_item(&StoredItem {
            mode,
            payload: general_purpose::STANDARD.encode(envelope),
        });
        self.entry(key)
            .set_password(&secret)
            .unwrap_or_else(|err| fail("write", err));
    }
}

fn encode_item(item: &StoredItem) -> String {
    match serde_json::to_string(item) {
        Ok(secret) => secret,
        Err(err) => {
            error!("stored item encode failed: {err}");
            panic!("stored item encode failed: {err}");
        }
    }
}

fn decode_item(secret: &str) -> StoredItem {
    match serde_json::from_str(secret) {
        Ok(item) => item,
        Err(err) => {
            error!("stored item unreadable: {err}");
            panic!("keyring item is not a stored envelope: {err}");
        }
    }
}

fn decode_payload(payload: &str) -> Vec<u8> {
    match general_purpose::STANDARD.decode(payload) {
        Ok(bytes) => bytes,
        Err(err) => {
            error!("stored payload unreadable: {err}");
            panic!("keyring payload is not valid base64: {err}");
        }
    }
}

fn fail(event: &str, err: keyring::Error) -> ! {
    error!(event, "keyring failure: {err}");
    panic!("during keyring {event}: {err}");
}
