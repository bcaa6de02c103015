use serde::{Deserialize, Serialize};

use crate::error::KeyChainError;

/// Access-control tier requested for a stored item.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum ItemMode {
    /// Readable once the device has been unlocked, without user presence.
    System,
    /// Reading requires the user to authenticate.
    UserPresence,
    /// Existence and read queries only; carries no access-control payload.
    Query,
}

/// Contract every storage provider implements.
///
/// Keys reaching a backend are already normalized and values are already
/// sealed envelopes; backends never see plaintext.
pub trait KeyChainBackend: Send + Sync {
    /// Whether an item is stored under `key`. Never fails.
    fn exists(&self, key: &str) -> bool;

    /// Raw envelope bytes stored under `key`.
    ///
    /// Fails with [`KeyChainError::NotFound`] when absent and
    /// [`KeyChainError::UserCancelledOrFailedAuthentication`] when the item
    /// is protected and authentication does not succeed.
    fn get(&self, key: &str) -> Result<Vec<u8>, KeyChainError>;

    /// Store `envelope` under `key`, replacing any previous item.
    /// Unrecoverable backend failures are fatal.
    fn put(&self, key: &str, envelope: &[u8], mode: ItemMode);
}

/// Backend assembled from three closures.
///
/// Handy for one-off providers and for wiring platform APIs that are
/// exposed as free functions.
pub struct FnBackend<E, G, P> {
    exists: E,
    get: G,
    put: P,
}

impl<E, G, P> FnBackend<E, G, P>
where
    E: Fn(&str) -> bool + Send + Sync,
    G: Fn(&str) -> Result<Vec<u8>, KeyChainError> + Send + Sync,
    P: Fn(&str, &[u8], ItemMode) + Send + Sync,
{
    pub fn new(exists: E, get: G, put: P) -> Self {
        Self { exists, get, put }
    }
}

impl<E, G, P> KeyChainBackend for FnBackend<E, G, P>
where
    E: Fn(&str) -> bool + Send + Sync,
    G: Fn(&str) -> Result<Vec<u8>, KeyChainError> + Send + Sync,
    P: Fn(&str, &[u8], ItemMode) + Send + Sync,
{
    fn exists(&self, key: &str) -> bool {
        (self.exists)(key)
    }

    fn get(&self, key: &str) -> Result<Vec<u8>, KeyChainError> {
        (self.get)(key)
    }

    fn put(&self, key: &str, envelope: &[u8], mode: ItemMode) {
        (self.put)(key, envelope, mode)
    }
}
