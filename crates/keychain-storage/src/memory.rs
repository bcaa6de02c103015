use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use keychain_core::{ItemMode, KeyChainBackend, KeyChainError};

/// In-memory backend for tests and ephemeral sessions.
///
/// Clones share the same map. Every operation takes the lock for exactly one
/// map read or write and releases it before returning.
#[derive(Debug, Default, Clone)]
pub struct MemoryBackend {
    inner: Arc<Mutex<HashMap<String, (Vec<u8>, ItemMode)>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mode the item under `key` was last written with.
    pub fn mode_of(&self, key: &str) -> Option<ItemMode> {
        self.lock().get(key).map(|(_, mode)| *mode)
    }

    /// Envelope bytes exactly as stored under `key`.
    pub fn raw(&self, key: &str) -> Option<Vec<u8>> {
        self.lock().get(key).map(|(bytes, _)| bytes.clone())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, (Vec<u8>, ItemMode)>> {
        // Each critical section is a single map operation, so a panicking
        // holder cannot leave the map inconsistent.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl KeyChainBackend for MemoryBackend {
    fn exists(&self, key: &str) -> bool {
        self.lock().contains_key(key)
    }

    fn get(&self, key: &str) -> Result<Vec<u8>, KeyChainError> {
        self.raw(key).ok_or(KeyChainError::NotFound)
    }

    fn put(&self, key: &str, envelope: &[u8], mode: ItemMode) {
        self.lock()
            .insert(key.to_string(), (envelope.to_vec(), mode));
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use keychain_core::{EncryptionSettings, KeyChainClient};

    use super::*;

    #[test]
    fn stores_and_replaces_raw_bytes() {
        let backend = MemoryBackend::new();
        assert!(backend.is_empty());
        assert!(!backend.exists("k"));
        assert_eq!(backend.get("k"), Err(KeyChainError::NotFound));

        backend.put("k", b"one", ItemMode::UserPresence);
        backend.put("k", b"two", ItemMode::System);

        assert_eq!(backend.len(), 1);
        assert_eq!(backend.get("k").expect("get"), b"two");
        assert_eq!(backend.mode_of("k"), Some(ItemMode::System));
    }

    #[test]
    fn clones_share_state() {
        let backend = MemoryBackend::new();
        let other = backend.clone();
        backend.put("shared", b"v", ItemMode::System);
        assert!(other.exists("shared"));
    }

    #[test]
    fn client_over_memory_never_stores_plaintext() {
        let backend = MemoryBackend::new();
        let client = KeyChainClient::new(backend.clone(), EncryptionSettings::new([1u8, 2, 3]));
        let secret = b"top-secret-payload";

        client.put("agent/session", secret);
        assert_eq!(client.get("agent/session").expect("get"), secret);

        let stored = backend.raw("agent/session").expect("stored");
        assert_ne!(stored, secret.to_vec());
        assert_eq!(backend.mode_of("agent/session"), Some(ItemMode::UserPresence));
    }

    #[test]
    fn concurrent_clients_round_trip_independently() {
        let client = KeyChainClient::new(MemoryBackend::new(), EncryptionSettings::new([7u8]));
        let payload: Vec<u8> = (0..32).collect();

        let handles: Vec<_> = ["alfa", "beta", "gamma", "delta"]
            .into_iter()
            .enumerate()
            .map(|(i, key)| {
                let client = client.clone();
                let data = payload.repeat(i + 1);
                thread::spawn(move || {
                    client.put(key, &data);
                    (key, data)
                })
            })
            .collect();

        for handle in handles {
            let (key, data) = handle.join().expect("join");
            assert!(client.exists(key));
            assert_eq!(client.get(key).expect("get"), data);
        }
    }

    #[test]
    fn poisoned_lock_is_recovered() {
        let backend = MemoryBackend::new();
        backend.put("k", b"v", ItemMode::System);

        let poisoner = backend.clone();
        let _ = thread::spawn(move || {
            let _guard = poisoner.inner.lock().expect("lock");
            panic!("poison the lock");
        })
        .join();

        assert!(backend.inner.is_poisoned());
        assert_eq!(backend.get("k").expect("get"), b"v");
    }
}
