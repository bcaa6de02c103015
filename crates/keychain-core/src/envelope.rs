//! Authenticated encryption envelope applied to every stored value.
//!
//! Envelope layout: `nonce (12 bytes) || ciphertext || tag (16 bytes)`,
//! the standard AES-256-GCM combined encoding. A fresh nonce is drawn from
//! the OS CSPRNG on every seal.

use std::fmt;

use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Key, Nonce,
};
use sha2::{Digest, Sha256};
use tracing::error;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::KeyChainError;

/// Nonce length for AES-256-GCM (96 bits).
pub const NONCE_LEN: usize = 12;

/// Authentication tag length for AES-256-GCM.
pub const TAG_LEN: usize = 16;

/// Smallest structurally valid envelope (empty plaintext).
pub const MIN_ENVELOPE_LEN: usize = NONCE_LEN + TAG_LEN;

/// 256-bit symmetric key derived from the configured passphrase.
/// Zeroized on drop; never printed.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKey([u8; 32]);

impl SymmetricKey {
    /// Borrow the raw key bytes. Callers must not log or persist them.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SymmetricKey").field(&"[REDACTED]").finish()
    }
}

/// SHA-256 of the passphrase. Same passphrase, same key.
pub fn derive_key(passphrase: &[u8]) -> SymmetricKey {
    SymmetricKey(Sha256::digest(passphrase).into())
}

/// Encrypt `plaintext` under `key` and return the combined envelope.
///
/// # Panics
///
/// If the AEAD primitive reports a failure. With a 32-byte key and an
/// in-range plaintext this cannot happen, so it is not a recoverable state.
pub fn seal(plaintext: &[u8], key: &SymmetricKey) -> Vec<u8> {
    let cipher = build_cipher(key);
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let ciphertext = match cipher.encrypt(&nonce, plaintext) {
        Ok(ciphertext) => ciphertext,
        Err(err) => {
            error!(len = plaintext.len(), "seal failed: {err}");
            panic!("authenticated encryption failed on well-formed input: {err}");
        }
    };

    let mut envelope = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    envelope.extend_from_slice(nonce.as_slice());
    envelope.extend_from_slice(&ciphertext);
    envelope
}

/// Verify and decrypt an envelope produced by [`seal`].
///
/// A tag mismatch (wrong or rotated key, tampered ciphertext) is the
/// recoverable [`KeyChainError::DecryptionFailed`].
///
/// # Panics
///
/// If `envelope` is too short to hold a nonce and a tag. Such bytes were
/// never produced by [`seal`]; the store is corrupt and decoding must not
/// continue on a guess.
pub fn open(envelope: &[u8], key: &SymmetricKey) -> Result<Vec<u8>, KeyChainError> {
    if envelope.len() < MIN_ENVELOPE_LEN {
        error!(
            len = envelope.len(),
            min = MIN_ENVELOPE_LEN,
            "envelope structurally invalid"
        );
        panic!("encrypted data tampered with and cannot be decoded");
    }

    let (nonce, ciphertext) = envelope.split_at(NONCE_LEN);
    build_cipher(key)
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| KeyChainError::DecryptionFailed)
}

fn build_cipher(key: &SymmetricKey) -> Aes256Gcm {
    Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_key_is_deterministic_and_passphrase_sensitive() {
        assert_eq!(derive_key(b"hunter2"), derive_key(b"hunter2"));
        assert_ne!(derive_key(&[0]), derive_key(&[0, 0]));
    }

    #[test]
    fn derive_key_matches_sha256() {
        // SHA-256("abc")
        let expected = [
            0xba, 0x78, 0x16, 0xbf, 0x8f, 0x01, 0xcf, 0xea, 0x41, 0x41, 0x40, 0xde, 0x5d, 0xae,
            0x22, 0x23, 0xb0, 0x03, 0x61, 0xa3, 0x96, 0x17, 0x7a, 0x9c, 0xb4, 0x10, 0xff, 0x61,
            0xf2, 0x00, 0x15, 0xad,
        ];
        assert_eq!(derive_key(b"abc").as_bytes(), &expected);
    }

    #[test]
    fn seal_then_open_returns_plaintext() {
        let key = derive_key(b"passphrase");
        let plaintext = "whatever floats 🌊 your boat ⛵️".as_bytes();

        let envelope = seal(plaintext, &key);
        assert_eq!(envelope.len(), plaintext.len() + MIN_ENVELOPE_LEN);
        assert!(!envelope
            .windows(plaintext.len())
            .any(|window| window == plaintext));

        assert_eq!(open(&envelope, &key).expect("open"), plaintext);
    }

    #[test]
    fn empty_plaintext_produces_minimal_envelope() {
        let key = derive_key(b"k");
        let envelope = seal(&[], &key);
        assert_eq!(envelope.len(), MIN_ENVELOPE_LEN);
        assert_eq!(open(&envelope, &key).expect("open"), Vec::<u8>::new());
    }

    #[test]
    fn each_seal_uses_a_fresh_nonce() {
        let key = derive_key(b"k");
        let first = seal(b"same", &key);
        let second = seal(b"same", &key);
        assert_ne!(first[..NONCE_LEN], second[..NONCE_LEN]);
        assert_ne!(first, second);
    }

    #[test]
    fn wrong_key_is_decryption_failed() {
        let envelope = seal(b"secret", &derive_key(&[0]));
        let err = open(&envelope, &derive_key(&[0, 0])).expect_err("wrong key");
        assert_eq!(err, KeyChainError::DecryptionFailed);
    }

    #[test]
    fn flipped_ciphertext_bit_is_decryption_failed() {
        let key = derive_key(b"k");
        let mut envelope = seal(b"secret", &key);
        envelope[NONCE_LEN] ^= 0x01;
        assert_eq!(open(&envelope, &key), Err(KeyChainError::DecryptionFailed));
    }

    #[test]
    #[should_panic(expected = "tampered")]
    fn truncated_envelope_is_fatal() {
        let key = derive_key(b"k");
        let envelope = seal(b"secret", &key);
        let _ = open(&envelope[..MIN_ENVELOPE_LEN - 1], &key);
    }

    #[test]
    fn debug_output_redacts_key_bytes() {
        let rendered = format!("{:?}", derive_key(b"k"));
        assert_eq!(rendered, "SymmetricKey(\"[REDACTED]\")");
    }
}
