use thiserror::Error;

/// Recoverable failures surfaced by the storage client.
///
/// Anything outside this set (a structurally corrupt envelope, an
/// unexpected backend status) is treated as fatal and never reaches the
/// caller as a value.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq, Hash)]
pub enum KeyChainError {
    /// Requested key has no stored value.
    #[error("entry not found")]
    NotFound,
    /// The envelope did not authenticate under the current encryption key.
    #[error("decryption failed")]
    DecryptionFailed,
    /// The backend's access-control gate was not satisfied.
    #[error("user cancelled or failed authentication")]
    UserCancelledOrFailedAuthentication,
}
