//! Authentication gate consulted before reading protected items.
//!
//! Prompting the user is platform UI and lives outside this crate; backends
//! only see the [`Authenticator`] trait.

use thiserror::Error;

/// Reason shown to the user when a protected item is read.
pub const AUTH_REASON: &str = "Private Key Access";

/// Kind of user-presence check to request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthPolicy {
    /// Biometric only (fingerprint, face).
    Biometric,
    /// Biometric or the device passcode.
    DeviceOwner,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("authentication cancelled by user")]
    Cancelled,
    #[error("authentication failed: {0}")]
    Failed(String),
}

/// Platform hook that challenges the user.
pub trait Authenticator: Send + Sync {
    /// Whether `policy` can be evaluated on this device right now.
    fn can_evaluate(&self, policy: AuthPolicy) -> bool;

    /// Challenge the user. May block until they respond.
    fn evaluate(&self, policy: AuthPolicy, reason: &str) -> Result<(), AuthError>;
}

/// Authenticator for headless environments: no policy is available, so
/// every challenge fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPrompt;

impl Authenticator for NoPrompt {
    fn can_evaluate(&self, _policy: AuthPolicy) -> bool {
        false
    }

    fn evaluate(&self, _policy: AuthPolicy, _reason: &str) -> Result<(), AuthError> {
        Err(AuthError::Failed("no authenticator available".to_string()))
    }
}

/// Run the challenge: biometric first, falling back to the device owner
/// policy when biometrics are unavailable. The first policy that can be
/// evaluated decides the outcome.
pub fn challenge<A: Authenticator + ?Sized>(authenticator: &A) -> Result<AuthPolicy, AuthError> {
    for policy in [AuthPolicy::Biometric, AuthPolicy::DeviceOwner] {
        if authenticator.can_evaluate(policy) {
            authenticator.evaluate(policy, AUTH_REASON)?;
            return Ok(policy);
        }
    }
    Err(AuthError::Failed("no authentication policy available".to_string()))
}
