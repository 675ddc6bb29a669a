//! Auth gate errors.

use kiebitz_types::ServiceError;
use thiserror::Error;

/// Failure from one of the four role gates.
#[derive(Debug, Error)]
pub enum GateError {
    /// Signature did not verify, or the signer is not in the expected role's
    /// key set.
    #[error("not authorized: {0}")]
    NotAuthorized(String),

    /// The envelope's claimed timestamp is outside the expiry window.
    #[error("expired: {0}")]
    Expired(String),

    /// An outbound lookup (actor directory) failed.
    #[error("lookup failed: {0}")]
    LookupFailed(String),
}

impl From<GateError> for ServiceError {
    fn from(err: GateError) -> Self {
        match err {
            GateError::NotAuthorized(msg) => ServiceError::NotAuthorized(msg),
            GateError::Expired(msg) => ServiceError::Expired(msg),
            GateError::LookupFailed(msg) => ServiceError::Internal(msg),
        }
    }
}
