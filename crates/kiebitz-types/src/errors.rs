//! # Service error taxonomy
//!
//! One shared, non-hierarchical set of error kinds threaded through auth,
//! storage, core and gateway. Each kind carries its own HTTP status /
//! JSON-RPC code mapping so the gateway never has to guess.

use thiserror::Error;

/// A service-level error, independent of transport.
#[derive(Debug, Clone, Error)]
pub enum ServiceError {
    /// Bad signature, unknown signer, wrong role, or token-issuance cap hit.
    #[error("not authorized: {0}")]
    NotAuthorized(String),

    /// Signature verified but the caller's role does not permit this call
    /// (used only by the root gate).
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Target entity absent.
    #[error("not found: {0}")]
    NotFound(String),

    /// Envelope timestamp outside the 60s skew window.
    #[error("expired: {0}")]
    Expired(String),

    /// `publishAppointments` batch exceeded the 500-item cap.
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// A named lock could not be acquired within its deadline.
    #[error("lock timeout: {0}")]
    LockTimeout(String),

    /// Form/parameter validation failed.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Database error or invariant breach; the cause is logged server-side
    /// and only an opaque code crosses the wire.
    #[error("internal error")]
    Internal(String),
}

impl ServiceError {
    /// The JSON-RPC 2.0 error code for this kind.
    pub fn jsonrpc_code(&self) -> i64 {
        match self {
            ServiceError::BadRequest(_) => -32602,
            ServiceError::Internal(_) => -32603,
            ServiceError::NotAuthorized(_) => 401,
            ServiceError::Forbidden(_) => 403,
            ServiceError::NotFound(_) => 404,
            ServiceError::Expired(_) => 410,
            ServiceError::RateLimited(_) => 429,
            ServiceError::LockTimeout(_) => 503,
        }
    }

    /// The REST/HTTP status code for this kind.
    pub fn http_status(&self) -> u16 {
        match self {
            ServiceError::BadRequest(_) => 400,
            ServiceError::NotAuthorized(_) => 401,
            ServiceError::Forbidden(_) => 403,
            ServiceError::NotFound(_) => 404,
            ServiceError::Expired(_) => 410,
            ServiceError::RateLimited(_) => 429,
            ServiceError::LockTimeout(_) => 503,
            ServiceError::Internal(_) => 500,
        }
    }

    /// True for the two kinds a database adapter is allowed to return
    /// without the caller treating it as an internal error. Every other
    /// database failure is logged server-side and collapsed to `Internal`.
    pub fn is_expected_database_outcome(&self) -> bool {
        matches!(self, ServiceError::NotFound(_) | ServiceError::NotAuthorized(_))
    }
}

/// Convenience result alias used throughout the workspace.
pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_codes_are_stable() {
        assert_eq!(ServiceError::NotAuthorized("x".into()).http_status(), 401);
        assert_eq!(ServiceError::Forbidden("x".into()).http_status(), 403);
        assert_eq!(ServiceError::NotFound("x".into()).http_status(), 404);
        assert_eq!(ServiceError::Expired("x".into()).http_status(), 410);
        assert_eq!(ServiceError::RateLimited("x".into()).http_status(), 429);
        assert_eq!(ServiceError::LockTimeout("x".into()).http_status(), 503);
        assert_eq!(ServiceError::BadRequest("x".into()).http_status(), 400);
        assert_eq!(ServiceError::Internal("x".into()).http_status(), 500);
    }

    #[test]
    fn jsonrpc_codes_are_stable() {
        assert_eq!(ServiceError::BadRequest("x".into()).jsonrpc_code(), -32602);
        assert_eq!(ServiceError::Internal("x".into()).jsonrpc_code(), -32603);
    }
}
