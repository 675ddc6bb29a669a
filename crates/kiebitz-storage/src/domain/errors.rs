//! Database-level errors.
//!
//! Kept deliberately narrow: the SQL booking recipe relies
//! on exactly two distinguishable outcomes (`NotFound`, `TokenUsed`)
//! surviving the trip through the adapter; everything else collapses to
//! `Internal` and is logged.

use kiebitz_types::ServiceError;
use thiserror::Error;

/// Errors a `Database`, `LockManager` or `BookingGateway` adapter can return.
#[derive(Debug, Error)]
pub enum DbError {
    /// The requested key/collection entry does not exist.
    #[error("not found")]
    NotFound,

    /// A token was already present in the `used_token` set
    /// (`INSERT INTO used_token` primary-key violation).
    #[error("token already used")]
    TokenUsed,

    /// A named lock could not be acquired before its deadline.
    #[error("lock timeout acquiring {0}")]
    LockTimeout(String),

    /// Any other adapter failure (connection loss, serialization error, ...).
    #[error("database error: {0}")]
    Internal(String),
}

impl From<DbError> for ServiceError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound => ServiceError::NotFound("not found".into()),
            DbError::TokenUsed => ServiceError::NotAuthorized("token already used".into()),
            DbError::LockTimeout(name) => ServiceError::LockTimeout(name),
            DbError::Internal(msg) => ServiceError::Internal(msg),
        }
    }
}
