//! Crypto error types.

use thiserror::Error;

/// Cryptographic operation errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Invalid public key encoding.
    #[error("invalid public key")]
    InvalidPublicKey,

    /// Invalid private key encoding.
    #[error("invalid private key")]
    InvalidPrivateKey,

    /// Signature bytes are malformed (wrong length, bad DER/compact encoding).
    #[error("invalid signature format")]
    InvalidSignatureFormat,

    /// Signature did not verify against the given message and key.
    #[error("signature verification failed")]
    VerificationFailed,

    /// HMAC tag did not match.
    #[error("hmac verification failed")]
    HmacMismatch,
}
