//! # kiebitz-crypto
//!
//! The cryptographic primitives used across the appointments service:
//! ECDSA signature verification (provider/mediator/user/root keys), SHA-256
//! hashing (`ActorKey.ID`), and HMAC-SHA256 (priority token minting).
//!
//! No encryption primitives live here: client payloads (`EncryptedData`)
//! are opaque blobs the server never decrypts.

#![warn(missing_docs)]

pub mod ecdsa;
pub mod errors;
pub mod sha256;

pub use ecdsa::{KeyPair, PublicKey};
pub use errors::CryptoError;
pub use sha256::{hmac_sha256, sha256, verify_hmac_sha256, Hash};

