//! SHA-256 hashing (actor key ids are `SHA256` of the signing key) and
//! HMAC-SHA256 (priority tokens are `HMAC_SHA256(serverSecret, ...)`).

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

use crate::CryptoError;

/// A 32-byte SHA-256 digest.
pub type Hash = [u8; 32];

/// Hash `data` with SHA-256.
pub fn sha256(data: &[u8]) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Compute `HMAC-SHA256(secret, data)`.
///
/// This is the primitive behind priority-token issuance: the token value
/// itself is the HMAC tag, making tokens deterministic for a given
/// `(secret, PriorityToken.N)` pair across horizontally scaled backends
/// that share `secret`.
pub fn hmac_sha256(secret: &[u8], data: &[u8]) -> Hash {
    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret).expect("HMAC accepts keys of any length");
    mac.update(data);
    mac.finalize().into_bytes().into()
}

/// Verify an HMAC-SHA256 tag in constant time.
pub fn verify_hmac_sha256(secret: &[u8], data: &[u8], tag: &[u8]) -> Result<(), CryptoError> {
    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret).expect("HMAC accepts keys of any length");
    mac.update(data);
    mac.verify_slice(tag).map_err(|_| CryptoError::HmacMismatch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_is_deterministic() {
        assert_eq!(sha256(b"hello"), sha256(b"hello"));
        assert_ne!(sha256(b"hello"), sha256(b"world"));
    }

    #[test]
    fn hmac_round_trips_through_verify() {
        let secret = b"server-secret";
        let tag = hmac_sha256(secret, b"token-data");
        assert!(verify_hmac_sha256(secret, b"token-data", &tag).is_ok());
        assert!(verify_hmac_sha256(secret, b"other-data", &tag).is_err());
        assert!(verify_hmac_sha256(b"wrong-secret", b"token-data", &tag).is_err());
    }
}
