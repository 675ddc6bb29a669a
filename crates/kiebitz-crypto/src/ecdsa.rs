//! ECDSA signatures over secp256k1.
//!
//! Every mutating call in the appointments service arrives wrapped in a
//! signed envelope (`kiebitz_types::envelope::SignedEnvelope`); this module
//! is the only place that calls into `k256`.

use crate::CryptoError;
use k256::ecdsa::{
    signature::{Signer, Verifier},
    Signature, SigningKey, VerifyingKey,
};
use zeroize::Zeroize;

/// A secp256k1 public key in SEC1 uncompressed form (65 bytes: `0x04 || x || y`).
///
/// Uncompressed encoding is used (rather than the 33-byte compressed form)
/// because actor keys are carried opaquely end-to-end in JSON payloads and
/// uncompressed points avoid a decompression step on every verification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublicKey(VerifyingKey);

impl PublicKey {
    /// Parse a SEC1-encoded public key (compressed or uncompressed).
    pub fn from_sec1_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        VerifyingKey::from_sec1_bytes(bytes)
            .map(Self)
            .map_err(|_| CryptoError::InvalidPublicKey)
    }

    /// Encode as uncompressed SEC1 bytes.
    pub fn to_sec1_bytes(&self) -> Vec<u8> {
        self.0.to_encoded_point(false).as_bytes().to_vec()
    }

    /// Verify `signature` over `message` (a compact 64-byte `r || s` signature).
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> Result<(), CryptoError> {
        let sig =
            Signature::from_slice(signature).map_err(|_| CryptoError::InvalidSignatureFormat)?;
        self.0
            .verify(message, &sig)
            .map_err(|_| CryptoError::VerificationFailed)
    }
}

/// A secp256k1 signing key, used only for server-held roles (root, token
/// key, mediator bootstrap keys) — never for provider/user keys, which are
/// client-generated and reach us only as signatures to verify.
pub struct KeyPair {
    signing_key: SigningKey,
}

impl KeyPair {
    /// Generate a fresh random keypair.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::random(&mut rand::thread_rng()),
        }
    }

    /// Load a keypair from its raw 32-byte scalar.
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self, CryptoError> {
        let signing_key =
            SigningKey::from_bytes(bytes.into()).map_err(|_| CryptoError::InvalidPrivateKey)?;
        Ok(Self { signing_key })
    }

    /// The matching public key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey(*self.signing_key.verifying_key())
    }

    /// Sign `message`, producing a deterministic (RFC 6979) compact signature.
    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        let sig: Signature = self.signing_key.sign(message);
        sig.to_bytes().to_vec()
    }
}

impl Drop for KeyPair {
    fn drop(&mut self) {
        let mut bytes: [u8; 32] = self.signing_key.to_bytes().into();
        bytes.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_then_verify_round_trips() {
        let pair = KeyPair::generate();
        let msg = b"canonical json payload";
        let sig = pair.sign(msg);
        assert!(pair.public_key().verify(msg, &sig).is_ok());
    }

    #[test]
    fn verification_rejects_tampered_message() {
        let pair = KeyPair::generate();
        let sig = pair.sign(b"original");
        assert!(pair.public_key().verify(b"tampered", &sig).is_err());
    }

    #[test]
    fn verification_rejects_foreign_key() {
        let a = KeyPair::generate();
        let b = KeyPair::generate();
        let sig = a.sign(b"hello");
        assert!(b.public_key().verify(b"hello", &sig).is_err());
    }

    #[test]
    fn sec1_round_trip() {
        let pair = KeyPair::generate();
        let encoded = pair.public_key().to_sec1_bytes();
        let decoded = PublicKey::from_sec1_bytes(&encoded).unwrap();
        assert_eq!(pair.public_key(), decoded);
    }
}
