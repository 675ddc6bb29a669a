//! The one signature check every gate builds on.
//!
//! Every envelope verification runs over `envelope.json` as received —
//! never over a re-serialisation of `envelope.data` — so a client cannot
//! smuggle fields the signature never actually covered.

use kiebitz_crypto::PublicKey;
use kiebitz_types::{Base64Bytes, SignedEnvelope};

use crate::domain::GateError;

/// Verify `envelope.signature` over `envelope.json` under `public_key`.
pub fn verify_envelope_signature<T>(
    envelope: &SignedEnvelope<T>,
    public_key: &Base64Bytes,
) -> Result<(), GateError> {
    let key = PublicKey::from_sec1_bytes(public_key.as_slice())
        .map_err(|e| GateError::NotAuthorized(format!("malformed public key: {e:?}")))?;
    key.verify(envelope.json.as_bytes(), envelope.signature.as_slice())
        .map_err(|_| GateError::NotAuthorized("signature verification failed".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiebitz_crypto::KeyPair;
    use kiebitz_types::Timestamped;
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize)]
    struct Inner {
        value: u32,
    }

    impl Timestamped for Inner {
        fn timestamp(&self) -> chrono::DateTime<chrono::Utc> {
            chrono::Utc::now()
        }
    }

    fn make_envelope(pair: &KeyPair) -> SignedEnvelope<Inner> {
        let data = Inner { value: 7 };
        let json = serde_json::to_string(&data).unwrap();
        let signature = pair.sign(json.as_bytes());
        SignedEnvelope {
            json,
            signature: Base64Bytes(signature),
            public_key: Base64Bytes(pair.public_key().to_sec1_bytes()),
            data,
        }
    }

    #[test]
    fn accepts_matching_signature() {
        let pair = KeyPair::generate();
        let envelope = make_envelope(&pair);
        assert!(verify_envelope_signature(&envelope, &envelope.public_key).is_ok());
    }

    #[test]
    fn rejects_signature_over_tampered_json() {
        let pair = KeyPair::generate();
        let mut envelope = make_envelope(&pair);
        envelope.json = "{\"value\":8}".into();
        assert!(verify_envelope_signature(&envelope, &envelope.public_key).is_err());
    }

    #[test]
    fn rejects_foreign_public_key() {
        let pair = KeyPair::generate();
        let envelope = make_envelope(&pair);
        let foreign = KeyPair::generate();
        let foreign_key = Base64Bytes(foreign.public_key().to_sec1_bytes());
        assert!(verify_envelope_signature(&envelope, &foreign_key).is_err());
    }
}
