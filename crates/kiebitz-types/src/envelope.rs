//! # Signed envelope
//!
//! Every mutating appointments-service call arrives wrapped the same way:
//!
//! ```json
//! { "json": "<canonical serialised inner Data>", "signature": "...",
//!   "publicKey": "...", "data": { ...typed inner fields..., "timestamp": "..." } }
//! ```
//!
//! `json` is the exact byte string that was signed; `data` is only a
//! convenience decoding of that same string for handlers to read fields
//! from. Verification MUST run over `json` as received, never over a
//! re-serialisation of `data` — re-serialising could silently change byte
//! layout (key order, float formatting) and accept a signature that never
//! actually covered the fields the handler trusts.

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::Base64Bytes;

/// A signed envelope carrying a typed inner payload `T`.
///
/// `T` must carry its own `timestamp: DateTime<Utc>` field (by convention
/// named `timestamp`), used by the auth gates for the expiry check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedEnvelope<T> {
    /// The canonical serialised form of `data`, exactly as signed.
    pub json: String,
    /// ECDSA signature over `json`.
    pub signature: Base64Bytes,
    /// The public key the signature is claimed to be from.
    pub public_key: Base64Bytes,
    /// The decoded inner payload (for handler convenience only).
    pub data: T,
}

impl<T: DeserializeOwned> SignedEnvelope<T> {
    /// Re-decode `data` from `json`, verifying the two are consistent.
    ///
    /// Transports that accept envelopes from the wire should call this
    /// instead of trusting the client-supplied `data` field, since nothing
    /// stops a client from sending `json` and `data` that disagree.
    pub fn decode_and_check(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.json)
    }
}

/// Trait implemented by every envelope's inner `Data` type so auth gates can
/// read the expiry timestamp without knowing the concrete type.
pub trait Timestamped {
    /// The time the caller claims to have produced this payload.
    fn timestamp(&self) -> DateTime<Utc>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize as _;

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct Inner {
        value: u32,
    }

    #[test]
    fn decode_and_check_round_trips() {
        let inner = Inner { value: 7 };
        let json = serde_json::to_string(&inner).unwrap();
        let envelope = SignedEnvelope {
            json: json.clone(),
            signature: Base64Bytes(vec![0u8; 64]),
            public_key: Base64Bytes(vec![0u8; 65]),
            data: inner,
        };
        let decoded: Inner = envelope.decode_and_check().unwrap();
        assert_eq!(decoded, envelope.data);
    }
}
