//! Actor signing-key records.
//!
//! An `ActorKey` is how the service tracks who is allowed to sign what:
//! mediator and provider signing keys are both installed this way, so the
//! auth gates can recognize a caller's `public_key` without knowing in
//! advance which role it belongs to.

use crate::entities::{id_to_hex, Base64Bytes, Id};
use serde::{Deserialize, Serialize};

/// The payload a key authority signs when installing an actor's key.
///
/// `signing` is always present; `encryption` and `zip_code` are populated
/// only for provider keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorData {
    /// SEC1-encoded signing public key.
    pub signing: Base64Bytes,
    /// SEC1-encoded or opaque encryption public key (providers only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encryption: Option<Base64Bytes>,
    /// The provider's zip code, used for proximity queries (providers only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
}

/// An actor's signing-key record.
///
/// `id` must equal `sha256(data.signing.0)`; callers that construct an
/// `ActorKey` directly (rather than decoding one from storage) are
/// responsible for that invariant — this type does not enforce it, since
/// computing the hash requires the crypto crate and this one sits below it
/// in the dependency graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorKey {
    /// `SHA256` of `data.signing`.
    pub id: Id,
    /// The signed payload.
    pub data: ActorData,
    /// Signature over the canonical serialisation of `data`, by the
    /// authority that installed this key (root, for mediators; a mediator,
    /// for providers).
    pub signature: Base64Bytes,
    /// The key used to sign messages from this actor.
    pub public_key: Base64Bytes,
}

impl ActorKey {
    /// Render `id` as lowercase hex, for collection keys and log lines.
    pub fn id_hex(&self) -> String {
        id_to_hex(&self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actor_data_omits_absent_provider_fields() {
        let data = ActorData {
            signing: Base64Bytes(vec![1, 2, 3]),
            encryption: None,
            zip_code: None,
        };
        let json = serde_json::to_string(&data).unwrap();
        assert!(!json.contains("encryption"));
        assert!(!json.contains("zipCode"));
    }

    #[test]
    fn actor_key_round_trips_through_json() {
        let key = ActorKey {
            id: [9u8; 32],
            data: ActorData {
                signing: Base64Bytes(vec![1, 2, 3]),
                encryption: Some(Base64Bytes(vec![4, 5, 6])),
                zip_code: Some("10115".into()),
            },
            signature: Base64Bytes(vec![0u8; 64]),
            public_key: Base64Bytes(vec![0u8; 65]),
        };
        let json = serde_json::to_string(&key).unwrap();
        let decoded: ActorKey = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.id, key.id);
        assert_eq!(decoded.data.zip_code, key.data.zip_code);
    }
}
