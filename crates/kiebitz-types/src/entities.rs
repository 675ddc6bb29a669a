//! Wire primitives shared by every crate.
//!
//! Binary identifiers (hashes, public keys, signatures) are stored and
//! transported as standard base64, so the JSON-over-wire representation
//! matches the on-disk representation exactly.

use base64::Engine;
use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A byte string that (de)serialises as standard base64 text.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Base64Bytes(pub Vec<u8>);

impl Base64Bytes {
    /// Borrow the underlying bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Base64Bytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Base64Bytes({})",
            base64::engine::general_purpose::STANDARD.encode(&self.0)
        )
    }
}

impl From<Vec<u8>> for Base64Bytes {
    fn from(value: Vec<u8>) -> Self {
        Self(value)
    }
}

impl AsRef<[u8]> for Base64Bytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Serialize for Base64Bytes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&base64::engine::general_purpose::STANDARD.encode(&self.0))
    }
}

impl<'de> Deserialize<'de> for Base64Bytes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        base64::engine::general_purpose::STANDARD
            .decode(s.as_bytes())
            .map(Base64Bytes)
            .map_err(D::Error::custom)
    }
}

/// A SHA-256 digest, used as the primary key for providers, appointments and
/// actor keys (an actor key's id is always `SHA256` of its signing key).
pub type Id = [u8; 32];

/// Render an `Id` as lowercase hex, for log lines and path-form REST routes.
pub fn id_to_hex(id: &Id) -> String {
    id.iter().map(|b| format!("{b:02x}")).collect()
}

/// Parse an `Id` from lowercase or uppercase hex.
pub fn id_from_hex(s: &str) -> Option<Id> {
    if s.len() != 64 {
        return None;
    }
    let mut out = [0u8; 32];
    for (i, chunk) in s.as_bytes().chunks(2).enumerate() {
        let byte_str = std::str::from_utf8(chunk).ok()?;
        out[i] = u8::from_str_radix(byte_str, 16).ok()?;
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base64_bytes_round_trips_through_json() {
        let original = Base64Bytes(vec![1, 2, 3, 255]);
        let json = serde_json::to_string(&original).unwrap();
        let decoded: Base64Bytes = serde_json::from_str(&json).unwrap();
        assert_eq!(original, decoded);
    }

    #[test]
    fn id_hex_round_trips() {
        let id: Id = [7u8; 32];
        let hex = id_to_hex(&id);
        assert_eq!(id_from_hex(&hex), Some(id));
    }
}
