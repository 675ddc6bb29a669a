//! Priority tokens.
//!
//! A token mint issues these: `PriorityToken` is the strictly-monotonic
//! counter value being spent; `TokenData` wraps it with the caller's
//! binding information; `SignedToken` is what actually crosses the wire —
//! `TokenData` signed by the server's token key, proving the token was
//! issued here.

use crate::entities::Base64Bytes;
use crate::envelope::Timestamped;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The nth issued token. The transported token value is
/// `HMAC_SHA256(serverSecret, marshal(PriorityToken))`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityToken {
    /// Strictly monotonic across all issuances on a backend instance.
    pub n: i64,
}

/// The payload signed by the server's token key when a token is minted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenData {
    /// Client-chosen binding (e.g. a hash of a user-held secret), used to
    /// prove token ownership later without the server storing identity.
    pub hash: Base64Bytes,
    /// `HMAC_SHA256(serverSecret, marshal(PriorityToken))`.
    pub token: Base64Bytes,
    /// The counter value this token represents.
    pub data: PriorityToken,
    /// Canonical serialisation of `data`, preserved so a holder can prove
    /// `token`'s derivation without recomputing the HMAC themselves.
    pub json: String,
    /// The user's ephemeral public key this token is bound to.
    pub public_key: Base64Bytes,
    /// When the token was minted.
    pub timestamp: DateTime<Utc>,
}

impl Timestamped for TokenData {
    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// `TokenData`, signed by the server's token key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedToken {
    /// Canonical serialisation of the inner `TokenData`, exactly as signed.
    pub json: String,
    /// Signature over `json`, by the server's token key.
    pub signature: Base64Bytes,
}
