//! Request payload for priority-token issuance.

use chrono::{DateTime, Utc};
use kiebitz_types::{Base64Bytes, Timestamped};
use serde::{Deserialize, Serialize};

/// Inner payload of `getToken`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetTokenData {
    /// When the caller produced this request.
    pub timestamp: DateTime<Utc>,
    /// A client-chosen binding value (e.g. a hash of a held eligibility
    /// code), used only to cap how many tokens one caller can mint; the
    /// server never learns what it is a hash of.
    pub hash: Base64Bytes,
}

impl Timestamped for GetTokenData {
    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}
