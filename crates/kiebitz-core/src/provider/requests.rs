//! Request payloads for the provider lifecycle's signed calls.

use chrono::{DateTime, Utc};
use kiebitz_types::{ActorKey, Base64Bytes, Id, Timestamped};
use serde::{Deserialize, Serialize};

use crate::domain::ProviderProfileData;

/// Inner payload of `storeProviderData`: a provider's own encrypted
/// profile, self-signed under its own signing key.
///
/// Self-signed: checked only for a valid signature under the envelope's
/// own embedded public key, never against an installed key set, since the
/// provider may not be confirmed (or may even be brand new) yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreProviderData {
    /// When the provider produced this submission.
    pub timestamp: DateTime<Utc>,
    /// The provider's encrypted profile, opaque to the server.
    pub encrypted_data: Base64Bytes,
}

impl Timestamped for StoreProviderData {
    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Inner payload of `confirmProvider`: a mediator vouching for one
/// provider and installing its signing key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmProviderData {
    /// When the mediator produced this confirmation.
    pub timestamp: DateTime<Utc>,
    /// The provider being confirmed.
    pub id: Id,
    /// The provider's signing key record, signed by the confirming
    /// mediator.
    pub key: ActorKey,
    /// The mediator's confirmation blob, addressed to the provider and
    /// opaque to the server.
    pub encrypted_confirmation: Base64Bytes,
    /// The provider's plaintext public profile, if the mediator chose to
    /// publish one for zip-code discovery.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_provider: Option<ProviderProfileData>,
}

impl Timestamped for ConfirmProviderData {
    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}
