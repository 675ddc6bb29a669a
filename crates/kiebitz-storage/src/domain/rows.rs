//! Row shapes mirroring the appointments service's relational schema:
//! `provider`, `mediator`, `appointment`, `slot`, `property`, `used_token`,
//! `user_token`, `token`, `storage`.
//!
//! These are the "tabular rows" the backend/repository layer (in
//! `kiebitz-core`) lifts into rich domain objects, keeping this crate a
//! thin facade over the database.

use kiebitz_types::Id;
use serde::{Deserialize, Serialize};

/// The four buckets a provider's profile can live in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProviderBucket {
    /// Self-published, not yet vetted by a mediator.
    Unverified,
    /// Vetted; the mediator's encrypted confirmation has been written.
    Verified,
    /// The mediator's confirmation blob, addressed to the provider.
    Confirmed,
    /// The plaintext public profile used for zip-code discovery.
    Public,
}

impl ProviderBucket {
    /// The KV collection name backing this bucket.
    pub fn collection(self) -> &'static str {
        match self {
            ProviderBucket::Unverified => "provider.unverified",
            ProviderBucket::Verified => "provider.verified",
            ProviderBucket::Confirmed => "provider.confirmed",
            ProviderBucket::Public => "provider.public",
        }
    }
}

/// A provider's status, derived and stored alongside its raw data
/// Mirrors the lifecycle status recorded alongside a provider's raw data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProviderStatus {
    /// Self-published, never verified.
    Unverified,
    /// Verified for the first time.
    VerifiedFirst,
    /// Re-verified after at least one prior verification.
    Verified,
    /// Verified once, then the provider republished a pending change.
    Changed,
    /// Status could not be determined (should not normally be observed).
    Unknown,
}

/// Row in the `provider` table: a provider's opaque encrypted profile plus
/// its derived status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRow {
    /// `SHA256` of the provider's signing key.
    pub id: Id,
    /// Opaque blob, never interpreted server-side.
    pub encrypted_data: Vec<u8>,
    /// Derived lifecycle status.
    pub status: ProviderStatus,
}

/// Row in the `appointment` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentRow {
    /// Appointment id, provider-chosen.
    pub id: Id,
    /// Owning provider.
    pub provider_id: Id,
    /// `YYYY-MM-DD` date bucket the appointment is filed under.
    pub date: String,
    /// Canonical JSON of the signed appointment payload (`Data`).
    pub json: String,
    /// Signature over `json`.
    pub signature: Vec<u8>,
    /// The provider public key the signature is claimed to be under.
    pub public_key: Vec<u8>,
    /// Server-stamped last-update time, RFC3339.
    pub updated_at: String,
}

/// Row in the `slot` table: one bookable unit within an appointment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotRow {
    /// Slot id, provider-chosen, unique within its appointment.
    pub id: Id,
    /// Owning appointment.
    pub appointment_id: Id,
    /// `Some` once booked: the spent token.
    pub token: Option<Vec<u8>>,
    /// `Some` once booked: the user's ephemeral public key.
    pub public_key: Option<Vec<u8>>,
    /// `Some` once booked: the user's encrypted confirmation blob.
    pub encrypted_data: Option<Vec<u8>>,
}

impl SlotRow {
    /// A slot is open (bookable) exactly when it has no token attached.
    pub fn is_open(&self) -> bool {
        self.token.is_none()
    }
}

/// Row in the `property` table: one `(key, value)` secondary-index entry
/// for an appointment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyRow {
    /// Owning appointment.
    pub appointment_id: Id,
    /// Owning provider (property indexes are scoped per-provider).
    pub provider_id: Id,
    /// Property key.
    pub key: String,
    /// Property value.
    pub value: String,
    /// `YYYY-MM-DD` date bucket, duplicated here for the index.
    pub date: String,
}

/// Row in the `user_token` table: the per-user priority-token counter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct UserTokenRow {
    /// Number of tokens issued to this user so far.
    pub count: i64,
}

/// Row in the `token` table: the global monotonic token counter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct TokenCounterRow {
    /// `PriorityToken.N` of the most recently issued token.
    pub n: i64,
}

/// Row in the `storage` table (the opaque blob storage service, out of
/// scope as a full CRUD surface but modeled here as a narrow capability
/// used by settings persistence).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageRow {
    /// Opaque storage id.
    pub id: String,
    /// Opaque bytes.
    pub data: Vec<u8>,
}
