//! Rich domain objects the repository layer lifts storage rows into.

use chrono::{DateTime, Utc};
use kiebitz_storage::ProviderStatus;
use kiebitz_types::{Base64Bytes, Id, Timestamped};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The inner, signed part of a provider-published appointment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedAppointmentData {
    /// Provider-chosen appointment id.
    pub id: Id,
    /// When the provider published this appointment.
    pub timestamp: DateTime<Utc>,
    /// Length of the appointment, in minutes.
    pub duration: i64,
    /// Opaque vaccine tag, validated only for shape.
    pub vaccine: String,
    /// String-to-string secondary-index properties.
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
    /// Ordered list of bookable slot ids.
    pub slot_data: Vec<SlotId>,
}

impl Timestamped for SignedAppointmentData {
    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// One bookable unit within an appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotId {
    /// Slot id, unique within its owning appointment.
    pub id: Id,
}

/// A stored, signed appointment plus its server-stamped bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentRecord {
    /// The canonical serialised form of `data`, exactly as the provider
    /// signed it.
    pub json: String,
    /// Signature over `json`.
    pub signature: Base64Bytes,
    /// The provider public key the signature is claimed to be under.
    pub public_key: Base64Bytes,
    /// The decoded inner payload.
    pub data: SignedAppointmentData,
    /// Server-stamped last-update time.
    pub updated_at: DateTime<Utc>,
    /// Owning provider.
    pub provider_id: Id,
}

/// A user's booking of one slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    /// Equal to the booked `SlotId.id`.
    pub id: Id,
    /// The user's ephemeral public key.
    pub public_key: Base64Bytes,
    /// The priority token spent on this booking.
    pub token: Base64Bytes,
    /// The user's encrypted confirmation blob.
    pub encrypted_data: Base64Bytes,
}

/// A booked slot with the booking redacted to just its id, for anonymous
/// callers who may learn which slots are taken but nothing about who
/// booked them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BookedSlot {
    /// The booked slot's id.
    pub id: Id,
}

/// The key chain a client replays to trust a provider's public profile:
/// the provider's own key, and the mediator key that installed it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyChain {
    /// The provider's signing key record.
    pub provider: kiebitz_types::ActorKey,
    /// The mediator key that signed the provider's key.
    pub mediator: kiebitz_types::ActorKey,
}

/// An appointment as returned to the provider that owns it: bookings
/// intact.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderAppointmentView {
    /// The canonical serialised form of the signed appointment data.
    pub json: String,
    /// Signature over `json`.
    pub signature: Base64Bytes,
    /// The provider public key.
    pub public_key: Base64Bytes,
    /// The decoded inner payload.
    pub data: SignedAppointmentData,
    /// Server-stamped last-update time.
    pub updated_at: DateTime<Utc>,
    /// Bookings currently attached to this appointment's slots.
    pub bookings: Vec<Booking>,
}

/// An appointment as returned to an anonymous caller: bookings redacted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnonymousAppointmentView {
    /// The canonical serialised form of the signed appointment data.
    pub json: String,
    /// Signature over `json`.
    pub signature: Base64Bytes,
    /// The provider public key.
    pub public_key: Base64Bytes,
    /// The decoded inner payload.
    pub data: SignedAppointmentData,
    /// Which slots are already taken, without revealing by whom.
    pub booked_slots: Vec<BookedSlot>,
    /// The trust path from root to this provider's key.
    pub key_chain: KeyChain,
}

/// A privacy-preserving summary used by the anonymous discovery endpoint:
/// no slot ids, no bookings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentAggregated {
    /// Appointment id.
    pub id: Id,
    /// Length of the appointment, in minutes.
    pub duration: i64,
    /// String-to-string secondary-index properties.
    pub properties: BTreeMap<String, String>,
    /// Number of still-open slots.
    pub slot_n: usize,
    /// When the appointment starts.
    pub timestamp: DateTime<Utc>,
}

/// A provider's public profile, signed by the mediator that verified it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderProfileData {
    /// Display name.
    pub name: String,
    /// Street address.
    pub street: String,
    /// City.
    pub city: String,
    /// Zip code, used for proximity queries.
    pub zip_code: String,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// Whether the site is wheelchair accessible.
    #[serde(default)]
    pub accessible: bool,
}

/// A provider's raw, opaque profile plus its derived lifecycle status.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawProviderData {
    /// `SHA256` of the provider's signing key.
    pub id: Id,
    /// Opaque blob, never interpreted server-side.
    pub encrypted_data: Base64Bytes,
    /// Whether this record is in the verified bucket.
    pub verified: bool,
    /// Derived lifecycle status.
    pub status: ProviderStatus,
}
