//! Request payloads for the appointment publishing call.

use chrono::{DateTime, Utc};
use kiebitz_types::{Base64Bytes, Timestamped};
use serde::{Deserialize, Serialize};

use crate::domain::SignedAppointmentData;

/// One appointment within a `publishAppointments` batch.
///
/// `json`/`signature` are the provider's signature over this single
/// appointment, independent of the signature over the outer envelope —
/// a client fetching this appointment later verifies it standalone, so it
/// must carry its own valid signature rather than relying on having been
/// part of a signed batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentSubmission {
    /// The canonical serialised form of `data`, exactly as signed.
    pub json: String,
    /// Signature over `json`, under the publishing provider's key.
    pub signature: Base64Bytes,
    /// A convenience decoding of `json`, for callers to read fields from.
    /// Not covered by the signature: never act on it before calling
    /// `decode_and_check`.
    pub data: SignedAppointmentData,
}

impl AppointmentSubmission {
    /// Re-derive `SignedAppointmentData` from `json`, the bytes the
    /// signature actually covers.
    pub fn decode_and_check(&self) -> Result<SignedAppointmentData, serde_json::Error> {
        serde_json::from_str(&self.json)
    }
}

/// Inner payload of `publishAppointments`: a provider replacing its open
/// appointment set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishAppointmentsData {
    /// When the provider produced this batch.
    pub timestamp: DateTime<Utc>,
    /// The appointments being published, at most 500 per call.
    pub appointments: Vec<AppointmentSubmission>,
}

impl Timestamped for PublishAppointmentsData {
    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}
