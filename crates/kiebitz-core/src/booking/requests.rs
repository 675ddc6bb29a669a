//! Request payloads for booking and cancellation.

use chrono::{DateTime, Utc};
use kiebitz_types::{Base64Bytes, Id, Timestamped};
use serde::{Deserialize, Serialize};

/// Inner payload of `bookAppointment`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookAppointmentData {
    /// When the caller produced this request.
    pub timestamp: DateTime<Utc>,
    /// The appointment being booked.
    pub id: Id,
    /// The user's encrypted confirmation blob, opaque to the server.
    pub encrypted_data: Base64Bytes,
}

impl Timestamped for BookAppointmentData {
    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Inner payload of `cancelAppointment`. The spent priority token (carried
/// alongside the envelope, not in this struct) is what actually identifies
/// the booking to release.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelAppointmentData {
    /// When the caller produced this request.
    pub timestamp: DateTime<Utc>,
}

impl Timestamped for CancelAppointmentData {
    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}
